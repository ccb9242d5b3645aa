//! View instructions.
//!
//! Generated render functions call these on the [`RenderContext`] in
//! template declaration order. Each instruction returns the context again
//! so calls chain with `?`:
//!
//! ```
//! use reinhardt_render::{
//! 	MemoryDocument, RenderEngine, RenderOptions, Renderer, RendererRef, Template,
//! };
//!
//! let template = Template::new(2, 0, |ctx| {
//! 	ctx.element_start(0, "p", None, None)?
//! 		.text(1, "hello")?
//! 		.element_end()?;
//! 	Ok(())
//! })
//! .into_ref();
//! let document = MemoryDocument::new().into_shared();
//! let body = document.borrow().body();
//! let renderer: RendererRef = document.clone();
//! let engine = RenderEngine::new(RenderOptions::new());
//! let mut instance = engine.create_instance(&template, renderer, body).unwrap();
//! engine.render(&mut instance).unwrap();
//!
//! let body = body.unwrap();
//! assert_eq!(document.borrow().inner_html(body), "<p>hello</p>");
//! ```

mod container;
mod element;
mod element_container;
mod text;

use crate::constants::{LocalRef, StaticAttrs};
use crate::context::RenderContext;
use crate::descriptor::{LocalTarget, SlotIndex};
use crate::diagnostics::Counter;
use crate::directives::set_inputs_for_property;
use crate::error::{RenderError, RenderResult};
use crate::hydration::Resolution;
use crate::instance::{BindingValue, LocalRefValue};
use crate::node_kind::{NodeFlags, NodeKind};
use crate::renderer::{Namespace, NodeContext, NodeId};

impl RenderContext<'_> {
	/// Switches element creation to the SVG namespace.
	pub fn namespace_svg(&mut self) -> &mut Self {
		self.cursor.set_namespace(Some(Namespace::Svg));
		self
	}

	/// Switches element creation to the MathML namespace.
	pub fn namespace_math_ml(&mut self) -> &mut Self {
		self.cursor.set_namespace(Some(Namespace::MathMl));
		self
	}

	/// Switches element creation back to HTML.
	pub fn namespace_html(&mut self) -> &mut Self {
		self.cursor.set_namespace(None);
		self
	}

	/// Writes the next binding cell.
	///
	/// Once a binding has been written, structural instructions are a
	/// contract violation for the rest of the pass.
	pub fn bind(&mut self, value: impl Into<BindingValue>) -> RenderResult<&mut Self> {
		let index = self.cursor.advance_binding_index();
		self.instance.set_binding(index, value.into())?;
		Ok(self)
	}

	fn check_structural_preconditions(&self, index: SlotIndex) -> RenderResult<()> {
		let limit = self.template.decls();
		if index >= limit {
			return Err(RenderError::IndexOutOfRange { index, limit });
		}
		let binding_index = self.cursor.binding_index();
		self.diagnostics
			.check(binding_index == self.template.binding_start_index(), || {
				RenderError::BindingsStarted {
					slot: index,
					binding_index,
				}
			})
	}

	/// Builds the descriptor of a structural node and runs the first-pass
	/// collaborators on it.
	fn structural_first_create_pass(
		&mut self,
		index: SlotIndex,
		kind: NodeKind,
		name: Option<&str>,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<()> {
		let attrs = self.template.consts().attrs(attrs_index).cloned();
		let local_refs = self
			.template
			.consts()
			.local_refs(local_refs_index)
			.map(<[LocalRef]>::to_vec);
		self.create_descriptor(index, kind, name, attrs)?;
		self.collaborators
			.resolve_directives(self.template, index, local_refs.as_deref())?;

		let skip_attr = self.options.skip_hydration_attr.as_str();
		let descriptor = self.template.descriptor_mut(index)?;
		if kind.contains(NodeKind::ELEMENT)
			&& descriptor
				.effective_attrs()
				.is_some_and(|attrs| attrs.has(skip_attr))
		{
			descriptor.flags |= NodeFlags::IS_SKIP_HYDRATION_ROOT;
		}
		self.collaborators.compute_static_styling(descriptor, false);
		self.collaborators.compute_static_styling(descriptor, true);
		self.template.match_queries(index)
	}

	fn create_descriptor(
		&mut self,
		index: SlotIndex,
		kind: NodeKind,
		name: Option<&str>,
		attrs: Option<StaticAttrs>,
	) -> RenderResult<()> {
		let exists = self.template.descriptor(index).is_ok();
		self.template
			.get_or_create_descriptor(index, kind, name, attrs, &self.cursor)?;
		if !exists {
			self.diagnostics.record(Counter::DescriptorCreated);
		}
		Ok(())
	}

	/// Inserts a newly created node under its render parent.
	///
	/// The render parent is the nearest ancestor that is not an element
	/// container, or the host at the view root. Children of an element
	/// container go before its anchor.
	fn append_child(&mut self, index: SlotIndex, resolution: Resolution) -> RenderResult<()> {
		if !resolution.created {
			return Ok(());
		}
		let descriptor = self.template.descriptor(index)?;
		if descriptor.is_detached() {
			return Ok(());
		}
		let Some(parent_node) = self.render_parent(descriptor.parent)? else {
			return Ok(());
		};
		let mut anchor = None;
		if let Some(parent) = descriptor.parent {
			if self
				.template
				.descriptor(parent)?
				.kind
				.contains(NodeKind::ELEMENT_CONTAINER)
			{
				anchor = self.instance.native(parent);
			}
		}
		let mut renderer = self.renderer.borrow_mut();
		let before = anchor.filter(|anchor| renderer.parent(*anchor) == Some(parent_node));
		renderer.insert_before(parent_node, resolution.node, before)
	}

	fn render_parent(&self, mut parent: Option<SlotIndex>) -> RenderResult<Option<NodeId>> {
		while let Some(slot) = parent {
			let descriptor = self.template.descriptor(slot)?;
			if !descriptor.kind.is_transparent() {
				return Ok(self.instance.native(slot));
			}
			parent = descriptor.parent;
		}
		Ok(self.instance.host())
	}

	/// Maps a root-level node back to its instance for introspection.
	fn attach_patch_data(&mut self, index: SlotIndex, node: NodeId) -> RenderResult<()> {
		if self.cursor.element_depth() != 0 {
			return Ok(());
		}
		let mut renderer = self.renderer.borrow_mut();
		if renderer.context_of(node).is_some() {
			return Ok(());
		}
		renderer.attach_context(
			node,
			NodeContext {
				instance: self.instance.id(),
				slot: index,
			},
		)
	}

	/// Writes static attributes, classes and styles to a created element.
	fn setup_static_attributes(&mut self, index: SlotIndex, node: NodeId) -> RenderResult<()> {
		let descriptor = self.template.descriptor(index)?;
		let mut renderer = self.renderer.borrow_mut();
		if let Some(attrs) = descriptor.effective_attrs() {
			for attr in &attrs.attrs {
				renderer.set_attribute(node, &attr.qualified_name(), &attr.value)?;
			}
		}
		if let Some(classes) = &descriptor.classes {
			renderer.set_attribute(node, "class", classes)?;
		}
		if let Some(styles) = &descriptor.styles {
			renderer.set_attribute(node, "style", styles)?;
		}
		Ok(())
	}

	/// Creates directive instances and runs content queries on a host node.
	fn create_directives_instances(&mut self, index: SlotIndex) -> RenderResult<()> {
		if !self.template.descriptor(index)?.is_directive_host() {
			return Ok(());
		}
		self.collaborators
			.instantiate_directives(self.template, self.instance, index)?;
		self.collaborators
			.execute_content_queries(self.template, index)
	}

	/// Stores the values of the local references declared on a node.
	fn save_resolved_locals(&mut self, index: SlotIndex) -> RenderResult<()> {
		let descriptor = self.template.descriptor(index)?;
		for local in &descriptor.local_names {
			let value = match local.target {
				LocalTarget::Node => match self.instance.native(index) {
					Some(node) => LocalRefValue::Node(node),
					None => continue,
				},
				LocalTarget::Directive(position) => LocalRefValue::Directive {
					slot: index,
					position,
				},
			};
			self.instance.set_local_ref(local.name.clone(), value);
		}
		Ok(())
	}

	/// Closes the current node and returns its slot.
	///
	/// An open node is closed in place; otherwise the cursor moves up to
	/// the parent of the current node.
	fn close_current(&mut self) -> RenderResult<SlotIndex> {
		let current = self.cursor.current().ok_or(RenderError::NoParentToClose)?;
		if self.cursor.is_parent() {
			self.cursor.set_not_parent();
			return Ok(current);
		}
		let parent = self
			.template
			.descriptor(current)?
			.parent
			.ok_or(RenderError::NoParentToClose)?;
		self.cursor.set_current(parent, false);
		Ok(parent)
	}

	/// Shared `end` work for elements and element containers.
	fn end_structural(&mut self, expected: NodeKind) -> RenderResult<SlotIndex> {
		let slot = self.close_current()?;
		let actual = self.template.descriptor(slot)?.kind;
		self.diagnostics
			.check(actual.contains(expected), || RenderError::UnexpectedNodeKind {
				slot,
				expected,
				actual,
			})?;
		if self.cursor.is_skip_hydration_root(slot) {
			self.cursor.leave_skip_hydration();
		}
		let was_open = self.cursor.decrease_element_depth();
		self.diagnostics
			.check(was_open, || RenderError::NoParentToClose)?;
		if self.template.first_create_pass() {
			self.collaborators
				.register_post_order_hooks(self.template, slot)?;
			if self.template.descriptor(slot)?.is_content_query_host() {
				self.template.queries_mut().element_end(slot);
			}
		}
		Ok(slot)
	}

	/// Passes staged static classes and styles to directives that take
	/// `class` or `style` as an input.
	fn propagate_styling_inputs(&mut self, slot: SlotIndex) -> RenderResult<()> {
		let descriptor = self.template.descriptor(slot)?;
		let mut pending = Vec::new();
		if descriptor.flags.contains(NodeFlags::HAS_CLASS_INPUT) {
			if let Some(classes) = &descriptor.classes_without_host {
				pending.push(("class", classes.clone()));
			}
		}
		if descriptor.flags.contains(NodeFlags::HAS_STYLE_INPUT) {
			if let Some(styles) = &descriptor.styles_without_host {
				pending.push(("style", styles.clone()));
			}
		}
		for (property, value) in pending {
			set_inputs_for_property(
				self.template,
				self.instance,
				slot,
				property,
				&BindingValue::String(value),
			)?;
		}
		Ok(())
	}
}
