//! Element instructions.

use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::error::RenderResult;
use crate::hydration::NodeRequest;
use crate::node_kind::NodeKind;

impl RenderContext<'_> {
	/// Declares an element and opens it for children.
	///
	/// `attrs_index` and `local_refs_index` address the template's constant
	/// table.
	pub fn element_start(
		&mut self,
		index: SlotIndex,
		name: &str,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<&mut Self> {
		self.check_structural_preconditions(index)?;
		let first_create_pass = self.template.first_create_pass();
		if first_create_pass {
			self.structural_first_create_pass(
				index,
				NodeKind::ELEMENT,
				Some(name),
				attrs_index,
				local_refs_index,
			)?;
			self.validate_element_is_known(index, name)?;
		}

		let namespace = self.cursor.namespace();
		let resolution = self.resolve_node(index, NodeRequest::Element { name, namespace })?;
		self.instance.set_native(index, resolution.node)?;
		self.cursor.set_current(index, true);
		if resolution.created {
			self.setup_static_attributes(index, resolution.node)?;
		}
		self.append_child(index, resolution)?;
		self.attach_patch_data(index, resolution.node)?;
		self.cursor.increase_element_depth();

		self.create_directives_instances(index)?;
		if local_refs_index.is_some() {
			self.save_resolved_locals(index)?;
		}
		Ok(self)
	}

	/// Closes the current element.
	pub fn element_end(&mut self) -> RenderResult<&mut Self> {
		let slot = self.end_structural(NodeKind::ELEMENT)?;
		self.propagate_styling_inputs(slot)?;
		Ok(self)
	}

	/// Declares an element without children.
	pub fn element(
		&mut self,
		index: SlotIndex,
		name: &str,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<&mut Self> {
		self.element_start(index, name, attrs_index, local_refs_index)?
			.element_end()
	}

	/// Warns about hyphenated tags that no directive claims, unless custom
	/// elements are allowed.
	fn validate_element_is_known(&self, index: SlotIndex, name: &str) -> RenderResult<()> {
		if !self.diagnostics.enabled()
			|| self.options.custom_elements_schema
			|| self.cursor.namespace().is_some()
			|| !name.contains('-')
		{
			return Ok(());
		}
		if !self.template.descriptor(index)?.is_directive_host() {
			tracing::warn!(
				slot = index,
				tag = name,
				"unknown element; enable `custom_elements_schema` to allow custom elements"
			);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use rstest::*;

	use crate::constants::{ConstantTable, LocalRef, StaticAttrs};
	use crate::error::RenderError;
	use crate::instance::LocalRefValue;
	use crate::renderer::{MemoryDocument, Namespace, NodeContext, Renderer, RendererRef};
	use crate::{RenderEngine, RenderOptions, Template};

	#[fixture]
	fn engine() -> RenderEngine {
		RenderEngine::new(RenderOptions::new().diagnostics(true))
	}

	fn document() -> (Rc<RefCell<MemoryDocument>>, RendererRef) {
		let document = MemoryDocument::new().into_shared();
		let renderer: RendererRef = document.clone();
		(document, renderer)
	}

	#[rstest]
	fn test_static_attributes_are_written(engine: RenderEngine) {
		let mut consts = ConstantTable::new();
		let attrs = consts.push_attrs(
			StaticAttrs::new()
				.attr("id", "main")
				.namespaced("xlink", "href", "#a")
				.class("a")
				.class("b")
				.style("color", "red"),
		);
		let template = Template::new(1, 0, move |ctx| {
			ctx.element(0, "div", Some(attrs), None)?;
			Ok(())
		})
		.with_consts(consts)
		.into_ref();
		let (document, renderer) = document();
		let body = document.borrow().body();
		let mut instance = engine.create_instance(&template, renderer, body).unwrap();

		engine.render(&mut instance).unwrap();

		let div = instance.native(0).unwrap();
		let document = document.borrow();
		assert_eq!(document.get_attribute(div, "id").as_deref(), Some("main"));
		assert_eq!(document.get_attribute(div, "xlink:href").as_deref(), Some("#a"));
		assert_eq!(document.get_attribute(div, "class").as_deref(), Some("a b"));
		assert_eq!(document.get_attribute(div, "style").as_deref(), Some("color: red;"));
	}

	#[rstest]
	fn test_patch_data_only_on_root_nodes(engine: RenderEngine) {
		let template = Template::new(2, 0, |ctx| {
			ctx.element_start(0, "ul", None, None)?
				.element(1, "li", None, None)?
				.element_end()?;
			Ok(())
		})
		.into_ref();
		let (document, renderer) = document();
		let body = document.borrow().body();
		let mut instance = engine.create_instance(&template, renderer, body).unwrap();

		engine.render(&mut instance).unwrap();

		let document = document.borrow();
		assert_eq!(
			document.context_of(instance.native(0).unwrap()),
			Some(NodeContext {
				instance: instance.id(),
				slot: 0
			})
		);
		assert_eq!(document.context_of(instance.native(1).unwrap()), None);
	}

	#[rstest]
	fn test_namespace_instructions(engine: RenderEngine) {
		let template = Template::new(3, 0, |ctx| {
			ctx.namespace_svg()
				.element_start(0, "svg", None, None)?
				.element(1, "circle", None, None)?
				.element_end()?
				.namespace_html()
				.element(2, "p", None, None)?;
			Ok(())
		})
		.into_ref();
		let (document, renderer) = document();
		let body = document.borrow().body();
		let mut instance = engine.create_instance(&template, renderer, body).unwrap();

		engine.render(&mut instance).unwrap();

		let document = document.borrow();
		assert_eq!(document.namespace(instance.native(1).unwrap()), Some(Namespace::Svg));
		assert_eq!(document.namespace(instance.native(2).unwrap()), None);
	}

	#[rstest]
	fn test_structural_instruction_after_binding_fails(engine: RenderEngine) {
		let template = Template::new(2, 1, |ctx| {
			ctx.element(0, "p", None, None)?
				.bind("late")?
				.element(1, "p", None, None)?;
			Ok(())
		})
		.into_ref();
		let (_, renderer) = document();
		let mut instance = engine.create_instance(&template, renderer, None).unwrap();

		let result = engine.render(&mut instance);

		assert!(matches!(result, Err(RenderError::BindingsStarted { slot: 1, .. })));
	}

	#[rstest]
	fn test_slot_beyond_declarations_fails(engine: RenderEngine) {
		let template = Template::new(1, 0, |ctx| {
			ctx.element(3, "p", None, None)?;
			Ok(())
		})
		.into_ref();
		let (_, renderer) = document();
		let mut instance = engine.create_instance(&template, renderer, None).unwrap();

		let result = engine.render(&mut instance);

		assert!(matches!(
			result,
			Err(RenderError::IndexOutOfRange { index: 3, limit: 1 })
		));
	}

	#[rstest]
	fn test_local_ref_to_node(engine: RenderEngine) {
		let mut consts = ConstantTable::new();
		let refs = consts.push_local_refs(vec![LocalRef::node("title")]);
		let template = Template::new(1, 0, move |ctx| {
			ctx.element(0, "h1", None, Some(refs))?;
			Ok(())
		})
		.with_consts(consts)
		.into_ref();
		let (_, renderer) = document();
		let mut instance = engine.create_instance(&template, renderer, None).unwrap();

		engine.render(&mut instance).unwrap();

		assert_eq!(
			instance.local_ref("title"),
			Some(LocalRefValue::Node(instance.native(0).unwrap()))
		);
	}
}
