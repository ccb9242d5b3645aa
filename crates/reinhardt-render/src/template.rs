//! Per-template metadata shared by every instance.
//!
//! The descriptor store is sized to the template's declaration count up
//! front and never grows, so a descriptor keeps its address for the life of
//! the template.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::{ConstantTable, StaticAttrs};
use crate::context::RenderContext;
use crate::cursor::TraversalCursor;
use crate::descriptor::{NodeDescriptor, SlotIndex};
use crate::directives::DirectiveDef;
use crate::error::{RenderError, RenderResult};
use crate::hooks::HookRegistry;
use crate::instance::HEADER_OFFSET;
use crate::node_kind::NodeKind;
use crate::queries::{QueryDef, QueryRegistry};

/// Global counter for template ids.
static TEMPLATE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Instruction stream of a compiled template.
pub type RenderFn = Rc<dyn Fn(&mut RenderContext<'_>) -> RenderResult<()>>;

/// Cached description of a compiled template.
pub struct Template {
	id: u64,
	decls: usize,
	vars: usize,
	data: Vec<Option<NodeDescriptor>>,
	consts: ConstantTable,
	first_create_pass: bool,
	first_child: Option<SlotIndex>,
	directives: Vec<DirectiveDef>,
	queries: QueryRegistry,
	hooks: HookRegistry,
	ssr_id: Option<String>,
	render: RenderFn,
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template")
			.field("id", &self.id)
			.field("decls", &self.decls)
			.field("vars", &self.vars)
			.field("first_create_pass", &self.first_create_pass)
			.field("descriptors", &self.descriptor_count())
			.field("ssr_id", &self.ssr_id)
			.finish_non_exhaustive()
	}
}

impl Template {
	/// Creates a template with `decls` node slots and `vars` binding cells.
	pub fn new<F>(decls: usize, vars: usize, render: F) -> Self
	where
		F: Fn(&mut RenderContext<'_>) -> RenderResult<()> + 'static,
	{
		Self {
			id: TEMPLATE_COUNTER.fetch_add(1, Ordering::Relaxed),
			decls,
			vars,
			data: (0..decls).map(|_| None).collect(),
			consts: ConstantTable::new(),
			first_create_pass: true,
			first_child: None,
			directives: Vec::new(),
			queries: QueryRegistry::default(),
			hooks: HookRegistry::default(),
			ssr_id: None,
			render: Rc::new(render),
		}
	}

	/// Sets the constant table.
	pub fn with_consts(mut self, consts: ConstantTable) -> Self {
		self.consts = consts;
		self
	}

	/// Makes a directive available for matching.
	pub fn with_directive(mut self, def: DirectiveDef) -> Self {
		self.directives.push(def);
		self
	}

	/// Declares a view query.
	pub fn with_view_query(mut self, def: QueryDef) -> Self {
		self.queries.add_view_query(def);
		self
	}

	/// Wraps the template in a shared handle.
	pub fn into_ref(self) -> TemplateRef {
		TemplateRef {
			id: self.id,
			inner: Rc::new(RefCell::new(self)),
		}
	}

	/// Unique template id.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Number of node slots.
	pub fn decls(&self) -> usize {
		self.decls
	}

	/// Number of binding cells.
	pub fn vars(&self) -> usize {
		self.vars
	}

	/// Constant table.
	pub fn consts(&self) -> &ConstantTable {
		&self.consts
	}

	/// Whether metadata is still being built.
	pub fn first_create_pass(&self) -> bool {
		self.first_create_pass
	}

	/// First binding cell; structural instructions must run before the
	/// binding cursor moves past it.
	pub fn binding_start_index(&self) -> usize {
		HEADER_OFFSET + self.decls
	}

	/// First slot declared at the template root.
	pub fn first_child(&self) -> Option<SlotIndex> {
		self.first_child
	}

	/// Id the server assigned to this template, learned during hydration.
	pub fn ssr_id(&self) -> Option<&str> {
		self.ssr_id.as_deref()
	}

	/// Records the server-assigned id.
	pub fn set_ssr_id(&mut self, id: impl Into<String>) {
		self.ssr_id = Some(id.into());
	}

	/// Directives available for matching.
	pub fn directive_registry(&self) -> &[DirectiveDef] {
		&self.directives
	}

	/// Registered queries.
	pub fn queries(&self) -> &QueryRegistry {
		&self.queries
	}

	/// Registered queries, mutably.
	pub fn queries_mut(&mut self) -> &mut QueryRegistry {
		&mut self.queries
	}

	/// Registered lifecycle hooks.
	pub fn hooks(&self) -> &HookRegistry {
		&self.hooks
	}

	/// Registered lifecycle hooks, mutably.
	pub fn hooks_mut(&mut self) -> &mut HookRegistry {
		&mut self.hooks
	}

	/// Number of descriptors built so far.
	pub fn descriptor_count(&self) -> usize {
		self.data.iter().filter(|slot| slot.is_some()).count()
	}

	/// Returns the cached descriptor of `slot`.
	pub fn descriptor(&self, slot: SlotIndex) -> RenderResult<&NodeDescriptor> {
		self.data
			.get(slot)
			.and_then(Option::as_ref)
			.ok_or(RenderError::MissingDescriptor { slot })
	}

	/// Returns the cached descriptor of `slot` mutably.
	pub fn descriptor_mut(&mut self, slot: SlotIndex) -> RenderResult<&mut NodeDescriptor> {
		self.data
			.get_mut(slot)
			.and_then(Option::as_mut)
			.ok_or(RenderError::MissingDescriptor { slot })
	}

	/// Returns the descriptor of `slot`, building and linking it first if
	/// this is the first request for the slot.
	///
	/// Links are derived from the cursor: with an open current node the new
	/// descriptor becomes its child, otherwise its next sibling.
	pub fn get_or_create_descriptor(
		&mut self,
		index: SlotIndex,
		kind: NodeKind,
		name: Option<&str>,
		attrs: Option<StaticAttrs>,
		cursor: &TraversalCursor,
	) -> RenderResult<&mut NodeDescriptor> {
		if index >= self.decls {
			return Err(RenderError::IndexOutOfRange {
				index,
				limit: self.decls,
			});
		}
		if self.data[index].is_none() {
			if !self.first_create_pass {
				return Err(RenderError::NotFirstCreatePass { slot: index });
			}
			let descriptor = self.create_descriptor(index, kind, name, attrs, cursor);
			self.data[index] = Some(descriptor);
			tracing::debug!(template = self.id, slot = index, kind = %kind, "node descriptor created");
		}
		self.descriptor_mut(index)
	}

	fn create_descriptor(
		&mut self,
		index: SlotIndex,
		kind: NodeKind,
		name: Option<&str>,
		attrs: Option<StaticAttrs>,
		cursor: &TraversalCursor,
	) -> NodeDescriptor {
		let current = cursor.current();
		let parent = if cursor.is_parent() {
			current
		} else {
			current.and_then(|slot| self.data.get(slot).and_then(Option::as_ref)?.parent)
		};
		let mut descriptor = NodeDescriptor::new(index, kind, name.map(str::to_string), attrs);
		descriptor.parent = parent;

		if self.first_child.is_none() {
			self.first_child = Some(index);
		}
		if let Some(current) = current.and_then(|slot| self.data.get_mut(slot).and_then(Option::as_mut)) {
			if cursor.is_parent() {
				if current.child.is_none() {
					current.child = Some(index);
				}
			} else if current.next.is_none() {
				current.next = Some(index);
				descriptor.prev = Some(current.index);
			}
		}
		descriptor
	}

	/// Offers `slot` to the registered queries.
	pub(crate) fn match_queries(&mut self, slot: SlotIndex) -> RenderResult<()> {
		let Self {
			data,
			queries,
			directives,
			..
		} = self;
		let descriptor = data
			.get(slot)
			.and_then(Option::as_ref)
			.ok_or(RenderError::MissingDescriptor { slot })?;
		queries.element_start(descriptor, data, directives);
		Ok(())
	}

	pub(crate) fn complete_first_pass(&mut self) {
		self.first_create_pass = false;
	}

	/// Throws away metadata recorded by a first creation pass that did not
	/// complete, so the next pass builds it from scratch.
	pub(crate) fn discard_incomplete_first_pass(&mut self) {
		debug_assert!(self.first_create_pass);
		for slot in &mut self.data {
			*slot = None;
		}
		self.first_child = None;
		self.queries.reset_matches();
		self.hooks = HookRegistry::default();
	}

	pub(crate) fn render_fn(&self) -> RenderFn {
		Rc::clone(&self.render)
	}
}

/// Shared handle to a [`Template`].
///
/// Templates are single-threaded: the handle is neither `Send` nor `Sync`,
/// and a second borrow while a render holds the template fails with
/// [`RenderError::TemplateBusy`] instead of panicking.
#[derive(Clone)]
pub struct TemplateRef {
	id: u64,
	inner: Rc<RefCell<Template>>,
}

impl fmt::Debug for TemplateRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateRef").field("id", &self.id).finish()
	}
}

impl TemplateRef {
	/// Template id, readable while the template is borrowed.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Borrows the template.
	pub fn borrow(&self) -> RenderResult<Ref<'_, Template>> {
		self.inner
			.try_borrow()
			.map_err(|_| RenderError::TemplateBusy(self.id))
	}

	/// Borrows the template mutably.
	pub fn borrow_mut(&self) -> RenderResult<RefMut<'_, Template>> {
		self.inner
			.try_borrow_mut()
			.map_err(|_| RenderError::TemplateBusy(self.id))
	}

	/// Returns `true` if both handles point at the same template.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	fn template() -> Template {
		Template::new(4, 2, |_| Ok(()))
	}

	#[rstest]
	fn test_binding_start_follows_declarations(template: Template) {
		assert_eq!(template.binding_start_index(), HEADER_OFFSET + 4);
		assert!(template.first_create_pass());
		assert_eq!(template.descriptor_count(), 0);
	}

	#[rstest]
	fn test_get_or_create_is_idempotent(mut template: Template) {
		let cursor = TraversalCursor::new(template.binding_start_index());
		let first = template
			.get_or_create_descriptor(0, NodeKind::ELEMENT, Some("div"), None, &cursor)
			.unwrap() as *const NodeDescriptor;
		let second = template
			.get_or_create_descriptor(0, NodeKind::TEXT, Some("ignored"), None, &cursor)
			.unwrap() as *const NodeDescriptor;

		assert!(std::ptr::eq(first, second));
		assert_eq!(template.descriptor(0).unwrap().kind, NodeKind::ELEMENT);
		assert_eq!(template.descriptor_count(), 1);
	}

	#[rstest]
	fn test_links_follow_cursor(mut template: Template) {
		let mut cursor = TraversalCursor::new(template.binding_start_index());
		template
			.get_or_create_descriptor(0, NodeKind::ELEMENT, Some("ul"), None, &cursor)
			.unwrap();
		cursor.set_current(0, true);
		template
			.get_or_create_descriptor(1, NodeKind::ELEMENT, Some("li"), None, &cursor)
			.unwrap();
		cursor.set_current(1, false);
		template
			.get_or_create_descriptor(2, NodeKind::ELEMENT, Some("li"), None, &cursor)
			.unwrap();

		let ul = template.descriptor(0).unwrap();
		let first = template.descriptor(1).unwrap();
		let second = template.descriptor(2).unwrap();

		assert_eq!(template.first_child(), Some(0));
		assert_eq!(ul.child, Some(1));
		assert_eq!(first.parent, Some(0));
		assert_eq!(first.next, Some(2));
		assert_eq!(second.prev, Some(1));
		assert_eq!(second.parent, Some(0));
	}

	#[rstest]
	fn test_out_of_range_slot(mut template: Template) {
		let cursor = TraversalCursor::new(0);

		let result = template.get_or_create_descriptor(9, NodeKind::ELEMENT, None, None, &cursor);

		assert!(matches!(
			result,
			Err(RenderError::IndexOutOfRange { index: 9, limit: 4 })
		));
	}

	#[rstest]
	fn test_creation_after_first_pass_is_rejected(mut template: Template) {
		let cursor = TraversalCursor::new(0);
		template.complete_first_pass();

		let result = template.get_or_create_descriptor(1, NodeKind::ELEMENT, None, None, &cursor);

		assert!(matches!(result, Err(RenderError::NotFirstCreatePass { slot: 1 })));
	}

	#[rstest]
	fn test_template_ref_reports_busy() {
		let template = Template::new(1, 0, |_| Ok(())).into_ref();
		let _guard = template.borrow_mut().unwrap();

		assert!(matches!(
			template.borrow(),
			Err(RenderError::TemplateBusy(id)) if id == template.id()
		));
	}

	#[rstest]
	fn test_ids_are_unique() {
		let a = Template::new(0, 0, |_| Ok(()));
		let b = Template::new(0, 0, |_| Ok(()));

		assert_ne!(a.id(), b.id());
	}
}
