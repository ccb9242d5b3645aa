//! Per-instantiation data.
//!
//! An instance owns a flat cell array laid out as
//! `[header | node slots | binding cells]`. Node slot `i` lives at
//! `HEADER_OFFSET + i`, mirroring the template's descriptor store.

use std::collections::BTreeMap;

use crate::descriptor::SlotIndex;
use crate::directives::Directive;
use crate::error::{RenderError, RenderResult};
use crate::hydration::{DehydratedView, HydrationInfo};
use crate::node_kind::NodeKind;
use crate::renderer::{NodeId, RendererRef};
use crate::template::{Template, TemplateRef};

/// Number of reserved header cells.
pub const HEADER_OFFSET: usize = 2;

const INSTANCE_CELL: usize = 0;
const HOST_CELL: usize = 1;

/// Identifier of an instance.
pub type InstanceId = u64;

/// Value stored in a binding cell.
pub type BindingValue = serde_json::Value;

/// One cell of the instance array.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
	/// Header: the owning instance id.
	Instance(InstanceId),
	/// Header: the host node, if any.
	Host(Option<NodeId>),
	/// Not yet written.
	Empty,
	/// The concrete node of a slot.
	Native(NodeId),
	/// A binding value.
	Binding(BindingValue),
}

/// What a local reference resolved to in this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRefValue {
	/// A concrete node.
	Node(NodeId),
	/// A directive instance.
	Directive {
		/// Host slot.
		slot: SlotIndex,
		/// Position among the slot's directives.
		position: usize,
	},
}

/// Live data of one template instantiation.
pub struct InstanceData {
	template: TemplateRef,
	renderer: RendererRef,
	hydration: Option<HydrationInfo>,
	cells: Vec<Cell>,
	directives: BTreeMap<SlotIndex, Vec<Box<dyn Directive>>>,
	local_refs: BTreeMap<String, LocalRefValue>,
	rendered: bool,
	destroyed: bool,
}

impl std::fmt::Debug for InstanceData {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InstanceData")
			.field("id", &self.id())
			.field("template", &self.template)
			.field("hydrated", &self.hydration.is_some())
			.field("cells", &self.cells)
			.field("local_refs", &self.local_refs)
			.field("rendered", &self.rendered)
			.field("destroyed", &self.destroyed)
			.finish_non_exhaustive()
	}
}

impl InstanceData {
	/// Creates an instance with every slot empty.
	pub fn new(
		id: InstanceId,
		template: TemplateRef,
		renderer: RendererRef,
		host: Option<NodeId>,
		hydration: Option<HydrationInfo>,
	) -> RenderResult<Self> {
		let size = {
			let template = template.borrow()?;
			HEADER_OFFSET + template.decls() + template.vars()
		};
		let mut cells = Vec::with_capacity(size);
		cells.push(Cell::Instance(id));
		cells.push(Cell::Host(host));
		cells.resize(size, Cell::Empty);
		Ok(Self {
			template,
			renderer,
			hydration,
			cells,
			directives: BTreeMap::new(),
			local_refs: BTreeMap::new(),
			rendered: false,
			destroyed: false,
		})
	}

	/// Instance id.
	pub fn id(&self) -> InstanceId {
		match self.cells[INSTANCE_CELL] {
			Cell::Instance(id) => id,
			_ => 0,
		}
	}

	/// Host node the instance renders into.
	pub fn host(&self) -> Option<NodeId> {
		match self.cells[HOST_CELL] {
			Cell::Host(host) => host,
			_ => None,
		}
	}

	/// Template of this instance.
	pub fn template(&self) -> &TemplateRef {
		&self.template
	}

	/// Renderer shared with the template's other instances.
	pub fn renderer(&self) -> &RendererRef {
		&self.renderer
	}

	/// Hydration state, if this instance reuses server-rendered nodes.
	pub fn hydration(&self) -> Option<&HydrationInfo> {
		self.hydration.as_ref()
	}

	/// Hydration state, mutably.
	pub fn hydration_mut(&mut self) -> Option<&mut HydrationInfo> {
		self.hydration.as_mut()
	}

	/// Whether this instance carries hydration state.
	pub fn is_hydrated(&self) -> bool {
		self.hydration.is_some()
	}

	/// The raw cell array.
	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	/// Concrete node of a slot.
	pub fn native(&self, slot: SlotIndex) -> Option<NodeId> {
		match self.cells.get(HEADER_OFFSET + slot)? {
			Cell::Native(node) => Some(*node),
			_ => None,
		}
	}

	pub(crate) fn set_native(&mut self, slot: SlotIndex, node: NodeId) -> RenderResult<()> {
		let limit = self.cells.len();
		let cell = self
			.cells
			.get_mut(HEADER_OFFSET + slot)
			.ok_or(RenderError::IndexOutOfRange {
				index: HEADER_OFFSET + slot,
				limit,
			})?;
		*cell = Cell::Native(node);
		Ok(())
	}

	/// Value of a binding cell, addressed by absolute index.
	pub fn binding(&self, index: usize) -> Option<&BindingValue> {
		match self.cells.get(index)? {
			Cell::Binding(value) => Some(value),
			_ => None,
		}
	}

	pub(crate) fn set_binding(&mut self, index: usize, value: BindingValue) -> RenderResult<()> {
		let limit = self.cells.len();
		let cell = self
			.cells
			.get_mut(index)
			.ok_or(RenderError::IndexOutOfRange { index, limit })?;
		*cell = Cell::Binding(value);
		Ok(())
	}

	/// Directive instances of a slot.
	pub fn directives(&self, slot: SlotIndex) -> &[Box<dyn Directive>] {
		self.directives
			.get(&slot)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	/// One directive instance.
	pub fn directive(&self, slot: SlotIndex, position: usize) -> Option<&dyn Directive> {
		self.directives
			.get(&slot)?
			.get(position)
			.map(|directive| directive.as_ref())
	}

	/// One directive instance, mutably.
	pub fn directive_mut(
		&mut self,
		slot: SlotIndex,
		position: usize,
	) -> Option<&mut (dyn Directive + 'static)> {
		self.directives
			.get_mut(&slot)?
			.get_mut(position)
			.map(|directive| directive.as_mut())
	}

	pub(crate) fn set_directives(&mut self, slot: SlotIndex, directives: Vec<Box<dyn Directive>>) {
		if directives.is_empty() {
			self.directives.remove(&slot);
		} else {
			self.directives.insert(slot, directives);
		}
	}

	/// Resolves a local reference by name.
	pub fn local_ref(&self, name: &str) -> Option<LocalRefValue> {
		self.local_refs.get(name).copied()
	}

	pub(crate) fn set_local_ref(&mut self, name: String, value: LocalRefValue) {
		self.local_refs.insert(name, value);
	}

	/// Removes and returns the dehydrated views stashed for a container slot.
	pub fn take_dehydrated_views(&mut self, slot: SlotIndex) -> Vec<DehydratedView> {
		self.hydration
			.as_mut()
			.map(|info| info.take_dehydrated_views(slot))
			.unwrap_or_default()
	}

	/// Whether the creation pass ran.
	pub fn is_rendered(&self) -> bool {
		self.rendered
	}

	/// Whether the instance was torn down.
	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	pub(crate) fn mark_rendered(&mut self) {
		self.rendered = true;
	}

	pub(crate) fn mark_destroyed(&mut self) {
		self.destroyed = true;
		self.directives.clear();
		self.local_refs.clear();
	}

	/// Concrete nodes at the root of this instance, in document order.
	///
	/// Element containers contribute their content followed by their anchor.
	pub fn root_nodes(&self) -> RenderResult<Vec<NodeId>> {
		let template = self.template.borrow()?;
		let mut nodes = Vec::new();
		self.collect_nodes(&template, template.first_child(), &mut nodes)?;
		Ok(nodes)
	}

	fn collect_nodes(
		&self,
		template: &Template,
		mut slot: Option<SlotIndex>,
		nodes: &mut Vec<NodeId>,
	) -> RenderResult<()> {
		while let Some(current) = slot {
			let descriptor = template.descriptor(current)?;
			if !descriptor.is_detached() {
				if descriptor.kind.contains(NodeKind::ELEMENT_CONTAINER) {
					self.collect_nodes(template, descriptor.child, nodes)?;
				}
				if let Some(node) = self.native(current) {
					nodes.push(node);
				}
			}
			slot = descriptor.next;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::{MemoryDocument, Renderer};
	use rstest::*;

	#[fixture]
	fn instance() -> InstanceData {
		let template = Template::new(3, 2, |_| Ok(())).into_ref();
		let renderer: RendererRef = MemoryDocument::new().into_shared();
		InstanceData::new(11, template, renderer, None, None).unwrap()
	}

	#[rstest]
	fn test_layout(instance: InstanceData) {
		assert_eq!(instance.cells().len(), HEADER_OFFSET + 3 + 2);
		assert_eq!(instance.cells()[0], Cell::Instance(11));
		assert_eq!(instance.cells()[1], Cell::Host(None));
		assert!(instance.cells()[HEADER_OFFSET..].iter().all(|cell| *cell == Cell::Empty));
		assert_eq!(instance.id(), 11);
		assert!(!instance.is_hydrated());
	}

	#[rstest]
	fn test_native_slots_are_offset(mut instance: InstanceData) {
		let node = instance.renderer().borrow_mut().create_text("x");
		instance.set_native(1, node).unwrap();

		assert_eq!(instance.native(1), Some(node));
		assert_eq!(instance.cells()[HEADER_OFFSET + 1], Cell::Native(node));
		assert_eq!(instance.native(0), None);
	}

	#[rstest]
	fn test_out_of_range_writes_fail(mut instance: InstanceData) {
		let node = instance.renderer().borrow_mut().create_text("x");

		assert!(instance.set_native(40, node).is_err());
		assert!(instance.set_binding(40, BindingValue::Null).is_err());
	}

	#[rstest]
	fn test_bindings(mut instance: InstanceData) {
		let index = HEADER_OFFSET + 3;
		instance.set_binding(index, serde_json::json!("hello")).unwrap();

		assert_eq!(instance.binding(index), Some(&serde_json::json!("hello")));
		assert_eq!(instance.binding(index + 1), None);
	}

	#[rstest]
	fn test_destroy_clears_directives_and_refs(mut instance: InstanceData) {
		instance.set_local_ref("a".to_string(), LocalRefValue::Directive { slot: 0, position: 0 });
		instance.mark_destroyed();

		assert!(instance.is_destroyed());
		assert_eq!(instance.local_ref("a"), None);
		assert!(instance.directives(0).is_empty());
	}
}
