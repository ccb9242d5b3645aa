//! Traversal state for one render pass.

use crate::descriptor::SlotIndex;
use crate::renderer::Namespace;

/// Tracks where the instruction stream currently is in the template tree.
///
/// Owned by a [`RenderContext`](crate::RenderContext) and dropped with it,
/// so no traversal state outlives a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalCursor {
	current: Option<SlotIndex>,
	is_parent: bool,
	element_depth: usize,
	binding_index: usize,
	namespace: Option<Namespace>,
	skip_hydration_root: Option<SlotIndex>,
}

impl TraversalCursor {
	/// Creates a cursor whose binding index starts at `binding_start`.
	pub fn new(binding_start: usize) -> Self {
		Self {
			binding_index: binding_start,
			..Self::default()
		}
	}

	/// The most recently declared or closed node.
	pub fn current(&self) -> Option<SlotIndex> {
		self.current
	}

	/// Whether the current node is open, so that new nodes become its children.
	pub fn is_parent(&self) -> bool {
		self.is_parent
	}

	/// Moves to `slot`.
	pub fn set_current(&mut self, slot: SlotIndex, is_parent: bool) {
		self.current = Some(slot);
		self.is_parent = is_parent;
	}

	/// Switches from child mode to sibling mode on the current node.
	pub fn set_not_parent(&mut self) {
		self.is_parent = false;
	}

	/// Number of structural nodes currently open.
	pub fn element_depth(&self) -> usize {
		self.element_depth
	}

	pub(crate) fn increase_element_depth(&mut self) {
		self.element_depth += 1;
	}

	/// Decrements the depth, returning `false` if it was already zero.
	pub(crate) fn decrease_element_depth(&mut self) -> bool {
		match self.element_depth.checked_sub(1) {
			Some(depth) => {
				self.element_depth = depth;
				true
			}
			None => false,
		}
	}

	/// Next binding cell to write.
	pub fn binding_index(&self) -> usize {
		self.binding_index
	}

	pub(crate) fn advance_binding_index(&mut self) -> usize {
		let index = self.binding_index;
		self.binding_index += 1;
		index
	}

	/// Namespace used for element creation.
	pub fn namespace(&self) -> Option<Namespace> {
		self.namespace
	}

	pub(crate) fn set_namespace(&mut self, namespace: Option<Namespace>) {
		self.namespace = namespace;
	}

	/// Whether nodes are being declared inside a skip-hydration region.
	pub fn in_skip_hydration(&self) -> bool {
		self.skip_hydration_root.is_some()
	}

	/// Returns `true` if `slot` opened the active skip-hydration region.
	pub fn is_skip_hydration_root(&self, slot: SlotIndex) -> bool {
		self.skip_hydration_root == Some(slot)
	}

	pub(crate) fn enter_skip_hydration(&mut self, slot: SlotIndex) {
		self.skip_hydration_root = Some(slot);
	}

	pub(crate) fn leave_skip_hydration(&mut self) {
		self.skip_hydration_root = None;
	}
}
