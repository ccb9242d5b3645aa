//! Element container instructions.
//!
//! An element container groups nodes without a native element of its own.
//! Its concrete node is a comment anchor placed after its content.

use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::error::RenderResult;
use crate::hydration::NodeRequest;
use crate::node_kind::NodeKind;

impl RenderContext<'_> {
	/// Declares an element container and opens it for children.
	pub fn element_container_start(
		&mut self,
		index: SlotIndex,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<&mut Self> {
		self.check_structural_preconditions(index)?;
		if self.template.first_create_pass() {
			self.structural_first_create_pass(
				index,
				NodeKind::ELEMENT_CONTAINER,
				None,
				attrs_index,
				local_refs_index,
			)?;
		}

		let resolution = self.resolve_node(index, NodeRequest::ElementContainer)?;
		self.instance.set_native(index, resolution.node)?;
		self.cursor.set_current(index, true);
		self.append_child(index, resolution)?;
		self.attach_patch_data(index, resolution.node)?;
		self.cursor.increase_element_depth();

		self.create_directives_instances(index)?;
		if local_refs_index.is_some() {
			self.save_resolved_locals(index)?;
		}
		Ok(self)
	}

	/// Closes the current element container.
	pub fn element_container_end(&mut self) -> RenderResult<&mut Self> {
		self.end_structural(NodeKind::ELEMENT_CONTAINER)?;
		Ok(self)
	}

	/// Declares an element container without children.
	pub fn element_container(
		&mut self,
		index: SlotIndex,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<&mut Self> {
		self.element_container_start(index, attrs_index, local_refs_index)?
			.element_container_end()
	}
}
