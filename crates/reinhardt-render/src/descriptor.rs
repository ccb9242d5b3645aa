//! Per-slot node metadata.

use crate::constants::StaticAttrs;
use crate::node_kind::{NodeFlags, NodeKind};
use crate::template::TemplateRef;

/// Position of a node in template declaration order.
pub type SlotIndex = usize;

/// What a resolved local reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTarget {
	/// The concrete node of the slot.
	Node,
	/// The directive at this position among the slot's matched directives.
	Directive(usize),
}

/// A local reference resolved during the first creation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalName {
	/// Name visible to the template.
	pub name: String,
	/// What the name resolves to.
	pub target: LocalTarget,
}

/// Cached description of one template slot.
///
/// Built once during the first creation pass and shared by every instance
/// of the template. Tree links are slot indices into the owning template.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
	/// Slot of this node.
	pub index: SlotIndex,
	/// Node category.
	pub kind: NodeKind,
	/// Facts discovered while resolving the node.
	pub flags: NodeFlags,
	/// Tag name for elements, text for text nodes.
	pub name: Option<String>,
	/// Attributes declared on the node itself.
	pub attrs: Option<StaticAttrs>,
	/// Own attributes merged with those contributed by matched directives.
	pub merged_attrs: Option<StaticAttrs>,
	/// Parent slot, `None` at the template root.
	pub parent: Option<SlotIndex>,
	/// First child slot.
	pub child: Option<SlotIndex>,
	/// Next sibling slot.
	pub next: Option<SlotIndex>,
	/// Previous sibling slot.
	pub prev: Option<SlotIndex>,
	/// Registry indices of matched directives, in match order.
	pub directives: Vec<usize>,
	/// Static attribute values routed to directive inputs, per matched directive.
	pub initial_inputs: Vec<Vec<(String, String)>>,
	/// Resolved local references.
	pub local_names: Vec<LocalName>,
	/// Static classes written to the node, including host contributions.
	pub classes: Option<String>,
	/// Static styles written to the node, including host contributions.
	pub styles: Option<String>,
	/// Classes declared on the node only, staged for directive inputs.
	pub classes_without_host: Option<String>,
	/// Styles declared on the node only, staged for directive inputs.
	pub styles_without_host: Option<String>,
	/// Template instantiated into this container.
	pub embedded: Option<TemplateRef>,
}

impl NodeDescriptor {
	/// Creates an unlinked descriptor.
	pub fn new(
		index: SlotIndex,
		kind: NodeKind,
		name: Option<String>,
		attrs: Option<StaticAttrs>,
	) -> Self {
		Self {
			index,
			kind,
			flags: NodeFlags::empty(),
			name,
			attrs,
			merged_attrs: None,
			parent: None,
			child: None,
			next: None,
			prev: None,
			directives: Vec::new(),
			initial_inputs: Vec::new(),
			local_names: Vec::new(),
			classes: None,
			styles: None,
			classes_without_host: None,
			styles_without_host: None,
			embedded: None,
		}
	}

	/// Returns `true` if at least one directive matched.
	pub fn is_directive_host(&self) -> bool {
		self.flags.contains(NodeFlags::IS_DIRECTIVE_HOST)
	}

	/// Returns `true` if a matched directive declares content queries.
	pub fn is_content_query_host(&self) -> bool {
		self.flags.contains(NodeFlags::IS_CONTENT_QUERY_HOST)
	}

	/// Returns `true` if the node must not be inserted into the tree.
	pub fn is_detached(&self) -> bool {
		self.flags.contains(NodeFlags::IS_DETACHED)
	}

	/// Returns `true` if the node opts its subtree out of hydration.
	pub fn is_skip_hydration_root(&self) -> bool {
		self.flags.contains(NodeFlags::IS_SKIP_HYDRATION_ROOT)
	}

	/// Returns the attribute set used for matching: merged if resolved, own otherwise.
	pub fn effective_attrs(&self) -> Option<&StaticAttrs> {
		self.merged_attrs.as_ref().or(self.attrs.as_ref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_new_descriptor_is_unlinked() {
		let descriptor = NodeDescriptor::new(4, NodeKind::ELEMENT, Some("div".to_string()), None);

		assert_eq!(descriptor.index, 4);
		assert_eq!(descriptor.parent, None);
		assert_eq!(descriptor.child, None);
		assert_eq!(descriptor.next, None);
		assert_eq!(descriptor.prev, None);
		assert!(!descriptor.is_directive_host());
		assert!(!descriptor.is_detached());
	}

	#[rstest]
	fn test_effective_attrs_prefers_merged() {
		let mut descriptor = NodeDescriptor::new(
			0,
			NodeKind::ELEMENT,
			Some("a".to_string()),
			Some(StaticAttrs::new().attr("href", "/")),
		);

		assert_eq!(descriptor.effective_attrs().unwrap().get("href"), Some("/"));

		descriptor.merged_attrs = Some(StaticAttrs::new().attr("href", "/x"));

		assert_eq!(descriptor.effective_attrs().unwrap().get("href"), Some("/x"));
	}
}
