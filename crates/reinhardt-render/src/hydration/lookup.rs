//! Finding the server-rendered node that corresponds to a slot.

use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::error::RenderResult;
use crate::node_kind::NodeKind;
use crate::renderer::NodeId;

use super::annotation::{NodePath, PathReference, PathStep};
use super::views::sibling_after;

/// Locates the server-rendered node for `slot`.
///
/// Lookup order: an explicit navigation path; the view's first node for
/// the template's first slot; the segment head of an enclosing element
/// container; the parent's first child; otherwise the node after the
/// previous sibling, skipping the views anchored on a previous element.
pub fn locate_next_native_node(
	ctx: &RenderContext<'_>,
	slot: SlotIndex,
) -> RenderResult<Option<NodeId>> {
	let Some(info) = ctx.instance.hydration() else {
		return Ok(None);
	};
	if let Some(path) = info.data().node_paths.get(&slot) {
		return navigate(ctx, path);
	}
	if ctx.template.first_child() == Some(slot) {
		return Ok(info.first_child());
	}

	let descriptor = ctx.template.descriptor(slot)?;
	let renderer = ctx.renderer.borrow();
	if let Some(prev) = descriptor.prev {
		let previous = ctx.template.descriptor(prev)?;
		if previous.kind.contains(NodeKind::ELEMENT) {
			if let Some(head) = info.segment_head(prev) {
				let size = info.data().container_size(prev);
				return Ok(sibling_after(&*renderer, size + 1, Some(head)));
			}
		}
		return Ok(ctx
			.instance
			.native(prev)
			.and_then(|node| renderer.next_sibling(node)));
	}

	let Some(parent) = descriptor.parent else {
		return Ok(None);
	};
	if ctx
		.template
		.descriptor(parent)?
		.kind
		.contains(NodeKind::ELEMENT_CONTAINER)
	{
		return Ok(info.segment_head(parent));
	}
	Ok(ctx
		.instance
		.native(parent)
		.and_then(|node| renderer.first_child(node)))
}

/// Follows a navigation path from its reference node.
///
/// Returns `Ok(None)` when the path leaves the tree.
pub fn navigate(ctx: &RenderContext<'_>, raw: &str) -> RenderResult<Option<NodeId>> {
	let path = NodePath::parse(raw)?;
	let renderer = ctx.renderer.borrow();
	let mut node = match path.reference {
		PathReference::Host => ctx.instance.host(),
		PathReference::Body => renderer.body(),
		PathReference::Slot(slot) => ctx.instance.native(slot),
	};
	for (step, count) in path.steps {
		for _ in 0..count {
			node = node.and_then(|current| match step {
				PathStep::FirstChild => renderer.first_child(current),
				PathStep::NextSibling => renderer.next_sibling(current),
			});
		}
	}
	tracing::trace!(path = raw, node = ?node, "navigated hydration path");
	Ok(node)
}
