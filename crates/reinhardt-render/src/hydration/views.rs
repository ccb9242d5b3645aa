//! Locating dehydrated views in the server-rendered tree.

use crate::error::RenderResult;
use crate::renderer::{NodeId, Renderer};

use super::annotation::SerializedContainerView;
use super::info::DehydratedView;

/// Walks `n` next-sibling steps from `from`.
pub fn sibling_after(renderer: &dyn Renderer, n: usize, from: Option<NodeId>) -> Option<NodeId> {
	let mut current = from;
	for _ in 0..n {
		current = renderer.next_sibling(current?);
	}
	current
}

/// Detaches the server-rendered root nodes of a view that no client view
/// claimed.
pub fn remove_dehydrated_view(
	renderer: &mut dyn Renderer,
	view: &DehydratedView,
) -> RenderResult<()> {
	let mut node = view.first_child;
	for _ in 0..view.data.root_nodes {
		let Some(current) = node else {
			break;
		};
		node = renderer.next_sibling(current);
		if let Some(parent) = renderer.parent(current) {
			renderer.remove_child(parent, current)?;
		}
	}
	Ok(())
}

/// Splits the nodes starting at `start` into the views recorded for a
/// container.
///
/// Returns the node following the last view together with the views, in
/// document order. Entries with a multiplier expand to that many views.
pub fn locate_dehydrated_views(
	renderer: &dyn Renderer,
	start: Option<NodeId>,
	serialized: &[SerializedContainerView],
) -> (Option<NodeId>, Vec<DehydratedView>) {
	let mut current = start;
	let mut views = Vec::new();
	for entry in serialized {
		for _ in 0..entry.repeat() {
			views.push(DehydratedView {
				data: entry.clone(),
				first_child: if entry.root_nodes > 0 { current } else { None },
			});
			current = sibling_after(renderer, entry.root_nodes, current);
		}
	}
	(current, views)
}
