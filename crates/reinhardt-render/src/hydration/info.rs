//! Per-instance hydration state.

use std::collections::HashMap;

use crate::config::RenderOptions;
use crate::descriptor::SlotIndex;
use crate::error::{RenderError, RenderResult};
use crate::node_kind::NodeKind;
use crate::renderer::{NodeId, RendererRef};

use super::annotation::{SerializedContainerView, SerializedView};

/// A server-rendered view not yet claimed by a client view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DehydratedView {
	/// Annotation entry of the view.
	pub data: SerializedContainerView,
	/// First root node of the view in the server-rendered tree.
	pub first_child: Option<NodeId>,
}

impl DehydratedView {
	/// Id of the template the server created the view from.
	pub fn template_id(&self) -> &str {
		&self.data.template
	}

	/// Builds the hydration state a client view uses to claim this view's nodes.
	pub fn into_hydration_info(self) -> HydrationInfo {
		HydrationInfo::new(self.data.view, self.first_child)
	}
}

/// Annotation of one instance plus the state of its consumption.
#[derive(Debug, Clone, Default)]
pub struct HydrationInfo {
	data: SerializedView,
	first_child: Option<NodeId>,
	segment_heads: HashMap<SlotIndex, NodeId>,
	claimed: HashMap<NodeId, SlotIndex>,
	resolved: HashMap<SlotIndex, NodeId>,
	dehydrated_views: HashMap<SlotIndex, Vec<DehydratedView>>,
}

impl HydrationInfo {
	/// Creates hydration state for a view whose first root node is `first_child`.
	pub fn new(data: SerializedView, first_child: Option<NodeId>) -> Self {
		Self {
			data,
			first_child,
			..Self::default()
		}
	}

	/// The annotation.
	pub fn data(&self) -> &SerializedView {
		&self.data
	}

	/// First root node of the view.
	pub fn first_child(&self) -> Option<NodeId> {
		self.first_child
	}

	/// Returns `true` if a node of `kind` at `slot` cannot be located and must be created.
	pub fn is_disconnected(&self, slot: SlotIndex, kind: NodeKind) -> bool {
		if self.data.is_disconnected(slot) {
			return true;
		}
		if kind.contains(NodeKind::ELEMENT_CONTAINER) {
			return !self.data.element_containers.contains_key(&slot);
		}
		if kind.contains(NodeKind::CONTAINER) {
			return !self.data.containers.contains_key(&slot);
		}
		false
	}

	/// First node of the content of a logical container, or of the views
	/// following an element anchor.
	pub fn segment_head(&self, slot: SlotIndex) -> Option<NodeId> {
		self.segment_heads.get(&slot).copied()
	}

	pub(crate) fn set_segment_head(&mut self, slot: SlotIndex, node: NodeId) {
		self.segment_heads.insert(slot, node);
	}

	/// Node already resolved for `slot`.
	pub fn resolved(&self, slot: SlotIndex) -> Option<NodeId> {
		self.resolved.get(&slot).copied()
	}

	/// Records `node` as claimed by `slot`.
	///
	/// Claiming again from the same slot is a no-op; a claim from another
	/// slot is refused with the slot that holds the node.
	pub fn claim(&mut self, slot: SlotIndex, node: NodeId) -> Result<(), SlotIndex> {
		match self.claimed.get(&node) {
			Some(&owner) if owner != slot => Err(owner),
			Some(_) => Ok(()),
			None => {
				self.claimed.insert(node, slot);
				self.resolved.insert(slot, node);
				Ok(())
			}
		}
	}

	/// Returns `true` if `node` was claimed.
	pub fn is_claimed(&self, node: NodeId) -> bool {
		self.claimed.contains_key(&node)
	}

	/// Slot that claimed `node`.
	pub fn claimant(&self, node: NodeId) -> Option<SlotIndex> {
		self.claimed.get(&node).copied()
	}

	/// Number of claimed nodes.
	pub fn claimed_count(&self) -> usize {
		self.claimed.len()
	}

	pub(crate) fn stash_views(&mut self, slot: SlotIndex, views: Vec<DehydratedView>) {
		if !views.is_empty() {
			self.dehydrated_views.insert(slot, views);
		}
	}

	/// Dehydrated views stashed for a container slot.
	pub fn dehydrated_views(&self, slot: SlotIndex) -> &[DehydratedView] {
		self.dehydrated_views
			.get(&slot)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	/// Removes and returns every view stashed for `slot`.
	pub fn take_dehydrated_views(&mut self, slot: SlotIndex) -> Vec<DehydratedView> {
		self.dehydrated_views.remove(&slot).unwrap_or_default()
	}

	/// Removes and returns the head view stashed for `slot` if it was created
	/// from the template with id `template_id`.
	///
	/// Views are claimed in document order only. A head view from another
	/// template is not claimed and stays stashed; see
	/// [`RenderEngine::create_embedded_view`](crate::RenderEngine::create_embedded_view)
	/// for how the rest of the stash is dropped.
	pub fn take_matching_view(
		&mut self,
		slot: SlotIndex,
		template_id: Option<&str>,
	) -> Option<DehydratedView> {
		let template_id = template_id?;
		let views = self.dehydrated_views.get_mut(&slot)?;
		if views.first()?.template_id() != template_id {
			return None;
		}
		let view = views.remove(0);
		if views.is_empty() {
			self.dehydrated_views.remove(&slot);
		}
		Some(view)
	}

	/// Removes every stashed view, in slot order.
	pub fn drain_dehydrated_views(&mut self) -> Vec<(SlotIndex, DehydratedView)> {
		let mut slots: Vec<SlotIndex> = self.dehydrated_views.keys().copied().collect();
		slots.sort_unstable();
		slots
			.into_iter()
			.flat_map(|slot| {
				self.dehydrated_views
					.remove(&slot)
					.unwrap_or_default()
					.into_iter()
					.map(move |view| (slot, view))
			})
			.collect()
	}
}

/// Looks up the annotation of a host element.
///
/// The host carries the index of its annotation in the transferred list
/// under [`RenderOptions::annotation_attr`]; the attribute is removed once
/// read. Hosts without the attribute, or marked to skip hydration, are not
/// hydrated.
pub fn retrieve_hydration_info(
	renderer: &RendererRef,
	host: NodeId,
	annotations: &[SerializedView],
	options: &RenderOptions,
) -> RenderResult<Option<HydrationInfo>> {
	let (raw, skip) = {
		let renderer = renderer.borrow();
		(
			renderer.get_attribute(host, &options.annotation_attr),
			renderer
				.get_attribute(host, &options.skip_hydration_attr)
				.is_some(),
		)
	};
	let Some(raw) = raw else {
		return Ok(None);
	};
	if skip {
		renderer
			.borrow_mut()
			.remove_attribute(host, &options.annotation_attr)?;
		tracing::debug!(host = %host, "host opts out of hydration");
		return Ok(None);
	}
	let index: usize = raw
		.trim()
		.parse()
		.map_err(|_| RenderError::InvalidAnnotationIndex(raw.clone()))?;
	let data = annotations
		.get(index)
		.cloned()
		.ok_or(RenderError::AnnotationIndexOutOfRange {
			index,
			len: annotations.len(),
		})?;
	let mut renderer = renderer.borrow_mut();
	renderer.remove_attribute(host, &options.annotation_attr)?;
	Ok(Some(HydrationInfo::new(data, renderer.first_child(host))))
}
