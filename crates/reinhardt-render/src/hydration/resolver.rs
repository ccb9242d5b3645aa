//! Node resolution strategies.
//!
//! Every structural instruction obtains its concrete node through a
//! [`NodeResolver`]. [`AlwaysCreate`] allocates a fresh node each time;
//! [`HydrationAware`] first tries to claim the matching node of a
//! server-rendered tree and falls back to creation when it cannot.

use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::diagnostics::Counter;
use crate::error::{RenderError, RenderResult};
use crate::node_kind::NodeKind;
use crate::renderer::{NativeNodeType, Namespace, NodeId};

use super::lookup::locate_next_native_node;
use super::views::{locate_dehydrated_views, sibling_after};

/// Outcome of resolving a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
	/// `true` if the node was allocated by this call.
	pub created: bool,
	/// The concrete node.
	pub node: NodeId,
}

impl Resolution {
	/// A freshly allocated node.
	pub fn created(node: NodeId) -> Self {
		Self {
			created: true,
			node,
		}
	}

	/// A node reused from an earlier render.
	pub fn located(node: NodeId) -> Self {
		Self {
			created: false,
			node,
		}
	}
}

/// What an instruction needs a node for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRequest<'r> {
	/// A native element.
	Element {
		/// Tag name.
		name: &'r str,
		/// Creation namespace.
		namespace: Option<Namespace>,
	},
	/// The anchor of an element container.
	ElementContainer,
	/// A text node.
	Text {
		/// Initial text.
		value: &'r str,
	},
	/// The anchor of a view container.
	ContainerAnchor,
}

impl NodeRequest<'_> {
	/// Node kind of the requesting slot.
	pub fn kind(&self) -> NodeKind {
		match self {
			Self::Element { .. } => NodeKind::ELEMENT,
			Self::ElementContainer => NodeKind::ELEMENT_CONTAINER,
			Self::Text { .. } => NodeKind::TEXT,
			Self::ContainerAnchor => NodeKind::CONTAINER,
		}
	}

	fn expected(&self) -> String {
		match self {
			Self::Element { name, .. } => format!("<{name}>"),
			Self::Text { .. } => NativeNodeType::Text.generic_name().to_string(),
			Self::ElementContainer | Self::ContainerAnchor => {
				NativeNodeType::Comment.generic_name().to_string()
			}
		}
	}
}

/// Strategy that produces the concrete node of a slot.
pub trait NodeResolver {
	/// Short name used in logs.
	fn name(&self) -> &'static str;

	/// Returns the node for `slot`, reporting whether it was newly created.
	fn resolve(
		&self,
		ctx: &mut RenderContext<'_>,
		slot: SlotIndex,
		request: NodeRequest<'_>,
	) -> RenderResult<Resolution>;
}

/// Creates every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCreate;

impl NodeResolver for AlwaysCreate {
	fn name(&self) -> &'static str {
		"always-create"
	}

	fn resolve(
		&self,
		ctx: &mut RenderContext<'_>,
		_slot: SlotIndex,
		request: NodeRequest<'_>,
	) -> RenderResult<Resolution> {
		Ok(Resolution::created(create_node(ctx, &request)))
	}
}

/// Claims server-rendered nodes where the annotation allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydrationAware;

impl NodeResolver for HydrationAware {
	fn name(&self) -> &'static str {
		"hydration-aware"
	}

	fn resolve(
		&self,
		ctx: &mut RenderContext<'_>,
		slot: SlotIndex,
		request: NodeRequest<'_>,
	) -> RenderResult<Resolution> {
		if let Some(node) = ctx.instance.hydration().and_then(|info| info.resolved(slot)) {
			tracing::trace!(slot, node = %node, "slot already resolved");
			return Ok(Resolution::located(node));
		}
		if !can_hydrate(ctx, slot, request.kind()) {
			return Ok(Resolution::created(create_node(ctx, &request)));
		}
		let Some(located) = locate_next_native_node(ctx, slot)? else {
			return fallback(ctx, slot, &request);
		};

		let node = match request {
			NodeRequest::Element { .. } => {
				validate_matching_node(ctx, slot, &request, Some(located))?;
				locate_element_extras(ctx, slot, located)?;
				located
			}
			NodeRequest::Text { .. } => {
				validate_matching_node(ctx, slot, &request, Some(located))?;
				located
			}
			NodeRequest::ElementContainer => {
				let Some(anchor) = locate_element_container_anchor(ctx, slot, located) else {
					return fallback(ctx, slot, &request);
				};
				validate_matching_node(ctx, slot, &request, Some(anchor))?;
				anchor
			}
			NodeRequest::ContainerAnchor => {
				let Some(anchor) = locate_container_anchor(ctx, slot, located) else {
					return fallback(ctx, slot, &request);
				};
				validate_matching_node(ctx, slot, &request, Some(anchor))?;
				anchor
			}
		};
		claim(ctx, slot, node)?;
		tracing::trace!(slot, node = %node, "claimed server-rendered node");
		Ok(Resolution::located(node))
	}
}

fn can_hydrate(ctx: &RenderContext<'_>, slot: SlotIndex, kind: NodeKind) -> bool {
	let Some(info) = ctx.instance.hydration() else {
		return false;
	};
	if ctx.cursor.in_skip_hydration() || info.is_disconnected(slot, kind) {
		return false;
	}
	// Children of a created node have no server-rendered counterpart.
	ctx.template
		.descriptor(slot)
		.ok()
		.and_then(|descriptor| descriptor.parent)
		.is_none_or(|parent| info.resolved(parent).is_some())
}

/// Allocates a fresh node for `request`.
///
/// Anchors of logical containers get a descriptive comment text only when
/// diagnostics are enabled.
pub fn create_node(ctx: &RenderContext<'_>, request: &NodeRequest<'_>) -> NodeId {
	let diagnostics = ctx.diagnostics;
	let mut renderer = ctx.renderer.borrow_mut();
	match request {
		NodeRequest::Element { name, namespace } => {
			diagnostics.record(Counter::ElementCreated);
			renderer.create_element(name, *namespace)
		}
		NodeRequest::Text { value } => {
			diagnostics.record(Counter::TextCreated);
			renderer.create_text(value)
		}
		NodeRequest::ElementContainer => {
			diagnostics.record(Counter::CommentCreated);
			renderer.create_comment(if diagnostics.enabled() { "element-container" } else { "" })
		}
		NodeRequest::ContainerAnchor => {
			diagnostics.record(Counter::CommentCreated);
			renderer.create_comment(if diagnostics.enabled() { "container" } else { "" })
		}
	}
}

fn fallback(
	ctx: &RenderContext<'_>,
	slot: SlotIndex,
	request: &NodeRequest<'_>,
) -> RenderResult<Resolution> {
	ctx.diagnostics
		.check(false, || RenderError::MissingHydrationNode { slot })?;
	tracing::debug!(slot, kind = %request.kind(), "server-rendered node not found, creating");
	Ok(Resolution::created(create_node(ctx, request)))
}

fn validate_matching_node(
	ctx: &RenderContext<'_>,
	slot: SlotIndex,
	request: &NodeRequest<'_>,
	node: Option<NodeId>,
) -> RenderResult<()> {
	if !ctx.diagnostics.enabled() {
		return Ok(());
	}
	let renderer = ctx.renderer.borrow();
	let node_type = node.and_then(|node| renderer.node_type(node));
	let matches = match (request, node_type) {
		(NodeRequest::Element { name, .. }, Some(NativeNodeType::Element)) => node
			.and_then(|node| renderer.tag_name(node))
			.is_some_and(|tag| tag.eq_ignore_ascii_case(name)),
		(NodeRequest::Text { .. }, Some(NativeNodeType::Text)) => true,
		(
			NodeRequest::ElementContainer | NodeRequest::ContainerAnchor,
			Some(NativeNodeType::Comment),
		) => true,
		_ => false,
	};
	if matches {
		return Ok(());
	}
	let actual = match (node, node_type) {
		(Some(node), Some(NativeNodeType::Element)) => {
			format!("<{}>", renderer.tag_name(node).unwrap_or_default())
		}
		(_, Some(other)) => other.generic_name().to_string(),
		_ => "nothing".to_string(),
	};
	Err(RenderError::HydrationMismatch {
		slot,
		expected: request.expected(),
		actual,
	})
}

fn claim(ctx: &mut RenderContext<'_>, slot: SlotIndex, node: NodeId) -> RenderResult<()> {
	let diagnostics = ctx.diagnostics;
	let Some(info) = ctx.instance.hydration_mut() else {
		return Ok(());
	};
	match info.claim(slot, node) {
		Ok(()) => {
			diagnostics.record(Counter::NodeClaimed);
			Ok(())
		}
		Err(claimed_by) => diagnostics.check(false, || RenderError::NodeAlreadyClaimed {
			node,
			claimed_by,
		}),
	}
}

/// Element-specific work after locating: skip-hydration entry and views
/// anchored on the element.
fn locate_element_extras(
	ctx: &mut RenderContext<'_>,
	slot: SlotIndex,
	node: NodeId,
) -> RenderResult<()> {
	if ctx.template.descriptor(slot)?.is_skip_hydration_root() {
		ctx.cursor.enter_skip_hydration(slot);
		let mut renderer = ctx.renderer.borrow_mut();
		while let Some(child) = renderer.first_child(node) {
			renderer.remove_child(node, child)?;
		}
		tracing::debug!(slot, node = %node, "entered skip-hydration region");
	}

	let Some(serialized) = ctx
		.instance
		.hydration()
		.and_then(|info| info.data().containers.get(&slot))
		.cloned()
	else {
		return Ok(());
	};
	let renderer = ctx.renderer.borrow();
	let head = renderer.next_sibling(node);
	let (_, views) = locate_dehydrated_views(&*renderer, head, &serialized);
	drop(renderer);
	if let Some(info) = ctx.instance.hydration_mut() {
		if let Some(head) = head {
			info.set_segment_head(slot, head);
		}
		info.stash_views(slot, views);
	}
	Ok(())
}

/// Records the segment head of an element container and returns its anchor,
/// which follows the container's content and any views rendered into it.
fn locate_element_container_anchor(
	ctx: &mut RenderContext<'_>,
	slot: SlotIndex,
	head: NodeId,
) -> Option<NodeId> {
	let renderer = ctx.renderer.borrow();
	let info = ctx.instance.hydration()?;
	let size = info.data().element_containers.get(&slot).copied().unwrap_or(0);
	let mut anchor = sibling_after(&*renderer, size, Some(head));
	let mut views = Vec::new();
	if let Some(serialized) = info.data().containers.get(&slot) {
		(anchor, views) = locate_dehydrated_views(&*renderer, anchor, serialized);
	}
	drop(renderer);
	let info = ctx.instance.hydration_mut()?;
	info.set_segment_head(slot, head);
	info.stash_views(slot, views);
	anchor
}

/// Records the segment head of a view container and returns its anchor,
/// which follows the container's views.
fn locate_container_anchor(
	ctx: &mut RenderContext<'_>,
	slot: SlotIndex,
	head: NodeId,
) -> Option<NodeId> {
	let info = ctx.instance.hydration()?;
	let ssr_id = info.data().templates.get(&slot).cloned();
	let serialized = info.data().containers.get(&slot).cloned().unwrap_or_default();
	if let Some(id) = ssr_id {
		let embedded = ctx
			.template
			.descriptor(slot)
			.ok()
			.and_then(|descriptor| descriptor.embedded.clone());
		if let Some(embedded) = embedded {
			match embedded.borrow_mut() {
				Ok(mut template) => template.set_ssr_id(id),
				Err(err) => tracing::trace!(slot, %err, "embedded template id not recorded"),
			}
		}
	}
	let renderer = ctx.renderer.borrow();
	let (anchor, views) = locate_dehydrated_views(&*renderer, Some(head), &serialized);
	drop(renderer);
	let info = ctx.instance.hydration_mut()?;
	info.set_segment_head(slot, head);
	info.stash_views(slot, views);
	anchor
}
