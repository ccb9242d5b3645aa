//! Reuse of server-rendered nodes.
//!
//! The server renderer annotates each hydratable view with a compact
//! [`SerializedView`]. On the client, [`HydrationAware`] walks that
//! annotation alongside the instruction stream and claims existing nodes
//! instead of creating new ones.

mod annotation;
mod info;
mod lookup;
mod resolver;
mod views;

pub use annotation::{
	NodePath, PathReference, PathStep, SerializedContainerView, SerializedView,
};
pub use info::{DehydratedView, HydrationInfo, retrieve_hydration_info};
pub use lookup::{locate_next_native_node, navigate};
pub use resolver::{AlwaysCreate, HydrationAware, NodeRequest, NodeResolver, Resolution, create_node};
pub use views::{locate_dehydrated_views, remove_dehydrated_view, sibling_after};
