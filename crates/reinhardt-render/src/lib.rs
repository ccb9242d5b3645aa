//! Reinhardt Render - view instruction execution and hydration
//!
//! Executes compiled view templates as a stream of instructions and builds
//! the corresponding node tree, either by creating nodes or by reclaiming
//! the nodes of a server-rendered page.
//!
//! ## Architecture
//!
//! - [`Template`]: per-template metadata (node descriptors, constants,
//!   directives, queries, hooks), built on the first creation pass and
//!   shared by every instance
//! - [`InstanceData`]: per-instantiation cell array holding concrete nodes
//!   and bindings
//! - [`RenderContext`]: one render pass; exposes the view instructions
//!   (`element_start`, `element_container_start`, `text`, `container`, ...)
//! - [`hydration`]: the annotation format and the [`NodeResolver`]
//!   strategies (`AlwaysCreate`, `HydrationAware`)
//! - [`renderer`]: the [`Renderer`] trait and the in-memory [`MemoryDocument`]
//! - [`RenderEngine`]: creates instances, drives passes and toggles hydration
//!
//! ## Example
//!
//! ```
//! use reinhardt_render::{
//! 	MemoryDocument, RenderEngine, RenderOptions, RendererRef, SerializedView, Template,
//! };
//!
//! let template = Template::new(1, 0, |ctx| {
//! 	ctx.element(0, "div", None, None)?;
//! 	Ok(())
//! })
//! .into_ref();
//!
//! // A page rendered on the server.
//! let document = MemoryDocument::new().into_shared();
//! let (host, div) = {
//! 	use reinhardt_render::Renderer;
//! 	let mut doc = document.borrow_mut();
//! 	let host = doc.create_element("app-root", None);
//! 	let div = doc.create_element("div", None);
//! 	doc.append_child(host, div).unwrap();
//! 	(host, div)
//! };
//!
//! let mut engine = RenderEngine::new(RenderOptions::new());
//! engine.enable_hydration();
//! let renderer: RendererRef = document.clone();
//! let mut instance = engine
//! 	.hydrate_instance(&template, renderer, host, SerializedView::new())
//! 	.unwrap();
//! engine.render(&mut instance).unwrap();
//!
//! assert_eq!(instance.native(0), Some(div));
//! ```

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod context;
pub mod cursor;
pub mod descriptor;
pub mod diagnostics;
pub mod directives;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod hydration;
pub mod instance;
mod instructions;
pub mod node_kind;
pub mod queries;
pub mod renderer;
pub mod styling;
pub mod template;

pub use collaborators::{Collaborators, DefaultCollaborators};
pub use config::{ANNOTATION_ATTR, RenderOptions, SKIP_HYDRATION_ATTR};
pub use constants::{Attr, ConstantTable, LocalRef, StaticAttrs};
pub use context::RenderContext;
pub use cursor::TraversalCursor;
pub use descriptor::{NodeDescriptor, SlotIndex};
pub use diagnostics::{DevCounters, Diagnostics};
pub use directives::{Directive, DirectiveDef, LifecycleHooks};
pub use engine::RenderEngine;
pub use error::{RenderError, RenderResult};
pub use hydration::{
	AlwaysCreate, HydrationAware, HydrationInfo, NodeRequest, NodeResolver, Resolution,
	SerializedContainerView, SerializedView,
};
pub use instance::{BindingValue, HEADER_OFFSET, InstanceData, LocalRefValue};
pub use node_kind::{NodeFlags, NodeKind};
pub use queries::QueryDef;
pub use renderer::{MemoryDocument, Namespace, NodeId, Renderer, RendererRef};
pub use template::{Template, TemplateRef};
