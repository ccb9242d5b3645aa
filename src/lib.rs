//! # Reinhardt
//!
//! Facade crate for the Reinhardt frontend rendering stack.
//!
//! ## Feature Flags
//!
//! - `render` (default) - view instruction execution and hydration, re-exported
//!   as [`render`]
//!
//! ## Example
//!
//! ```
//! # #[cfg(feature = "render")]
//! # {
//! use reinhardt::render::{MemoryDocument, RenderEngine, RenderOptions, RendererRef, Template};
//!
//! let template = Template::new(1, 0, |ctx| {
//! 	ctx.text(0, "hello")?;
//! 	Ok(())
//! })
//! .into_ref();
//! let renderer: RendererRef = MemoryDocument::new().into_shared();
//! let engine = RenderEngine::new(RenderOptions::new());
//! let mut instance = engine.create_instance(&template, renderer, None).unwrap();
//! engine.render(&mut instance).unwrap();
//! # }
//! ```

#[cfg(feature = "render")]
pub use reinhardt_render as render;

#[cfg(feature = "render")]
pub use reinhardt_render::{RenderEngine, RenderError, RenderOptions, RenderResult};
