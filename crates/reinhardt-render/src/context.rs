//! State of one render pass.

use crate::collaborators::Collaborators;
use crate::config::RenderOptions;
use crate::cursor::TraversalCursor;
use crate::descriptor::SlotIndex;
use crate::diagnostics::Diagnostics;
use crate::error::{RenderError, RenderResult};
use crate::hydration::{NodeRequest, NodeResolver, Resolution};
use crate::instance::InstanceData;
use crate::renderer::RendererRef;
use crate::template::Template;

/// Everything an instruction needs while one instance is being rendered.
///
/// Created by [`RenderEngine::render`](crate::RenderEngine::render) and
/// handed to the template's render function. The traversal cursor lives
/// here, so two passes never share traversal state.
pub struct RenderContext<'a> {
	pub(crate) template: &'a mut Template,
	pub(crate) instance: &'a mut InstanceData,
	pub(crate) cursor: TraversalCursor,
	pub(crate) resolver: &'a dyn NodeResolver,
	pub(crate) collaborators: &'a dyn Collaborators,
	pub(crate) diagnostics: &'a Diagnostics,
	pub(crate) options: &'a RenderOptions,
	pub(crate) renderer: RendererRef,
}

impl std::fmt::Debug for RenderContext<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderContext")
			.field("template", &self.template.id())
			.field("instance", &self.instance.id())
			.field("cursor", &self.cursor)
			.field("resolver", &self.resolver.name())
			.finish_non_exhaustive()
	}
}

impl<'a> RenderContext<'a> {
	pub(crate) fn new(
		template: &'a mut Template,
		instance: &'a mut InstanceData,
		resolver: &'a dyn NodeResolver,
		collaborators: &'a dyn Collaborators,
		diagnostics: &'a Diagnostics,
		options: &'a RenderOptions,
	) -> Self {
		let renderer = instance.renderer().clone();
		let cursor = TraversalCursor::new(template.binding_start_index());
		Self {
			template,
			instance,
			cursor,
			resolver,
			collaborators,
			diagnostics,
			options,
			renderer,
		}
	}

	/// Template being rendered.
	pub fn template(&self) -> &Template {
		&*self.template
	}

	/// Instance being rendered.
	pub fn instance(&self) -> &InstanceData {
		&*self.instance
	}

	/// Instance being rendered, mutably.
	pub fn instance_mut(&mut self) -> &mut InstanceData {
		&mut *self.instance
	}

	/// Traversal state.
	pub fn cursor(&self) -> &TraversalCursor {
		&self.cursor
	}

	/// Diagnostics layer of the engine.
	pub fn diagnostics(&self) -> &Diagnostics {
		self.diagnostics
	}

	/// Engine options.
	pub fn options(&self) -> &RenderOptions {
		self.options
	}

	/// Renderer of the instance.
	pub fn renderer(&self) -> &RendererRef {
		&self.renderer
	}

	/// Resolves the concrete node of `slot` through the engine's strategy.
	pub fn resolve_node(
		&mut self,
		slot: SlotIndex,
		request: NodeRequest<'_>,
	) -> RenderResult<Resolution> {
		let resolver = self.resolver;
		resolver.resolve(self, slot, request)
	}

	/// Verifies that every structural node was closed.
	pub(crate) fn finish(&self) -> RenderResult<()> {
		let depth = self.cursor.element_depth();
		self.diagnostics
			.check(depth == 0, || RenderError::UnclosedNodes { depth })
	}
}
