//! The render engine.
//!
//! An engine owns the node resolution strategy and the diagnostics layer,
//! creates instances and drives their creation passes.

use std::cell::Cell;
use std::rc::Rc;

use crate::collaborators::{Collaborators, DefaultCollaborators};
use crate::config::RenderOptions;
use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::diagnostics::{Counter, Diagnostics};
use crate::error::{RenderError, RenderResult};
use crate::hooks::HookPhase;
use crate::hydration::{
	AlwaysCreate, HydrationAware, HydrationInfo, NodeResolver, SerializedView,
	remove_dehydrated_view, retrieve_hydration_info,
};
use crate::instance::{InstanceData, InstanceId};
use crate::renderer::{NodeId, RendererRef};
use crate::template::TemplateRef;

/// Executes templates against a renderer.
///
/// # Example
///
/// ```
/// use reinhardt_render::{MemoryDocument, RenderEngine, RenderOptions, RendererRef, Template};
///
/// let template = Template::new(1, 0, |ctx| {
/// 	ctx.element(0, "div", None, None)?;
/// 	Ok(())
/// })
/// .into_ref();
/// let renderer: RendererRef = MemoryDocument::new().into_shared();
/// let engine = RenderEngine::new(RenderOptions::new());
///
/// let mut instance = engine.create_instance(&template, renderer, None).unwrap();
/// engine.render(&mut instance).unwrap();
/// assert!(instance.native(0).is_some());
/// ```
pub struct RenderEngine {
	options: RenderOptions,
	resolver: Box<dyn NodeResolver>,
	collaborators: Box<dyn Collaborators>,
	diagnostics: Diagnostics,
	next_instance: Cell<InstanceId>,
}

impl std::fmt::Debug for RenderEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderEngine")
			.field("options", &self.options)
			.field("resolver", &self.resolver.name())
			.field("diagnostics", &self.diagnostics)
			.finish_non_exhaustive()
	}
}

impl Default for RenderEngine {
	fn default() -> Self {
		Self::new(RenderOptions::default())
	}
}

impl RenderEngine {
	/// Creates an engine. Hydration-aware resolution is active from the
	/// start when [`RenderOptions::hydration`] is set.
	pub fn new(options: RenderOptions) -> Self {
		let resolver: Box<dyn NodeResolver> = if options.hydration {
			Box::new(HydrationAware)
		} else {
			Box::new(AlwaysCreate)
		};
		Self {
			diagnostics: Diagnostics::new(options.diagnostics),
			options,
			resolver,
			collaborators: Box::new(DefaultCollaborators),
			next_instance: Cell::new(1),
		}
	}

	/// Replaces the directive, styling, query and hook collaborators.
	pub fn with_collaborators(mut self, collaborators: impl Collaborators + 'static) -> Self {
		self.collaborators = Box::new(collaborators);
		self
	}

	/// Engine options.
	pub fn options(&self) -> &RenderOptions {
		&self.options
	}

	/// Diagnostics layer, including the dev counters.
	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Name of the active resolution strategy.
	pub fn resolver_name(&self) -> &'static str {
		self.resolver.name()
	}

	/// Switches node resolution from always-create to hydration-aware.
	///
	/// Meant to be called once at bootstrap; later calls do nothing.
	pub fn enable_hydration(&mut self) {
		if self.options.hydration {
			return;
		}
		self.options.hydration = true;
		self.resolver = Box::new(HydrationAware);
		tracing::info!("hydration support enabled");
	}

	/// Whether hydration-aware resolution is active.
	pub fn hydration_enabled(&self) -> bool {
		self.options.hydration
	}

	fn next_id(&self) -> InstanceId {
		let id = self.next_instance.get();
		self.next_instance.set(id + 1);
		id
	}

	/// Creates an instance that renders into `host`.
	pub fn create_instance(
		&self,
		template: &TemplateRef,
		renderer: RendererRef,
		host: Option<NodeId>,
	) -> RenderResult<InstanceData> {
		InstanceData::new(self.next_id(), template.clone(), renderer, host, None)
	}

	/// Creates an instance that claims the server-rendered children of `host`
	/// described by `view`.
	pub fn hydrate_instance(
		&self,
		template: &TemplateRef,
		renderer: RendererRef,
		host: NodeId,
		view: SerializedView,
	) -> RenderResult<InstanceData> {
		let first_child = renderer.borrow().first_child(host);
		let info = HydrationInfo::new(view, first_child);
		InstanceData::new(self.next_id(), template.clone(), renderer, Some(host), Some(info))
	}

	/// Creates an instance for `host`, hydrating it when hydration is enabled
	/// and the host references one of `annotations`.
	pub fn instantiate_on_host(
		&self,
		template: &TemplateRef,
		renderer: RendererRef,
		host: NodeId,
		annotations: &[SerializedView],
	) -> RenderResult<InstanceData> {
		let info = if self.hydration_enabled() {
			retrieve_hydration_info(&renderer, host, annotations, &self.options)?
		} else {
			None
		};
		InstanceData::new(self.next_id(), template.clone(), renderer, Some(host), info)
	}

	/// Runs the creation pass of an instance.
	///
	/// The first successful pass of a template completes its metadata; init
	/// and after-init hooks run once the pass returns.
	pub fn render(&self, instance: &mut InstanceData) -> RenderResult<()> {
		if instance.is_destroyed() {
			return Err(RenderError::InstanceDestroyed(instance.id()));
		}
		if instance.is_rendered() {
			return Err(RenderError::AlreadyRendered(instance.id()));
		}
		let template_ref = instance.template().clone();
		let mut template = template_ref.borrow_mut()?;
		let render = template.render_fn();
		let result = {
			let mut ctx = RenderContext::new(
				&mut template,
				instance,
				self.resolver.as_ref(),
				self.collaborators.as_ref(),
				&self.diagnostics,
				&self.options,
			);
			render(&mut ctx).and_then(|()| ctx.finish())
		};
		if let Err(error) = result {
			if template.first_create_pass() {
				template.discard_incomplete_first_pass();
				tracing::debug!(
					template = template.id(),
					%error,
					"first creation pass failed, metadata discarded"
				);
			}
			return Err(error);
		}

		if template.first_create_pass() {
			template.complete_first_pass();
			self.diagnostics.record(Counter::FirstPassCompleted);
			tracing::debug!(
				template = template.id(),
				descriptors = template.descriptor_count(),
				"first creation pass completed"
			);
		}
		instance.mark_rendered();
		for phase in [HookPhase::Init, HookPhase::AfterContentInit, HookPhase::AfterViewInit] {
			template.hooks().run(phase, instance);
		}
		Ok(())
	}

	/// Creates and renders a view of the template embedded at
	/// `container_slot`, inserting its root nodes before the container's
	/// anchor.
	///
	/// A matching dehydrated view left by the server is claimed instead of
	/// creating new nodes.
	pub fn create_embedded_view(
		&self,
		parent: &mut InstanceData,
		container_slot: SlotIndex,
	) -> RenderResult<InstanceData> {
		if parent.is_destroyed() {
			return Err(RenderError::InstanceDestroyed(parent.id()));
		}
		let embedded = parent
			.template()
			.borrow()?
			.descriptor(container_slot)?
			.embedded
			.clone()
			.ok_or(RenderError::MissingEmbeddedTemplate {
				slot: container_slot,
			})?;
		let ssr_id = embedded.borrow()?.ssr_id().map(str::to_string);
		let renderer = Rc::clone(parent.renderer());
		let mut hydration = None;
		if self.hydration_enabled() {
			if let Some(info) = parent.hydration_mut() {
				match info.take_matching_view(container_slot, ssr_id.as_deref()) {
					Some(view) => hydration = Some(view.into_hydration_info()),
					None => {
						let stale = info.take_dehydrated_views(container_slot);
						let mut renderer = renderer.borrow_mut();
						for view in &stale {
							remove_dehydrated_view(&mut *renderer, view)?;
						}
						if !stale.is_empty() {
							tracing::debug!(
								slot = container_slot,
								removed = stale.len(),
								"dehydrated views do not match the embedded template"
							);
						}
					}
				}
			}
		}
		let mut view = InstanceData::new(
			self.next_id(),
			embedded,
			Rc::clone(&renderer),
			None,
			hydration,
		)?;
		self.render(&mut view)?;

		if let Some(anchor) = parent.native(container_slot) {
			let mut renderer = renderer.borrow_mut();
			if let Some(target) = renderer.parent(anchor) {
				for node in view.root_nodes()? {
					if renderer.parent(node).is_none() {
						renderer.insert_before(target, node, Some(anchor))?;
					}
				}
			}
		}
		Ok(view)
	}

	/// Removes server-rendered views that no client view claimed, returning
	/// how many were removed.
	pub fn cleanup_dehydrated_views(&self, instance: &mut InstanceData) -> RenderResult<usize> {
		let Some(info) = instance.hydration_mut() else {
			return Ok(0);
		};
		let views = info.drain_dehydrated_views();
		let renderer = Rc::clone(instance.renderer());
		let mut renderer = renderer.borrow_mut();
		for (slot, view) in &views {
			remove_dehydrated_view(&mut *renderer, view)?;
			tracing::debug!(slot, template = view.template_id(), "removed dehydrated view");
		}
		Ok(views.len())
	}

	/// Tears an instance down: runs destroy hooks and removes its root nodes.
	///
	/// Destroying twice is a no-op.
	pub fn destroy(&self, instance: &mut InstanceData) -> RenderResult<()> {
		if instance.is_destroyed() {
			return Ok(());
		}
		let template_ref = instance.template().clone();
		let template = template_ref.borrow()?;
		template.hooks().run(HookPhase::Destroy, instance);
		let nodes = instance.root_nodes()?;
		let mut renderer = instance.renderer().borrow_mut();
		for node in nodes {
			if let Some(parent) = renderer.parent(node) {
				renderer.remove_child(parent, node)?;
			}
		}
		drop(renderer);
		instance.mark_destroyed();
		tracing::debug!(instance = instance.id(), "instance destroyed");
		Ok(())
	}
}
