//! Seam between the instruction dispatcher and the directive, styling,
//! query and hook machinery.

use crate::constants::LocalRef;
use crate::descriptor::{NodeDescriptor, SlotIndex};
use crate::error::RenderResult;
use crate::instance::InstanceData;
use crate::template::Template;
use crate::{directives, hooks, queries, styling};

/// Work the dispatcher delegates at fixed points of a node's lifecycle.
pub trait Collaborators {
	/// Matches directives against a new descriptor (first pass only).
	fn resolve_directives(
		&self,
		template: &mut Template,
		slot: SlotIndex,
		local_refs: Option<&[LocalRef]>,
	) -> RenderResult<()>;

	/// Computes static classes and styles (first pass only).
	fn compute_static_styling(&self, descriptor: &mut NodeDescriptor, write_to_host: bool);

	/// Creates directive instances for a host node (every pass).
	fn instantiate_directives(
		&self,
		template: &Template,
		instance: &mut InstanceData,
		slot: SlotIndex,
	) -> RenderResult<()>;

	/// Registers the content queries of a host node.
	fn execute_content_queries(&self, template: &mut Template, slot: SlotIndex) -> RenderResult<()>;

	/// Registers post-order lifecycle hooks (first pass only).
	fn register_post_order_hooks(&self, template: &mut Template, slot: SlotIndex) -> RenderResult<()>;
}

/// Collaborators backed by this crate's modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollaborators;

impl Collaborators for DefaultCollaborators {
	fn resolve_directives(
		&self,
		template: &mut Template,
		slot: SlotIndex,
		local_refs: Option<&[LocalRef]>,
	) -> RenderResult<()> {
		directives::resolve_directives(template, slot, local_refs)
	}

	fn compute_static_styling(&self, descriptor: &mut NodeDescriptor, write_to_host: bool) {
		styling::compute_static_styling(descriptor, write_to_host);
	}

	fn instantiate_directives(
		&self,
		template: &Template,
		instance: &mut InstanceData,
		slot: SlotIndex,
	) -> RenderResult<()> {
		directives::instantiate_directives(template, instance, slot)
	}

	fn execute_content_queries(&self, template: &mut Template, slot: SlotIndex) -> RenderResult<()> {
		queries::execute_content_queries(template, slot)
	}

	fn register_post_order_hooks(&self, template: &mut Template, slot: SlotIndex) -> RenderResult<()> {
		hooks::register_post_order_hooks(template, slot)
	}
}
