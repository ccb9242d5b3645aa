//! Lifecycle hook registration and execution.

use crate::descriptor::SlotIndex;
use crate::directives::LifecycleHooks;
use crate::error::RenderResult;
use crate::instance::InstanceData;
use crate::template::Template;

/// Phase in which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
	/// After the creation pass, in declaration order.
	Init,
	/// After content creation, in node-close order.
	AfterContentInit,
	/// After view creation, in node-close order.
	AfterViewInit,
	/// On teardown.
	Destroy,
}

/// A hook bound to one directive instance position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookEntry {
	/// Host slot.
	pub slot: SlotIndex,
	/// Position among the slot's directives.
	pub position: usize,
}

/// Hooks registered by a template, in execution order.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
	init: Vec<HookEntry>,
	content: Vec<HookEntry>,
	view: Vec<HookEntry>,
	destroy: Vec<HookEntry>,
}

impl HookRegistry {
	/// Registers pre-order hooks for the directives of `slot`.
	pub fn register_pre_order_hooks(&mut self, slot: SlotIndex, hooks: &[LifecycleHooks]) {
		for (position, hooks) in hooks.iter().enumerate() {
			if hooks.contains(LifecycleHooks::ON_INIT) {
				push_unique(&mut self.init, HookEntry { slot, position });
			}
		}
	}

	/// Registers post-order hooks for the directives of `slot`.
	pub fn register_post_order_hooks(&mut self, slot: SlotIndex, hooks: &[LifecycleHooks]) {
		for (position, hooks) in hooks.iter().enumerate() {
			let entry = HookEntry { slot, position };
			if hooks.contains(LifecycleHooks::AFTER_CONTENT_INIT) {
				push_unique(&mut self.content, entry);
			}
			if hooks.contains(LifecycleHooks::AFTER_VIEW_INIT) {
				push_unique(&mut self.view, entry);
			}
			if hooks.contains(LifecycleHooks::ON_DESTROY) {
				push_unique(&mut self.destroy, entry);
			}
		}
	}

	/// Returns the entries of a phase.
	pub fn entries(&self, phase: HookPhase) -> &[HookEntry] {
		match phase {
			HookPhase::Init => &self.init,
			HookPhase::AfterContentInit => &self.content,
			HookPhase::AfterViewInit => &self.view,
			HookPhase::Destroy => &self.destroy,
		}
	}

	/// Runs every hook of `phase` against an instance.
	pub fn run(&self, phase: HookPhase, instance: &mut InstanceData) {
		for entry in self.entries(phase) {
			let Some(directive) = instance.directive_mut(entry.slot, entry.position) else {
				continue;
			};
			match phase {
				HookPhase::Init => directive.on_init(),
				HookPhase::AfterContentInit => directive.after_content_init(),
				HookPhase::AfterViewInit => directive.after_view_init(),
				HookPhase::Destroy => directive.on_destroy(),
			}
		}
	}
}

fn push_unique(entries: &mut Vec<HookEntry>, entry: HookEntry) {
	if !entries.contains(&entry) {
		entries.push(entry);
	}
}

/// Registers the post-order hooks of the directives matched at `slot`.
pub fn register_post_order_hooks(template: &mut Template, slot: SlotIndex) -> RenderResult<()> {
	let descriptor = template.descriptor(slot)?;
	let hooks: Vec<LifecycleHooks> = descriptor
		.directives
		.iter()
		.map(|&index| {
			template
				.directive_registry()
				.get(index)
				.map(|def| def.hooks)
				.unwrap_or_default()
		})
		.collect();
	template.hooks_mut().register_post_order_hooks(slot, &hooks);
	Ok(())
}
