//! View container anchors.

use crate::constants::LocalRef;
use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::error::RenderResult;
use crate::hydration::NodeRequest;
use crate::node_kind::NodeKind;
use crate::template::TemplateRef;

impl RenderContext<'_> {
	/// Declares an anchor for dynamically created views.
	///
	/// `embedded` is the template views of this container are created from;
	/// see [`RenderEngine::create_embedded_view`](crate::RenderEngine::create_embedded_view).
	pub fn container(
		&mut self,
		index: SlotIndex,
		embedded: Option<&TemplateRef>,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<&mut Self> {
		self.check_structural_preconditions(index)?;
		if self.template.first_create_pass() {
			self.container_first_create_pass(index, embedded, attrs_index, local_refs_index)?;
		}
		self.cursor.set_current(index, false);

		let resolution = self.resolve_node(index, NodeRequest::ContainerAnchor)?;
		self.instance.set_native(index, resolution.node)?;
		self.append_child(index, resolution)?;
		self.attach_patch_data(index, resolution.node)?;

		self.create_directives_instances(index)?;
		if local_refs_index.is_some() {
			self.save_resolved_locals(index)?;
		}
		Ok(self)
	}

	fn container_first_create_pass(
		&mut self,
		index: SlotIndex,
		embedded: Option<&TemplateRef>,
		attrs_index: Option<usize>,
		local_refs_index: Option<usize>,
	) -> RenderResult<()> {
		let attrs = self.template.consts().attrs(attrs_index).cloned();
		let local_refs = self
			.template
			.consts()
			.local_refs(local_refs_index)
			.map(<[LocalRef]>::to_vec);
		self.create_descriptor(index, NodeKind::CONTAINER, None, attrs)?;
		self.collaborators
			.resolve_directives(self.template, index, local_refs.as_deref())?;
		self.collaborators
			.register_post_order_hooks(self.template, index)?;

		let descriptor = self.template.descriptor_mut(index)?;
		descriptor.embedded = embedded.cloned();
		self.collaborators.compute_static_styling(descriptor, false);
		self.template.match_queries(index)
	}
}
