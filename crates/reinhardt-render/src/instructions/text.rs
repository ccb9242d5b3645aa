use crate::context::RenderContext;
use crate::descriptor::SlotIndex;
use crate::error::RenderResult;
use crate::hydration::NodeRequest;
use crate::node_kind::NodeKind;

impl RenderContext<'_> {
	/// Declares a text node.
	pub fn text(&mut self, index: SlotIndex, value: &str) -> RenderResult<&mut Self> {
		self.check_structural_preconditions(index)?;
		if self.template.first_create_pass() {
			self.create_descriptor(index, NodeKind::TEXT, Some(value), None)?;
		}

		let resolution = self.resolve_node(index, NodeRequest::Text { value })?;
		self.instance.set_native(index, resolution.node)?;
		self.append_child(index, resolution)?;
		self.cursor.set_current(index, false);
		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use crate::renderer::{MemoryDocument, Renderer, RendererRef};
	use crate::{RenderEngine, RenderOptions, Template};

	#[rstest]
	fn test_text_is_appended_in_order() {
		let engine = RenderEngine::new(RenderOptions::new());
		let template = Template::new(3, 0, |ctx| {
			ctx.text(0, "a<")?
				.element_start(1, "b", None, None)?
				.element_end()?
				.text(2, "c")?;
			Ok(())
		})
		.into_ref();
		let document = MemoryDocument::new().into_shared();
		let body = document.borrow().body();
		let renderer: RendererRef = document.clone();
		let mut instance = engine.create_instance(&template, renderer, body).unwrap();

		engine.render(&mut instance).unwrap();

		assert_eq!(document.borrow().inner_html(body.unwrap()), "a&lt;<b></b>c");
	}
}
