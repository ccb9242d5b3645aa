//! Static class and style computation.

use crate::descriptor::NodeDescriptor;

/// Computes static classes and styles for a descriptor.
///
/// With `write_to_host` the merged attributes are appended to
/// [`NodeDescriptor::classes`] / [`NodeDescriptor::styles`], which are written
/// to the node. Otherwise the node's own attributes are staged in the
/// `*_without_host` buffers for directives that take `class` or `style`
/// as an input.
pub fn compute_static_styling(descriptor: &mut NodeDescriptor, write_to_host: bool) {
	let source = if write_to_host {
		descriptor.merged_attrs.as_ref()
	} else {
		descriptor.attrs.as_ref()
	};
	let Some(source) = source else {
		return;
	};
	let (mut classes, mut styles) = if write_to_host {
		(descriptor.classes.clone(), descriptor.styles.clone())
	} else {
		(None, None)
	};
	for class in &source.classes {
		classes = Some(concat_with_space(classes, class));
	}
	for (property, value) in &source.styles {
		styles = Some(concat_with_space(styles, &format!("{}: {};", property, value)));
	}
	if write_to_host {
		descriptor.classes = classes;
		descriptor.styles = styles;
	} else {
		descriptor.classes_without_host = classes;
		descriptor.styles_without_host = styles;
	}
}

fn concat_with_space(existing: Option<String>, value: &str) -> String {
	match existing {
		Some(mut existing) if !existing.is_empty() => {
			existing.push(' ');
			existing.push_str(value);
			existing
		}
		_ => value.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::StaticAttrs;
	use crate::node_kind::NodeKind;
	use rstest::rstest;

	fn descriptor(attrs: StaticAttrs) -> NodeDescriptor {
		NodeDescriptor::new(0, NodeKind::ELEMENT, Some("div".to_string()), Some(attrs))
	}

	#[rstest]
	fn test_own_attrs_go_to_staging_buffers() {
		let mut descriptor = descriptor(StaticAttrs::new().class("a").class("b").style("color", "red"));

		compute_static_styling(&mut descriptor, false);

		assert_eq!(descriptor.classes_without_host.as_deref(), Some("a b"));
		assert_eq!(descriptor.styles_without_host.as_deref(), Some("color: red;"));
		assert_eq!(descriptor.classes, None);
	}

	#[rstest]
	fn test_merged_attrs_go_to_host() {
		let mut descriptor = descriptor(StaticAttrs::new().class("a"));
		descriptor.merged_attrs = Some(
			StaticAttrs::new()
				.class("a")
				.class("host")
				.style("display", "block")
				.style("margin", "0"),
		);

		compute_static_styling(&mut descriptor, true);

		assert_eq!(descriptor.classes.as_deref(), Some("a host"));
		assert_eq!(descriptor.styles.as_deref(), Some("display: block; margin: 0;"));
		assert_eq!(descriptor.classes_without_host, None);
	}

	#[rstest]
	fn test_missing_attrs_leave_descriptor_untouched() {
		let mut descriptor = NodeDescriptor::new(0, NodeKind::ELEMENT, None, None);

		compute_static_styling(&mut descriptor, false);
		compute_static_styling(&mut descriptor, true);

		assert_eq!(descriptor.classes, None);
		assert_eq!(descriptor.styles_without_host, None);
	}
}
