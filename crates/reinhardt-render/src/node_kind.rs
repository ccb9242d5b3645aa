//! Node categories and per-node flags.
//!
//! Kinds are bit sets so that lookups can test against a family of kinds
//! at once (for example "any container").

use std::fmt;

bitflags::bitflags! {
	/// The category of a template node.
	///
	/// A descriptor always carries exactly one base kind; the combined
	/// constants exist for membership tests only.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct NodeKind: u8 {
		/// A text node.
		const TEXT = 1 << 0;
		/// A native element.
		const ELEMENT = 1 << 1;
		/// An anchor for dynamically inserted views.
		const CONTAINER = 1 << 2;
		/// A logical grouping node with no native element of its own.
		const ELEMENT_CONTAINER = 1 << 3;
		/// A content projection slot.
		const PROJECTION = 1 << 4;
		/// An internationalization expression.
		const ICU = 1 << 5;
		/// A slot reserved before its kind is known.
		const PLACEHOLDER = 1 << 6;

		/// Kinds backed by a native node of their own.
		const ANY_NATIVE_NODE = Self::TEXT.bits() | Self::ELEMENT.bits();
		/// Kinds that anchor other content.
		const ANY_CONTAINER = Self::CONTAINER.bits() | Self::ELEMENT_CONTAINER.bits();
	}
}

impl NodeKind {
	/// Returns `true` when exactly one base kind is set.
	pub fn is_single(self) -> bool {
		self.bits().count_ones() == 1
	}

	/// Returns `true` for kinds declared with a start/end instruction pair.
	pub fn is_structural(self) -> bool {
		self.intersects(Self::ELEMENT | Self::ELEMENT_CONTAINER)
	}

	/// Returns `true` when this kind is transparent for rendering purposes,
	/// i.e. its children are inserted into the nearest native ancestor.
	pub fn is_transparent(self) -> bool {
		self.intersects(Self::ELEMENT_CONTAINER | Self::ICU)
	}

	fn base_name(self) -> &'static str {
		match self {
			Self::TEXT => "text",
			Self::ELEMENT => "element",
			Self::CONTAINER => "container",
			Self::ELEMENT_CONTAINER => "element-container",
			Self::PROJECTION => "projection",
			Self::ICU => "icu",
			Self::PLACEHOLDER => "placeholder",
			_ => "unknown",
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return f.write_str("none");
		}
		let mut first = true;
		for kind in self.iter() {
			if !first {
				f.write_str("|")?;
			}
			f.write_str(kind.base_name())?;
			first = false;
		}
		Ok(())
	}
}

bitflags::bitflags! {
	/// Facts about a descriptor discovered during the first creation pass.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct NodeFlags: u16 {
		/// At least one directive matched this node.
		const IS_DIRECTIVE_HOST = 1 << 0;
		/// A matched directive declares content queries.
		const IS_CONTENT_QUERY_HOST = 1 << 1;
		/// The node must not be inserted into the tree.
		const IS_DETACHED = 1 << 2;
		/// A matched directive has a `class` input.
		const HAS_CLASS_INPUT = 1 << 3;
		/// A matched directive has a `style` input.
		const HAS_STYLE_INPUT = 1 << 4;
		/// The node opts its subtree out of hydration.
		const IS_SKIP_HYDRATION_ROOT = 1 << 5;
	}
}
