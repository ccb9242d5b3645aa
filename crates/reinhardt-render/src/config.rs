//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::RenderResult;

/// Attribute that opts an element's subtree out of hydration.
pub const SKIP_HYDRATION_ATTR: &str = "data-rh-skip-hydration";

/// Host attribute holding the index of the element's hydration annotation.
pub const ANNOTATION_ATTR: &str = "data-rh-ngh";

/// Options controlling a [`RenderEngine`](crate::RenderEngine).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use reinhardt_render::RenderOptions;
///
/// let options = RenderOptions::from_json(r#"{ "hydration": true }"#).unwrap();
/// assert!(options.hydration);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
	/// Run contract checks, hydration verification and dev counters.
	///
	/// Defaults to on in debug builds and off in release builds.
	pub diagnostics: bool,
	/// Start the engine with hydration-aware node resolution.
	pub hydration: bool,
	/// Accept unknown custom elements without a warning.
	pub custom_elements_schema: bool,
	/// Attribute marking skip-hydration roots.
	pub skip_hydration_attr: String,
	/// Host attribute carrying the annotation index.
	pub annotation_attr: String,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			diagnostics: cfg!(debug_assertions),
			hydration: false,
			custom_elements_schema: false,
			skip_hydration_attr: SKIP_HYDRATION_ATTR.to_string(),
			annotation_attr: ANNOTATION_ATTR.to_string(),
		}
	}
}

impl RenderOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses options from a JSON document.
	pub fn from_json(source: &str) -> RenderResult<Self> {
		Ok(serde_json::from_str(source)?)
	}

	/// Enables or disables diagnostics.
	pub fn diagnostics(mut self, enabled: bool) -> Self {
		self.diagnostics = enabled;
		self
	}

	/// Starts the engine in hydration-aware mode.
	pub fn with_hydration(mut self) -> Self {
		self.hydration = true;
		self
	}

	/// Accepts unknown custom elements silently.
	pub fn allow_custom_elements(mut self) -> Self {
		self.custom_elements_schema = true;
		self
	}

	/// Sets the skip-hydration attribute name.
	pub fn skip_hydration_attr(mut self, name: impl Into<String>) -> Self {
		self.skip_hydration_attr = name.into();
		self
	}

	/// Sets the annotation index attribute name.
	pub fn annotation_attr(mut self, name: impl Into<String>) -> Self {
		self.annotation_attr = name.into();
		self
	}
}
