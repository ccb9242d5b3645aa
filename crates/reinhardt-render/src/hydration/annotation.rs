//! Serialized hydration annotation.
//!
//! The server renderer emits one [`SerializedView`] per hydratable view as
//! compact JSON with single-letter keys:
//!
//! | key | contents                                                  |
//! |-----|-----------------------------------------------------------|
//! | `c` | container slot → views rendered into it                   |
//! | `e` | element-container slot → number of root nodes             |
//! | `t` | container slot → id of its embedded template              |
//! | `n` | slot → navigation path to its node                        |
//! | `d` | slots whose nodes were not rendered on the server         |
//! | `s` | number of slots the server rendered                       |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::SlotIndex;
use crate::error::{RenderError, RenderResult};

/// Annotation of one server-rendered view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedView {
	/// Views rendered into each container slot.
	#[serde(rename = "c", default, skip_serializing_if = "BTreeMap::is_empty")]
	pub containers: BTreeMap<SlotIndex, Vec<SerializedContainerView>>,
	/// Root node count of each element container.
	#[serde(rename = "e", default, skip_serializing_if = "BTreeMap::is_empty")]
	pub element_containers: BTreeMap<SlotIndex, usize>,
	/// Embedded template id of each container.
	#[serde(rename = "t", default, skip_serializing_if = "BTreeMap::is_empty")]
	pub templates: BTreeMap<SlotIndex, String>,
	/// Navigation paths for nodes that cannot be found by walking siblings.
	#[serde(rename = "n", default, skip_serializing_if = "BTreeMap::is_empty")]
	pub node_paths: BTreeMap<SlotIndex, String>,
	/// Slots absent from the server-rendered tree.
	#[serde(rename = "d", default, skip_serializing_if = "Vec::is_empty")]
	pub disconnected: Vec<SlotIndex>,
	/// Number of slots the server rendered, if recorded.
	#[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
	pub slot_count: Option<usize>,
}

impl SerializedView {
	/// Creates an empty annotation.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses one annotation.
	pub fn from_json(source: &str) -> RenderResult<Self> {
		Ok(serde_json::from_str(source)?)
	}

	/// Parses the transferred annotation list.
	pub fn list_from_json(source: &str) -> RenderResult<Vec<Self>> {
		Ok(serde_json::from_str(source)?)
	}

	/// Returns `true` if nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.containers.is_empty()
			&& self.element_containers.is_empty()
			&& self.templates.is_empty()
			&& self.node_paths.is_empty()
			&& self.disconnected.is_empty()
			&& self.slot_count.is_none()
	}

	/// Returns `true` if the server did not render `slot`.
	pub fn is_disconnected(&self, slot: SlotIndex) -> bool {
		self.disconnected.contains(&slot) || self.slot_count.is_some_and(|count| slot >= count)
	}

	/// Total number of root nodes rendered into the container at `slot`.
	pub fn container_size(&self, slot: SlotIndex) -> usize {
		self.containers
			.get(&slot)
			.map(|views| views.iter().map(|view| view.root_nodes * view.repeat()).sum())
			.unwrap_or(0)
	}

	/// Records an element container's root node count.
	pub fn with_element_container(mut self, slot: SlotIndex, root_nodes: usize) -> Self {
		self.element_containers.insert(slot, root_nodes);
		self
	}

	/// Records the views rendered into a container.
	pub fn with_container(mut self, slot: SlotIndex, views: Vec<SerializedContainerView>) -> Self {
		self.containers.insert(slot, views);
		self
	}

	/// Records a navigation path.
	pub fn with_node_path(mut self, slot: SlotIndex, path: impl Into<String>) -> Self {
		self.node_paths.insert(slot, path.into());
		self
	}

	/// Marks a slot as not rendered.
	pub fn with_disconnected(mut self, slot: SlotIndex) -> Self {
		if !self.disconnected.contains(&slot) {
			self.disconnected.push(slot);
		}
		self
	}

	/// Records the rendered slot count.
	pub fn with_slot_count(mut self, count: usize) -> Self {
		self.slot_count = Some(count);
		self
	}

	/// Records a container's embedded template id.
	pub fn with_template(mut self, slot: SlotIndex, id: impl Into<String>) -> Self {
		self.templates.insert(slot, id.into());
		self
	}
}

/// One view (or a run of identical views) rendered into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedContainerView {
	/// Id of the template the view was created from.
	#[serde(rename = "i")]
	pub template: String,
	/// Number of root nodes of one view.
	#[serde(rename = "r")]
	pub root_nodes: usize,
	/// How many consecutive views share this shape.
	#[serde(rename = "x", default, skip_serializing_if = "Option::is_none")]
	pub multiplier: Option<usize>,
	/// Annotation of the view's own content.
	#[serde(rename = "v", default, skip_serializing_if = "SerializedView::is_empty")]
	pub view: SerializedView,
}

impl SerializedContainerView {
	/// Creates a single view entry.
	pub fn new(template: impl Into<String>, root_nodes: usize) -> Self {
		Self {
			template: template.into(),
			root_nodes,
			multiplier: None,
			view: SerializedView::default(),
		}
	}

	/// Repeats the entry `count` times.
	pub fn multiplier(mut self, count: usize) -> Self {
		self.multiplier = Some(count);
		self
	}

	/// Sets the annotation of the view's content.
	pub fn nested(mut self, view: SerializedView) -> Self {
		self.view = view;
		self
	}

	/// Number of views this entry stands for.
	pub fn repeat(&self) -> usize {
		self.multiplier.unwrap_or(1)
	}
}

/// Starting point of a navigation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathReference {
	/// The instance's host node.
	Host,
	/// The document body.
	Body,
	/// The node of an earlier slot.
	Slot(SlotIndex),
}

/// One navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
	/// Move to the first child.
	FirstChild,
	/// Move to the next sibling.
	NextSibling,
}

/// A parsed navigation path such as `2fn3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
	/// Where navigation starts.
	pub reference: PathReference,
	/// Steps with their repeat counts.
	pub steps: Vec<(PathStep, usize)>,
}

impl NodePath {
	/// Parses a path: a reference (`h`, `b` or a slot number) followed by
	/// `f`/`n` steps, each with an optional repeat count.
	pub fn parse(source: &str) -> RenderResult<Self> {
		let invalid = |reason: &str| RenderError::InvalidNodePath {
			path: source.to_string(),
			reason: reason.to_string(),
		};
		let mut chars = source.chars().peekable();
		let reference = match chars.peek() {
			Some('h') => {
				chars.next();
				PathReference::Host
			}
			Some('b') => {
				chars.next();
				PathReference::Body
			}
			Some(c) if c.is_ascii_digit() => {
				let digits = take_digits(&mut chars);
				let slot = digits.parse().map_err(|_| invalid("slot reference is too large"))?;
				PathReference::Slot(slot)
			}
			Some(_) => return Err(invalid("path must start with `h`, `b` or a slot number")),
			None => return Err(invalid("path is empty")),
		};

		let mut steps = Vec::new();
		while let Some(c) = chars.next() {
			let step = match c {
				'f' => PathStep::FirstChild,
				'n' => PathStep::NextSibling,
				other => return Err(invalid(&format!("unexpected character `{other}`"))),
			};
			let digits = take_digits(&mut chars);
			let count = if digits.is_empty() {
				1
			} else {
				digits.parse().map_err(|_| invalid("step count is too large"))?
			};
			if count == 0 {
				return Err(invalid("step count must be positive"));
			}
			steps.push((step, count));
		}
		Ok(Self { reference, steps })
	}
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
	let mut digits = String::new();
	while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
		digits.push(c);
		chars.next();
	}
	digits
}

impl fmt::Display for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.reference {
			PathReference::Host => f.write_str("h")?,
			PathReference::Body => f.write_str("b")?,
			PathReference::Slot(slot) => write!(f, "{slot}")?,
		}
		for (step, count) in &self.steps {
			f.write_str(match step {
				PathStep::FirstChild => "f",
				PathStep::NextSibling => "n",
			})?;
			if *count > 1 {
				write!(f, "{count}")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parses_compact_json() {
		let view = SerializedView::from_json(
			r#"{
				"c": { "3": [ { "i": "t1", "r": 2, "x": 3 }, { "i": "t2", "r": 1, "v": { "d": [0] } } ] },
				"e": { "1": 4 },
				"t": { "3": "t1" },
				"n": { "5": "hf2n" },
				"d": [7],
				"s": 9
			}"#,
		)
		.unwrap();

		assert_eq!(view.element_containers.get(&1), Some(&4));
		assert_eq!(view.templates.get(&3).map(String::as_str), Some("t1"));
		assert_eq!(view.container_size(3), 7);
		assert_eq!(view.containers[&3][1].view.disconnected, vec![0]);
		assert!(view.is_disconnected(7));
		assert!(view.is_disconnected(9));
		assert!(!view.is_disconnected(8));
	}

	#[rstest]
	fn test_empty_fields_are_omitted() {
		let view = SerializedView::new().with_element_container(0, 2);

		assert_eq!(serde_json::to_string(&view).unwrap(), r#"{"e":{"0":2}}"#);
		assert!(SerializedView::from_json("{}").unwrap().is_empty());
	}

	#[rstest]
	fn test_invalid_json_is_an_error() {
		assert!(matches!(
			SerializedView::from_json(r#"{"s": "many"}"#),
			Err(RenderError::AnnotationParse(_))
		));
	}

	#[rstest]
	#[case("h", PathReference::Host, vec![])]
	#[case("bf", PathReference::Body, vec![(PathStep::FirstChild, 1)])]
	#[case(
		"12fn3",
		PathReference::Slot(12),
		vec![(PathStep::FirstChild, 1), (PathStep::NextSibling, 3)]
	)]
	fn test_path_parsing(
		#[case] source: &str,
		#[case] reference: PathReference,
		#[case] steps: Vec<(PathStep, usize)>,
	) {
		let path = NodePath::parse(source).unwrap();

		assert_eq!(path.reference, reference);
		assert_eq!(path.steps, steps);
		assert_eq!(path.to_string(), source);
	}

	#[rstest]
	#[case("")]
	#[case("x")]
	#[case("hq")]
	#[case("hn0")]
	fn test_invalid_paths(#[case] source: &str) {
		assert!(matches!(
			NodePath::parse(source),
			Err(RenderError::InvalidNodePath { .. })
		));
	}
}
