//! Constant tables emitted alongside a compiled template.
//!
//! Instructions refer to static attributes and local reference lists by
//! index into a [`ConstantTable`] so that identical lists are shared.

use serde::{Deserialize, Serialize};

/// A single static attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
	/// Namespace prefix, e.g. `xlink`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
	/// Attribute name.
	pub name: String,
	/// Attribute value.
	pub value: String,
}

impl Attr {
	/// Returns the name as written on the node, including any prefix.
	pub fn qualified_name(&self) -> String {
		match &self.namespace {
			Some(prefix) => format!("{}:{}", prefix, self.name),
			None => self.name.clone(),
		}
	}
}

/// Static attributes of a node, grouped by how they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAttrs {
	/// Plain and namespaced attributes, in declaration order.
	#[serde(default)]
	pub attrs: Vec<Attr>,
	/// Static class names.
	#[serde(default)]
	pub classes: Vec<String>,
	/// Static style declarations as property/value pairs.
	#[serde(default)]
	pub styles: Vec<(String, String)>,
	/// Names of bound properties, used for directive matching only.
	#[serde(default)]
	pub bindings: Vec<String>,
}

impl StaticAttrs {
	/// Creates an empty attribute list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a plain attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.push(Attr {
			namespace: None,
			name: name.into(),
			value: value.into(),
		});
		self
	}

	/// Adds a namespaced attribute.
	pub fn namespaced(
		mut self,
		namespace: impl Into<String>,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.attrs.push(Attr {
			namespace: Some(namespace.into()),
			name: name.into(),
			value: value.into(),
		});
		self
	}

	/// Adds a static class.
	pub fn class(mut self, name: impl Into<String>) -> Self {
		self.classes.push(name.into());
		self
	}

	/// Adds a static style declaration.
	pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
		self.styles.push((property.into(), value.into()));
		self
	}

	/// Adds a bound property name.
	pub fn binding(mut self, name: impl Into<String>) -> Self {
		self.bindings.push(name.into());
		self
	}

	/// Returns the value of an un-namespaced attribute.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.attrs
			.iter()
			.find(|attr| attr.namespace.is_none() && attr.name == name)
			.map(|attr| attr.value.as_str())
	}

	/// Returns `true` if an attribute or binding with this name exists.
	pub fn has(&self, name: &str) -> bool {
		self.get(name).is_some() || self.bindings.iter().any(|binding| binding == name)
	}

	/// Returns `true` when nothing is declared.
	pub fn is_empty(&self) -> bool {
		self.attrs.is_empty()
			&& self.classes.is_empty()
			&& self.styles.is_empty()
			&& self.bindings.is_empty()
	}

	/// Merges `other` into `self`.
	///
	/// Attributes and styles from `other` replace entries of the same name;
	/// classes and bindings are unioned.
	pub fn merge(&mut self, other: &StaticAttrs) {
		for attr in &other.attrs {
			match self
				.attrs
				.iter_mut()
				.find(|existing| existing.namespace == attr.namespace && existing.name == attr.name)
			{
				Some(existing) => existing.value = attr.value.clone(),
				None => self.attrs.push(attr.clone()),
			}
		}
		for class in &other.classes {
			if !self.classes.contains(class) {
				self.classes.push(class.clone());
			}
		}
		for (property, value) in &other.styles {
			match self.styles.iter_mut().find(|(existing, _)| existing == property) {
				Some((_, existing)) => *existing = value.clone(),
				None => self.styles.push((property.clone(), value.clone())),
			}
		}
		for binding in &other.bindings {
			if !self.bindings.contains(binding) {
				self.bindings.push(binding.clone());
			}
		}
	}
}

/// A local reference declared on a node (`#name` or `#name="export"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRef {
	/// Name visible to the template.
	pub name: String,
	/// Directive export to bind; `None` binds the node itself.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub export: Option<String>,
}

impl LocalRef {
	/// A reference to the node itself.
	pub fn node(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			export: None,
		}
	}

	/// A reference to a directive exported under `export`.
	pub fn export(name: impl Into<String>, export: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			export: Some(export.into()),
		}
	}
}

/// One entry of a constant table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
	/// A static attribute list.
	Attrs(StaticAttrs),
	/// A local reference list.
	LocalRefs(Vec<LocalRef>),
}

/// Index-addressed constants shared by all instances of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantTable {
	entries: Vec<Constant>,
}

impl ConstantTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an attribute list and returns its index.
	pub fn push_attrs(&mut self, attrs: StaticAttrs) -> usize {
		self.entries.push(Constant::Attrs(attrs));
		self.entries.len() - 1
	}

	/// Appends a local reference list and returns its index.
	pub fn push_local_refs(&mut self, refs: Vec<LocalRef>) -> usize {
		self.entries.push(Constant::LocalRefs(refs));
		self.entries.len() - 1
	}

	/// Looks up an attribute list.
	///
	/// Returns `None` for a missing index or an entry of another type.
	pub fn attrs(&self, index: Option<usize>) -> Option<&StaticAttrs> {
		match self.entries.get(index?)? {
			Constant::Attrs(attrs) => Some(attrs),
			Constant::LocalRefs(_) => None,
		}
	}

	/// Looks up a local reference list.
	pub fn local_refs(&self, index: Option<usize>) -> Option<&[LocalRef]> {
		match self.entries.get(index?)? {
			Constant::LocalRefs(refs) => Some(refs),
			Constant::Attrs(_) => None,
		}
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the table is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_table_lookup_by_type() {
		let mut table = ConstantTable::new();
		let attrs = table.push_attrs(StaticAttrs::new().attr("id", "main"));
		let refs = table.push_local_refs(vec![LocalRef::node("box")]);

		assert_eq!(table.attrs(Some(attrs)).unwrap().get("id"), Some("main"));
		assert_eq!(table.local_refs(Some(refs)).unwrap()[0].name, "box");
		assert!(table.attrs(Some(refs)).is_none());
		assert!(table.local_refs(Some(attrs)).is_none());
		assert!(table.attrs(None).is_none());
		assert!(table.attrs(Some(42)).is_none());
	}

	#[rstest]
	fn test_merge_overrides_and_unions() {
		let mut own = StaticAttrs::new()
			.attr("role", "link")
			.class("a")
			.style("color", "red");
		let host = StaticAttrs::new()
			.attr("role", "button")
			.attr("tabindex", "0")
			.class("a")
			.class("b")
			.style("color", "blue");

		own.merge(&host);

		assert_eq!(own.get("role"), Some("button"));
		assert_eq!(own.get("tabindex"), Some("0"));
		assert_eq!(own.classes, vec!["a", "b"]);
		assert_eq!(own.styles, vec![("color".to_string(), "blue".to_string())]);
	}

	#[rstest]
	fn test_namespaced_attr_is_distinct() {
		let attrs = StaticAttrs::new()
			.namespaced("xlink", "href", "#a")
			.attr("href", "/b");

		assert_eq!(attrs.get("href"), Some("/b"));
		assert_eq!(attrs.attrs[0].qualified_name(), "xlink:href");
	}

	#[rstest]
	fn test_has_checks_bindings() {
		let attrs = StaticAttrs::new().binding("value");

		assert!(attrs.has("value"));
		assert!(!attrs.has("id"));
	}

	#[rstest]
	fn test_table_deserializes() {
		let json = r#"{"entries":[{"attrs":{"attrs":[{"name":"id","value":"x"}],"classes":["c"]}},{"local_refs":[{"name":"r"}]}]}"#;
		let table: ConstantTable = serde_json::from_str(json).unwrap();

		assert_eq!(table.len(), 2);
		assert_eq!(table.attrs(Some(0)).unwrap().classes, vec!["c"]);
		assert_eq!(table.local_refs(Some(1)).unwrap()[0].export, None);
	}
}
