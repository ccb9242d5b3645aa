//! Primitive node operations and an in-memory node tree.
//!
//! The engine never touches concrete nodes directly; everything goes through
//! the [`Renderer`] trait. [`MemoryDocument`] is an arena-backed
//! implementation used for server rendering and tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::descriptor::SlotIndex;
use crate::error::{RenderError, RenderResult};

/// Handle to a concrete node owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
	/// Returns the raw arena index.
	pub fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// XML namespace for element creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
	/// Scalable Vector Graphics.
	Svg,
	/// Mathematical Markup Language.
	MathMl,
}

impl Namespace {
	/// Returns the namespace URI.
	pub fn uri(self) -> &'static str {
		match self {
			Self::Svg => "http://www.w3.org/2000/svg",
			Self::MathMl => "http://www.w3.org/1998/Math/MathML",
		}
	}
}

/// Observable type of a concrete node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeNodeType {
	/// An element.
	Element,
	/// A text node.
	Text,
	/// A comment node.
	Comment,
}

impl NativeNodeType {
	/// Returns the DOM-style name for non-element nodes.
	pub fn generic_name(self) -> &'static str {
		match self {
			Self::Element => "#element",
			Self::Text => "#text",
			Self::Comment => "#comment",
		}
	}
}

/// Instance metadata attached to a node for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeContext {
	/// Owning instance.
	pub instance: u64,
	/// Slot the node occupies in that instance.
	pub slot: SlotIndex,
}

/// Primitive node operations consumed by the engine.
pub trait Renderer {
	/// Creates a detached element.
	fn create_element(&mut self, name: &str, namespace: Option<Namespace>) -> NodeId;

	/// Creates a detached comment.
	fn create_comment(&mut self, text: &str) -> NodeId;

	/// Creates a detached text node.
	fn create_text(&mut self, value: &str) -> NodeId;

	/// Appends `child` as the last child of `parent`, moving it if needed.
	fn append_child(&mut self, parent: NodeId, child: NodeId) -> RenderResult<()>;

	/// Inserts `child` before `reference` under `parent`.
	///
	/// A `None` reference appends.
	fn insert_before(
		&mut self,
		parent: NodeId,
		child: NodeId,
		reference: Option<NodeId>,
	) -> RenderResult<()>;

	/// Removes `child` from `parent`.
	fn remove_child(&mut self, parent: NodeId, child: NodeId) -> RenderResult<()>;

	/// Returns the parent of a node.
	fn parent(&self, node: NodeId) -> Option<NodeId>;

	/// Returns the first child of a node.
	fn first_child(&self, node: NodeId) -> Option<NodeId>;

	/// Returns the next sibling of a node.
	fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

	/// Returns the observable type of a node.
	fn node_type(&self, node: NodeId) -> Option<NativeNodeType>;

	/// Returns the tag name of an element.
	fn tag_name(&self, node: NodeId) -> Option<String>;

	/// Sets an attribute on an element.
	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> RenderResult<()>;

	/// Reads an attribute of an element.
	fn get_attribute(&self, node: NodeId, name: &str) -> Option<String>;

	/// Removes an attribute from an element.
	fn remove_attribute(&mut self, node: NodeId, name: &str) -> RenderResult<()>;

	/// Records which instance slot a node belongs to.
	fn attach_context(&mut self, node: NodeId, context: NodeContext) -> RenderResult<()>;

	/// Returns the context recorded by [`Renderer::attach_context`].
	fn context_of(&self, node: NodeId) -> Option<NodeContext>;

	/// Returns the document body, used as a navigation reference.
	fn body(&self) -> Option<NodeId>;
}

/// Shared handle to a renderer.
pub type RendererRef = Rc<RefCell<dyn Renderer>>;

#[derive(Debug, Clone)]
enum NodeData {
	Element {
		name: String,
		namespace: Option<Namespace>,
		attrs: Vec<(String, String)>,
	},
	Text(String),
	Comment(String),
}

#[derive(Debug, Clone)]
struct Entry {
	data: NodeData,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	context: Option<NodeContext>,
}

/// Arena-backed node tree implementing [`Renderer`].
///
/// Nodes are never freed; removed nodes stay in the arena detached, so
/// [`MemoryDocument::node_count`] counts every allocation ever made.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
	nodes: Vec<Entry>,
	body: NodeId,
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDocument {
	/// Creates a document containing an empty `body` element.
	pub fn new() -> Self {
		let mut doc = Self {
			nodes: Vec::new(),
			body: NodeId(0),
		};
		doc.body = doc.push(NodeData::Element {
			name: "body".to_string(),
			namespace: None,
			attrs: Vec::new(),
		});
		doc
	}

	/// Wraps the document in a shared handle.
	pub fn into_shared(self) -> Rc<RefCell<Self>> {
		Rc::new(RefCell::new(self))
	}

	/// Returns the number of nodes ever allocated, including the body.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Returns the children of a node.
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.nodes
			.get(node.0)
			.map(|entry| entry.children.as_slice())
			.unwrap_or(&[])
	}

	/// Returns the text of a text or comment node.
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.nodes.get(node.0)?.data {
			NodeData::Text(text) | NodeData::Comment(text) => Some(text),
			NodeData::Element { .. } => None,
		}
	}

	/// Returns the namespace an element was created in.
	pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
		match &self.nodes.get(node.0)?.data {
			NodeData::Element { namespace, .. } => *namespace,
			_ => None,
		}
	}

	/// Serializes a node and its subtree as HTML.
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		self.write_html(node, &mut out);
		out
	}

	/// Serializes the children of a node as HTML.
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut out = String::new();
		for child in self.children(node) {
			self.write_html(*child, &mut out);
		}
		out
	}

	fn write_html(&self, node: NodeId, out: &mut String) {
		let Some(entry) = self.nodes.get(node.0) else {
			return;
		};
		match &entry.data {
			NodeData::Element { name, attrs, .. } => {
				out.push('<');
				out.push_str(name);
				for (key, value) in attrs {
					out.push(' ');
					out.push_str(key);
					out.push_str("=\"");
					out.push_str(&escape_attr(value));
					out.push('"');
				}
				out.push('>');
				for child in &entry.children {
					self.write_html(*child, out);
				}
				out.push_str("</");
				out.push_str(name);
				out.push('>');
			}
			NodeData::Text(text) => out.push_str(&escape_text(text)),
			NodeData::Comment(text) => {
				out.push_str("<!--");
				out.push_str(text);
				out.push_str("-->");
			}
		}
	}

	fn push(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Entry {
			data,
			parent: None,
			children: Vec::new(),
			context: None,
		});
		id
	}

	fn entry(&self, node: NodeId) -> RenderResult<&Entry> {
		self.nodes.get(node.0).ok_or(RenderError::UnknownNode(node))
	}

	fn entry_mut(&mut self, node: NodeId) -> RenderResult<&mut Entry> {
		self.nodes
			.get_mut(node.0)
			.ok_or(RenderError::UnknownNode(node))
	}

	fn attrs_mut(&mut self, node: NodeId) -> RenderResult<&mut Vec<(String, String)>> {
		match &mut self.entry_mut(node)?.data {
			NodeData::Element { attrs, .. } => Ok(attrs),
			_ => Err(RenderError::InvalidTreeOperation(format!(
				"node {node} is not an element"
			))),
		}
	}

	fn detach(&mut self, node: NodeId) -> RenderResult<()> {
		if let Some(parent) = self.entry(node)?.parent {
			self.entry_mut(parent)?.children.retain(|child| *child != node);
			self.entry_mut(node)?.parent = None;
		}
		Ok(())
	}

	fn check_insertable(&self, parent: NodeId, child: NodeId) -> RenderResult<()> {
		if !matches!(self.entry(parent)?.data, NodeData::Element { .. }) {
			return Err(RenderError::InvalidTreeOperation(format!(
				"node {parent} cannot have children"
			)));
		}
		self.entry(child)?;
		let mut ancestor = Some(parent);
		while let Some(current) = ancestor {
			if current == child {
				return Err(RenderError::InvalidTreeOperation(format!(
					"inserting {child} under {parent} would create a cycle"
				)));
			}
			ancestor = self.entry(current)?.parent;
		}
		Ok(())
	}
}

impl Renderer for MemoryDocument {
	fn create_element(&mut self, name: &str, namespace: Option<Namespace>) -> NodeId {
		self.push(NodeData::Element {
			name: name.to_string(),
			namespace,
			attrs: Vec::new(),
		})
	}

	fn create_comment(&mut self, text: &str) -> NodeId {
		self.push(NodeData::Comment(text.to_string()))
	}

	fn create_text(&mut self, value: &str) -> NodeId {
		self.push(NodeData::Text(value.to_string()))
	}

	fn append_child(&mut self, parent: NodeId, child: NodeId) -> RenderResult<()> {
		self.insert_before(parent, child, None)
	}

	fn insert_before(
		&mut self,
		parent: NodeId,
		child: NodeId,
		reference: Option<NodeId>,
	) -> RenderResult<()> {
		self.check_insertable(parent, child)?;
		if reference == Some(child) {
			return Ok(());
		}
		self.detach(child)?;
		let position = match reference {
			Some(reference) => self
				.entry(parent)?
				.children
				.iter()
				.position(|existing| *existing == reference)
				.ok_or_else(|| {
					RenderError::InvalidTreeOperation(format!(
						"reference {reference} is not a child of {parent}"
					))
				})?,
			None => self.entry(parent)?.children.len(),
		};
		self.entry_mut(parent)?.children.insert(position, child);
		self.entry_mut(child)?.parent = Some(parent);
		Ok(())
	}

	fn remove_child(&mut self, parent: NodeId, child: NodeId) -> RenderResult<()> {
		if self.entry(child)?.parent != Some(parent) {
			return Err(RenderError::InvalidTreeOperation(format!(
				"{child} is not a child of {parent}"
			)));
		}
		self.detach(child)
	}

	fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(node.0)?.parent
	}

	fn first_child(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(node.0)?.children.first().copied()
	}

	fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
		let parent = self.nodes.get(node.0)?.parent?;
		let siblings = &self.nodes.get(parent.0)?.children;
		let position = siblings.iter().position(|sibling| *sibling == node)?;
		siblings.get(position + 1).copied()
	}

	fn node_type(&self, node: NodeId) -> Option<NativeNodeType> {
		Some(match self.nodes.get(node.0)?.data {
			NodeData::Element { .. } => NativeNodeType::Element,
			NodeData::Text(_) => NativeNodeType::Text,
			NodeData::Comment(_) => NativeNodeType::Comment,
		})
	}

	fn tag_name(&self, node: NodeId) -> Option<String> {
		match &self.nodes.get(node.0)?.data {
			NodeData::Element { name, .. } => Some(name.clone()),
			_ => None,
		}
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> RenderResult<()> {
		let attrs = self.attrs_mut(node)?;
		match attrs.iter_mut().find(|(key, _)| key == name) {
			Some((_, existing)) => *existing = value.to_string(),
			None => attrs.push((name.to_string(), value.to_string())),
		}
		Ok(())
	}

	fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.nodes.get(node.0)?.data {
			NodeData::Element { attrs, .. } => attrs
				.iter()
				.find(|(key, _)| key == name)
				.map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) -> RenderResult<()> {
		self.attrs_mut(node)?.retain(|(key, _)| key != name);
		Ok(())
	}

	fn attach_context(&mut self, node: NodeId, context: NodeContext) -> RenderResult<()> {
		self.entry_mut(node)?.context = Some(context);
		Ok(())
	}

	fn context_of(&self, node: NodeId) -> Option<NodeContext> {
		self.nodes.get(node.0)?.context
	}

	fn body(&self) -> Option<NodeId> {
		Some(self.body)
	}
}

fn escape_text(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}
