//! Structural queries collected during the first creation pass.
//!
//! A query records which slots match its predicate. View queries are
//! declared on the template and see every node; content queries are
//! declared by a directive and only see nodes declared between their host's
//! start and end instructions.

use crate::descriptor::{NodeDescriptor, SlotIndex};
use crate::directives::DirectiveDef;
use crate::error::RenderResult;
use crate::instance::InstanceData;
use crate::node_kind::NodeKind;
use crate::renderer::NodeId;
use crate::template::Template;

/// What a query looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicate {
	/// Nodes declaring a local reference with this name.
	LocalRef(String),
	/// Nodes matched by the directive with this name.
	Directive(String),
	/// Elements with this tag.
	Tag(String),
}

/// Definition of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDef {
	/// Predicate to match.
	pub predicate: QueryPredicate,
	/// Match all descendants rather than direct children only.
	pub descendants: bool,
}

impl QueryDef {
	/// Matches nodes with a local reference.
	pub fn local_ref(name: impl Into<String>) -> Self {
		Self {
			predicate: QueryPredicate::LocalRef(name.into()),
			descendants: true,
		}
	}

	/// Matches nodes hosting a directive.
	pub fn directive(name: impl Into<String>) -> Self {
		Self {
			predicate: QueryPredicate::Directive(name.into()),
			descendants: true,
		}
	}

	/// Matches elements by tag.
	pub fn tag(name: impl Into<String>) -> Self {
		Self {
			predicate: QueryPredicate::Tag(name.into()),
			descendants: true,
		}
	}

	/// Restricts matching to direct children.
	pub fn direct_children_only(mut self) -> Self {
		self.descendants = false;
		self
	}
}

/// A query registered on a template, with its matches.
#[derive(Debug, Clone)]
pub struct TemplateQuery {
	def: QueryDef,
	declaration: Option<SlotIndex>,
	applies: bool,
	matches: Vec<SlotIndex>,
}

impl TemplateQuery {
	/// The query definition.
	pub fn def(&self) -> &QueryDef {
		&self.def
	}

	/// Slot of the declaring node, `None` for view queries.
	pub fn declaration(&self) -> Option<SlotIndex> {
		self.declaration
	}

	/// Matched slots in declaration order.
	pub fn matches(&self) -> &[SlotIndex] {
		&self.matches
	}

	fn is_applying_to(&self, descriptor: &NodeDescriptor, data: &[Option<NodeDescriptor>]) -> bool {
		if !self.applies {
			return false;
		}
		if self.def.descendants {
			return true;
		}
		let mut parent = descriptor.parent;
		while let Some(slot) = parent {
			match data.get(slot).and_then(Option::as_ref) {
				Some(candidate)
					if candidate.kind.contains(NodeKind::ELEMENT_CONTAINER)
						&& Some(slot) != self.declaration =>
				{
					parent = candidate.parent;
				}
				_ => break,
			}
		}
		parent == self.declaration
	}

	fn is_match(&self, descriptor: &NodeDescriptor, registry: &[DirectiveDef]) -> bool {
		match &self.def.predicate {
			QueryPredicate::LocalRef(name) => descriptor
				.local_names
				.iter()
				.any(|local| &local.name == name),
			QueryPredicate::Directive(name) => descriptor
				.directives
				.iter()
				.any(|&index| registry.get(index).is_some_and(|def| &def.name == name)),
			QueryPredicate::Tag(tag) => {
				descriptor.kind.contains(NodeKind::ELEMENT)
					&& descriptor
						.name
						.as_deref()
						.is_some_and(|name| name.eq_ignore_ascii_case(tag))
			}
		}
	}
}

/// All queries of a template.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
	queries: Vec<TemplateQuery>,
}

impl QueryRegistry {
	/// Registers a view query and returns its index.
	pub fn add_view_query(&mut self, def: QueryDef) -> usize {
		self.push(def, None)
	}

	/// Registers a content query declared at `declaration`.
	pub fn add_content_query(&mut self, def: QueryDef, declaration: SlotIndex) -> usize {
		self.push(def, Some(declaration))
	}

	fn push(&mut self, def: QueryDef, declaration: Option<SlotIndex>) -> usize {
		self.queries.push(TemplateQuery {
			def,
			declaration,
			applies: true,
			matches: Vec::new(),
		});
		self.queries.len() - 1
	}

	/// Offers a newly declared node to every active query.
	pub fn element_start(
		&mut self,
		descriptor: &NodeDescriptor,
		data: &[Option<NodeDescriptor>],
		registry: &[DirectiveDef],
	) {
		for query in &mut self.queries {
			if query.is_applying_to(descriptor, data)
				&& query.is_match(descriptor, registry)
				&& !query.matches.contains(&descriptor.index)
			{
				query.matches.push(descriptor.index);
			}
		}
	}

	/// Closes the content queries declared at `slot`.
	pub fn element_end(&mut self, slot: SlotIndex) {
		for query in &mut self.queries {
			if query.declaration == Some(slot) {
				query.applies = false;
			}
		}
	}

	/// Drops content queries and the matches of view queries.
	pub(crate) fn reset_matches(&mut self) {
		self.queries.retain(|query| query.declaration.is_none());
		for query in &mut self.queries {
			query.applies = true;
			query.matches.clear();
		}
	}

	/// Returns a query by index.
	pub fn get(&self, index: usize) -> Option<&TemplateQuery> {
		self.queries.get(index)
	}

	/// Returns the indices of queries declared at `slot`.
	pub fn declared_at(&self, slot: SlotIndex) -> Vec<usize> {
		self.queries
			.iter()
			.enumerate()
			.filter(|(_, query)| query.declaration == Some(slot))
			.map(|(index, _)| index)
			.collect()
	}

	/// Number of registered queries.
	pub fn len(&self) -> usize {
		self.queries.len()
	}

	/// Returns `true` if no query is registered.
	pub fn is_empty(&self) -> bool {
		self.queries.is_empty()
	}
}

/// Registers the content queries of the directives matched at `slot`.
///
/// Only the first creation pass records anything; later passes read the
/// cached matches.
pub fn execute_content_queries(template: &mut Template, slot: SlotIndex) -> RenderResult<()> {
	if !template.first_create_pass() {
		return Ok(());
	}
	let descriptor = template.descriptor(slot)?;
	let defs: Vec<QueryDef> = descriptor
		.directives
		.iter()
		.filter_map(|&index| template.directive_registry().get(index))
		.flat_map(|def| def.content_queries.iter().cloned())
		.collect();
	if template.queries().declared_at(slot).is_empty() {
		for def in defs {
			template.queries_mut().add_content_query(def, slot);
		}
	}
	Ok(())
}

/// Maps a query's matched slots to the concrete nodes of one instance.
pub fn query_results(template: &Template, instance: &InstanceData, query: usize) -> Vec<NodeId> {
	template
		.queries()
		.get(query)
		.map(|query| {
			query
				.matches()
				.iter()
				.filter_map(|&slot| instance.native(slot))
				.collect()
		})
		.unwrap_or_default()
}
