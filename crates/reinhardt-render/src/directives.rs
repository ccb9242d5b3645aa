//! Directive definitions, selector matching and instantiation.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::constants::{LocalRef, StaticAttrs};
use crate::descriptor::{LocalName, LocalTarget, SlotIndex};
use crate::error::{RenderError, RenderResult};
use crate::instance::{BindingValue, InstanceData};
use crate::node_kind::{NodeFlags, NodeKind};
use crate::queries::QueryDef;
use crate::template::Template;

/// Behaviour attached to a matched node.
///
/// All hooks default to no-ops.
pub trait Directive {
	/// Receives an input value.
	fn set_input(&mut self, _name: &str, _value: &BindingValue) {}

	/// Runs once after the creation pass.
	fn on_init(&mut self) {}

	/// Runs after the content of the host node is created.
	fn after_content_init(&mut self) {}

	/// Runs after the whole view is created.
	fn after_view_init(&mut self) {}

	/// Runs when the owning instance is destroyed.
	fn on_destroy(&mut self) {}

	/// Gives access to the concrete type.
	fn as_any(&self) -> &dyn Any;
}

bitflags::bitflags! {
	/// Lifecycle hooks a directive implements.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct LifecycleHooks: u8 {
		/// [`Directive::on_init`].
		const ON_INIT = 1 << 0;
		/// [`Directive::after_content_init`].
		const AFTER_CONTENT_INIT = 1 << 1;
		/// [`Directive::after_view_init`].
		const AFTER_VIEW_INIT = 1 << 2;
		/// [`Directive::on_destroy`].
		const ON_DESTROY = 1 << 3;
	}
}

/// A simple CSS-like selector: `tag[attr].class`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
	tag: Option<String>,
	attrs: Vec<String>,
	classes: Vec<String>,
}

impl Selector {
	/// Parses a selector such as `button[tooltip].primary`.
	///
	/// Attribute values (`[type=text]`) are ignored; only presence is matched.
	pub fn parse(source: &str) -> Self {
		let mut selector = Self::default();
		let mut chars = source.trim().chars().peekable();
		let mut tag = String::new();
		while let Some(&c) = chars.peek() {
			if c == '[' || c == '.' {
				break;
			}
			tag.push(c);
			chars.next();
		}
		if !tag.is_empty() {
			selector.tag = Some(tag.to_ascii_lowercase());
		}
		while let Some(c) = chars.next() {
			match c {
				'[' => {
					let mut name = String::new();
					let mut in_value = false;
					for c in chars.by_ref() {
						match c {
							']' => break,
							'=' => in_value = true,
							_ if !in_value => name.push(c),
							_ => {}
						}
					}
					if !name.is_empty() {
						selector.attrs.push(name);
					}
				}
				'.' => {
					let mut class = String::new();
					while let Some(&c) = chars.peek() {
						if c == '[' || c == '.' {
							break;
						}
						class.push(c);
						chars.next();
					}
					if !class.is_empty() {
						selector.classes.push(class);
					}
				}
				_ => {}
			}
		}
		selector
	}

	/// Returns `true` if the selector constrains nothing.
	pub fn is_empty(&self) -> bool {
		self.tag.is_none() && self.attrs.is_empty() && self.classes.is_empty()
	}

	/// Matches a node by tag and static attributes.
	///
	/// An empty selector matches nothing.
	pub fn matches(&self, tag: Option<&str>, attrs: Option<&StaticAttrs>) -> bool {
		if self.is_empty() {
			return false;
		}
		if let Some(expected) = &self.tag {
			if !tag.is_some_and(|tag| tag.eq_ignore_ascii_case(expected)) {
				return false;
			}
		}
		let has_attr = |name: &str| attrs.is_some_and(|attrs| attrs.has(name));
		let has_class = |name: &str| attrs.is_some_and(|attrs| attrs.classes.iter().any(|c| c == name));
		self.attrs.iter().all(|name| has_attr(name))
			&& self.classes.iter().all(|name| has_class(name))
	}
}

/// Factory producing a fresh directive instance.
pub type DirectiveFactory = Rc<dyn Fn() -> Box<dyn Directive>>;

/// Static definition of a directive.
#[derive(Clone)]
pub struct DirectiveDef {
	/// Name used by queries and diagnostics.
	pub name: String,
	/// Nodes this directive applies to.
	pub selector: Selector,
	/// Input names.
	pub inputs: Vec<String>,
	/// Attributes the directive contributes to its host.
	pub host_attrs: Option<StaticAttrs>,
	/// Names under which local references can bind the instance.
	pub export_as: Vec<String>,
	/// Lifecycle hooks implemented by the directive.
	pub hooks: LifecycleHooks,
	/// Queries over the host's content.
	pub content_queries: Vec<QueryDef>,
	factory: DirectiveFactory,
}

impl fmt::Debug for DirectiveDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DirectiveDef")
			.field("name", &self.name)
			.field("selector", &self.selector)
			.field("inputs", &self.inputs)
			.field("export_as", &self.export_as)
			.field("hooks", &self.hooks)
			.finish_non_exhaustive()
	}
}

impl DirectiveDef {
	/// Creates a definition.
	pub fn new<F>(name: impl Into<String>, selector: &str, factory: F) -> Self
	where
		F: Fn() -> Box<dyn Directive> + 'static,
	{
		Self {
			name: name.into(),
			selector: Selector::parse(selector),
			inputs: Vec::new(),
			host_attrs: None,
			export_as: Vec::new(),
			hooks: LifecycleHooks::empty(),
			content_queries: Vec::new(),
			factory: Rc::new(factory),
		}
	}

	/// Declares an input.
	pub fn input(mut self, name: impl Into<String>) -> Self {
		self.inputs.push(name.into());
		self
	}

	/// Sets the host attributes.
	pub fn host_attrs(mut self, attrs: StaticAttrs) -> Self {
		self.host_attrs = Some(attrs);
		self
	}

	/// Adds an export name.
	pub fn export_as(mut self, name: impl Into<String>) -> Self {
		self.export_as.push(name.into());
		self
	}

	/// Declares implemented lifecycle hooks.
	pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
		self.hooks |= hooks;
		self
	}

	/// Adds a content query.
	pub fn content_query(mut self, query: QueryDef) -> Self {
		self.content_queries.push(query);
		self
	}

	/// Returns `true` if `name` is an input.
	pub fn has_input(&self, name: &str) -> bool {
		self.inputs.iter().any(|input| input == name)
	}

	/// Instantiates the directive.
	pub fn create(&self) -> Box<dyn Directive> {
		(self.factory)()
	}
}

/// Matches directives against a freshly created descriptor and records the
/// outcome on it.
///
/// Sets the directive-host, content-query-host and styling-input flags,
/// computes merged attributes, resolves local references and registers
/// pre-order hooks.
pub fn resolve_directives(
	template: &mut Template,
	slot: SlotIndex,
	local_refs: Option<&[LocalRef]>,
) -> RenderResult<()> {
	let descriptor = template.descriptor(slot)?;
	let tag = if descriptor.kind.contains(NodeKind::ELEMENT) {
		descriptor.name.clone()
	} else {
		None
	};
	let own = descriptor.attrs.clone();
	let registry = template.directive_registry();

	let matched: Vec<usize> = registry
		.iter()
		.enumerate()
		.filter(|(_, def)| def.selector.matches(tag.as_deref(), own.as_ref()))
		.map(|(index, _)| index)
		.collect();

	let mut flags = NodeFlags::empty();
	let mut merged = own.clone();
	let mut initial_inputs = Vec::with_capacity(matched.len());
	let mut hooks = Vec::with_capacity(matched.len());
	for &index in &matched {
		let def = &registry[index];
		flags |= NodeFlags::IS_DIRECTIVE_HOST;
		if !def.content_queries.is_empty() {
			flags |= NodeFlags::IS_CONTENT_QUERY_HOST;
		}
		if def.has_input("class") {
			flags |= NodeFlags::HAS_CLASS_INPUT;
		}
		if def.has_input("style") {
			flags |= NodeFlags::HAS_STYLE_INPUT;
		}
		if let Some(host) = &def.host_attrs {
			merged.get_or_insert_with(StaticAttrs::new).merge(host);
		}
		initial_inputs.push(
			own.as_ref()
				.map(|attrs| initial_inputs_for(def, attrs))
				.unwrap_or_default(),
		);
		hooks.push(def.hooks);
	}
	let local_names = resolve_local_names(slot, registry, &matched, local_refs)?;

	if !matched.is_empty() {
		tracing::debug!(slot, directives = matched.len(), "directives matched");
	}

	let descriptor = template.descriptor_mut(slot)?;
	descriptor.flags |= flags;
	descriptor.directives = matched;
	descriptor.initial_inputs = initial_inputs;
	descriptor.merged_attrs = merged;
	descriptor.local_names = local_names;
	template.hooks_mut().register_pre_order_hooks(slot, &hooks);
	Ok(())
}

fn initial_inputs_for(def: &DirectiveDef, attrs: &StaticAttrs) -> Vec<(String, String)> {
	def.inputs
		.iter()
		.filter_map(|input| {
			attrs
				.get(input)
				.map(|value| (input.clone(), value.to_string()))
		})
		.collect()
}

fn resolve_local_names(
	slot: SlotIndex,
	registry: &[DirectiveDef],
	matched: &[usize],
	local_refs: Option<&[LocalRef]>,
) -> RenderResult<Vec<LocalName>> {
	let Some(local_refs) = local_refs else {
		return Ok(Vec::new());
	};
	local_refs
		.iter()
		.map(|local| {
			let target = match &local.export {
				None => LocalTarget::Node,
				Some(export) => matched
					.iter()
					.position(|&index| registry[index].export_as.iter().any(|name| name == export))
					.map(LocalTarget::Directive)
					.ok_or_else(|| RenderError::ExportNotFound {
						slot,
						name: export.clone(),
					})?,
			};
			Ok(LocalName {
				name: local.name.clone(),
				target,
			})
		})
		.collect()
}

/// Creates directive instances for a host slot and applies initial inputs.
pub fn instantiate_directives(
	template: &Template,
	instance: &mut InstanceData,
	slot: SlotIndex,
) -> RenderResult<()> {
	let descriptor = template.descriptor(slot)?;
	let registry = template.directive_registry();
	let mut created = Vec::with_capacity(descriptor.directives.len());
	for (position, &index) in descriptor.directives.iter().enumerate() {
		let def = registry.get(index).ok_or(RenderError::IndexOutOfRange {
			index,
			limit: registry.len(),
		})?;
		let mut directive = def.create();
		if let Some(inputs) = descriptor.initial_inputs.get(position) {
			for (name, value) in inputs {
				directive.set_input(name, &BindingValue::String(value.clone()));
			}
		}
		created.push(directive);
	}
	instance.set_directives(slot, created);
	Ok(())
}

/// Writes `value` to every directive on `slot` that declares `property` as an input.
pub fn set_inputs_for_property(
	template: &Template,
	instance: &mut InstanceData,
	slot: SlotIndex,
	property: &str,
	value: &BindingValue,
) -> RenderResult<()> {
	let descriptor = template.descriptor(slot)?;
	let registry = template.directive_registry();
	for (position, &index) in descriptor.directives.iter().enumerate() {
		if !registry.get(index).is_some_and(|def| def.has_input(property)) {
			continue;
		}
		if let Some(directive) = instance.directive_mut(slot, position) {
			directive.set_input(property, value);
		}
	}
	Ok(())
}
