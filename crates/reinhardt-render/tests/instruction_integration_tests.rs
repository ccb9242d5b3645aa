//! View instruction integration tests
//!
//! Success Criteria:
//! 1. Instructions build the expected node tree without hydration
//! 2. Template metadata is built once and shared by every instance
//! 3. Contract violations are reported with diagnostics enabled
//! 4. Directives, inputs, queries, local references and hooks are wired up
//! 5. Instance lifecycle errors are reported instead of panicking
//!
//! Test Categories:
//! - Happy Path: 4 tests
//! - Error Path: 6 tests
//! - State Transitions: 5 tests
//! - Use Cases: 5 tests

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reinhardt_render::queries::query_results;
use reinhardt_render::{
	BindingValue, ConstantTable, Directive, DirectiveDef, LifecycleHooks, LocalRef,
	LocalRefValue, MemoryDocument, NodeFlags, NodeId, QueryDef, RenderEngine, RenderError,
	RenderOptions, Renderer, RendererRef, StaticAttrs, Template, TemplateRef,
};
use rstest::*;

// ============================================================================
// Fixtures
// ============================================================================

struct Page {
	document: Rc<RefCell<MemoryDocument>>,
	renderer: RendererRef,
	body: NodeId,
}

impl Page {
	fn html(&self) -> String {
		self.document.borrow().inner_html(self.body)
	}
}

#[fixture]
fn page() -> Page {
	let document = MemoryDocument::new().into_shared();
	let body = document.borrow().body().unwrap();
	let renderer: RendererRef = document.clone();
	Page {
		document,
		renderer,
		body,
	}
}

#[fixture]
fn engine() -> RenderEngine {
	RenderEngine::new(RenderOptions::new().diagnostics(true))
}

/// Records every call a directive receives.
struct Probe {
	log: Rc<RefCell<Vec<String>>>,
}

impl Directive for Probe {
	fn set_input(&mut self, name: &str, value: &BindingValue) {
		self.log
			.borrow_mut()
			.push(format!("input {}={}", name, value.as_str().unwrap_or_default()));
	}

	fn on_init(&mut self) {
		self.log.borrow_mut().push("init".to_string());
	}

	fn after_content_init(&mut self) {
		self.log.borrow_mut().push("content".to_string());
	}

	fn after_view_init(&mut self) {
		self.log.borrow_mut().push("view".to_string());
	}

	fn on_destroy(&mut self) {
		self.log.borrow_mut().push("destroy".to_string());
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

fn tooltip(log: &Rc<RefCell<Vec<String>>>) -> DirectiveDef {
	let log = Rc::clone(log);
	DirectiveDef::new("tooltip", "[tooltip]", move || {
		Box::new(Probe {
			log: Rc::clone(&log),
		}) as Box<dyn Directive>
	})
	.input("tooltip")
	.input("class")
	.host_attrs(StaticAttrs::new().attr("role", "tooltip").class("has-tip"))
	.export_as("tip")
	.hooks(LifecycleHooks::all())
}

fn card_template() -> TemplateRef {
	Template::new(3, 1, |ctx| {
		ctx.element_start(0, "article", None, None)?
			.element_start(1, "h1", None, None)?
			.text(2, "title")?
			.element_end()?
			.element_end()?
			.bind("bound")?;
		Ok(())
	})
	.into_ref()
}

// ============================================================================
// Happy Path Tests
// ============================================================================

/// Tests that a template without hydration builds fresh nodes under the host
#[rstest]
fn test_render_creates_tree(page: Page, engine: RenderEngine) {
	let template = card_template();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	assert_eq!(page.html(), "<article><h1>title</h1></article>");
	let binding_start = template.borrow().unwrap().binding_start_index();
	assert_eq!(instance.binding(binding_start), Some(&BindingValue::from("bound")));
	let counters = engine.diagnostics().counters();
	assert_eq!(counters.elements, 2);
	assert_eq!(counters.texts, 1);
	assert_eq!(counters.claimed, 0);
}

/// Tests that repeated instantiation shares one set of descriptors
#[rstest]
fn test_descriptors_built_once(page: Page, engine: RenderEngine) {
	let template = card_template();

	for _ in 0..3 {
		let mut instance = engine
			.create_instance(&template, page.renderer.clone(), Some(page.body))
			.unwrap();
		engine.render(&mut instance).unwrap();
	}

	let counters = engine.diagnostics().counters();
	assert_eq!(counters.descriptors, 3);
	assert_eq!(counters.first_passes, 1);
	assert_eq!(counters.elements, 6);
	assert!(!template.borrow().unwrap().first_create_pass());
	assert_eq!(page.html(), "<article><h1>title</h1></article>".repeat(3));
}

/// Tests that root nodes of an instance carry their patch data
#[rstest]
fn test_root_nodes_map_back_to_instance(page: Page, engine: RenderEngine) {
	let template = Template::new(3, 0, |ctx| {
		ctx.text(0, "a")?
			.element_start(1, "div", None, None)?
			.element(2, "span", None, None)?
			.element_end()?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	let document = page.document.borrow();
	let div = instance.native(1).unwrap();
	assert_eq!(document.context_of(div).map(|c| c.slot), Some(1));
	assert_eq!(document.context_of(div).map(|c| c.instance), Some(instance.id()));
	assert_eq!(document.context_of(instance.native(2).unwrap()), None);
	assert_eq!(instance.root_nodes().unwrap(), vec![instance.native(0).unwrap(), div]);
}

/// Tests that a partial JSON configuration starts the engine as configured
#[rstest]
fn test_engine_from_json_options() {
	let options = RenderOptions::from_json(r#"{ "diagnostics": false, "hydration": true }"#).unwrap();

	let engine = RenderEngine::new(options);

	assert!(engine.hydration_enabled());
	assert_eq!(engine.resolver_name(), "hydration-aware");
	assert!(!engine.diagnostics().enabled());
}

// ============================================================================
// Error Path Tests
// ============================================================================

/// Tests that closing with nothing open is rejected
#[rstest]
fn test_unbalanced_end_fails(page: Page, engine: RenderEngine) {
	let template = Template::new(1, 0, |ctx| {
		ctx.element(0, "div", None, None)?.element_end()?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(result, Err(RenderError::NoParentToClose)));
}

/// Tests that a render pass leaving nodes open is rejected
#[rstest]
fn test_unclosed_nodes_fail(page: Page, engine: RenderEngine) {
	let template = Template::new(2, 0, |ctx| {
		ctx.element_start(0, "div", None, None)?
			.element_start(1, "p", None, None)?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(result, Err(RenderError::UnclosedNodes { depth: 2 })));
}

/// Tests that structural instructions after bindings are rejected
#[rstest]
fn test_structural_after_binding_fails(page: Page, engine: RenderEngine) {
	let template = Template::new(2, 1, |ctx| {
		ctx.element(0, "div", None, None)?
			.bind(1)?
			.element(1, "p", None, None)?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(result, Err(RenderError::BindingsStarted { slot: 1, .. })));
}

/// Tests that a local reference to an unknown export is rejected
#[rstest]
fn test_unknown_export_fails(page: Page, engine: RenderEngine) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let mut consts = ConstantTable::new();
	let attrs = consts.push_attrs(StaticAttrs::new().attr("tooltip", "hi"));
	let refs = consts.push_local_refs(vec![LocalRef::export("t", "missing")]);
	let template = Template::new(1, 0, move |ctx| {
		ctx.element(0, "button", Some(attrs), Some(refs))?;
		Ok(())
	})
	.with_consts(consts)
	.with_directive(tooltip(&log))
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(
		result,
		Err(RenderError::ExportNotFound { slot: 0, ref name }) if name == "missing"
	));
}

/// Tests that an embedded view needs a container with a template
#[rstest]
fn test_embedded_view_without_template_fails(page: Page, engine: RenderEngine) {
	let template = Template::new(1, 0, |ctx| {
		ctx.container(0, None, None, None)?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut instance).unwrap();

	let result = engine.create_embedded_view(&mut instance, 0);

	assert!(matches!(result, Err(RenderError::MissingEmbeddedTemplate { slot: 0 })));
}

/// Tests that rendering while the template is borrowed fails instead of panicking
#[rstest]
fn test_busy_template_is_reported(page: Page, engine: RenderEngine) {
	let template = card_template();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	let _guard = template.borrow_mut().unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(result, Err(RenderError::TemplateBusy(id)) if id == template.id()));
}

// ============================================================================
// State Transition Tests
// ============================================================================

/// Tests that an instance renders once
#[rstest]
fn test_second_render_is_rejected(page: Page, engine: RenderEngine) {
	let template = card_template();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut instance).unwrap();

	let result = engine.render(&mut instance);

	assert!(matches!(result, Err(RenderError::AlreadyRendered(id)) if id == instance.id()));
}

/// Tests that destroying removes root nodes and is idempotent
#[rstest]
fn test_destroy_removes_nodes(page: Page, engine: RenderEngine) {
	let template = card_template();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut instance).unwrap();

	engine.destroy(&mut instance).unwrap();
	engine.destroy(&mut instance).unwrap();

	assert_eq!(page.html(), "");
	assert!(instance.is_destroyed());
	assert!(matches!(
		engine.render(&mut instance),
		Err(RenderError::InstanceDestroyed(_))
	));
}

/// Tests that enabling hydration switches the strategy once
#[rstest]
fn test_enable_hydration_is_idempotent() {
	let mut engine = RenderEngine::default();
	assert_eq!(engine.resolver_name(), "always-create");

	engine.enable_hydration();
	engine.enable_hydration();

	assert!(engine.hydration_enabled());
	assert_eq!(engine.resolver_name(), "hydration-aware");
}

/// Tests that a failed first pass leaves no metadata behind for the next instance
#[rstest]
fn test_failed_first_pass_is_rebuilt(page: Page) {
	let engine = RenderEngine::new(RenderOptions::new());
	let mut consts = ConstantTable::new();
	let attrs = consts.push_attrs(StaticAttrs::new().class("a").style("color", "red"));
	let fail_once = Rc::new(Cell::new(true));
	let should_fail = Rc::clone(&fail_once);
	let template = Template::new(1, 0, move |ctx| {
		ctx.element(0, "div", Some(attrs), None)?;
		if should_fail.replace(false) {
			ctx.element_end()?;
		}
		Ok(())
	})
	.with_consts(consts)
	.into_ref();
	let mut broken = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	assert!(matches!(
		engine.render(&mut broken),
		Err(RenderError::NoParentToClose)
	));
	assert!(template.borrow().unwrap().first_create_pass());
	assert_eq!(template.borrow().unwrap().descriptor_count(), 0);

	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut instance).unwrap();

	let div = instance.native(0).unwrap();
	let document = page.document.borrow();
	assert_eq!(document.get_attribute(div, "class").as_deref(), Some("a"));
	assert_eq!(document.get_attribute(div, "style").as_deref(), Some("color: red;"));
	assert!(!template.borrow().unwrap().first_create_pass());
	assert_eq!(engine.diagnostics().counters().first_passes, 1);
}

/// Tests that a detached node is created but kept out of the tree
#[rstest]
fn test_detached_node_is_not_inserted(page: Page, engine: RenderEngine) {
	let template = Template::new(2, 0, |ctx| {
		ctx.element(0, "div", None, None)?
			.element(1, "span", None, None)?;
		Ok(())
	})
	.into_ref();
	let mut first = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut first).unwrap();
	template.borrow_mut().unwrap().descriptor_mut(1).unwrap().flags |= NodeFlags::IS_DETACHED;

	let mut second = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();
	engine.render(&mut second).unwrap();

	let div = second.native(0).unwrap();
	let span = second.native(1).unwrap();
	assert_eq!(page.document.borrow().parent(span), None);
	assert_eq!(page.document.borrow().parent(div), Some(page.body));
	assert_eq!(second.root_nodes().unwrap(), vec![div]);
	assert_eq!(page.html(), "<div></div><span></span><div></div>");
}

// ============================================================================
// Use Case Tests
// ============================================================================

/// Tests directive matching, host attributes, inputs and the hook order
#[rstest]
fn test_directive_lifecycle(page: Page, engine: RenderEngine) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let mut consts = ConstantTable::new();
	let attrs = consts.push_attrs(StaticAttrs::new().attr("tooltip", "hi").class("own"));
	let template = Template::new(1, 0, move |ctx| {
		ctx.element(0, "button", Some(attrs), None)?;
		Ok(())
	})
	.with_consts(consts)
	.with_directive(tooltip(&log))
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();
	engine.destroy(&mut instance).unwrap();

	assert_eq!(
		*log.borrow(),
		vec![
			"input tooltip=hi",
			"input class=own",
			"init",
			"content",
			"view",
			"destroy",
		]
	);
}

/// Tests that host attributes and classes are merged onto the element
#[rstest]
fn test_host_attributes_are_merged(page: Page, engine: RenderEngine) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let mut consts = ConstantTable::new();
	let attrs = consts.push_attrs(StaticAttrs::new().attr("tooltip", "hi").class("own"));
	let template = Template::new(1, 0, move |ctx| {
		ctx.element(0, "button", Some(attrs), None)?;
		Ok(())
	})
	.with_consts(consts)
	.with_directive(tooltip(&log))
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	assert_eq!(
		page.html(),
		r#"<button tooltip="hi" role="tooltip" class="own has-tip"></button>"#
	);
}

/// Tests local references to nodes and to exported directives
#[rstest]
fn test_local_references(page: Page, engine: RenderEngine) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let mut consts = ConstantTable::new();
	let attrs = consts.push_attrs(StaticAttrs::new().attr("tooltip", "hi"));
	let refs = consts.push_local_refs(vec![LocalRef::node("button"), LocalRef::export("tip", "tip")]);
	let template = Template::new(1, 0, move |ctx| {
		ctx.element(0, "button", Some(attrs), Some(refs))?;
		Ok(())
	})
	.with_consts(consts)
	.with_directive(tooltip(&log))
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	assert_eq!(
		instance.local_ref("button"),
		Some(LocalRefValue::Node(instance.native(0).unwrap()))
	);
	assert_eq!(
		instance.local_ref("tip"),
		Some(LocalRefValue::Directive { slot: 0, position: 0 })
	);
	let directive = instance.directive(0, 0).unwrap();
	assert!(directive.as_any().downcast_ref::<Probe>().is_some());
}

/// Tests view queries and direct-children content queries
#[rstest]
fn test_queries_collect_matches(page: Page, engine: RenderEngine) {
	let menu = DirectiveDef::new("menu", "ul", || {
		Box::new(Probe {
			log: Rc::new(RefCell::new(Vec::new())),
		}) as Box<dyn Directive>
	})
	.content_query(QueryDef::tag("li").direct_children_only());
	let template = Template::new(6, 0, |ctx| {
		ctx.element_start(0, "ul", None, None)?
			.element(1, "li", None, None)?
			.element_container_start(2, None, None)?
			.element(3, "li", None, None)?
			.element_container_end()?
			.element_start(4, "div", None, None)?
			.element(5, "li", None, None)?
			.element_end()?
			.element_end()?;
		Ok(())
	})
	.with_view_query(QueryDef::tag("li"))
	.with_directive(menu)
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	let template = template.borrow().unwrap();
	let li = |slot| instance.native(slot).unwrap();
	assert_eq!(query_results(&template, &instance, 0), vec![li(1), li(3), li(5)]);
	assert_eq!(template.queries().declared_at(0), vec![1]);
	assert_eq!(query_results(&template, &instance, 1), vec![li(1), li(3)]);
}

/// Tests SVG namespace creation and the return to HTML
#[rstest]
fn test_namespaced_elements(page: Page, engine: RenderEngine) {
	let template = Template::new(3, 0, |ctx| {
		ctx.namespace_svg()
			.element_start(0, "svg", None, None)?
			.element(1, "circle", None, None)?
			.element_end()?
			.namespace_html()
			.element(2, "p", None, None)?;
		Ok(())
	})
	.into_ref();
	let mut instance = engine
		.create_instance(&template, page.renderer.clone(), Some(page.body))
		.unwrap();

	engine.render(&mut instance).unwrap();

	let document = page.document.borrow();
	assert_eq!(
		document.namespace(instance.native(1).unwrap()),
		Some(reinhardt_render::Namespace::Svg)
	);
	assert_eq!(document.namespace(instance.native(2).unwrap()), None);
}
