use super::{InterceptContext, InterceptingVisitor, MappingInterceptor, TraversalControl, TreeLogger};
use crate::test_utils::orders;
use crate::tree::NodeRef;
use crate::{NodeId, NodeKind};

/// Logs start/end events and checks they nest.
#[derive(Default)]
struct Events {
    log: Vec<String>,
    open: Vec<NodeId>,
}

impl MappingInterceptor for Events {
    fn start_node(&mut self, node: NodeRef<'_>, _ctx: &mut InterceptContext) -> TraversalControl {
        self.log.push(format!("start {}", node.kind()));
        self.open.push(node.id());
        TraversalControl::Continue
    }

    fn end_node(&mut self, node: NodeRef<'_>, _ctx: &mut InterceptContext) -> TraversalControl {
        assert_eq!(self.open.pop(), Some(node.id()));
        self.log.push(format!("end {}", node.kind()));
        TraversalControl::Continue
    }
}

#[test]
fn starts_and_ends_are_nested() {
    let orders = orders();
    let mut visitor = InterceptingVisitor::new(Events::default());

    assert!(visitor.traverse(&orders.doc).is_continue());

    let (events, _) = visitor.into_parts();
    assert!(events.open.is_empty());
    let starts = events.log.iter().filter(|e| e.starts_with("start")).count();
    let ends = events.log.iter().filter(|e| e.starts_with("end")).count();
    assert_eq!(starts, orders.doc.node_count());
    assert_eq!(ends, starts);
    insta::assert_snapshot!(events.log[..8].join("\n"), @r"
    start document
    start element
    start source
    start element
    start attribute
    end attribute
    start comment
    end comment
    ");
}

#[test]
fn recursive_element_attributes_get_events() {
    let orders = orders();
    let mut doc = orders.doc;
    doc.add_attribute(orders.sub_order, "level").unwrap();
    let mut visitor = InterceptingVisitor::new(Events::default());

    assert!(visitor.traverse(&doc).is_continue());

    let (events, _) = visitor.into_parts();
    let starts = events.log.iter().filter(|e| e.starts_with("start")).count();
    assert_eq!(starts, doc.node_count());
    let at = events
        .log
        .iter()
        .position(|e| e == "start recursive element")
        .unwrap();
    insta::assert_snapshot!(events.log[at..at + 5].join("\n"), @r"
    start recursive element
    start attribute
    end attribute
    end recursive element
    end element
    ");
}

/// Tracks the innermost source through the context stack.
#[derive(Default)]
struct SourceScopes {
    elements: Vec<(String, Option<String>)>,
}

const SOURCES: &str = "sources";

impl MappingInterceptor for SourceScopes {
    fn start_source(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        ctx.push(SOURCES, node.result_set_name().unwrap_or_default().to_owned());
        TraversalControl::Continue
    }

    fn end_source(&mut self, _node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        ctx.pop::<String>(SOURCES);
        TraversalControl::Continue
    }

    fn start_element(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        let source = ctx.peek::<String>(SOURCES).cloned();
        self.elements
            .push((node.name().unwrap_or_default().to_owned(), source));
        TraversalControl::Continue
    }
}

#[test]
fn context_is_shared_across_callbacks() {
    let orders = orders();
    let mut visitor = InterceptingVisitor::new(SourceScopes::default());

    assert!(visitor.traverse(&orders.doc).is_continue());

    let rs = |s: &str| Some(s.to_owned());
    assert_eq!(
        visitor.interceptor().elements,
        [
            ("orders".to_owned(), None),
            ("order".to_owned(), rs("model.orders")),
            ("express".to_owned(), rs("model.orders")),
            ("standard".to_owned(), rs("model.orders")),
            ("line".to_owned(), rs("model.lines")),
        ]
    );
    assert_eq!(visitor.context().get::<Vec<String>>(SOURCES), Some(&Vec::new()));
}

struct StopAtChoice {
    ended: Vec<NodeKind>,
}

impl MappingInterceptor for StopAtChoice {
    fn start_choice(&mut self, _node: NodeRef<'_>, _ctx: &mut InterceptContext) -> TraversalControl {
        TraversalControl::Stop
    }

    fn end_node(&mut self, node: NodeRef<'_>, _ctx: &mut InterceptContext) -> TraversalControl {
        self.ended.push(node.kind());
        TraversalControl::Continue
    }
}

#[test]
fn stop_skips_remaining_events() {
    let orders = orders();
    let mut visitor = InterceptingVisitor::new(StopAtChoice { ended: Vec::new() });

    assert!(visitor.traverse(&orders.doc).is_stop());
    assert_eq!(
        visitor.interceptor().ended,
        [NodeKind::Attribute, NodeKind::Comment]
    );
}

#[test]
fn tree_logger_counts_nodes() {
    let orders = orders();
    let mut visitor = InterceptingVisitor::new(TreeLogger);

    assert!(visitor.traverse(&orders.doc).is_continue());
    assert_eq!(TreeLogger::visited(visitor.context()), 15);

    // The context outlives one traversal.
    assert!(visitor.walk(orders.doc.node(orders.lines)).is_continue());
    assert_eq!(TreeLogger::visited(visitor.context()), 17);
    assert_eq!(visitor.context().get::<usize>("tree_logger.depth"), Some(&0));
}

#[test]
fn context_values_by_type() {
    let mut ctx = InterceptContext::new();
    ctx.insert("count", 3_usize);
    ctx.insert("name", String::from("orders"));

    assert_eq!(ctx.get::<usize>("count"), Some(&3));
    assert_eq!(ctx.get::<String>("count"), None);
    assert_eq!(ctx.remove::<u32>("count"), None);
    assert!(ctx.contains("count"));
    *ctx.get_mut::<usize>("count").unwrap() += 1;
    assert_eq!(ctx.remove::<usize>("count"), Some(4));
    assert!(!ctx.contains("count"));

    *ctx.entry_or_default::<u64>("name") += 2;
    assert_eq!(ctx.get::<u64>("name"), Some(&2));
    assert_eq!(ctx.len(), 1);
    insta::assert_snapshot!(format!("{ctx:?}"), @r#"{"name"}"#);

    ctx.clear();
    assert!(ctx.is_empty());
}

#[test]
fn context_stack_helpers() {
    let mut ctx = InterceptContext::new();
    assert_eq!(ctx.pop::<i32>("stack"), None);

    ctx.push("stack", 1);
    ctx.push("stack", 2);
    assert_eq!(ctx.peek::<i32>("stack"), Some(&2));
    assert_eq!(ctx.pop::<i32>("stack"), Some(2));
    assert_eq!(ctx.peek::<i32>("stack"), Some(&1));
    assert_eq!(ctx.peek::<u8>("stack"), None);
}
