use crate::test_utils::orders;
use crate::{Config, CriteriaSpec, MappingDocument, NodeId, NodeKind, UnresolvedNamespacePolicy};

#[test]
fn new_document_has_only_document_node() {
    let doc = MappingDocument::new();

    assert_eq!(doc.node_count(), 1);
    assert_eq!(doc.document().kind(), NodeKind::Document);
    assert!(doc.root_node().is_none());
    assert!(doc.tag_root().is_none());
    assert_eq!(doc.encoding(), "UTF-8");
    assert!(!doc.is_formatted());
    assert_eq!(doc.name(), None);
}

#[test]
fn document_properties() {
    let mut doc = MappingDocument::new();
    let mut node = doc.node_mut(NodeId::DOCUMENT);
    node.set_document_name("orders.xml").unwrap();
    node.set_encoding("ISO-8859-1").unwrap();
    node.set_formatted(true).unwrap();

    assert_eq!(doc.name(), Some("orders.xml"));
    assert_eq!(doc.encoding(), "ISO-8859-1");
    assert!(doc.is_formatted());
}

#[test]
fn tag_root_descends_through_sources() {
    let mut doc = MappingDocument::new();
    let source = doc.add_source(NodeId::DOCUMENT, "model.orders").unwrap();
    let sequence = doc.add_sequence(source).unwrap();
    let element = doc.add_element(sequence, "order").unwrap();

    assert_eq!(doc.root_node().map(|n| n.id()), Some(source));
    assert_eq!(doc.tag_root().map(|n| n.id()), Some(element));
}

#[test]
fn tag_root_descends_through_criteria() {
    let mut doc = MappingDocument::new();
    let source = doc.add_source(NodeId::DOCUMENT, "model.orders").unwrap();
    let choice = doc.add_choice(source).unwrap();
    let branch = doc
        .add_criteria(choice, CriteriaSpec::when("kind = 'a'"))
        .unwrap();
    let element = doc.add_element(branch, "order").unwrap();

    assert_eq!(doc.tag_root().map(|n| n.id()), Some(element));
}

#[test]
fn iteration_is_document_order() {
    let orders = orders();

    let kinds: Vec<String> = orders
        .doc
        .iter()
        .map(|n| format!("{} {}", n.kind(), n.name().unwrap_or("-")))
        .collect();

    insta::assert_debug_snapshot!(kinds, @r#"
    [
        "document -",
        "element orders",
        "source -",
        "element order",
        "attribute id",
        "comment -",
        "choice -",
        "criteria -",
        "element express",
        "criteria -",
        "element standard",
        "sequence -",
        "source -",
        "element line",
        "recursive element sub-order",
    ]
    "#);
    assert_eq!(orders.doc.node_count(), 15);
}

#[test]
fn find_by_path_ignores_case() {
    let orders = orders();

    let found = orders.doc.find_by_path("ORDERS.Order.@ID").map(|n| n.id());
    assert_eq!(found, Some(orders.id));
    let found = orders.doc.find_by_path("orders.order.line").map(|n| n.id());
    assert_eq!(found, Some(orders.line));
    assert!(orders.doc.find_by_path("orders.missing").is_none());
}

#[test]
fn descendants_of_subtree() {
    let orders = orders();

    let ids: Vec<NodeId> = orders.doc.descendants(orders.lines).map(|n| n.id()).collect();
    assert_eq!(ids, [orders.lines, orders.line]);
}

#[test]
fn equality_is_structural() {
    let a = orders().doc;
    let b = orders().doc;
    assert_eq!(a, b);

    let mut c = orders();
    c.doc.node_mut(c.line).set_optional(true).unwrap();
    assert_ne!(a, c.doc);

    let mut d = orders();
    d.doc.add_attribute(d.order, "extra").unwrap();
    assert_ne!(a, d.doc);
}

#[test]
fn clone_keeps_ids_valid() {
    let orders = orders();
    let mut copy = orders.doc.clone();

    copy.node_mut(orders.order).set_name("purchase").unwrap();

    assert_eq!(copy.node(orders.order).name(), Some("purchase"));
    assert_eq!(orders.doc.node(orders.order).name(), Some("order"));
}

#[test]
fn config_is_kept() {
    let config = Config::new()
        .unresolved_namespaces(UnresolvedNamespacePolicy::Error)
        .max_depth(12);
    let doc = MappingDocument::with_config(config.clone());

    assert_eq!(doc.config(), &config);
    assert_eq!(doc.config().depth_limit(), 12);
    assert_eq!(
        doc.config().unresolved_namespace_policy(),
        UnresolvedNamespacePolicy::Error
    );
}

#[test]
#[should_panic(expected = "node ids are only valid for the document that issued them")]
fn foreign_node_id_panics() {
    let orders = orders();
    let empty = MappingDocument::new();

    let _ = empty.node(orders.line);
}
