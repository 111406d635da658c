use crate::{
    Config, DiagnosticKind, Error, MappingDocument, NamespaceBinding, NamespaceDeclarations,
    NodeId, NodeKind, PropertyKey, PropertyValue, UnresolvedNamespacePolicy,
};

fn uri_of(doc: &MappingDocument, id: NodeId) -> Option<&str> {
    doc.node(id).namespace().and_then(|ns| ns.uri())
}

#[test]
fn prefix_declared_on_self() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "po:order").unwrap();
    doc.declare_namespace(root, "po", "urn:po").unwrap();

    assert_eq!(uri_of(&doc, root), Some("urn:po"));
    assert!(doc.pending_namespaces().is_empty());
}

#[test]
fn forward_reference_is_patched() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let early = doc.add_element(root, "ns1:early").unwrap();

    assert_eq!(
        doc.node(early).namespace(),
        Some(&NamespaceBinding::pending("ns1"))
    );
    assert_eq!(doc.pending_namespaces().get("ns1"), Some(&vec![early]));

    // Declared on a sibling, outside `early`'s scope.
    let late = doc.add_element(root, "late").unwrap();
    doc.declare_namespace(late, "ns1", "urn:x").unwrap();

    assert_eq!(uri_of(&doc, early), Some("urn:x"));
    assert!(doc.pending_namespaces().is_empty());
    assert!(doc.finish().unwrap().is_empty());
}

#[test]
fn nearest_declaration_wins() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    doc.declare_namespace(root, "p", "urn:outer").unwrap();
    let inner = doc.add_element(root, "inner").unwrap();
    doc.declare_namespace(inner, "p", "urn:inner").unwrap();
    let a = doc.add_element(inner, "p:a").unwrap();
    let b = doc.add_element(root, "p:b").unwrap();
    let attr = doc.add_attribute(inner, "p:flag").unwrap();

    assert_eq!(uri_of(&doc, a), Some("urn:inner"));
    assert_eq!(uri_of(&doc, b), Some("urn:outer"));
    assert_eq!(uri_of(&doc, attr), Some("urn:inner"));
}

#[test]
fn declaration_rebinds_descendants_in_scope() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    doc.declare_namespace(root, "p", "urn:outer").unwrap();
    let inner = doc.add_element(root, "inner").unwrap();
    let a = doc.add_element(inner, "p:a").unwrap();
    assert_eq!(uri_of(&doc, a), Some("urn:outer"));

    doc.declare_namespace(inner, "p", "urn:inner").unwrap();

    assert_eq!(uri_of(&doc, a), Some("urn:inner"));
}

/// root declares `ns1`, child `ns1:c` uses it.
fn declared_child(config: Config) -> (MappingDocument, NodeId, NodeId) {
    let mut doc = MappingDocument::with_config(config);
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    doc.declare_namespace(root, "ns1", "urn:x").unwrap();
    let child = doc.add_element(root, "ns1:c").unwrap();
    assert_eq!(uri_of(&doc, child), Some("urn:x"));
    (doc, root, child)
}

#[test]
fn replacing_declarations_withdraws_prefix() {
    let (mut doc, root, child) = declared_child(Config::new());

    doc.node_mut(root)
        .set_property(
            PropertyKey::NamespaceDeclarations,
            PropertyValue::Declarations(NamespaceDeclarations::new()),
        )
        .unwrap();

    assert_eq!(
        doc.node(child).namespace(),
        Some(&NamespaceBinding::pending("ns1"))
    );
    assert_eq!(doc.pending_namespaces().get("ns1"), Some(&vec![child]));
    insta::assert_snapshot!(doc.finish().unwrap().render(), @"warning: namespace prefix `ns1` is never declared (at N2 `root.c`)");
}

#[test]
fn clearing_declarations_withdraws_prefix() {
    let config = Config::new().unresolved_namespaces(UnresolvedNamespacePolicy::Error);
    let (mut doc, root, child) = declared_child(config);

    let removed = doc
        .node_mut(root)
        .clear_property(PropertyKey::NamespaceDeclarations)
        .unwrap();

    assert!(removed.is_some());
    assert!(doc.node(child).namespace().is_some_and(NamespaceBinding::is_pending));
    assert_eq!(
        doc.finish().unwrap_err(),
        Error::UnresolvedNamespace {
            prefix: "ns1".to_owned(),
            node: "root.c".to_owned(),
        }
    );
}

#[test]
fn withdrawn_prefix_falls_back_to_outer_declaration() {
    let (mut doc, root, _) = declared_child(Config::new());
    let inner = doc.add_element(root, "inner").unwrap();
    doc.declare_namespace(inner, "ns1", "urn:inner").unwrap();
    let deep = doc.add_element(inner, "ns1:deep").unwrap();
    assert_eq!(uri_of(&doc, deep), Some("urn:inner"));

    doc.node_mut(inner)
        .clear_property(PropertyKey::NamespaceDeclarations)
        .unwrap();

    assert_eq!(uri_of(&doc, deep), Some("urn:x"));
    assert!(doc.pending_namespaces().is_empty());
}

#[test]
fn withdrawn_forward_reference_waits_again() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let early = doc.add_element(root, "ns1:early").unwrap();
    let late = doc.add_element(root, "late").unwrap();
    doc.declare_namespace(late, "ns1", "urn:x").unwrap();
    assert_eq!(uri_of(&doc, early), Some("urn:x"));

    let mut moved = NamespaceDeclarations::new();
    moved.insert("ns1".to_owned(), "urn:y".to_owned());
    doc.node_mut(late)
        .set_property(PropertyKey::NamespaceDeclarations, PropertyValue::Declarations(moved))
        .unwrap();
    assert_eq!(uri_of(&doc, early), Some("urn:y"));

    doc.node_mut(late)
        .clear_property(PropertyKey::NamespaceDeclarations)
        .unwrap();
    assert_eq!(doc.pending_namespaces().get("ns1"), Some(&vec![early]));
}

#[test]
fn prefix_set_after_creation() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    doc.declare_namespace(root, "q", "urn:q").unwrap();
    let item = doc.add_element(root, "item").unwrap();
    assert_eq!(doc.node(item).namespace(), None);

    doc.node_mut(item).set_namespace_prefix("q").unwrap();
    assert_eq!(uri_of(&doc, item), Some("urn:q"));

    doc.node_mut(item)
        .clear_property(crate::PropertyKey::NamespacePrefix)
        .unwrap();
    assert_eq!(doc.node(item).namespace(), None);
}

#[test]
fn empty_prefix_uses_default_namespace() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let item = doc.add_element(root, "item").unwrap();

    assert_eq!(doc.resolve_namespace(item, ""), None);

    doc.declare_namespace(root, "", "urn:default").unwrap();
    assert_eq!(
        doc.resolve_namespace(item, ""),
        Some(NamespaceBinding::resolved("", "urn:default"))
    );
    assert_eq!(
        doc.resolve_namespace(item, "xml"),
        NamespaceBinding::builtin("xml")
    );
    assert_eq!(
        doc.resolve_namespace(item, "zz"),
        Some(NamespaceBinding::pending("zz"))
    );
}

#[test]
fn finish_keeps_placeholder_and_warns() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let item = doc.add_element(root, "zz:item").unwrap();

    let diagnostics = doc.finish().unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert!(!diagnostics.has_errors());
    let warning = diagnostics.iter().next().unwrap();
    assert_eq!(warning.kind(), DiagnosticKind::UnresolvedNamespace);
    assert_eq!(warning.node(), item);
    insta::assert_snapshot!(diagnostics.render(), @"warning: namespace prefix `zz` is never declared (at N2 `root.item`)");

    assert!(doc.node(item).namespace().is_some_and(NamespaceBinding::is_pending));
    assert!(doc.pending_namespaces().is_empty());
}

#[test]
fn finish_fails_under_error_policy() {
    let config = Config::new().unresolved_namespaces(UnresolvedNamespacePolicy::Error);
    let mut doc = MappingDocument::with_config(config);
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let item = doc.add_element(root, "zz:item").unwrap();

    let err = doc.finish().unwrap_err();

    assert_eq!(
        err,
        Error::UnresolvedNamespace {
            prefix: "zz".to_owned(),
            node: "root.item".to_owned(),
        }
    );
    insta::assert_snapshot!(err, @"namespace prefix `zz` used by `root.item` is never declared");
    assert_eq!(doc.pending_namespaces().get("zz"), Some(&vec![item]));

    doc.declare_namespace(root, "zz", "urn:zz").unwrap();
    assert!(doc.finish().unwrap().is_empty());
    assert_eq!(uri_of(&doc, item), Some("urn:zz"));
}

#[test]
fn finish_skips_detached_nodes() {
    let mut doc = MappingDocument::new();
    let old = doc.add_element(NodeId::DOCUMENT, "old").unwrap();
    doc.add_element(old, "zz:item").unwrap();
    doc.add_element(NodeId::DOCUMENT, "new").unwrap();

    assert!(doc.finish().unwrap().is_empty());
}

#[test]
fn only_elements_declare_namespaces() {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "root").unwrap();
    let source = doc.add_source(root, "model.rs").unwrap();
    let attr = doc.add_attribute(root, "id").unwrap();

    let err = doc.declare_namespace(source, "p", "urn:p").unwrap_err();
    assert_eq!(err, Error::InvalidNamespaceScope(NodeKind::Source));
    insta::assert_snapshot!(err, @"source cannot declare namespaces");
    assert!(doc.declare_namespace(attr, "p", "urn:p").is_err());
    assert!(doc.declare_namespace(NodeId::DOCUMENT, "p", "urn:p").is_err());
}
