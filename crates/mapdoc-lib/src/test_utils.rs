use crate::{CriteriaSpec, DocumentPrinter, MappingDocument, NodeId};

/// Handles into the document built by [`orders`].
pub(crate) struct Orders {
    pub doc: MappingDocument,
    pub root: NodeId,
    pub source: NodeId,
    pub order: NodeId,
    pub id: NodeId,
    pub comment: NodeId,
    pub choice: NodeId,
    pub express: NodeId,
    pub fallback: NodeId,
    pub lines: NodeId,
    pub line: NodeId,
    pub sub_order: NodeId,
}

/// ```text
/// orders
///   source model.orders
///     order
///       @id
///       comment
///       choice
///         criteria when "kind = 'express'"
///           element express
///         criteria default
///           element standard
///       sequence
///         source model.lines
///           element line
///       recursive element sub-order -> model.orders
/// ```
pub(crate) fn orders() -> Orders {
    let mut doc = MappingDocument::new();
    let root = doc.add_element(NodeId::DOCUMENT, "orders").unwrap();
    let source = doc.add_source(root, "model.orders").unwrap();
    let order = doc.add_element(source, "order").unwrap();
    let id = doc.add_attribute(order, "id").unwrap();
    let comment = doc.add_comment(order, "one per row").unwrap();
    let choice = doc.add_choice(order).unwrap();
    let express = doc
        .add_criteria(choice, CriteriaSpec::when("kind = 'express'"))
        .unwrap();
    doc.add_element(express, "express").unwrap();
    let fallback = doc.add_criteria(choice, CriteriaSpec::otherwise()).unwrap();
    doc.add_element(fallback, "standard").unwrap();
    let sequence = doc.add_sequence(order).unwrap();
    let lines = doc.add_source(sequence, "model.lines").unwrap();
    let line = doc.add_element(lines, "line").unwrap();
    let sub_order = doc
        .add_recursive_element(order, "sub-order", "model.orders")
        .unwrap();

    Orders {
        doc,
        root,
        source,
        order,
        id,
        comment,
        choice,
        express,
        fallback,
        lines,
        line,
        sub_order,
    }
}

pub(crate) fn dump(doc: &MappingDocument) -> String {
    DocumentPrinter::new(doc).dump()
}

pub(crate) fn dump_properties(doc: &MappingDocument) -> String {
    DocumentPrinter::new(doc).with_properties(true).dump()
}
