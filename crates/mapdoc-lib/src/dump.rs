//! Textual tree printer, mainly for tests and debugging.

use std::fmt::Write;

use mapdoc_core::{PropertyKey, PropertyValue};

use crate::tree::{MappingDocument, NodeKind, NodeRef};

pub struct DocumentPrinter<'d> {
    doc: &'d MappingDocument,
    properties: bool,
    ids: bool,
}

impl<'d> DocumentPrinter<'d> {
    pub fn new(doc: &'d MappingDocument) -> Self {
        Self {
            doc,
            properties: false,
            ids: false,
        }
    }

    /// Append locally set properties to each line.
    pub fn with_properties(mut self, value: bool) -> Self {
        self.properties = value;
        self
    }

    /// Prefix each line with the node id.
    pub fn with_ids(mut self, value: bool) -> Self {
        self.ids = value;
        self
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        self.format_node(self.doc.document(), 0, w)
    }

    fn format_node(&self, node: NodeRef<'_>, indent: usize, w: &mut impl Write) -> std::fmt::Result {
        write!(w, "{:indent$}", "", indent = indent * 2)?;
        if self.ids {
            write!(w, "{} ", node.id())?;
        }
        write!(w, "{}", node.kind())?;
        let label = node_label(node);
        if !label.is_empty() {
            write!(w, " {label}")?;
        }
        if self.properties {
            let props: Vec<String> = node
                .properties()
                .iter()
                .map(|(k, v)| format!("{k}={}", format_value(v)))
                .collect();
            if !props.is_empty() {
                write!(w, " [{}]", props.join(" "))?;
            }
        }
        writeln!(w)?;

        for attribute in node.attributes() {
            self.format_node(attribute, indent + 1, w)?;
        }
        for child in node.children() {
            self.format_node(child, indent + 1, w)?;
        }
        Ok(())
    }
}

/// Short human-readable identification of a node, without its kind.
pub(crate) fn node_label(node: NodeRef<'_>) -> String {
    match node.kind() {
        NodeKind::Document => node
            .properties()
            .str(PropertyKey::DocumentName)
            .unwrap_or_default()
            .to_owned(),
        NodeKind::Source => node.result_set_name().unwrap_or_default().to_owned(),
        NodeKind::Element | NodeKind::Attribute => node.qualified_name().unwrap_or_default(),
        NodeKind::RecursiveElement => format!(
            "{} -> {}",
            node.qualified_name().unwrap_or_default(),
            node.mapping_class().unwrap_or_default()
        ),
        NodeKind::Comment => format!("{:?}", node.comment_text().unwrap_or_default()),
        NodeKind::Criteria if node.is_default_choice() => "default".to_owned(),
        NodeKind::Criteria => format!("when {:?}", node.criteria_text().unwrap_or_default()),
        NodeKind::Choice | NodeKind::Sequence | NodeKind::All => {
            node.result_set_name().unwrap_or_default().to_owned()
        }
    }
}

fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Normalize(n) => n.as_str().to_owned(),
        PropertyValue::Str(s) => format!("{s:?}"),
        PropertyValue::StrList(list) => format!("[{}]", list.join(", ")),
        PropertyValue::Criteria(handle) => format!("#{}", handle.0),
        PropertyValue::Symbol(symbol) => format!("{}:{}", symbol.kind().as_str(), symbol),
        PropertyValue::Namespace(binding) => binding.to_string(),
        PropertyValue::SymbolMap(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(from, to)| {
                    format!("{}:{from}->{to}", from.kind().as_str())
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        PropertyValue::Declarations(declarations) => {
            let entries: Vec<String> = declarations
                .iter()
                .map(|(prefix, uri)| format!("{prefix}={uri}"))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
