//! Arena storage for a mapping document.

use std::fmt;

use indexmap::IndexMap;
use mapdoc_core::{PropertyBag, PropertyKey};

use super::{NodeKind, NodeMut, NodeRef};
use crate::config::Config;

/// Handle to a node inside one `MappingDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The document node, present in every document.
    pub const DOCUMENT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
    pub(crate) props: PropertyBag,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            props: PropertyBag::new(),
        }
    }
}

/// A mapping document and its whole node tree, owned as a unit.
///
/// Cloning copies the arena, so node ids stay valid in the clone.
#[derive(Debug, Clone)]
pub struct MappingDocument {
    pub(crate) nodes: Vec<NodeData>,
    /// Nodes waiting for a namespace declaration, keyed by prefix.
    pub(crate) pending_namespaces: IndexMap<String, Vec<NodeId>>,
    pub(crate) config: Config,
}

impl Default for MappingDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingDocument {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document, None)],
            pending_namespaces: IndexMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// View of a node.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this document.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        self.ensure_node(id);
        NodeRef::new(self, id)
    }

    /// Mutable view of a node, for the resolution phase.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this document.
    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        self.ensure_node(id);
        NodeMut::new(self, id)
    }

    pub fn document(&self) -> NodeRef<'_> {
        NodeRef::new(self, NodeId::DOCUMENT)
    }

    /// The single root: an element or a source.
    pub fn root_node(&self) -> Option<NodeRef<'_>> {
        self.document().children().next()
    }

    /// The element that becomes the XML document element.
    ///
    /// When the root is a source, this is the first element reached through
    /// sources, containers and criteria below it.
    pub fn tag_root(&self) -> Option<NodeRef<'_>> {
        let mut current = self.root_node()?;
        loop {
            if current.kind().is_element() {
                return Some(current);
            }
            current = current.children().find(|c| {
                let kind = c.kind();
                kind.is_element()
                    || kind.is_container()
                    || matches!(kind, NodeKind::Source | NodeKind::Criteria)
            })?;
        }
    }

    /// Document name, encoding and formatting, as shorthand over the
    /// document node's properties.
    pub fn name(&self) -> Option<&str> {
        self.document().properties().str(PropertyKey::DocumentName)
    }

    pub fn encoding(&self) -> &str {
        self.document()
            .properties()
            .str(PropertyKey::DocumentEncoding)
            .unwrap_or("UTF-8")
    }

    pub fn is_formatted(&self) -> bool {
        self.document().properties().flag(PropertyKey::FormattedDocument)
    }

    /// Whether `id` is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == NodeId::DOCUMENT {
                return true;
            }
            match self.ensure_node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// All attached nodes in document order (node, attributes, children).
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.descendants(NodeId::DOCUMENT)
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeRef<'_>> {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let data = self.ensure_node(id);
            stack.extend(data.children.iter().rev());
            stack.extend(data.attributes.iter().rev());
            Some(NodeRef::new(self, id))
        })
    }

    /// Number of attached nodes, the document node included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Find an attached node by its dotted path name, ignoring ASCII case.
    ///
    /// See [`NodeRef::path_name`] for the format.
    pub fn find_by_path(&self, path: &str) -> Option<NodeRef<'_>> {
        self.iter()
            .filter(|n| n.kind().is_named())
            .find(|n| n.path_name().eq_ignore_ascii_case(path))
    }

    /// Number of edges between `id` and the document node.
    pub(crate) fn depth_of(&self, id: NodeId) -> u32 {
        let mut depth = 0;
        let mut current = self.ensure_node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.ensure_node(parent).parent;
        }
        depth
    }

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }
}

/// Documents are equal when their attached trees have the same shape and
/// every corresponding pair of nodes has the same kind and properties.
impl PartialEq for MappingDocument {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: NodeRef<'_>, b: NodeRef<'_>) -> bool {
            a.kind() == b.kind()
                && a == b
                && a.attributes().count() == b.attributes().count()
                && a.children().count() == b.children().count()
                && a.attributes().zip(b.attributes()).all(|(x, y)| same(x, y))
                && a.children().zip(b.children()).all(|(x, y)| same(x, y))
        }
        same(self.document(), other.document())
    }
}

impl Eq for MappingDocument {}
