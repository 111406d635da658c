//! Owned copies of subtrees, and document serialization built on them.
//!
//! A snapshot is plain nested data. Turning one back into nodes replays it
//! through the builder, so everything the builder enforces also holds for
//! copied and deserialized trees. Derived properties (resolved namespaces,
//! recursion-root flags) are recomputed by that replay instead of copied.

use mapdoc_core::{PropertyBag, PropertyKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CriteriaSpec, MappingDocument, NodeId, NodeKind, NodeRef};
use crate::config::Config;
use crate::{Error, Result};

/// A node with its properties, attributes and children, detached from any
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<NodeSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn capture(node: NodeRef<'_>) -> Self {
        Self {
            kind: node.kind(),
            properties: node.properties().clone(),
            attributes: node.attributes().map(Self::capture).collect(),
            children: node.children().map(Self::capture).collect(),
        }
    }
}

/// Set by the `add_*` call itself or recomputed during replay.
fn is_replayed_by_builder(key: PropertyKey) -> bool {
    matches!(
        key,
        PropertyKey::Name
            | PropertyKey::Namespace
            | PropertyKey::CommentText
            | PropertyKey::ResultSetName
            | PropertyKey::CriteriaText
            | PropertyKey::IsDefaultChoice
            | PropertyKey::RecursionMappingClass
            | PropertyKey::IsRecursiveRoot
            | PropertyKey::RecursionId
    )
}

impl MappingDocument {
    /// Snapshot of the whole attached tree.
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot::capture(self.document())
    }

    /// Rebuild a document from a snapshot of its document node.
    pub fn from_snapshot(snapshot: &NodeSnapshot, config: Config) -> Result<Self> {
        if snapshot.kind != NodeKind::Document {
            return Err(Error::InvalidStructure {
                parent: NodeKind::Document,
                child: snapshot.kind,
            });
        }
        let mut doc = Self::with_config(config);
        doc.apply_properties(NodeId::DOCUMENT, &snapshot.properties)?;
        for child in &snapshot.children {
            doc.replay(NodeId::DOCUMENT, child)?;
        }
        Ok(doc)
    }

    /// Deep-copy the subtree at `source` under `new_parent`.
    ///
    /// The copy goes through the same checks as fresh insertion; if any part
    /// is rejected, nothing is added.
    pub fn copy_subtree(&mut self, source: NodeId, new_parent: NodeId) -> Result<NodeId> {
        let snapshot = NodeSnapshot::capture(self.node(source));
        self.insert_snapshot(new_parent, &snapshot)
    }

    /// Add a snapshot, possibly taken from another document, under `parent`.
    ///
    /// All or nothing, like [`Self::copy_subtree`].
    pub fn insert_snapshot(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<NodeId> {
        let mut staged = self.clone();
        let id = staged.replay(parent, snapshot)?;
        *self = staged;
        Ok(id)
    }

    fn replay(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<NodeId> {
        let props = &snapshot.properties;
        let name = props.str(PropertyKey::Name).unwrap_or_default();
        let id = match snapshot.kind {
            NodeKind::Document => {
                return Err(Error::InvalidStructure {
                    parent: self.node(parent).kind(),
                    child: NodeKind::Document,
                });
            }
            NodeKind::Element => self.add_element(parent, name)?,
            NodeKind::RecursiveElement => {
                let class = props
                    .str(PropertyKey::RecursionMappingClass)
                    .unwrap_or_default();
                self.add_recursive_element(parent, name, class)?
            }
            NodeKind::Attribute => self.add_attribute(parent, name)?,
            NodeKind::Comment => {
                let text = props.str(PropertyKey::CommentText).unwrap_or_default();
                self.add_comment(parent, text)?
            }
            NodeKind::Choice => self.add_choice(parent)?,
            NodeKind::Sequence => self.add_sequence(parent)?,
            NodeKind::All => self.add_all(parent)?,
            NodeKind::Source => {
                let result_set = props.str(PropertyKey::ResultSetName).unwrap_or_default();
                self.add_source(parent, result_set)?
            }
            NodeKind::Criteria => {
                let spec = CriteriaSpec {
                    expression: props.str(PropertyKey::CriteriaText).map(str::to_owned),
                    is_default: props.flag(PropertyKey::IsDefaultChoice),
                };
                self.add_criteria(parent, spec)?
            }
        };

        self.apply_properties(id, props)?;
        for attribute in &snapshot.attributes {
            self.replay(id, attribute)?;
        }
        for child in &snapshot.children {
            self.replay(id, child)?;
        }
        Ok(id)
    }

    fn apply_properties(&mut self, id: NodeId, props: &PropertyBag) -> Result<()> {
        for (key, value) in props.iter() {
            if !is_replayed_by_builder(key) {
                self.update_property(id, key, value.clone())?;
            }
        }
        Ok(())
    }
}

impl Serialize for MappingDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MappingDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = NodeSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(&snapshot, Config::default()).map_err(serde::de::Error::custom)
    }
}
