//! Validating insertion and property updates.
//!
//! Every `add_*` operation checks the parent/child pairing, the nesting
//! depth and any kind-specific rule before the arena is touched, so a
//! rejected call leaves the document exactly as it was.

use mapdoc_core::{PropertyError, PropertyKey, PropertyValue};
use tracing::debug;

use super::{MappingDocument, NodeData, NodeId, NodeKind};
use crate::{CriteriaViolation, Error, Result};

/// Contents of a criteria branch at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSpec {
    /// Boolean expression source; required unless `is_default`.
    pub expression: Option<String>,
    pub is_default: bool,
}

impl CriteriaSpec {
    /// A branch taken when `expression` holds.
    pub fn when(expression: impl Into<String>) -> Self {
        Self {
            expression: Some(expression.into()),
            is_default: false,
        }
    }

    /// The branch taken when no other branch matches.
    pub fn otherwise() -> Self {
        Self {
            expression: None,
            is_default: true,
        }
    }
}

/// Where an accepted child goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Append,
    Attribute,
    ReplaceRoot,
}

/// Decide whether `child` may be added under `parent`.
pub(crate) fn placement(parent: NodeKind, child: NodeKind) -> Result<Placement> {
    use NodeKind::*;

    let invalid = || Error::InvalidStructure { parent, child };
    match (parent, child) {
        (_, Document) => Err(invalid()),
        (Choice, Criteria) => Ok(Placement::Append),
        (Choice, _) => Err(invalid()),
        (Document, Element | Source) => Ok(Placement::ReplaceRoot),
        (Document, _) => Err(invalid()),
        (Attribute | Comment, _) => Err(invalid()),
        (Element | RecursiveElement, Attribute) => Ok(Placement::Attribute),
        (Element | RecursiveElement, Comment) => Ok(Placement::Append),
        (RecursiveElement, _) => Err(invalid()),
        (_, Attribute | Comment) => Err(invalid()),
        (Sequence | All, Criteria) => Err(invalid()),
        _ => Ok(Placement::Append),
    }
}

/// Split `prefix:local` into its parts.
fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (Some(prefix), local),
        _ => (None, name),
    }
}

impl MappingDocument {
    /// Add an element named `name`, optionally qualified as `prefix:local`.
    ///
    /// Under the document node this replaces the current root, and the new
    /// root's cardinality is fixed at exactly one.
    pub fn add_element(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::Element)?;
        let id = self.link(parent, placement, NodeKind::Element);
        self.set_qualified_name(id, name)?;
        Ok(id)
    }

    /// Add an element that re-enters the fragment rooted at the nearest
    /// ancestor source whose result set is `mapping_class`.
    ///
    /// Fails with [`Error::InvalidRecursion`] when no such source exists.
    pub fn add_recursive_element(
        &mut self,
        parent: NodeId,
        name: &str,
        mapping_class: &str,
    ) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::RecursiveElement)?;
        let Some(anchor) = self.find_recursion_anchor(parent, mapping_class) else {
            return Err(Error::InvalidRecursion {
                element: name.to_owned(),
                mapping_class: mapping_class.to_owned(),
            });
        };

        let id = self.link(parent, placement, NodeKind::RecursiveElement);
        self.set_qualified_name(id, name)?;
        self.ensure_node_mut(id)
            .props
            .set(PropertyKey::RecursionMappingClass, mapping_class.into())?;
        self.mark_recursion_root(anchor, mapping_class)?;
        Ok(id)
    }

    pub fn add_attribute(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::Attribute)?;
        let id = self.link(parent, placement, NodeKind::Attribute);
        self.set_qualified_name(id, name)?;
        Ok(id)
    }

    pub fn add_comment(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::Comment)?;
        let id = self.link(parent, placement, NodeKind::Comment);
        self.ensure_node_mut(id)
            .props
            .set(PropertyKey::CommentText, text.into())?;
        Ok(id)
    }

    pub fn add_choice(&mut self, parent: NodeId) -> Result<NodeId> {
        self.add_container(parent, NodeKind::Choice)
    }

    pub fn add_sequence(&mut self, parent: NodeId) -> Result<NodeId> {
        self.add_container(parent, NodeKind::Sequence)
    }

    pub fn add_all(&mut self, parent: NodeId) -> Result<NodeId> {
        self.add_container(parent, NodeKind::All)
    }

    fn add_container(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        let placement = self.check_insert(parent, kind)?;
        Ok(self.link(parent, placement, kind))
    }

    /// Add a join point to the result set `result_set_name`.
    pub fn add_source(&mut self, parent: NodeId, result_set_name: &str) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::Source)?;
        let id = self.link(parent, placement, NodeKind::Source);
        self.ensure_node_mut(id)
            .props
            .set(PropertyKey::ResultSetName, result_set_name.into())?;
        Ok(id)
    }

    /// Add a guarded branch.
    ///
    /// A choice holds at most one default branch, and every other branch
    /// needs expression text.
    pub fn add_criteria(&mut self, parent: NodeId, spec: CriteriaSpec) -> Result<NodeId> {
        let placement = self.check_insert(parent, NodeKind::Criteria)?;
        self.check_criteria(parent, None, spec.is_default, spec.expression.as_deref())?;

        let id = self.link(parent, placement, NodeKind::Criteria);
        let props = &mut self.ensure_node_mut(id).props;
        if let Some(expression) = spec.expression {
            props.set(PropertyKey::CriteriaText, expression.into())?;
        }
        props.set(PropertyKey::IsDefaultChoice, spec.is_default.into())?;
        Ok(id)
    }

    fn check_insert(&self, parent: NodeId, kind: NodeKind) -> Result<Placement> {
        let placement = placement(self.ensure_node(parent).kind, kind)?;
        let max = self.config.max_depth;
        if self.depth_of(parent) >= max {
            return Err(Error::DepthLimitExceeded { max });
        }
        Ok(placement)
    }

    /// Validate a criteria node's default flag and expression.
    ///
    /// `node` is the criteria being updated, if it already exists, so it is
    /// not counted against itself.
    fn check_criteria(
        &self,
        parent: NodeId,
        node: Option<NodeId>,
        is_default: bool,
        expression: Option<&str>,
    ) -> Result<()> {
        if is_default {
            let parent = self.node(parent);
            let taken = parent.kind() == NodeKind::Choice
                && parent
                    .children()
                    .any(|c| Some(c.id()) != node && c.is_default_choice());
            if taken {
                return Err(Error::InvalidCriteria(CriteriaViolation::MultipleDefaults));
            }
        } else if expression.is_none_or(|e| e.trim().is_empty()) {
            return Err(Error::InvalidCriteria(CriteriaViolation::MissingExpression));
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, placement: Placement, kind: NodeKind) -> NodeId {
        let id = self.push_node(NodeData::new(kind, Some(parent)));
        match placement {
            Placement::Append => self.ensure_node_mut(parent).children.push(id),
            Placement::Attribute => self.ensure_node_mut(parent).attributes.push(id),
            Placement::ReplaceRoot => {
                let root = &mut self.ensure_node_mut(parent).children;
                let previous = std::mem::replace(root, vec![id]);
                for old in previous {
                    self.ensure_node_mut(old).parent = None;
                    debug!("replace_root: detached {} for {}", old, id);
                }
            }
        }
        debug!("add: {} {} under {}", kind, id, parent);
        id
    }

    /// Store `name`, splitting a `prefix:local` form into name and prefix.
    /// An unqualified name leaves the current prefix alone.
    pub(crate) fn set_qualified_name(&mut self, id: NodeId, name: &str) -> Result<()> {
        let (prefix, local) = split_qualified(name);
        self.ensure_node_mut(id)
            .props
            .set(PropertyKey::Name, local.into())?;
        if let Some(prefix) = prefix {
            self.update_property(id, PropertyKey::NamespacePrefix, prefix.into())?;
        }
        Ok(())
    }

    fn is_root_element(&self, id: NodeId) -> bool {
        let data = self.ensure_node(id);
        data.kind == NodeKind::Element && data.parent == Some(NodeId::DOCUMENT)
    }

    /// Single entry point for property writes after insertion.
    ///
    /// Rejects values of the wrong kind and changes that would break a
    /// structural rule; keys other nodes depend on are propagated.
    pub(crate) fn update_property(
        &mut self,
        id: NodeId,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<()> {
        if value.kind() != key.kind() {
            return Err(PropertyError::KindMismatch {
                key,
                expected: key.kind(),
                found: value.kind(),
            }
            .into());
        }

        let node = self.node(id);
        match (key, &value) {
            (PropertyKey::MinOccurs | PropertyKey::MaxOccurs, _) if self.is_root_element(id) => {
                debug!("set_property: {} ignored on root element {}", key, id);
                return Ok(());
            }
            (PropertyKey::IsDefaultChoice, PropertyValue::Bool(is_default))
                if node.kind() == NodeKind::Criteria =>
            {
                if let Some(parent) = node.parent() {
                    self.check_criteria(parent.id(), Some(id), *is_default, node.criteria_text())?;
                }
            }
            (PropertyKey::CriteriaText, PropertyValue::Str(text))
                if node.kind() == NodeKind::Criteria =>
            {
                if let Some(parent) = node.parent() {
                    let is_default = node.is_default_choice();
                    self.check_criteria(parent.id(), Some(id), is_default, Some(text.as_str()))?;
                }
            }
            (PropertyKey::NamespaceDeclarations, PropertyValue::Declarations(declarations)) => {
                if !node.kind().is_element() {
                    return Err(Error::InvalidNamespaceScope(node.kind()));
                }
                let withdrawn: Vec<(String, String)> = node
                    .namespace_declarations()
                    .into_iter()
                    .flatten()
                    .filter(|&(prefix, uri)| declarations.get(prefix) != Some(uri))
                    .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
                    .collect();
                let declarations = declarations.clone();
                self.ensure_node_mut(id).props.set(key, value)?;
                for (prefix, uri) in &withdrawn {
                    self.withdraw_prefix(prefix, uri)?;
                }
                for prefix in declarations.keys() {
                    self.refresh_prefix(id, prefix)?;
                }
                return Ok(());
            }
            (PropertyKey::NamespacePrefix, PropertyValue::Str(prefix)) => {
                let prefix = prefix.clone();
                self.ensure_node_mut(id).props.set(key, value)?;
                self.register_prefix(id, &prefix)?;
                return Ok(());
            }
            (PropertyKey::RecursionMappingClass, PropertyValue::Str(class))
                if node.kind() == NodeKind::RecursiveElement =>
            {
                let anchor = node
                    .parent()
                    .and_then(|p| self.find_recursion_anchor(p.id(), class));
                let Some(anchor) = anchor else {
                    return Err(Error::InvalidRecursion {
                        element: node.name().unwrap_or_default().to_owned(),
                        mapping_class: class.clone(),
                    });
                };
                let previous = node
                    .mapping_class()
                    .and_then(|old| self.find_recursion_anchor(node.parent()?.id(), old));
                let class = class.clone();
                self.ensure_node_mut(id).props.set(key, value)?;
                self.mark_recursion_root(anchor, &class)?;
                if let Some(previous) = previous.filter(|&p| p != anchor) {
                    self.release_recursion_root(previous);
                }
                return Ok(());
            }
            _ => {}
        }

        self.ensure_node_mut(id).props.set(key, value)?;
        Ok(())
    }

    /// Clear a local value, subject to the same rules as [`Self::update_property`].
    pub(crate) fn remove_property(
        &mut self,
        id: NodeId,
        key: PropertyKey,
    ) -> Result<Option<PropertyValue>> {
        let node = self.node(id);
        match key {
            PropertyKey::CriteriaText if node.kind() == NodeKind::Criteria => {
                if let Some(parent) = node.parent() {
                    self.check_criteria(parent.id(), Some(id), node.is_default_choice(), None)?;
                }
            }
            PropertyKey::IsDefaultChoice if node.kind() == NodeKind::Criteria => {
                if let Some(parent) = node.parent() {
                    self.check_criteria(parent.id(), Some(id), false, node.criteria_text())?;
                }
            }
            PropertyKey::NamespacePrefix => {
                self.forget_pending(id);
                self.ensure_node_mut(id).props.clear(PropertyKey::Namespace);
            }
            PropertyKey::NamespaceDeclarations => {
                let withdrawn: Vec<(String, String)> = node
                    .namespace_declarations()
                    .into_iter()
                    .flatten()
                    .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
                    .collect();
                let removed = self.ensure_node_mut(id).props.clear(key);
                for (prefix, uri) in &withdrawn {
                    self.withdraw_prefix(prefix, uri)?;
                }
                return Ok(removed);
            }
            _ => {}
        }
        Ok(self.ensure_node_mut(id).props.clear(key))
    }
}
