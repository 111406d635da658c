//! Namespace resolution, including prefixes used before they are declared.
//!
//! A node's prefix is resolved as soon as it is set: the node's own
//! declarations first, then those of its element ancestors. A prefix with no
//! declaration in scope gets a `Pending` binding and is recorded in the
//! document's pending table. Declaring that prefix later, anywhere in the
//! document, patches every pending node. Whatever is still pending when
//! `finish` runs is handled according to the configured policy.

use indexmap::IndexMap;
use mapdoc_core::{NamespaceBinding, PropertyKey, PropertyValue};
use tracing::{debug, warn};

use crate::config::UnresolvedNamespacePolicy;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::tree::{MappingDocument, NodeId, NodeKind};
use crate::{Error, Result};

impl MappingDocument {
    /// Declare `xmlns:prefix="uri"` on an element; an empty prefix declares
    /// the default namespace.
    ///
    /// Nodes in scope that use `prefix` are re-resolved, and nodes anywhere
    /// still waiting on `prefix` are bound to `uri`.
    pub fn declare_namespace(&mut self, node: NodeId, prefix: &str, uri: &str) -> Result<()> {
        let mut declarations = self
            .node(node)
            .namespace_declarations()
            .cloned()
            .unwrap_or_default();
        declarations.insert(prefix.to_owned(), uri.to_owned());
        self.update_property(
            node,
            PropertyKey::NamespaceDeclarations,
            PropertyValue::Declarations(declarations),
        )
    }

    /// Resolve `prefix` as seen from `node`.
    ///
    /// Returns `None` for the empty prefix when no default namespace is in
    /// scope, and a pending binding for any other undeclared prefix.
    pub fn resolve_namespace(&self, node: NodeId, prefix: &str) -> Option<NamespaceBinding> {
        if let Some(builtin) = NamespaceBinding::builtin(prefix) {
            return Some(builtin);
        }

        let declared = self
            .node(node)
            .ancestors_inclusive()
            .filter(|n| n.kind().is_element())
            .find_map(|n| n.namespace_declarations()?.get(prefix));
        match declared {
            Some(uri) => Some(NamespaceBinding::resolved(prefix, uri.as_str())),
            None if prefix.is_empty() => None,
            None => Some(NamespaceBinding::pending(prefix)),
        }
    }

    /// Prefixes still waiting for a declaration, with the nodes using them.
    pub fn pending_namespaces(&self) -> &IndexMap<String, Vec<NodeId>> {
        &self.pending_namespaces
    }

    /// Complete the document after the last fragment has been added.
    ///
    /// Re-resolves any leftover pending prefixes, applies the unresolved
    /// namespace policy, and reports findings that do not prevent use.
    pub fn finish(&mut self) -> Result<Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let pending = self.pending_namespaces.clone();
        debug!("finish: {} pending prefixes", pending.len());

        for (prefix, nodes) in pending {
            for id in nodes {
                if !self.is_attached(id) {
                    continue;
                }
                let binding = self.resolve_namespace(id, &prefix);
                if binding.as_ref().is_some_and(NamespaceBinding::is_pending) {
                    let node = self.node(id);
                    match self.config.unresolved_namespace_policy() {
                        UnresolvedNamespacePolicy::Error => {
                            return Err(Error::UnresolvedNamespace {
                                prefix,
                                node: node.path_name(),
                            });
                        }
                        UnresolvedNamespacePolicy::Placeholder => {
                            warn!("finish: prefix `{}` on {} is never declared", prefix, id);
                            diagnostics
                                .report(DiagnosticKind::UnresolvedNamespace, node)
                                .message(&prefix)
                                .emit();
                        }
                    }
                }
                self.store_binding(id, binding)?;
            }
        }
        self.pending_namespaces.clear();

        self.check_completed(&mut diagnostics);
        Ok(diagnostics)
    }

    fn check_completed(&self, diagnostics: &mut Diagnostics) {
        for node in self.iter() {
            if node.kind() == NodeKind::Choice && node.children().next().is_none() {
                diagnostics.report(DiagnosticKind::EmptyChoice, node).emit();
            }
            if node.fixed_value().is_some() && node.default_value().is_some() {
                diagnostics
                    .report(DiagnosticKind::FixedAndDefaultValue, node)
                    .emit();
            }
            let min = node.min_occurs();
            let max = node.max_occurs();
            if min < 0 || max.is_some_and(|max| min > max) {
                let max = max.map_or_else(|| "unbounded".to_owned(), |m| m.to_string());
                diagnostics
                    .report(DiagnosticKind::InvalidOccurrence, node)
                    .message(format!("{min}..{max}"))
                    .emit();
            }
        }
    }

    /// Resolve the prefix just set on `id` and track it if still pending.
    pub(crate) fn register_prefix(&mut self, id: NodeId, prefix: &str) -> Result<()> {
        self.forget_pending(id);
        let binding = self.resolve_namespace(id, prefix);
        if binding.as_ref().is_some_and(NamespaceBinding::is_pending) {
            debug!("namespace: {} waits for prefix `{}`", id, prefix);
            self.pending_namespaces
                .entry(prefix.to_owned())
                .or_default()
                .push(id);
        }
        self.store_binding(id, binding)
    }

    /// Drop `id` from the pending table.
    pub(crate) fn forget_pending(&mut self, id: NodeId) {
        self.pending_namespaces.retain(|_, nodes| {
            nodes.retain(|n| *n != id);
            !nodes.is_empty()
        });
    }

    /// Bring bindings up to date after `declaring` declared `prefix`.
    pub(crate) fn refresh_prefix(&mut self, declaring: NodeId, prefix: &str) -> Result<()> {
        let in_scope: Vec<NodeId> = self
            .descendants(declaring)
            .filter(|n| n.namespace_prefix() == Some(prefix))
            .map(|n| n.id())
            .collect();
        for id in in_scope {
            self.register_prefix(id, prefix)?;
        }

        let Some(waiting) = self.pending_namespaces.shift_remove(prefix) else {
            return Ok(());
        };
        let Some(uri) = self
            .node(declaring)
            .namespace_declarations()
            .and_then(|d| d.get(prefix))
            .cloned()
        else {
            return Ok(());
        };
        debug!(
            "namespace: `{}` declared on {} patches {} pending nodes",
            prefix,
            declaring,
            waiting.len()
        );
        for id in waiting {
            let binding = NamespaceBinding::resolved(prefix, uri.as_str());
            self.store_binding(id, Some(binding))?;
        }
        Ok(())
    }

    /// Re-resolve every node bound to a declaration of `prefix` that was
    /// just removed. Nodes with no other declaration in scope go back to the
    /// pending table.
    pub(crate) fn withdraw_prefix(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let bound: Vec<NodeId> = self
            .iter()
            .filter(|n| n.namespace_prefix() == Some(prefix))
            .filter(|n| n.namespace().and_then(NamespaceBinding::uri) == Some(uri))
            .map(|n| n.id())
            .collect();
        debug!(
            "namespace: `{}` = `{}` withdrawn, {} nodes re-resolved",
            prefix,
            uri,
            bound.len()
        );
        for id in bound {
            self.register_prefix(id, prefix)?;
        }
        Ok(())
    }

    fn store_binding(&mut self, id: NodeId, binding: Option<NamespaceBinding>) -> Result<()> {
        let props = &mut self.ensure_node_mut(id).props;
        match binding {
            Some(binding) => props.set(PropertyKey::Namespace, binding.into())?,
            None => {
                props.clear(PropertyKey::Namespace);
            }
        }
        Ok(())
    }
}
