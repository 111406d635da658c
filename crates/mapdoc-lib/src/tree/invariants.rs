//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MappingDocument, NodeData, NodeId};

impl MappingDocument {
    pub(crate) fn ensure_node(&self, id: NodeId) -> &NodeData {
        self.nodes.get(id.index()).unwrap_or_else(|| {
            panic!(
                "MappingDocument: node {id} not found \
                 (node ids are only valid for the document that issued them)"
            )
        })
    }

    pub(crate) fn ensure_node_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.nodes.get_mut(id.index()).unwrap_or_else(|| {
            panic!(
                "MappingDocument: node {id} not found \
                 (node ids are only valid for the document that issued them)"
            )
        })
    }
}
