use super::{TraversalControl, Visitor, dispatch};
use crate::tree::{MappingDocument, NodeRef};

/// Whole-tree traversal that reports every node to a delegate.
///
/// An element's attributes are visited before its structural children.
/// A recursive element's own attributes are visited, but its fragment is
/// walked once, at its anchor.
pub struct Navigator<V> {
    pre_order: bool,
    delegate: V,
}

impl<V: Visitor> Navigator<V> {
    /// With `pre_order`, each node is reported before its contents;
    /// otherwise after.
    pub fn new(pre_order: bool, delegate: V) -> Self {
        Self {
            pre_order,
            delegate,
        }
    }

    pub fn is_pre_order(&self) -> bool {
        self.pre_order
    }

    pub fn delegate(&self) -> &V {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut V {
        &mut self.delegate
    }

    pub fn into_inner(self) -> V {
        self.delegate
    }

    /// Walk the whole document.
    pub fn navigate(&mut self, doc: &MappingDocument) -> TraversalControl {
        self.walk(doc.document())
    }

    /// Walk the subtree rooted at `node`.
    pub fn walk(&mut self, node: NodeRef<'_>) -> TraversalControl {
        if self.pre_order && dispatch(&mut self.delegate, node).is_stop() {
            return TraversalControl::Stop;
        }

        for attribute in node.attributes() {
            if self.walk(attribute).is_stop() {
                return TraversalControl::Stop;
            }
        }
        if !node.kind().is_traversal_leaf() {
            for child in node.children() {
                if self.walk(child).is_stop() {
                    return TraversalControl::Stop;
                }
            }
        }

        if !self.pre_order {
            return dispatch(&mut self.delegate, node);
        }
        TraversalControl::Continue
    }
}

/// A navigator can itself be dispatched, e.g. from another visitor's walk.
impl<V: Visitor> Visitor for Navigator<V> {
    fn visit_node(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.walk(node)
    }
}
