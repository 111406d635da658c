//! Mapping tree visitors.
//!
//! # Usage
//!
//! Implement `Visitor` for your struct and override the `visit_*` methods
//! you care about. Every method falls through to its nearest group, and
//! every group ends at `visit_node`, so overriding only `visit_node` still
//! sees every node:
//!
//! - attribute, comment → node
//! - document, source, criteria, element → base node → node
//! - choice, sequence, all → container → base node
//! - recursive element → element
//!
//! Visitors recurse by calling `walk_children`/`walk_attributes` from their
//! overrides. Returning `TraversalControl::Stop` skips the remaining
//! siblings and unwinds every enclosing walk.
//!
//! ```ignore
//! impl Visitor for MyPass {
//!     fn visit_element(&mut self, node: NodeRef<'_>) -> TraversalControl {
//!         // Pre-order logic
//!         walk_children(self, node)
//!     }
//! }
//! ```

mod intercept;
mod logger;
mod navigator;

#[cfg(test)]
mod intercept_tests;

pub use intercept::{InterceptContext, InterceptingVisitor, MappingInterceptor};
pub use logger::TreeLogger;
pub use navigator::Navigator;

use crate::tree::{NodeKind, NodeRef};

/// Whether a traversal goes on after a visit.
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalControl {
    #[default]
    Continue,
    Stop,
}

impl TraversalControl {
    pub fn is_stop(self) -> bool {
        self == Self::Stop
    }

    pub fn is_continue(self) -> bool {
        self == Self::Continue
    }
}

pub trait Visitor {
    /// Fallback every other method ends up in.
    fn visit_node(&mut self, _node: NodeRef<'_>) -> TraversalControl {
        TraversalControl::Continue
    }

    /// Nodes that take part in the document structure.
    fn visit_base_node(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_node(node)
    }

    fn visit_document(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_base_node(node)
    }

    fn visit_source(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_base_node(node)
    }

    fn visit_criteria(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_base_node(node)
    }

    fn visit_element(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_base_node(node)
    }

    fn visit_recursive_element(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_element(node)
    }

    /// Choice, sequence and all.
    fn visit_container(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_base_node(node)
    }

    fn visit_choice(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_container(node)
    }

    fn visit_sequence(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_container(node)
    }

    fn visit_all(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_container(node)
    }

    fn visit_attribute(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_node(node)
    }

    fn visit_comment(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.visit_node(node)
    }
}

/// Call the `visit_*` method matching `node`'s kind.
pub fn dispatch<V: Visitor + ?Sized>(visitor: &mut V, node: NodeRef<'_>) -> TraversalControl {
    match node.kind() {
        NodeKind::Document => visitor.visit_document(node),
        NodeKind::Source => visitor.visit_source(node),
        NodeKind::Element => visitor.visit_element(node),
        NodeKind::RecursiveElement => visitor.visit_recursive_element(node),
        NodeKind::Attribute => visitor.visit_attribute(node),
        NodeKind::Comment => visitor.visit_comment(node),
        NodeKind::Choice => visitor.visit_choice(node),
        NodeKind::Sequence => visitor.visit_sequence(node),
        NodeKind::All => visitor.visit_all(node),
        NodeKind::Criteria => visitor.visit_criteria(node),
    }
}

/// Dispatch each structural child in order, stopping at the first `Stop`.
pub fn walk_children<V: Visitor + ?Sized>(visitor: &mut V, node: NodeRef<'_>) -> TraversalControl {
    for child in node.children() {
        if dispatch(visitor, child).is_stop() {
            return TraversalControl::Stop;
        }
    }
    TraversalControl::Continue
}

/// Dispatch each attribute in order, stopping at the first `Stop`.
pub fn walk_attributes<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: NodeRef<'_>,
) -> TraversalControl {
    for attribute in node.attributes() {
        if dispatch(visitor, attribute).is_stop() {
            return TraversalControl::Stop;
        }
    }
    TraversalControl::Continue
}
