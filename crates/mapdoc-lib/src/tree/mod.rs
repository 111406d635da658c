//! Mapping tree: arena storage, node views and the validating builder.
//!
//! # Architecture
//!
//! Nodes live in a flat `Vec` owned by `MappingDocument` and are addressed
//! by `NodeId`. Slot 0 is always the document node. Each node stores its
//! parent handle, ordered structural children, ordered attributes (elements
//! only) and a `PropertyBag`.
//!
//! Structure is only ever changed through the `add_*` operations in
//! `builder`, which validate the parent/child pairing before touching the
//! arena. Afterwards nodes may have their properties changed through
//! `NodeMut` but are never re-parented, except that replacing the document
//! root detaches the previous root subtree.

mod builder;
mod document;
mod invariants;
mod kind;
mod node;
mod snapshot;

#[cfg(test)]
mod document_tests;

pub use builder::CriteriaSpec;
pub use document::{MappingDocument, NodeId};
pub use kind::NodeKind;
pub use node::{Ancestors, NodeMut, NodeRef};
pub use snapshot::NodeSnapshot;

pub(crate) use document::NodeData;
