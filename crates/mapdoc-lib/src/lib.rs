//! mapdoc: compiler core for relational-to-XML mapping documents.
//!
//! A mapping document describes how rows from named relational result sets
//! are assembled into a nested XML document. This crate builds that
//! description into a validated arena tree and provides the machinery later
//! stages use to walk it:
//! - `tree` - node model, builder and structural validation
//! - `namespace` - prefix resolution, including forward references
//! - `source` - result-set join points and symbol renaming
//! - `recursion` - anchoring recursive fragments to their root source
//! - `visit` - visitor, navigator and intercepting traversals
//! - `diagnostics` - non-fatal findings from the finish pass
//! - `dump` - textual tree printer
//!
//! # Example
//!
//! ```
//! use mapdoc_lib::{MappingDocument, NodeId};
//!
//! let mut doc = MappingDocument::new();
//! let root = doc.add_element(NodeId::DOCUMENT, "orders")?;
//! let source = doc.add_source(root, "model.orders")?;
//! let order = doc.add_element(source, "order")?;
//! doc.add_attribute(order, "id")?;
//! doc.add_recursive_element(order, "sub-order", "model.orders")?;
//!
//! let diagnostics = doc.finish()?;
//! assert!(diagnostics.is_empty());
//! assert!(doc.node(source).as_source().is_some_and(|s| s.is_recursion_root()));
//! # Ok::<(), mapdoc_lib::Error>(())
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod diagnostics;
pub mod dump;
pub mod namespace;
pub mod recursion;
pub mod source;
pub mod tree;
pub mod visit;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod namespace_tests;

pub use config::{Config, UnresolvedNamespacePolicy};
pub use diagnostics::{DiagnosticKind, DiagnosticMessage, Diagnostics, Severity};
pub use dump::DocumentPrinter;
pub use source::SourceNode;
pub use tree::{CriteriaSpec, MappingDocument, NodeId, NodeKind, NodeMut, NodeRef, NodeSnapshot};
pub use visit::{
    InterceptContext, InterceptingVisitor, MappingInterceptor, Navigator, TraversalControl,
    TreeLogger, Visitor,
};

pub use mapdoc_core::{
    CriteriaHandle, NamespaceBinding, NamespaceDeclarations, NormalizeText, PropertyKey,
    PropertyValue, RelationalSymbol, SymbolMap, UNBOUNDED,
};

use mapdoc_core::PropertyError;

/// Why a criteria node was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaViolation {
    /// The choice already has a default branch.
    MultipleDefaults,
    /// A non-default branch has no expression to evaluate.
    MissingExpression,
}

impl std::fmt::Display for CriteriaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleDefaults => f.write_str("choice already has a default criteria"),
            Self::MissingExpression => f.write_str("non-default criteria has no expression"),
        }
    }
}

/// Errors raised while building or completing a mapping document.
///
/// Every error is raised before the offending change is applied, so the
/// tree is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A node kind was added under a parent that does not accept it.
    #[error("{child} cannot be added under {parent}")]
    InvalidStructure { parent: NodeKind, child: NodeKind },

    /// No ancestor source matches a recursive element's mapping class.
    #[error(
        "recursive element `{element}` has no ancestor source for mapping class `{mapping_class}`"
    )]
    InvalidRecursion {
        element: String,
        mapping_class: String,
    },

    #[error("invalid criteria: {0}")]
    InvalidCriteria(CriteriaViolation),

    /// A prefix was still undeclared when the document finished loading.
    #[error("namespace prefix `{prefix}` used by `{node}` is never declared")]
    UnresolvedNamespace { prefix: String, node: String },

    /// Namespace declarations are only meaningful on elements.
    #[error("{0} cannot declare namespaces")]
    InvalidNamespaceScope(NodeKind),

    #[error(transparent)]
    PropertyType(#[from] PropertyError),

    /// Nesting exceeded `Config::max_depth`.
    #[error("mapping tree nested deeper than {max} levels")]
    DepthLimitExceeded { max: u32 },
}

/// Result type for mapping document operations.
pub type Result<T> = std::result::Result<T, Error>;
