#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core vocabulary for mapping documents.
//!
//! Everything here is plain data with no knowledge of the tree:
//! - **Properties**: the closed key enumeration, typed values, the tree-wide
//!   default table and the deviation-only `PropertyBag`
//! - **Symbols**: case-insensitive relational symbols and symbol maps
//! - **Namespaces**: prefix bindings and declaration tables

pub mod namespace;
pub mod property;
pub mod symbol;

#[cfg(test)]
mod property_tests;

pub use namespace::{NamespaceBinding, NamespaceDeclarations, XML_NAMESPACE_URI, XML_PREFIX};
pub use property::{
    CriteriaHandle, NormalizeText, PropertyBag, PropertyError, PropertyKey, PropertyValue,
    UNBOUNDED, ValueKind,
};
pub use symbol::{ParseSymbolError, RelationalSymbol, SymbolKind, SymbolMap};
