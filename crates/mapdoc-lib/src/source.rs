//! Source nodes: join points to named result sets and their symbol maps.
//!
//! Sources form a chain of their own inside the tree: a source's parent
//! source is its nearest source ancestor, whatever lies in between. Symbol
//! lookups walk that chain outward, so a nested source can rename the
//! bindings it inherits without touching the outer ones. This is how one
//! mapping class is reused at several recursion depths.

use std::fmt;

use mapdoc_core::{PropertyKey, RelationalSymbol, SymbolMap};
use tracing::trace;

use crate::tree::{NodeId, NodeKind, NodeRef};

/// Read view of a `Source` node.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SourceNode<'d> {
    node: NodeRef<'d>,
}

impl<'d> SourceNode<'d> {
    /// `None` unless `node` is a source.
    pub fn new(node: NodeRef<'d>) -> Option<Self> {
        (node.kind() == NodeKind::Source).then_some(Self { node })
    }

    pub fn node(&self) -> NodeRef<'d> {
        self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Result set name as declared.
    pub fn result_set_name(&self) -> Option<&'d str> {
        self.node.result_set_name()
    }

    pub fn alias_result_set_name(&self) -> Option<&'d str> {
        self.node.properties().str(PropertyKey::AliasResultSetName)
    }

    /// This node's own renaming table.
    pub fn symbol_map(&self) -> Option<&'d SymbolMap> {
        self.node.properties().symbol_map(PropertyKey::SymbolMap)
    }

    pub fn staging_tables(&self) -> &'d [String] {
        self.node.properties().str_list(PropertyKey::StagingTables)
    }

    /// Nearest source ancestor.
    pub fn parent_source(&self) -> Option<SourceNode<'d>> {
        self.node.ancestors().find_map(|n| n.as_source())
    }

    /// Sources from this one outward to the outermost.
    pub fn source_chain(&self) -> impl Iterator<Item = SourceNode<'d>> + use<'d> {
        self.node.ancestors_inclusive().filter_map(|n| n.as_source())
    }

    pub fn is_root_source(&self) -> bool {
        self.parent_source().is_none()
    }

    /// Whether a recursive element re-enters the fragment this source roots.
    pub fn is_recursion_root(&self) -> bool {
        self.node.properties().flag(PropertyKey::IsRecursiveRoot)
    }

    /// Mapping class of the recursion rooted here.
    pub fn recursion_id(&self) -> Option<&'d str> {
        self.node.properties().str(PropertyKey::RecursionId)
    }

    /// Resolve `symbol` through this source's map, then its ancestors'.
    ///
    /// The first map with an entry wins and its value is returned as is, not
    /// looked up again. Unmapped symbols resolve to themselves.
    pub fn mapped_symbol<'a>(&self, symbol: &'a RelationalSymbol) -> &'a RelationalSymbol
    where
        'd: 'a,
    {
        for source in self.source_chain() {
            if let Some(mapped) = source.symbol_map().and_then(|m| m.get(symbol)) {
                trace!(
                    "mapped_symbol: {} -> {} at {}",
                    symbol,
                    mapped,
                    source.id()
                );
                return mapped;
            }
        }
        trace!("mapped_symbol: {} unmapped", symbol);
        symbol
    }

    /// All mappings visible here in one table, nearer sources overriding
    /// farther ones.
    pub fn full_symbol_map(&self) -> SymbolMap {
        let chain: Vec<_> = self.source_chain().collect();
        let mut full = SymbolMap::new();
        for source in chain.iter().rev() {
            if let Some(map) = source.symbol_map() {
                full.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        full
    }

    /// The declared result set name after renaming, as seen inside this
    /// source's subtree.
    pub fn actual_result_set_name(&self) -> Option<String> {
        let declared = RelationalSymbol::group(self.result_set_name()?);
        Some(self.mapped_symbol(&declared).name().to_owned())
    }
}

impl fmt::Debug for SourceNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceNode")
            .field("id", &self.id())
            .field("result_set_name", &self.result_set_name())
            .field("symbol_map", &self.symbol_map())
            .finish()
    }
}
