//! Read and write views over a single node.

use std::fmt;
use std::hash::{Hash, Hasher};

use mapdoc_core::{
    CriteriaHandle, NamespaceBinding, NamespaceDeclarations, NormalizeText, PropertyBag,
    PropertyKey, PropertyValue, RelationalSymbol, SymbolMap, UNBOUNDED,
};

use super::{MappingDocument, NodeData, NodeId, NodeKind};
use crate::Result;
use crate::source::SourceNode;

/// Borrowed view of one node in a document.
///
/// Equality and hashing look only at the property bag, so two nodes
/// compare equal regardless of where they are attached.
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d MappingDocument,
    id: NodeId,
}

impl<'d> NodeRef<'d> {
    pub(crate) fn new(doc: &'d MappingDocument, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(&self) -> &'d NodeData {
        self.doc.ensure_node(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn document(&self) -> &'d MappingDocument {
        self.doc
    }

    pub fn parent(&self) -> Option<NodeRef<'d>> {
        self.data().parent.map(|p| NodeRef::new(self.doc, p))
    }

    /// Structural children in insertion order (attributes excluded).
    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeRef<'d>> + ExactSizeIterator + use<'d> {
        let doc = self.doc;
        self.data()
            .children
            .iter()
            .map(move |&id| NodeRef::new(doc, id))
    }

    /// Attributes in insertion order; empty for non-elements.
    pub fn attributes(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeRef<'d>> + ExactSizeIterator + use<'d> {
        let doc = self.doc;
        self.data()
            .attributes
            .iter()
            .map(move |&id| NodeRef::new(doc, id))
    }

    /// Parent, grandparent, ... up to the document node.
    pub fn ancestors(&self) -> Ancestors<'d> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// This node followed by its ancestors.
    pub fn ancestors_inclusive(&self) -> Ancestors<'d> {
        Ancestors { next: Some(*self) }
    }

    /// Number of edges up to the document node.
    pub fn depth(&self) -> u32 {
        self.doc.depth_of(self.id)
    }

    pub fn properties(&self) -> &'d PropertyBag {
        &self.data().props
    }

    /// Local value or the key's tree-wide default.
    pub fn property(&self, key: PropertyKey) -> Option<&'d PropertyValue> {
        self.properties().get(key)
    }

    pub fn as_source(&self) -> Option<SourceNode<'d>> {
        SourceNode::new(*self)
    }

    pub fn name(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::Name)
    }

    /// `prefix:name` when a prefix is set, otherwise the bare name.
    pub fn qualified_name(&self) -> Option<String> {
        let name = self.name()?;
        Some(match self.namespace_prefix() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
            _ => name.to_owned(),
        })
    }

    /// Dotted path of element names from the tag root down to this node.
    ///
    /// Attributes contribute `@name`; sources, containers and criteria are
    /// transparent. For example `orders.order.@id`.
    pub fn path_name(&self) -> String {
        let mut segments: Vec<String> = self
            .ancestors_inclusive()
            .filter(|n| n.kind().is_named())
            .map(|n| {
                let name = n.name().unwrap_or_default();
                if n.kind() == NodeKind::Attribute {
                    format!("@{name}")
                } else {
                    name.to_owned()
                }
            })
            .collect();
        segments.reverse();
        segments.join(".")
    }

    pub fn namespace_prefix(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::NamespacePrefix)
    }

    /// Resolved (or pending) namespace of this node's prefix.
    pub fn namespace(&self) -> Option<&'d NamespaceBinding> {
        self.properties().namespace(PropertyKey::Namespace)
    }

    pub fn namespace_declarations(&self) -> Option<&'d NamespaceDeclarations> {
        self.properties()
            .declarations(PropertyKey::NamespaceDeclarations)
    }

    pub fn min_occurs(&self) -> i64 {
        self.properties().int(PropertyKey::MinOccurs).unwrap_or(1)
    }

    /// Upper occurrence bound; `None` when unbounded.
    pub fn max_occurs(&self) -> Option<i64> {
        match self.properties().int(PropertyKey::MaxOccurs) {
            Some(UNBOUNDED) => None,
            other => Some(other.unwrap_or(1)),
        }
    }

    pub fn default_value(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::DefaultValue)
    }

    pub fn fixed_value(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::FixedValue)
    }

    pub fn is_nillable(&self) -> bool {
        self.properties().flag(PropertyKey::IsNillable)
    }

    pub fn built_in_type(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::BuiltInType)
    }

    pub fn normalize_text(&self) -> NormalizeText {
        self.properties().normalize(PropertyKey::NormalizeText)
    }

    pub fn always_include(&self) -> bool {
        self.properties().flag(PropertyKey::AlwaysInclude)
    }

    pub fn is_optional(&self) -> bool {
        self.properties().flag(PropertyKey::IsOptional)
    }

    pub fn is_excluded(&self) -> bool {
        self.properties().flag(PropertyKey::IsExcluded)
    }

    pub fn name_in_source(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::NameInSource)
    }

    /// Relational symbol bound by the resolver, if any.
    pub fn element_symbol(&self) -> Option<&'d RelationalSymbol> {
        self.properties().symbol(PropertyKey::ElementSymbol)
    }

    /// Declared (source) or bound (container) result-set name.
    pub fn result_set_name(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::ResultSetName)
    }

    pub fn comment_text(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::CommentText)
    }

    pub fn criteria_text(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::CriteriaText)
    }

    pub fn criteria_handle(&self) -> Option<CriteriaHandle> {
        self.properties().criteria(PropertyKey::CriteriaHandle)
    }

    pub fn is_default_choice(&self) -> bool {
        self.properties().flag(PropertyKey::IsDefaultChoice)
    }

    /// Choice: fail when no branch matches and there is no default.
    pub fn exception_on_default(&self) -> bool {
        self.properties().flag(PropertyKey::ExceptionOnDefault)
    }

    /// The default criteria branch of a choice.
    pub fn default_branch(&self) -> Option<NodeRef<'d>> {
        self.children().find(|c| c.is_default_choice())
    }

    pub fn mapping_class(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::RecursionMappingClass)
    }

    pub fn recursion_criteria(&self) -> Option<&'d str> {
        self.properties().str(PropertyKey::RecursionCriteria)
    }

    pub fn recursion_criteria_handle(&self) -> Option<CriteriaHandle> {
        self.properties()
            .criteria(PropertyKey::RecursionCriteriaHandle)
    }

    pub fn recursion_limit(&self) -> i64 {
        self.properties()
            .int(PropertyKey::RecursionLimit)
            .unwrap_or(10)
    }

    /// Fail instead of truncating when the recursion limit is reached.
    pub fn exception_on_recursion_limit(&self) -> bool {
        self.properties()
            .flag(PropertyKey::ExceptionOnRecursionLimit)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.properties() == other.properties()
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.properties().hash(state);
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("properties", self.properties())
            .finish()
    }
}

/// Iterator over a node's ancestor chain.
#[derive(Clone)]
pub struct Ancestors<'d> {
    next: Option<NodeRef<'d>>,
}

impl<'d> Iterator for Ancestors<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Mutable view of one node for the resolution phase.
///
/// Only properties change through this view. Keys that structural
/// invariants depend on (criteria defaults, namespace prefixes and
/// declarations, mapping classes, root cardinality) are checked or
/// propagated the same way the builder does at insertion.
pub struct NodeMut<'d> {
    doc: &'d mut MappingDocument,
    id: NodeId,
}

impl<'d> NodeMut<'d> {
    pub(crate) fn new(doc: &'d mut MappingDocument, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn view(&self) -> NodeRef<'_> {
        NodeRef::new(self.doc, self.id)
    }

    /// Store a property, or drop the local value when `value` is the default.
    pub fn set_property(&mut self, key: PropertyKey, value: PropertyValue) -> Result<()> {
        self.doc.update_property(self.id, key, value)
    }

    /// Drop the local value so `key` reads as its default again.
    pub fn clear_property(&mut self, key: PropertyKey) -> Result<Option<PropertyValue>> {
        self.doc.remove_property(self.id, key)
    }

    /// Rename the node. `prefix:local` also sets the namespace prefix.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.doc.set_qualified_name(self.id, name)
    }

    pub fn set_namespace_prefix(&mut self, prefix: &str) -> Result<()> {
        self.set_property(PropertyKey::NamespacePrefix, prefix.into())
    }

    pub fn set_min_occurs(&mut self, min: i64) -> Result<()> {
        self.set_property(PropertyKey::MinOccurs, min.into())
    }

    /// Set the upper bound; `None` means unbounded.
    pub fn set_max_occurs(&mut self, max: Option<i64>) -> Result<()> {
        self.set_property(PropertyKey::MaxOccurs, max.unwrap_or(UNBOUNDED).into())
    }

    pub fn set_default_value(&mut self, value: &str) -> Result<()> {
        self.set_property(PropertyKey::DefaultValue, value.into())
    }

    pub fn set_fixed_value(&mut self, value: &str) -> Result<()> {
        self.set_property(PropertyKey::FixedValue, value.into())
    }

    pub fn set_nillable(&mut self, nillable: bool) -> Result<()> {
        self.set_property(PropertyKey::IsNillable, nillable.into())
    }

    pub fn set_built_in_type(&mut self, type_name: &str) -> Result<()> {
        self.set_property(PropertyKey::BuiltInType, type_name.into())
    }

    pub fn set_normalize_text(&mut self, mode: NormalizeText) -> Result<()> {
        self.set_property(PropertyKey::NormalizeText, mode.into())
    }

    pub fn set_always_include(&mut self, always: bool) -> Result<()> {
        self.set_property(PropertyKey::AlwaysInclude, always.into())
    }

    pub fn set_optional(&mut self, optional: bool) -> Result<()> {
        self.set_property(PropertyKey::IsOptional, optional.into())
    }

    pub fn set_excluded(&mut self, excluded: bool) -> Result<()> {
        self.set_property(PropertyKey::IsExcluded, excluded.into())
    }

    pub fn set_name_in_source(&mut self, name: &str) -> Result<()> {
        self.set_property(PropertyKey::NameInSource, name.into())
    }

    /// Bind the relational symbol this element or attribute outputs.
    pub fn set_element_symbol(&mut self, symbol: RelationalSymbol) -> Result<()> {
        self.set_property(PropertyKey::ElementSymbol, symbol.into())
    }

    /// Bind the result set a container iterates.
    pub fn set_result_set_name(&mut self, name: &str) -> Result<()> {
        self.set_property(PropertyKey::ResultSetName, name.into())
    }

    pub fn set_symbol_map(&mut self, map: SymbolMap) -> Result<()> {
        self.set_property(PropertyKey::SymbolMap, PropertyValue::SymbolMap(map))
    }

    /// Add one entry to this node's symbol map.
    pub fn map_symbol(&mut self, from: RelationalSymbol, to: RelationalSymbol) -> Result<()> {
        let mut map = self
            .view()
            .properties()
            .symbol_map(PropertyKey::SymbolMap)
            .cloned()
            .unwrap_or_default();
        map.insert(from, to);
        self.set_symbol_map(map)
    }

    /// Rename this source's result set for its subtree.
    ///
    /// Records the alias and maps the declared group onto it, so
    /// `actual_result_set_name` and every lookup below resolve to `alias`.
    pub fn set_alias_result_set_name(&mut self, alias: &str) -> Result<()> {
        self.set_property(PropertyKey::AliasResultSetName, alias.into())?;
        if let Some(declared) = self.view().result_set_name().map(str::to_owned) {
            self.map_symbol(
                RelationalSymbol::group(declared),
                RelationalSymbol::group(alias),
            )?;
        }
        Ok(())
    }

    pub fn add_staging_table(&mut self, table: &str) -> Result<()> {
        let mut tables = self
            .view()
            .properties()
            .str_list(PropertyKey::StagingTables)
            .to_vec();
        if tables.iter().any(|t| t.eq_ignore_ascii_case(table)) {
            return Ok(());
        }
        tables.push(table.to_owned());
        self.set_property(PropertyKey::StagingTables, PropertyValue::StrList(tables))
    }

    pub fn set_criteria_text(&mut self, text: &str) -> Result<()> {
        self.set_property(PropertyKey::CriteriaText, text.into())
    }

    /// Attach the expression compiled by the external criteria resolver.
    pub fn set_criteria_handle(&mut self, handle: CriteriaHandle) -> Result<()> {
        self.set_property(PropertyKey::CriteriaHandle, handle.into())
    }

    pub fn set_default_choice(&mut self, is_default: bool) -> Result<()> {
        self.set_property(PropertyKey::IsDefaultChoice, is_default.into())
    }

    pub fn set_exception_on_default(&mut self, fail: bool) -> Result<()> {
        self.set_property(PropertyKey::ExceptionOnDefault, fail.into())
    }

    pub fn set_recursion_criteria(&mut self, text: &str) -> Result<()> {
        self.set_property(PropertyKey::RecursionCriteria, text.into())
    }

    pub fn set_recursion_criteria_handle(&mut self, handle: CriteriaHandle) -> Result<()> {
        self.set_property(PropertyKey::RecursionCriteriaHandle, handle.into())
    }

    pub fn set_recursion_limit(&mut self, limit: i64) -> Result<()> {
        self.set_property(PropertyKey::RecursionLimit, limit.into())
    }

    pub fn set_exception_on_recursion_limit(&mut self, fail: bool) -> Result<()> {
        self.set_property(PropertyKey::ExceptionOnRecursionLimit, fail.into())
    }

    pub fn set_comment_text(&mut self, text: &str) -> Result<()> {
        self.set_property(PropertyKey::CommentText, text.into())
    }

    pub fn set_document_name(&mut self, name: &str) -> Result<()> {
        self.set_property(PropertyKey::DocumentName, name.into())
    }

    pub fn set_encoding(&mut self, encoding: &str) -> Result<()> {
        self.set_property(PropertyKey::DocumentEncoding, encoding.into())
    }

    pub fn set_formatted(&mut self, formatted: bool) -> Result<()> {
        self.set_property(PropertyKey::FormattedDocument, formatted.into())
    }

    /// Declare `xmlns:prefix="uri"` on this element.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.doc.declare_namespace(self.id, prefix, uri)
    }
}
