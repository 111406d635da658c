//! Start/end event traversal with a shared scratch context.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use super::{TraversalControl, Visitor};
use crate::tree::{MappingDocument, NodeKind, NodeRef};

/// Callbacks fired around each node of an intercepting traversal.
///
/// Every `start_*`/`end_*` falls through to `start_node`/`end_node`.
#[allow(unused_variables)]
pub trait MappingInterceptor {
    fn start_node(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        TraversalControl::Continue
    }

    fn end_node(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        TraversalControl::Continue
    }

    fn start_document(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_document(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_source(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_source(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_element(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_element(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_recursive_element(
        &mut self,
        node: NodeRef<'_>,
        ctx: &mut InterceptContext,
    ) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_recursive_element(
        &mut self,
        node: NodeRef<'_>,
        ctx: &mut InterceptContext,
    ) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_attribute(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_attribute(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_comment(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_comment(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_choice(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_choice(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_sequence(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_sequence(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_all(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_all(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }

    fn start_criteria(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.start_node(node, ctx)
    }

    fn end_criteria(&mut self, node: NodeRef<'_>, ctx: &mut InterceptContext) -> TraversalControl {
        self.end_node(node, ctx)
    }
}

fn start<I: MappingInterceptor + ?Sized>(
    interceptor: &mut I,
    node: NodeRef<'_>,
    ctx: &mut InterceptContext,
) -> TraversalControl {
    match node.kind() {
        NodeKind::Document => interceptor.start_document(node, ctx),
        NodeKind::Source => interceptor.start_source(node, ctx),
        NodeKind::Element => interceptor.start_element(node, ctx),
        NodeKind::RecursiveElement => interceptor.start_recursive_element(node, ctx),
        NodeKind::Attribute => interceptor.start_attribute(node, ctx),
        NodeKind::Comment => interceptor.start_comment(node, ctx),
        NodeKind::Choice => interceptor.start_choice(node, ctx),
        NodeKind::Sequence => interceptor.start_sequence(node, ctx),
        NodeKind::All => interceptor.start_all(node, ctx),
        NodeKind::Criteria => interceptor.start_criteria(node, ctx),
    }
}

fn end<I: MappingInterceptor + ?Sized>(
    interceptor: &mut I,
    node: NodeRef<'_>,
    ctx: &mut InterceptContext,
) -> TraversalControl {
    match node.kind() {
        NodeKind::Document => interceptor.end_document(node, ctx),
        NodeKind::Source => interceptor.end_source(node, ctx),
        NodeKind::Element => interceptor.end_element(node, ctx),
        NodeKind::RecursiveElement => interceptor.end_recursive_element(node, ctx),
        NodeKind::Attribute => interceptor.end_attribute(node, ctx),
        NodeKind::Comment => interceptor.end_comment(node, ctx),
        NodeKind::Choice => interceptor.end_choice(node, ctx),
        NodeKind::Sequence => interceptor.end_sequence(node, ctx),
        NodeKind::All => interceptor.end_all(node, ctx),
        NodeKind::Criteria => interceptor.end_criteria(node, ctx),
    }
}

/// Open-ended scratch map shared by every callback of one traversal.
///
/// Values are stored by name and read back by type; a read with the wrong
/// type behaves as if the key were absent. The stack helpers keep a
/// `Vec<T>` under the key.
#[derive(Default)]
pub struct InterceptContext {
    values: IndexMap<String, Box<dyn Any + Send>>,
}

impl InterceptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// Take the value out if it has type `T`; otherwise leave it in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let (index, key, value) = self.values.shift_remove_full(key)?;
        match value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(value) => {
                self.values.shift_insert(index, key, value);
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value under `key`, replaced by `T::default()` when absent or of
    /// another type.
    pub fn entry_or_default<T: Any + Send + Default>(&mut self, key: &str) -> &mut T {
        let present = self.values.get(key).is_some_and(|v| v.is::<T>());
        if !present {
            self.values.insert(key.to_owned(), Box::new(T::default()));
        }
        self.values
            .get_mut(key)
            .and_then(|v| v.downcast_mut())
            .unwrap_or_else(|| unreachable!("context slot `{key}` was just filled"))
    }

    pub fn push<T: Any + Send>(&mut self, key: &str, value: T) {
        self.entry_or_default::<Vec<T>>(key).push(value);
    }

    pub fn pop<T: Any>(&mut self, key: &str) -> Option<T> {
        self.get_mut::<Vec<T>>(key)?.pop()
    }

    pub fn peek<T: Any>(&self, key: &str) -> Option<&T> {
        self.get::<Vec<T>>(key)?.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for InterceptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Drives a `MappingInterceptor` over a tree.
///
/// For each node: `start`, then its attributes, then its children (none
/// for attributes, comments and recursive elements), then `end`. One context is
/// created per visitor and lives across traversals until taken back with
/// `into_parts`.
pub struct InterceptingVisitor<I> {
    interceptor: I,
    context: InterceptContext,
}

impl<I: MappingInterceptor> InterceptingVisitor<I> {
    pub fn new(interceptor: I) -> Self {
        Self {
            interceptor,
            context: InterceptContext::new(),
        }
    }

    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }

    pub fn context(&self) -> &InterceptContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut InterceptContext {
        &mut self.context
    }

    pub fn into_parts(self) -> (I, InterceptContext) {
        (self.interceptor, self.context)
    }

    /// Traverse the whole document.
    pub fn traverse(&mut self, doc: &MappingDocument) -> TraversalControl {
        self.walk(doc.document())
    }

    pub fn walk(&mut self, node: NodeRef<'_>) -> TraversalControl {
        if start(&mut self.interceptor, node, &mut self.context).is_stop() {
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

        end(&mut self.interceptor, node, &mut self.context)
    }
}

impl<I: MappingInterceptor> Visitor for InterceptingVisitor<I> {
    fn visit_node(&mut self, node: NodeRef<'_>) -> TraversalControl {
        self.walk(node)
    }
}
