//! Anchoring recursive elements to the source that roots their fragment.
//!
//! A recursive element names a mapping class: the result set whose
//! fragment it re-enters. The anchor is the nearest source at or above the
//! element's parent whose declared result set matches that class, ignoring
//! ASCII case. The anchor is flagged as a recursion root and keyed by the
//! class. Marking is a flag, not a count, so anchoring again is a no-op;
//! the flag is dropped when the last recursive element re-anchors away.

use mapdoc_core::PropertyKey;
use tracing::debug;

use crate::Result;
use crate::source::SourceNode;
use crate::tree::{MappingDocument, NodeId, NodeKind};

impl MappingDocument {
    /// Source that would anchor a recursive element for `mapping_class`
    /// added under `parent`.
    pub fn find_recursion_anchor(&self, parent: NodeId, mapping_class: &str) -> Option<NodeId> {
        self.node(parent)
            .ancestors_inclusive()
            .filter_map(|n| n.as_source())
            .find(|s| {
                s.result_set_name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(mapping_class))
            })
            .map(|s| s.id())
    }

    pub(crate) fn mark_recursion_root(&mut self, anchor: NodeId, mapping_class: &str) -> Result<()> {
        if self.node(anchor).as_source().is_some_and(|s| s.is_recursion_root()) {
            debug!("recursion: {} already anchors `{}`", anchor, mapping_class);
            return Ok(());
        }
        let props = &mut self.ensure_node_mut(anchor).props;
        props.set(PropertyKey::IsRecursiveRoot, true.into())?;
        props.set(PropertyKey::RecursionId, mapping_class.into())?;
        debug!("recursion: {} anchors `{}`", anchor, mapping_class);
        Ok(())
    }

    /// Drop the recursion flag from `anchor` once no attached recursive
    /// element re-enters it.
    pub(crate) fn release_recursion_root(&mut self, anchor: NodeId) {
        let still_anchored = self
            .iter()
            .filter(|n| n.kind() == NodeKind::RecursiveElement)
            .filter_map(|n| Some((n.parent()?, n.mapping_class()?)))
            .any(|(parent, class)| self.find_recursion_anchor(parent.id(), class) == Some(anchor));
        if still_anchored {
            return;
        }
        let props = &mut self.ensure_node_mut(anchor).props;
        props.clear(PropertyKey::IsRecursiveRoot);
        props.clear(PropertyKey::RecursionId);
        debug!("recursion: {} no longer anchors anything", anchor);
    }

    /// Attached sources flagged as recursion roots, in document order.
    pub fn recursion_roots(&self) -> impl Iterator<Item = SourceNode<'_>> {
        self.iter()
            .filter_map(|n| n.as_source())
            .filter(|s| s.is_recursion_root())
    }
}
