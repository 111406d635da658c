use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of mapping node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Source,
    Element,
    RecursiveElement,
    Attribute,
    Comment,
    Choice,
    Sequence,
    All,
    Criteria,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Source => "source",
            Self::Element => "element",
            Self::RecursiveElement => "recursive element",
            Self::Attribute => "attribute",
            Self::Comment => "comment",
            Self::Choice => "choice",
            Self::Sequence => "sequence",
            Self::All => "all",
            Self::Criteria => "criteria",
        }
    }

    /// Element or recursive element: nodes that produce XML elements and
    /// may declare namespaces.
    pub fn is_element(self) -> bool {
        matches!(self, Self::Element | Self::RecursiveElement)
    }

    /// Choice, sequence or all.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Choice | Self::Sequence | Self::All)
    }

    /// Kinds whose structural children are never walked by traversals.
    /// Attributes are still walked.
    pub fn is_traversal_leaf(self) -> bool {
        matches!(self, Self::Attribute | Self::Comment | Self::RecursiveElement)
    }

    /// Kinds that carry an XML name.
    pub fn is_named(self) -> bool {
        matches!(self, Self::Element | Self::RecursiveElement | Self::Attribute)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
