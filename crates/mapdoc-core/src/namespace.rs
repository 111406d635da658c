//! Namespace bindings stored on elements and attributes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The prefix every XML processor binds implicitly.
pub const XML_PREFIX: &str = "xml";
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix → URI declarations made by one element (`xmlns:p="uri"`).
///
/// The empty prefix holds the default namespace declaration.
pub type NamespaceDeclarations = BTreeMap<String, String>;

/// Namespace a node's prefix resolved to.
///
/// `Pending` is the placeholder for a prefix whose declaration has not been
/// seen yet. It is replaced once the declaration shows up, or left in place
/// when the document finishes loading without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum NamespaceBinding {
    Resolved { prefix: String, uri: String },
    Pending { prefix: String },
}

impl NamespaceBinding {
    pub fn resolved(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::Resolved {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    pub fn pending(prefix: impl Into<String>) -> Self {
        Self::Pending {
            prefix: prefix.into(),
        }
    }

    /// Binding for prefixes that never need a declaration.
    pub fn builtin(prefix: &str) -> Option<Self> {
        (prefix == XML_PREFIX).then(|| Self::resolved(XML_PREFIX, XML_NAMESPACE_URI))
    }

    pub fn prefix(&self) -> &str {
        match self {
            Self::Resolved { prefix, .. } | Self::Pending { prefix } => prefix,
        }
    }

    /// URI of a resolved binding; `None` while pending.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Resolved { uri, .. } => Some(uri),
            Self::Pending { .. } => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

impl fmt::Display for NamespaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved { prefix, uri } if prefix.is_empty() => write!(f, "{{{uri}}}"),
            Self::Resolved { prefix, uri } => write!(f, "{prefix}={{{uri}}}"),
            Self::Pending { prefix } => write!(f, "{prefix}=?"),
        }
    }
}
