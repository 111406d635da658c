use std::fmt;

use crate::tree::NodeId;

/// Diagnostic kinds, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Bounds that no instance document can satisfy
    InvalidOccurrence,

    // Loadable, but probably not what the author meant
    UnresolvedNamespace,
    EmptyChoice,
    FixedAndDefaultValue,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::InvalidOccurrence => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Base message for this kind, used when no detail is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::InvalidOccurrence => "occurrence bounds cannot be satisfied",
            Self::UnresolvedNamespace => "namespace prefix is never declared",
            Self::EmptyChoice => "choice has no criteria branches",
            Self::FixedAndDefaultValue => "both a fixed and a default value are set",
        }
    }

    /// Template for custom messages, with `{}` standing for the detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnresolvedNamespace => "namespace prefix `{}` is never declared".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) node: NodeId,
    /// Dotted element path of `node`, empty for unnamed nodes at the top.
    pub(crate) path: String,
    pub(crate) message: String,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, node: NodeId, path: String) -> Self {
        Self {
            kind,
            node,
            path,
            message: kind.fallback_message().to_string(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.message)?;
        if self.path.is_empty() {
            write!(f, " (at {})", self.node)
        } else {
            write!(f, " (at {} `{}`)", self.node, self.path)
        }
    }
}
