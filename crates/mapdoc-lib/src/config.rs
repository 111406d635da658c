//! Build configuration.

/// What `finish` does with a prefix that was never declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnresolvedNamespacePolicy {
    /// Keep the pending placeholder and report a warning diagnostic.
    #[default]
    Placeholder,
    /// Fail with `Error::UnresolvedNamespace`.
    Error,
}

pub const DEFAULT_MAX_DEPTH: u32 = 4096;

/// Configuration for building a mapping document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) unresolved_namespaces: UnresolvedNamespacePolicy,
    /// Deepest nesting the builder accepts; traversals recurse once per level.
    pub(crate) max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unresolved_namespaces: UnresolvedNamespacePolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for prefixes left undeclared at `finish`.
    pub fn unresolved_namespaces(mut self, policy: UnresolvedNamespacePolicy) -> Self {
        self.unresolved_namespaces = policy;
        self
    }

    /// Set the maximum nesting depth.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn unresolved_namespace_policy(&self) -> UnresolvedNamespacePolicy {
        self.unresolved_namespaces
    }

    pub fn depth_limit(&self) -> u32 {
        self.max_depth
    }
}
