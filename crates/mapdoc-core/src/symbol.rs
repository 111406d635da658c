//! Relational symbols as the mapping tree sees them.
//!
//! The tree never resolves symbols against a catalog; it only stores and
//! renames them. Names compare ASCII case-insensitively, matching how the
//! relational side treats identifiers.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a symbol names a column-level element or a whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    Element,
    Group,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Group => "group",
        }
    }
}

/// A reference to a relational element or group, by name.
///
/// Serialized as `element:<name>` or `group:<name>` so symbol maps can be
/// written as plain string-keyed maps.
#[derive(Debug, Clone)]
pub struct RelationalSymbol {
    kind: SymbolKind,
    name: String,
}

/// Renaming table from one relational symbol to another.
///
/// Ordered so that dumps and serialized documents are stable.
pub type SymbolMap = BTreeMap<RelationalSymbol, RelationalSymbol>;

impl RelationalSymbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn element(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Element, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Group, name)
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_group(&self) -> bool {
        self.kind == SymbolKind::Group
    }

    /// Last dot-separated segment, e.g. `col` for `orders.col`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Everything before the last dot, if the name is qualified.
    pub fn qualifier(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(q, _)| q)
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.name.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for RelationalSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for RelationalSymbol {}

impl PartialOrd for RelationalSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelationalSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.folded().cmp(other.folded()))
    }
}

impl Hash for RelationalSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        for b in self.folded() {
            state.write_u8(b);
        }
        // Terminator keeps `ab` + `c` distinct from `a` + `bc` in composite hashes.
        state.write_u8(0xff);
    }
}

impl fmt::Display for RelationalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Error for a serialized symbol without a known `kind:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a relational symbol (expected `element:<name>` or `group:<name>`)")]
pub struct ParseSymbolError(String);

impl FromStr for RelationalSymbol {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s.split_once(':').ok_or_else(|| ParseSymbolError(s.to_owned()))?;
        let kind = match kind {
            "element" => SymbolKind::Element,
            "group" => SymbolKind::Group,
            _ => return Err(ParseSymbolError(s.to_owned())),
        };
        if name.is_empty() {
            return Err(ParseSymbolError(s.to_owned()));
        }
        Ok(Self::new(kind, name))
    }
}

impl Serialize for RelationalSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}:{}", self.kind.as_str(), self.name))
    }
}

impl<'de> Deserialize<'de> for RelationalSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
