//! Node properties: keys, typed values, tree-wide defaults and the bag.
//!
//! Every node carries a `PropertyBag` holding only the properties that
//! deviate from the tree-wide default for their key. Reading an unset key
//! yields the default; writing the default erases the local value. Two bags
//! are equal exactly when they deviate from the defaults in the same way.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::namespace::{NamespaceBinding, NamespaceDeclarations};
use crate::symbol::{RelationalSymbol, SymbolMap};

/// Maximum-occurrence value meaning "no upper bound".
pub const UNBOUNDED: i64 = -1;

/// Opaque handle to a criteria expression compiled by an external resolver.
///
/// The tree stores it and hands it back; it never looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CriteriaHandle(pub u64);

/// Whitespace handling applied to text content on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeText {
    #[default]
    Preserve,
    Replace,
    Collapse,
}

impl NormalizeText {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Replace => "replace",
            Self::Collapse => "collapse",
        }
    }
}

impl FromStr for NormalizeText {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(Self::Preserve),
            "replace" => Ok(Self::Replace),
            "collapse" => Ok(Self::Collapse),
            other => Err(PropertyError::UnknownNormalization(other.to_owned())),
        }
    }
}

/// The shape of value a key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Str,
    Int,
    Bool,
    StrList,
    Normalize,
    Namespace,
    Declarations,
    Symbol,
    SymbolMap,
    Criteria,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Bool => "boolean",
            Self::StrList => "string list",
            Self::Normalize => "normalization mode",
            Self::Namespace => "namespace binding",
            Self::Declarations => "namespace declarations",
            Self::Symbol => "relational symbol",
            Self::SymbolMap => "symbol map",
            Self::Criteria => "criteria handle",
        };
        f.write_str(s)
    }
}

/// A typed property value.
///
/// Serialized without a tag; the key decides the shape when reading back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Normalize(NormalizeText),
    Str(String),
    StrList(Vec<String>),
    Criteria(CriteriaHandle),
    Symbol(RelationalSymbol),
    Namespace(NamespaceBinding),
    SymbolMap(SymbolMap),
    Declarations(NamespaceDeclarations),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Str(_) => ValueKind::Str,
            Self::Int(_) => ValueKind::Int,
            Self::Bool(_) => ValueKind::Bool,
            Self::StrList(_) => ValueKind::StrList,
            Self::Normalize(_) => ValueKind::Normalize,
            Self::Namespace(_) => ValueKind::Namespace,
            Self::Declarations(_) => ValueKind::Declarations,
            Self::Symbol(_) => ValueKind::Symbol,
            Self::SymbolMap(_) => ValueKind::SymbolMap,
            Self::Criteria(_) => ValueKind::Criteria,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NormalizeText> for PropertyValue {
    fn from(value: NormalizeText) -> Self {
        Self::Normalize(value)
    }
}

impl From<RelationalSymbol> for PropertyValue {
    fn from(value: RelationalSymbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<CriteriaHandle> for PropertyValue {
    fn from(value: CriteriaHandle) -> Self {
        Self::Criteria(value)
    }
}

impl From<NamespaceBinding> for PropertyValue {
    fn from(value: NamespaceBinding) -> Self {
        Self::Namespace(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property `{key}` expects a {expected} value, got a {found} value")]
    KindMismatch {
        key: PropertyKey,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("unknown text normalization mode `{0}`")]
    UnknownNormalization(String),

    #[error("unknown property `{0}`")]
    UnknownKey(String),
}

macro_rules! property_keys {
    ($( $variant:ident => $name:literal : $kind:ident $( = $default:expr )? ),* $(,)?) => {
        /// Closed set of node property keys.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum PropertyKey {
            $( $variant, )*
        }

        impl PropertyKey {
            pub const ALL: &'static [PropertyKey] = &[ $( PropertyKey::$variant, )* ];
            pub const COUNT: usize = Self::ALL.len();

            /// Stable name used in dumps and serialized documents.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Self::$variant), )*
                    _ => None,
                }
            }

            pub fn kind(self) -> ValueKind {
                match self {
                    $( Self::$variant => ValueKind::$kind, )*
                }
            }

            fn make_default(self) -> Option<PropertyValue> {
                match self {
                    $( Self::$variant => property_keys!(@default $( $default )?), )*
                }
            }
        }
    };
    (@default) => { None };
    (@default $default:expr) => { Some(PropertyValue::from($default)) };
}

property_keys! {
    Name => "name": Str,
    NamespacePrefix => "namespacePrefix": Str,
    Namespace => "namespace": Namespace,
    NamespaceDeclarations => "namespaceDeclarations": Declarations,
    MinOccurs => "minOccurs": Int = 1_i64,
    MaxOccurs => "maxOccurs": Int = 1_i64,
    DefaultValue => "defaultValue": Str,
    FixedValue => "fixedValue": Str,
    IsNillable => "isNillable": Bool = false,
    BuiltInType => "builtInType": Str,
    NormalizeText => "normalizeText": Normalize = NormalizeText::Preserve,
    AlwaysInclude => "alwaysInclude": Bool = false,
    IsExcluded => "isExcluded": Bool = false,
    IsOptional => "isOptional": Bool = false,
    NameInSource => "nameInSource": Str,
    ElementSymbol => "elementSymbol": Symbol,
    ResultSetName => "resultSetName": Str,
    AliasResultSetName => "aliasResultSetName": Str,
    SymbolMap => "symbolMap": SymbolMap,
    StagingTables => "stagingTables": StrList,
    IsRecursiveRoot => "isRecursiveRoot": Bool = false,
    RecursionId => "recursionId": Str,
    RecursionMappingClass => "recursionMappingClass": Str,
    RecursionCriteria => "recursionCriteria": Str,
    RecursionCriteriaHandle => "recursionCriteriaHandle": Criteria,
    RecursionLimit => "recursionLimit": Int = 10_i64,
    ExceptionOnRecursionLimit => "exceptionOnRecursionLimit": Bool = false,
    CriteriaText => "criteria": Str,
    CriteriaHandle => "criteriaHandle": Criteria,
    IsDefaultChoice => "isDefaultChoice": Bool = false,
    ExceptionOnDefault => "exceptionOnDefault": Bool = false,
    CommentText => "commentText": Str,
    DocumentName => "documentName": Str,
    DocumentEncoding => "documentEncoding": Str = "UTF-8",
    FormattedDocument => "formattedDocument": Bool = false,
}

static DEFAULTS: LazyLock<Vec<Option<PropertyValue>>> =
    LazyLock::new(|| PropertyKey::ALL.iter().map(|k| k.make_default()).collect());

impl PropertyKey {
    pub fn index(self) -> usize {
        self as usize
    }

    /// The tree-wide default, if this key has one.
    pub fn default_value(self) -> Option<&'static PropertyValue> {
        DEFAULTS[self.index()].as_ref()
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKey {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PropertyError::UnknownKey(s.to_owned()))
    }
}

impl Serialize for PropertyKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Deviation-only property storage, one slot per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyBag {
    slots: [Option<PropertyValue>; PropertyKey::COUNT],
}

impl Default for PropertyBag {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBag {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Local value, falling back to the key's default.
    pub fn get(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.slots[key.index()]
            .as_ref()
            .or_else(|| key.default_value())
    }

    /// Local value only, ignoring defaults.
    pub fn local(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.slots[key.index()].as_ref()
    }

    pub fn is_overridden(&self, key: PropertyKey) -> bool {
        self.slots[key.index()].is_some()
    }

    /// Store `value` for `key`.
    ///
    /// Storing the key's default removes any local value instead.
    pub fn set(&mut self, key: PropertyKey, value: PropertyValue) -> Result<(), PropertyError> {
        let expected = key.kind();
        let found = value.kind();
        if expected != found {
            return Err(PropertyError::KindMismatch {
                key,
                expected,
                found,
            });
        }

        let slot = &mut self.slots[key.index()];
        if key.default_value() == Some(&value) {
            *slot = None;
        } else {
            *slot = Some(value);
        }
        Ok(())
    }

    /// Remove any local value so `key` reads as its default again.
    pub fn clear(&mut self, key: PropertyKey) -> Option<PropertyValue> {
        self.slots[key.index()].take()
    }

    /// Locally set properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &PropertyValue)> {
        PropertyKey::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(k, v)| v.as_ref().map(|v| (*k, v)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn str(&self, key: PropertyKey) -> Option<&str> {
        match self.get(key) {
            Some(PropertyValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, key: PropertyKey) -> Option<i64> {
        match self.get(key) {
            Some(PropertyValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value; keys without a value or default read as `false`.
    pub fn flag(&self, key: PropertyKey) -> bool {
        matches!(self.get(key), Some(PropertyValue::Bool(true)))
    }

    pub fn str_list(&self, key: PropertyKey) -> &[String] {
        match self.get(key) {
            Some(PropertyValue::StrList(list)) => list,
            _ => &[],
        }
    }

    pub fn normalize(&self, key: PropertyKey) -> NormalizeText {
        match self.get(key) {
            Some(PropertyValue::Normalize(n)) => *n,
            _ => NormalizeText::default(),
        }
    }

    pub fn namespace(&self, key: PropertyKey) -> Option<&NamespaceBinding> {
        match self.get(key) {
            Some(PropertyValue::Namespace(ns)) => Some(ns),
            _ => None,
        }
    }

    pub fn declarations(&self, key: PropertyKey) -> Option<&NamespaceDeclarations> {
        match self.get(key) {
            Some(PropertyValue::Declarations(d)) => Some(d),
            _ => None,
        }
    }

    pub fn symbol(&self, key: PropertyKey) -> Option<&RelationalSymbol> {
        match self.get(key) {
            Some(PropertyValue::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    pub fn symbol_map(&self, key: PropertyKey) -> Option<&SymbolMap> {
        match self.get(key) {
            Some(PropertyValue::SymbolMap(m)) => Some(m),
            _ => None,
        }
    }

    pub fn criteria(&self, key: PropertyKey) -> Option<CriteriaHandle> {
        match self.get(key) {
            Some(PropertyValue::Criteria(c)) => Some(*c),
            _ => None,
        }
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BagVisitor)
    }
}

/// Reads each value with the shape its key declares, so a normalization mode
/// and a plain string never get confused.
struct BagVisitor;

impl<'de> Visitor<'de> for BagVisitor {
    type Value = PropertyBag;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of property names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut bag = PropertyBag::new();
        while let Some(key) = map.next_key::<PropertyKey>()? {
            let value = match key.kind() {
                ValueKind::Str => PropertyValue::Str(map.next_value()?),
                ValueKind::Int => PropertyValue::Int(map.next_value()?),
                ValueKind::Bool => PropertyValue::Bool(map.next_value()?),
                ValueKind::StrList => PropertyValue::StrList(map.next_value()?),
                ValueKind::Normalize => PropertyValue::Normalize(map.next_value()?),
                ValueKind::Namespace => PropertyValue::Namespace(map.next_value()?),
                ValueKind::Declarations => PropertyValue::Declarations(map.next_value()?),
                ValueKind::Symbol => PropertyValue::Symbol(map.next_value()?),
                ValueKind::SymbolMap => PropertyValue::SymbolMap(map.next_value()?),
                ValueKind::Criteria => PropertyValue::Criteria(map.next_value()?),
            };
            bag.set(key, value).map_err(de::Error::custom)?;
        }
        Ok(bag)
    }
}
