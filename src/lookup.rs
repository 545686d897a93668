//! The type lookup accumulator: fully-qualified name → resolved descriptor.
//!
//! One `TypeLookup` is threaded by the caller through successive loads. It
//! owns the shared-variant namespace and its tag counter, so cross-file tag
//! identity depends on nothing but the sequence of loads.
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::ast::Quantifier;

/// Tags handed out to shared variants start right above this.
pub const SHARED_TAG_BASE: u32 = 1000;

/// `{Sum}__{Variant}`
pub fn qualified_name(sum: &str, variant: &str) -> String {
    format!("{sum}__{variant}")
}

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Int,
    Float,
    Bool,
    Any,
}

impl Primitive {
    pub const ALL: [Primitive; 5] = [Self::String, Self::Int, Self::Float, Self::Bool, Self::Any];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Any => "any",
        }
    }
}

/// A type expression with every simple name bound to what it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Primitive(Primitive),
    Product(String),
    Sum(String),
    Maybe(Box<ResolvedType>),
    Array(Box<ResolvedType>),
    Map(Box<ResolvedType>, Box<ResolvedType>),
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Product(name) | Self::Sum(name) => f.write_str(name),
            Self::Maybe(t) => write!(f, "maybe[{t}]"),
            Self::Array(t) => write!(f, "array[{t}]"),
            Self::Map(k, v) => write!(f, "map[{k}, {v}]"),
        }
    }
}

impl Serialize for ResolvedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    pub quantifier: Quantifier,
}

impl fmt::Display for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quantifier {
            Quantifier::One => write!(f, "{} {}", self.ty, self.name),
            Quantifier::Optional => write!(f, "{}? {}", self.ty, self.name),
            Quantifier::Repeated => write!(f, "{}* {}", self.ty, self.name),
        }
    }
}

/// Printable field signature, e.g. `(int left, string* tokens)`.
pub fn signature(fields: &[ResolvedField]) -> String {
    let parts: Vec<String> = fields.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescKind {
    Product,
    Variant { sum: String, shared: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDesc {
    pub tag: u32,
    #[serde(flatten)]
    pub kind: DescKind,
    /// own fields followed by the sum's common fields
    pub fields: Vec<ResolvedField>,
}

impl TypeDesc {
    pub fn is_shared_variant(&self) -> bool {
        matches!(self.kind, DescKind::Variant { shared: true, .. })
    }
}

/// What a declared type name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Product,
    Sum,
    SharedSum,
}

/// First sighting of a shared variant name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedVariant {
    pub tag: u32,
    pub first_key: String,
    #[serde(skip)]
    pub fields: Vec<ResolvedField>,
}

// ----------------------------- Accumulator -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeLookup {
    types: IndexMap<String, DeclKind>,
    entries: IndexMap<String, TypeDesc>,
    shared_variants: IndexMap<String, SharedVariant>,
    #[serde(skip)]
    next_shared_tag: u32,
}

impl Default for TypeLookup {
    fn default() -> Self {
        Self {
            types: IndexMap::new(),
            entries: IndexMap::new(),
            shared_variants: IndexMap::new(),
            next_shared_tag: SHARED_TAG_BASE + 1,
        }
    }
}

impl TypeLookup {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&TypeDesc> { self.entries.get(key) }
    pub fn contains_key(&self, key: &str) -> bool { self.entries.contains_key(key) }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDesc)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn declared(&self, name: &str) -> Option<DeclKind> {
        self.types.get(name).copied()
    }

    pub fn shared_variant(&self, variant: &str) -> Option<&SharedVariant> {
        self.shared_variants.get(variant)
    }

    pub(crate) fn declare(&mut self, name: &str, kind: DeclKind) {
        self.types.insert(name.to_string(), kind);
    }

    pub(crate) fn insert(&mut self, key: String, desc: TypeDesc) {
        debug_assert!(!self.entries.contains_key(&key), "duplicate key {key}");
        self.entries.insert(key, desc);
    }

    /// Allocate the next shared tag and bind `variant` to it.
    pub(crate) fn register_shared(&mut self, variant: &str, key: &str, fields: &[ResolvedField]) -> u32 {
        let tag = self.next_shared_tag;
        self.next_shared_tag += 1;
        self.shared_variants.insert(variant.to_string(), SharedVariant {
            tag,
            first_key: key.to_string(),
            fields: fields.to_vec(),
        });
        tag
    }
}

/// Per-declaration tag counter for products and non-shared sums.
#[derive(Debug)]
pub(crate) struct TagCounter { next: u32 }

impl TagCounter {
    pub(crate) fn new() -> Self { Self { next: 1 } }

    pub(crate) fn allocate(&mut self) -> u32 {
        let tag = self.next;
        self.next += 1;
        tag
    }
}
