//! Schema AST: modules, sum/product declarations, fields and type expressions.
//!
//! Nodes are plain owned data. `Display` prints valid schema source, so a
//! printed module parses back to an equal one.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AstError;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

pub fn is_identifier(s: &str) -> bool {
    IDENT_RE.is_match(s)
}

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub decls: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    Sum(Sum),
    Product(Product),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sum {
    pub name: String,
    pub variants: Vec<Constructor>,
    pub shared: bool,
    /// attached to every variant
    pub common_fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    One,
    Optional,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub ty: TypeExpr,
    pub quantifier: Quantifier,
    pub name: String,
}

/// A type reference. Generic heads are closed: adding one is an
/// exhaustiveness change everywhere a `TypeExpr` is matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Named(String),
    Maybe(Box<TypeExpr>),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
}

// ---------------------------- Constructors -------------------------------- //

pub const MAYBE: &str = "maybe";
pub const ARRAY: &str = "array";
pub const MAP: &str = "map";

/// Number of type arguments a reserved generic head takes.
pub fn generic_arity(head: &str) -> Option<usize> {
    match head {
        MAYBE | ARRAY => Some(1),
        MAP => Some(2),
        _ => None,
    }
}

impl TypeExpr {
    /// Checked construction from the `{head, args}` view.
    pub fn new(head: &str, args: Vec<TypeExpr>) -> Result<Self, AstError> {
        if !is_identifier(head) {
            return Err(AstError::InvalidIdentifier(head.to_string()));
        }
        let expected = generic_arity(head).unwrap_or(0);
        let found = args.len();
        let mut args = args.into_iter().map(Box::new);
        let ty = match (head, args.next(), args.next()) {
            (MAYBE, Some(t), None) => TypeExpr::Maybe(t),
            (ARRAY, Some(t), None) => TypeExpr::Array(t),
            (MAP, Some(k), Some(v)) if found == 2 => TypeExpr::Map(k, v),
            (_, None, None) if expected == 0 => TypeExpr::Named(head.to_string()),
            _ => return Err(AstError::Arity { head: head.to_string(), expected, found }),
        };
        Ok(ty)
    }

    pub fn named(name: &str) -> Result<Self, AstError> {
        Self::new(name, Vec::new())
    }

    pub fn head(&self) -> &str {
        match self {
            TypeExpr::Named(name) => name,
            TypeExpr::Maybe(_) => MAYBE,
            TypeExpr::Array(_) => ARRAY,
            TypeExpr::Map(..) => MAP,
        }
    }

    pub fn args(&self) -> Vec<&TypeExpr> {
        match self {
            TypeExpr::Named(_) => Vec::new(),
            TypeExpr::Maybe(t) | TypeExpr::Array(t) => vec![t.as_ref()],
            TypeExpr::Map(k, v) => vec![k.as_ref(), v.as_ref()],
        }
    }

    /// Every simple name referenced, left to right.
    pub fn named_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(t) = stack.pop() {
            match t {
                TypeExpr::Named(name) => out.push(name.as_str()),
                other => stack.extend(other.args().into_iter().rev()),
            }
        }
        out
    }
}

impl Field {
    pub fn new(ty: TypeExpr, quantifier: Quantifier, name: impl Into<String>) -> Self {
        Self { ty, quantifier, name: name.into() }
    }

    /// `maybe[T] name` is the same field as `T? name`.
    pub fn normalized(ty: TypeExpr, quantifier: Quantifier, name: impl Into<String>) -> Self {
        match (ty, quantifier) {
            (TypeExpr::Maybe(inner), Quantifier::One) => Self::new(*inner, Quantifier::Optional, name),
            (ty, quantifier) => Self::new(ty, quantifier, name),
        }
    }
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Sum(sum) => &sum.name,
            TypeDecl::Product(product) => &product.name,
        }
    }
}

impl Module {
    pub fn decl(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.iter().find(|d| d.name() == name)
    }
}

impl Sum {
    pub fn variant(&self, name: &str) -> Option<&Constructor> {
        self.variants.iter().find(|c| c.name == name)
    }
}

// ------------------------------- Display ---------------------------------- //

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Maybe(t) => write!(f, "maybe[{t}]"),
            TypeExpr::Array(t) => write!(f, "array[{t}]"),
            TypeExpr::Map(k, v) => write!(f, "map[{k}, {v}]"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.ty, self.quantifier) {
            (TypeExpr::Named(ty), Quantifier::Optional) => write!(f, "{ty}? {}", self.name),
            (TypeExpr::Named(ty), Quantifier::Repeated) => write!(f, "{ty}* {}", self.name),
            // no postfix spelling for a generic head
            (ty, Quantifier::Optional) => write!(f, "maybe[{ty}] {}", self.name),
            (ty, Quantifier::Repeated) => write!(f, "{ty}* {}", self.name),
            (ty, Quantifier::One) => write!(f, "{ty} {}", self.name),
        }
    }
}

struct FieldList<'a>(&'a [Field]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{field}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.fields.is_empty() {
            write!(f, "{}", FieldList(&self.fields))?;
        }
        Ok(())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, FieldList(&self.fields))
    }
}

impl fmt::Display for Sum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shared { f.write_str("shared ")?; }
        write!(f, "{} = ", self.name)?;
        for (i, variant) in self.variants.iter().enumerate() {
            if i > 0 { f.write_str(" | ")?; }
            write!(f, "{variant}")?;
        }
        if !self.common_fields.is_empty() {
            write!(f, " {}", FieldList(&self.common_fields))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Sum(sum) => sum.fmt(f),
            TypeDecl::Product(product) => product.fmt(f),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {} {{", self.name)?;
        for decl in &self.decls {
            writeln!(f, "  {decl}")?;
        }
        f.write_str("}")
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TypeExpr {
        TypeExpr::named(name).unwrap()
    }

    #[test]
    fn nested_type_expr_prints_every_head() {
        let string = named("string");
        let maybe = TypeExpr::new("maybe", vec![string.clone()]).unwrap();
        assert_eq!(maybe.to_string(), "maybe[string]");

        let map = TypeExpr::new("map", vec![string, maybe]).unwrap();
        assert_eq!(map.head(), "map");
        assert_eq!(map.args().len(), 2);
        assert_eq!(map.args()[1].head(), "maybe");
        assert_eq!(map.args()[1].args()[0].head(), "string");
        assert_eq!(map.to_string(), "map[string, maybe[string]]");
        assert!(format!("{map:?}").contains("Maybe(Named(\"string\"))"));
        assert_eq!(map.named_refs(), vec!["string", "string"]);
    }

    #[test]
    fn direct_construction_checks_arity() {
        let int = named("int");
        assert_eq!(
            TypeExpr::new("map", vec![int.clone()]),
            Err(AstError::Arity { head: "map".into(), expected: 2, found: 1 })
        );
        assert_eq!(
            TypeExpr::new("array", vec![]),
            Err(AstError::Arity { head: "array".into(), expected: 1, found: 0 })
        );
        // a simple type never carries arguments
        assert_eq!(
            TypeExpr::new("string", vec![int]),
            Err(AstError::Arity { head: "string".into(), expected: 0, found: 1 })
        );
        assert_eq!(
            TypeExpr::named("9lives"),
            Err(AstError::InvalidIdentifier("9lives".into()))
        );
    }

    #[test]
    fn maybe_field_normalizes_to_optional() {
        let maybe_int = TypeExpr::new("maybe", vec![named("int")]).unwrap();
        let a = Field::normalized(maybe_int, Quantifier::One, "x");
        let b = Field::normalized(named("int"), Quantifier::Optional, "x");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "int? x");

        let maybe_list = TypeExpr::new("array", vec![named("int")]).unwrap();
        let c = Field::new(maybe_list, Quantifier::Optional, "ids");
        assert_eq!(c.to_string(), "maybe[array[int]] ids");
    }

    #[test]
    fn module_prints_as_source() {
        let module = Module {
            name: "demo".into(),
            decls: vec![
                TypeDecl::Product(Product {
                    name: "point".into(),
                    fields: vec![
                        Field::new(named("int"), Quantifier::Optional, "x"),
                        Field::new(named("int"), Quantifier::Repeated, "y"),
                    ],
                }),
                TypeDecl::Sum(Sum {
                    name: "expr".into(),
                    shared: true,
                    variants: vec![
                        Constructor { name: "Nil".into(), fields: vec![] },
                        Constructor {
                            name: "Pair".into(),
                            fields: vec![Field::new(named("point"), Quantifier::One, "p")],
                        },
                    ],
                    common_fields: vec![Field::new(named("int"), Quantifier::One, "line")],
                }),
            ],
        };
        assert_eq!(
            module.to_string(),
            "module demo {\n  point = (int? x, int* y)\n  shared expr = Nil | Pair(point p) (int line)\n}"
        );
        assert!(matches!(module.decl("expr"), Some(TypeDecl::Sum(s)) if s.variant("Nil").is_some()));
    }
}
