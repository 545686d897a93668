//! Schema loading: parse, then resolve names and assign variant tags into a
//! caller-owned `TypeLookup`.
//!
//! Products get tag 1 from a counter of their own. Variants of an ordinary
//! sum are numbered from 1 in source order. Variants of a `shared` sum draw
//! from the accumulator-wide shared counter, and a variant name seen before
//! in any shared sum reuses its first tag as long as the field signature is
//! identical.
use std::collections::HashSet;
use std::io::Read;

use crate::ast::{generic_arity, Field, Module, Product, Sum, TypeDecl, TypeExpr};
use crate::error::{Result, SemanticError};
use crate::lookup::{
    qualified_name, signature, DeclKind, DescKind, Primitive, ResolvedField, ResolvedType, TagCounter,
    TypeDesc, TypeLookup,
};
use crate::parser;

/// Parse one schema from `reader` and register it into `lookup`.
///
/// On failure `lookup` is left exactly as it was passed in.
pub fn load_schema<R: Read>(reader: R, lookup: &mut TypeLookup, verbose: bool) -> Result<Module> {
    let module = parser::parse(reader)?;
    resolve(&module, lookup, verbose)?;
    Ok(module)
}

pub fn load_schema_str(src: &str, lookup: &mut TypeLookup, verbose: bool) -> Result<Module> {
    load_schema(src.as_bytes(), lookup, verbose)
}

/// Resolve an already parsed module into `lookup`.
pub fn resolve(module: &Module, lookup: &mut TypeLookup, verbose: bool) -> Result<(), SemanticError> {
    let mut staged = lookup.clone();
    Resolver { lookup: &mut staged, verbose }.run(module)?;
    *lookup = staged;
    if verbose {
        tracing::info!(module = %module.name, entries = lookup.len(), "schema loaded");
    }
    Ok(())
}

struct Resolver<'a> {
    lookup: &'a mut TypeLookup,
    verbose: bool,
}

impl Resolver<'_> {
    fn run(&mut self, module: &Module) -> Result<(), SemanticError> {
        self.declare_all(module)?;
        for decl in &module.decls {
            match decl {
                TypeDecl::Product(product) => self.register_product(product)?,
                TypeDecl::Sum(sum) => self.register_sum(sum)?,
            }
        }
        Ok(())
    }

    /// Bind every declared name first so fields may refer forward.
    fn declare_all(&mut self, module: &Module) -> Result<(), SemanticError> {
        let mut seen = HashSet::new();
        for decl in &module.decls {
            let name = decl.name();
            if Primitive::from_name(name).is_some() || generic_arity(name).is_some() {
                return Err(SemanticError::new(format!("`{name}` is a builtin type and cannot be redeclared"), [name]));
            }
            if !seen.insert(name) {
                return Err(SemanticError::new(
                    format!("type `{name}` is declared twice in module `{}`", module.name),
                    [name],
                ));
            }
            let kind = match decl {
                TypeDecl::Product(_) => DeclKind::Product,
                TypeDecl::Sum(sum) if sum.shared => DeclKind::SharedSum,
                TypeDecl::Sum(_) => DeclKind::Sum,
            };
            match self.lookup.declared(name) {
                None => self.lookup.declare(name, kind),
                // the same shared sum may be spelled out by several schemas
                Some(DeclKind::SharedSum) if kind == DeclKind::SharedSum => {}
                Some(_) => {
                    return Err(SemanticError::new(
                        format!("type `{name}` in module `{}` is already declared by an earlier schema", module.name),
                        [name],
                    ));
                }
            }
        }
        Ok(())
    }

    fn register_product(&mut self, product: &Product) -> Result<(), SemanticError> {
        let fields = self.resolve_fields(&product.name, &product.fields)?;
        let key = product.name.clone();
        if self.lookup.contains_key(&key) {
            return Err(SemanticError::new(format!("`{key}` is already registered"), [key]));
        }
        let tag = TagCounter::new().allocate();
        self.note(&key, tag, false);
        self.lookup.insert(key, TypeDesc { tag, kind: DescKind::Product, fields });
        Ok(())
    }

    fn register_sum(&mut self, sum: &Sum) -> Result<(), SemanticError> {
        let common = self.resolve_fields(&sum.name, &sum.common_fields)?;
        let mut local = TagCounter::new();

        for variant in &sum.variants {
            let key = qualified_name(&sum.name, &variant.name);
            let mut fields = self.resolve_fields(&key, &variant.fields)?;
            fields.extend(common.iter().cloned());

            if let Some(existing) = self.lookup.get(&key) {
                if sum.shared && existing.is_shared_variant() && existing.fields == fields {
                    self.note(&key, existing.tag, true);
                    continue;
                }
                return Err(SemanticError::new(
                    format!(
                        "`{key}` {} conflicts with an earlier declaration {}",
                        signature(&fields),
                        signature(&existing.fields),
                    ),
                    [key.clone(), key],
                ));
            }

            let tag = if sum.shared {
                match self.lookup.shared_variant(&variant.name) {
                    Some(first) if first.fields == fields => first.tag,
                    Some(first) => {
                        return Err(SemanticError::new(
                            format!(
                                "shared variant `{}` is declared as `{key}` {} but `{}` has {}",
                                variant.name,
                                signature(&fields),
                                first.first_key,
                                signature(&first.fields),
                            ),
                            [first.first_key.clone(), key],
                        ));
                    }
                    None => self.lookup.register_shared(&variant.name, &key, &fields),
                }
            } else {
                local.allocate()
            };

            self.note(&key, tag, false);
            let kind = DescKind::Variant { sum: sum.name.clone(), shared: sum.shared };
            self.lookup.insert(key, TypeDesc { tag, kind, fields });
        }
        Ok(())
    }

    fn resolve_fields(&self, owner: &str, fields: &[Field]) -> Result<Vec<ResolvedField>, SemanticError> {
        fields
            .iter()
            .map(|field| -> Result<ResolvedField, SemanticError> {
                Ok(ResolvedField {
                    name: field.name.clone(),
                    ty: self.resolve_type(owner, field, &field.ty)?,
                    quantifier: field.quantifier,
                })
            })
            .collect()
    }

    fn resolve_type(&self, owner: &str, field: &Field, ty: &TypeExpr) -> Result<ResolvedType, SemanticError> {
        let resolve = |t: &TypeExpr| self.resolve_type(owner, field, t).map(Box::new);
        Ok(match ty {
            TypeExpr::Named(name) => {
                if let Some(p) = Primitive::from_name(name) {
                    return Ok(ResolvedType::Primitive(p));
                }
                match self.lookup.declared(name) {
                    Some(DeclKind::Product) => ResolvedType::Product(name.clone()),
                    Some(DeclKind::Sum | DeclKind::SharedSum) => ResolvedType::Sum(name.clone()),
                    None => {
                        return Err(SemanticError::new(
                            format!("unknown type `{name}` in field `{}` of `{owner}`", field.name),
                            [owner, name.as_str()],
                        ));
                    }
                }
            }
            TypeExpr::Maybe(t) => ResolvedType::Maybe(resolve(t)?),
            TypeExpr::Array(t) => ResolvedType::Array(resolve(t)?),
            TypeExpr::Map(k, v) => ResolvedType::Map(resolve(k)?, resolve(v)?),
        })
    }

    fn note(&self, key: &str, tag: u32, reused: bool) {
        if self.verbose {
            tracing::info!(key, tag, reused, "registered");
        } else {
            tracing::debug!(key, tag, reused, "registered");
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Quantifier;
    use crate::error::Error;

    const DEMO: &str = include_str!("../testdata/cases/demo/01_demo.asdl");
    const TYPED_DEMO: &str = include_str!("../testdata/cases/typed_demo/01_typed_demo.asdl");
    const SHARED_EXPR: &str = include_str!("../testdata/cases/shared_variant/01_expr.asdl");
    const SHARED_WORD_PART: &str = include_str!("../testdata/cases/shared_variant/02_word_part.asdl");

    fn semantic_err(src: &str, lookup: &mut TypeLookup) -> SemanticError {
        match load_schema_str(src, lookup, false) {
            Err(Error::Semantic(e)) => e,
            other => panic!("expected semantic error, got {other:?}"),
        }
    }

    fn tag(lookup: &TypeLookup, key: &str) -> u32 {
        lookup.get(key).unwrap_or_else(|| panic!("missing {key}")).tag
    }

    #[test]
    fn loads_demo_schema() {
        let mut lookup = TypeLookup::new();
        let module = load_schema(DEMO.as_bytes(), &mut lookup, true).unwrap();
        assert_eq!(module.name, "foo");
        assert_eq!(module.decls.len(), 4);

        let keys: Vec<_> = lookup.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["point", "action__Foo", "action__Bar", "foo", "bar"]);
        assert_eq!(tag(&lookup, "point"), 1);
        assert_eq!(tag(&lookup, "action__Foo"), 1);
        assert_eq!(tag(&lookup, "action__Bar"), 2);

        let bar = lookup.get("action__Bar").unwrap();
        assert_eq!(bar.fields, vec![ResolvedField {
            name: "z".into(),
            ty: ResolvedType::Product("point".into()),
            quantifier: Quantifier::One,
        }]);
        assert!(lookup.get("action__Foo").unwrap().fields.is_empty());
        assert_eq!(lookup.get("bar").unwrap().fields[0].ty.to_string(), "map[string, int]");
    }

    #[test]
    fn typed_demo_has_qualified_names() {
        let mut lookup = TypeLookup::new();
        load_schema_str(TYPED_DEMO, &mut lookup, true).unwrap();
        assert!(lookup.contains_key("bool_expr__LogicalNot"));
        assert!(lookup.contains_key("op_id__Plus"));
        assert_eq!(lookup.declared("bool_expr"), Some(DeclKind::Sum));

        // forward reference, recursion and common fields
        let call = lookup.get("arith_expr__Call").unwrap();
        assert_eq!(call.fields[1].ty, ResolvedType::Array(Box::new(ResolvedType::Sum("arith_expr".into()))));
        let not = lookup.get("bool_expr__LogicalNot").unwrap();
        let names: Vec<_> = not.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "loc"]);
        assert_eq!(not.fields[1].ty, ResolvedType::Product("source_location".into()));
    }

    #[test]
    fn ordinary_sums_number_variants_independently() {
        let mut lookup = TypeLookup::new();
        load_schema_str(TYPED_DEMO, &mut lookup, false).unwrap();
        assert_eq!(tag(&lookup, "op_id__Plus"), 1);
        assert_eq!(tag(&lookup, "op_id__Minus"), 2);
        assert_eq!(tag(&lookup, "cflow__Break"), 1);
        assert_eq!(tag(&lookup, "bool_expr__LogicalNot"), 3);
    }

    #[test]
    fn shared_variant_gets_one_tag_across_schemas() {
        let mut lookup = TypeLookup::new();
        load_schema_str(SHARED_EXPR, &mut lookup, false).unwrap();
        load_schema_str(SHARED_WORD_PART, &mut lookup, false).unwrap();

        assert_eq!(tag(&lookup, "expr__DoubleQuoted"), 1001);
        assert_eq!(tag(&lookup, "expr__DoubleQuoted"), tag(&lookup, "word_part__DoubleQuoted"));
        // everything else in a shared sum draws from the same counter
        assert_eq!(tag(&lookup, "expr__Binary"), 1002);
        assert_eq!(tag(&lookup, "word_part__Literal"), 1003);
        assert_eq!(lookup.shared_variant("DoubleQuoted").unwrap().first_key, "expr__DoubleQuoted");
    }

    #[test]
    fn load_order_changes_values_not_sharing() {
        let mut forward = TypeLookup::new();
        load_schema_str(SHARED_EXPR, &mut forward, false).unwrap();
        load_schema_str(SHARED_WORD_PART, &mut forward, false).unwrap();

        let mut backward = TypeLookup::new();
        load_schema_str(SHARED_WORD_PART, &mut backward, false).unwrap();
        load_schema_str(SHARED_EXPR, &mut backward, false).unwrap();

        for lookup in [&forward, &backward] {
            assert_eq!(tag(lookup, "expr__DoubleQuoted"), tag(lookup, "word_part__DoubleQuoted"));
        }
        assert_ne!(tag(&forward, "word_part__Literal"), tag(&backward, "word_part__Literal"));

        let mut again = TypeLookup::new();
        load_schema_str(SHARED_EXPR, &mut again, false).unwrap();
        load_schema_str(SHARED_WORD_PART, &mut again, false).unwrap();
        assert_eq!(again, forward);
    }

    #[test]
    fn identical_shared_redeclaration_is_a_no_op() {
        let mut lookup = TypeLookup::new();
        load_schema_str(SHARED_EXPR, &mut lookup, false).unwrap();
        let before = lookup.clone();
        load_schema_str(SHARED_EXPR, &mut lookup, false).unwrap();
        assert_eq!(lookup, before);
    }

    #[test]
    fn divergent_shared_variant_is_rejected() {
        let mut lookup = TypeLookup::new();
        load_schema_str(SHARED_EXPR, &mut lookup, false).unwrap();
        let before = lookup.clone();

        let e = semantic_err("module other { shared arg = DoubleQuoted(int left) }", &mut lookup);
        assert_eq!(e.conflicting_names, vec!["expr__DoubleQuoted".to_string(), "arg__DoubleQuoted".to_string()]);
        assert!(e.message.contains("(int left, string* tokens)"), "{}", e.message);
        // failed loads leave the accumulator untouched
        assert_eq!(lookup, before);

        // same key, different fields
        let e = semantic_err("module again { shared expr = DoubleQuoted(string left) }", &mut lookup);
        assert_eq!(e.conflicting_names, vec!["expr__DoubleQuoted".to_string(); 2]);
    }

    #[test]
    fn non_shared_duplicates_are_rejected() {
        let mut lookup = TypeLookup::new();
        load_schema_str(DEMO, &mut lookup, false).unwrap();
        let e = semantic_err(DEMO, &mut lookup);
        assert_eq!(e.conflicting_names, vec!["point".to_string()]);

        let e = semantic_err("module m { t = (int x) t = A | B }", &mut TypeLookup::new());
        assert!(e.message.contains("declared twice"));

        // a shared sum cannot take over an ordinary sum's name
        let e = semantic_err("module m { shared action = Foo }", &mut lookup);
        assert_eq!(e.conflicting_names, vec!["action".to_string()]);

        // a product named like an existing qualified key
        let e = semantic_err("module m { action__Foo = (int x) }", &mut lookup);
        assert_eq!(e.conflicting_names, vec!["action__Foo".to_string()]);
    }

    #[test]
    fn unknown_and_builtin_names() {
        let mut lookup = TypeLookup::new();
        let e = semantic_err("module m { t = A(widget w) }", &mut lookup);
        assert_eq!(e.conflicting_names, vec!["t__A".to_string(), "widget".to_string()]);
        assert!(lookup.is_empty());

        let e = semantic_err("module m { t = (map[string, array[gadget]] g) }", &mut lookup);
        assert!(e.message.contains("unknown type `gadget`"));

        let e = semantic_err("module m { int = (string s) }", &mut lookup);
        assert!(e.message.contains("builtin"));
        semantic_err("module m { map = A | B }", &mut lookup);
    }

    #[test]
    fn later_schemas_see_earlier_types() {
        let mut lookup = TypeLookup::new();
        load_schema_str(DEMO, &mut lookup, false).unwrap();
        load_schema_str("module uses { line = (point start, point end, action? act) }", &mut lookup, false).unwrap();
        let line = lookup.get("line").unwrap();
        assert_eq!(line.fields[2].ty, ResolvedType::Sum("action".into()));
        assert_eq!(line.fields[2].quantifier, Quantifier::Optional);
    }

    #[test]
    fn syntax_errors_pass_through_unchanged() {
        let mut lookup = TypeLookup::new();
        let err = load_schema_str("module foo { t = (map[string] a) }", &mut lookup, false).unwrap_err();
        assert!(matches!(err, Error::Syntax(_)), "{err:?}");
        assert!(lookup.is_empty());
    }

    #[test]
    fn verbosity_does_not_change_results() {
        let mut quiet = TypeLookup::new();
        let mut loud = TypeLookup::new();
        let a = load_schema_str(TYPED_DEMO, &mut quiet, false).unwrap();
        let b = load_schema_str(TYPED_DEMO, &mut loud, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(quiet, loud);
    }
}
