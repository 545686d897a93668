//! JSON views for tooling. The lookup table serializes itself; modules are
//! emitted here so type expressions stay in their source spelling.
use serde_json::{json, Value};

use crate::ast::{Field, Module, TypeDecl};

pub fn emit_module(module: &Module) -> Value {
    let decls: Vec<Value> = module.decls.iter().map(emit_decl).collect();
    json!({ "module": module.name, "decls": decls })
}

fn emit_decl(decl: &TypeDecl) -> Value {
    match decl {
        TypeDecl::Product(product) => json!({
            "name": product.name,
            "kind": "product",
            "fields": emit_fields(&product.fields),
        }),
        TypeDecl::Sum(sum) => {
            let variants: Vec<Value> = sum.variants.iter().map(|v| json!({
                "name": v.name,
                "fields": emit_fields(&v.fields),
            })).collect();
            let mut o = json!({
                "name": sum.name,
                "kind": "sum",
                "shared": sum.shared,
                "variants": variants,
            });
            if !sum.common_fields.is_empty() {
                o["common_fields"] = emit_fields(&sum.common_fields);
            }
            o
        }
    }
}

fn emit_fields(fields: &[Field]) -> Value {
    Value::Array(fields.iter().map(|f| json!({
        "name": f.name,
        "type": f.ty.to_string(),
        "quantifier": f.quantifier,
    })).collect())
}
