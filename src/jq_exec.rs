//! jq filtering of the emitted JSON, via jaq.
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output of the filter becomes one value.
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| anyhow!("jq filter `{filter_src}` failed: {e:?}"))?;
        // Val prints as JSON text
        let json = serde_json::from_str(&val.to_string())
            .with_context(|| format!("jq filter `{filter_src}` produced non-JSON output"))?;
        out.push(json);
    }
    Ok(out)
}

fn parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let lines: Vec<String> = errs
        .into_iter()
        .map(|(file, err)| format!("cannot parse jq filter `{}`: {err:?}", file.code))
        .collect();
    anyhow!(lines.join("\n"))
}

fn undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> anyhow::Error {
    let mut lines = Vec::new();
    for (file, list) in errs {
        for (name, undef) in list {
            lines.push(format!("undefined `{name}` ({undef:?}) in jq filter `{}`", file.code));
        }
    }
    anyhow!(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_from_lookup_json() {
        let input = json!({ "entries": { "t__A": { "tag": 1 }, "t__B": { "tag": 2 } } });
        let out = apply_filter(".entries.t__B.tag", &input).unwrap();
        assert_eq!(out, vec![json!(2)]);

        let out = apply_filter(".entries | keys | .[]", &input).unwrap();
        assert_eq!(out, vec![json!("t__A"), json!("t__B")]);
    }

    #[test]
    fn bad_filters_are_errors() {
        assert!(apply_filter(".entries |", &json!({})).is_err());
        assert!(apply_filter("no_such_function", &json!({})).is_err());
    }
}
