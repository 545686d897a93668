//! Runs every case under `testdata/cases/`: the case's `.asdl` files are
//! loaded in file-name order into one lookup and checked against
//! `expected.json`.
mod expect;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use asdl_front::{load_schema_str, TypeLookup};
use colored::Colorize;

use expect::{ErrorKind, Expected};

fn main() -> ExitCode {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../testdata/cases"));

    let cases = match case_dirs(&root) {
        Ok(cases) => cases,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for case in &cases {
        let name = case.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        match run_case(case) {
            Ok(()) => eprintln!("{} {name}", "PASS".green()),
            Err(error) => {
                failed += 1;
                eprintln!("{} {name}: {error:#}", "FAIL".red());
            }
        }
    }

    eprintln!("{} cases, {} failed", cases.len(), failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn case_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*/expected.json", root.display());
    let mut dirs = Vec::new();
    for entry in glob::glob(&pattern)? {
        if let Some(dir) = entry?.parent() {
            dirs.push(dir.to_path_buf());
        }
    }
    if dirs.is_empty() {
        bail!("no cases under {}", root.display());
    }
    dirs.sort();
    Ok(dirs)
}

fn run_case(dir: &Path) -> Result<()> {
    let expected_src = std::fs::read_to_string(dir.join("expected.json"))?;
    let expected: Expected = expect::from_str_with_path(&expected_src)
        .context("bad expected.json")?;

    let mut schemas = glob::glob(&format!("{}/*.asdl", dir.display()))?
        .collect::<Result<Vec<_>, _>>()?;
    schemas.sort();

    let mut lookup = TypeLookup::new();
    for schema in &schemas {
        let src = std::fs::read_to_string(schema)?;
        if let Err(error) = load_schema_str(&src, &mut lookup, false) {
            return match (expected.error, ErrorKind::of(&error)) {
                (Some(want), Some(got)) if want == got => Ok(()),
                (want, _) => bail!("{}: expected {want:?}, got error: {error}", schema.display()),
            };
        }
    }
    if let Some(want) = expected.error {
        bail!("expected a {want:?} error, but every schema loaded");
    }

    for (key, want) in &expected.tags {
        let got = lookup.get(key).map(|d| d.tag);
        if got != Some(*want) {
            bail!("tag of `{key}`: expected {want}, got {got:?}");
        }
    }
    for group in &expected.same_tag {
        let tags: Vec<_> = group.iter().map(|key| lookup.get(key).map(|d| d.tag)).collect();
        if tags.iter().any(Option::is_none) || tags.windows(2).any(|w| w[0] != w[1]) {
            bail!("expected one tag for {group:?}, got {tags:?}");
        }
    }
    Ok(())
}
