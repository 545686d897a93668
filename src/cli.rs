//! Minimal CLI: parse | load
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use asdl_front::{emit, load_schema, parse_str, TypeLookup};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse ASDL schema files, or load them into one type lookup and print it as JSON
#[derive(Parser, Debug)]
#[command(name = "asdl-front", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse each schema on its own and print the AST
    Parse(ParseOut),
    /// load schemas in order into one lookup and print the lookup as JSON
    Load(LoadOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns.
    /// Glob matches are taken in sorted order.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ParseOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// print a JSON view instead of schema text
    #[arg(long)]
    json: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct LoadOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// log every registered name and tag
    #[arg(short, long)]
    verbose: bool,

    /// jq filter applied to the lookup JSON before printing
    #[arg(long)]
    jq_expr: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn paths(&self) -> Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `RUST_LOG` wins; otherwise warnings only, or info under `load --verbose`.
    pub fn init_logging(&self) {
        let default = match &self.cmd {
            Command::Load(target) if target.verbose => "info",
            _ => "warn",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Parse(target) => {
                let paths = target.input_settings.paths()?;

                // files are independent here; collect keeps input order
                let modules = paths
                    .par_iter()
                    .map(|path| {
                        let source = std::fs::read_to_string(path)
                            .with_context(|| format!("failed to read {}", path.display()))?;
                        parse_str(&source).with_context(|| format!("failed to parse {}", path.display()))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let rendered = if target.json {
                    let views: Vec<_> = modules.iter().map(emit::emit_module).collect();
                    serde_json::to_string_pretty(&views)?
                } else {
                    modules.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n\n")
                };
                write_output(target.out.as_deref(), &rendered)
            }
            Command::Load(target) => {
                let paths = target.input_settings.paths()?;

                let mut lookup = TypeLookup::new();
                for path in &paths {
                    let file = File::open(path)
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    let module = load_schema(BufReader::new(file), &mut lookup, target.verbose)
                        .with_context(|| format!("failed to load {}", path.display()))?;
                    tracing::debug!(module = %module.name, path = %path.display(), "loaded");
                }

                let value = serde_json::to_value(&lookup)?;
                let rendered = match target.jq_expr.as_ref() {
                    None => serde_json::to_string_pretty(&value)?,
                    Some(jq_expr) => {
                        let results = crate::jq_exec::apply_filter(jq_expr, &value)?;
                        let mut lines = Vec::with_capacity(results.len());
                        for result in &results {
                            lines.push(serde_json::to_string_pretty(result)?);
                        }
                        lines.join("\n")
                    }
                };
                write_output(target.out.as_deref(), &rendered)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .collect::<Result<Vec<_>, _>>()?;
        if matched.is_empty() {
            bail!("glob pattern matched no files: {pattern}");
        }
        // load order decides tag values, so keep it stable
        matched.sort();
        out.extend(matched);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns_expand_sorted() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/cases/shared_variant");
        let paths = resolve_file_path_patterns([format!("{dir}/*.asdl")]).unwrap();
        let names: Vec<_> = paths.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["01_expr.asdl", "02_word_part.asdl"]);

        assert!(resolve_file_path_patterns([format!("{dir}/*.nothing")]).is_err());
        // literal paths pass through untouched
        assert_eq!(resolve_file_path_patterns(["a.asdl"]).unwrap(), vec![PathBuf::from("a.asdl")]);
    }

    #[test]
    fn cli_arguments_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "asdl-front", "load", "-i", "a.asdl", "b.asdl", "--verbose", "--jq-expr", ".entries",
        ])
        .unwrap();
        let Command::Load(load) = cli.cmd else { panic!("expected load") };
        assert_eq!(load.input_settings.input, vec!["a.asdl", "b.asdl"]);
        assert!(load.verbose);
        assert_eq!(load.jq_expr.as_deref(), Some(".entries"));

        assert!(CommandLineInterface::try_parse_from(["asdl-front", "parse"]).is_err());
    }
}
