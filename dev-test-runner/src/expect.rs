//! `expected.json` for one case directory.
use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expected {
    /// fully-qualified name → tag
    #[serde(default)]
    pub tags: BTreeMap<String, u32>,
    /// groups of keys that must carry one tag
    #[serde(default)]
    pub same_tag: Vec<Vec<String>>,
    /// the load must fail with this kind of error
    #[serde(default)]
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Lex,
    Syntax,
    Semantic,
}

impl ErrorKind {
    pub fn of(error: &asdl_front::Error) -> Option<Self> {
        match error {
            asdl_front::Error::Lex(_) => Some(Self::Lex),
            asdl_front::Error::Syntax(_) => Some(Self::Syntax),
            asdl_front::Error::Semantic(_) => Some(Self::Semantic),
            asdl_front::Error::Io(_) => None,
        }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        anyhow!("at JSON path {path} → {}", err.into_inner())
    })
}
