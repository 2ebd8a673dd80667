use super::Transport;
use crate::version::ManifestVersion;
use anyhow::{Context, Result};
use colored::*;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

/// The library's object inside a manifest: platform key -> variant mapping,
/// plus metadata keys (`name`, `license`, ...) the aggregator ignores.
/// Keys keep their document order.
pub type LibrarySection = Map<String, Value>;

/// One downloadable archive as published in a manifest.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub relative_path: String,
    pub sha256: String,
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,
}

/// Sizes appear both as JSON numbers and as decimal strings.
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid size '{}'", s))),
    }
}

/// Why a manifest contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unparseable(String),
    NotAnObject,
    MissingLibrary(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unparseable(e) => write!(f, "manifest is not valid JSON ({})", e),
            SkipReason::NotAnObject => write!(f, "manifest is not a JSON object"),
            SkipReason::MissingLibrary(key) => write!(f, "'{}' not found in manifest", key),
        }
    }
}

pub fn manifest_url(base_url: &str, version: &ManifestVersion) -> String {
    format!(
        "{}/redistrib_{}.json",
        base_url.trim_end_matches('/'),
        version
    )
}

/// Pull the `library` section out of a manifest body.
pub fn parse_manifest(body: &str, library: &str) -> Result<LibrarySection, SkipReason> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| SkipReason::Unparseable(e.to_string()))?;

    let Value::Object(mut root) = document else {
        return Err(SkipReason::NotAnObject);
    };

    match root.remove(library) {
        Some(Value::Object(section)) => Ok(section),
        _ => Err(SkipReason::MissingLibrary(library.to_string())),
    }
}

/// Fetch one manifest.
///
/// `Ok(None)` means the manifest was unusable and has been reported; the run
/// should move on to the next version. Transport errors are returned.
pub fn load_manifest<T: Transport>(
    transport: &T,
    base_url: &str,
    library: &str,
    version: &ManifestVersion,
) -> Result<Option<LibrarySection>> {
    let url = manifest_url(base_url, version);
    let body = transport
        .get_text(&url)
        .with_context(|| format!("Failed to fetch manifest {}", version))?;

    match parse_manifest(&body, library) {
        Ok(section) => Ok(Some(section)),
        Err(reason) => {
            println!("   {} skipping {}: {}", "!".yellow(), version, reason);
            Ok(None)
        }
    }
}
