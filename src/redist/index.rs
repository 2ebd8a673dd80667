use super::Transport;
use crate::LinksError;
use crate::version::ManifestVersion;
use anyhow::{Context, Result};
use colored::*;
use regex::Regex;
use std::collections::HashSet;

const MANIFEST_LINK_PATTERN: &str = r">redistrib_(\d+\.\d+\.\d+)\.json<";

/// A scanned listing: accepted versions plus link-shaped entries that are not
/// plain `major.minor.patch` versions.
#[derive(Debug, Default)]
pub struct IndexListing {
    pub versions: Vec<ManifestVersion>,
    pub ignored: Vec<LinksError>,
}

/// Scan a directory listing for manifest links, in order of first
/// appearance. Repeated links collapse into one entry.
pub fn scan_index(body: &str) -> Result<IndexListing> {
    let re = Regex::new(MANIFEST_LINK_PATTERN).context("Invalid manifest link pattern")?;

    let mut seen = HashSet::new();
    let mut listing = IndexListing::default();
    for caps in re.captures_iter(body) {
        let raw = &caps[1];
        if !seen.insert(raw.to_string()) {
            continue;
        }
        match ManifestVersion::parse(raw) {
            Ok(v) => listing.versions.push(v),
            Err(e) => listing.ignored.push(e),
        }
    }
    Ok(listing)
}

fn ignored_entry_message(err: &LinksError) -> String {
    format!("ignoring listing entry: {}", err)
}

/// Extract manifest versions from a directory listing, warning about every
/// entry that was dropped.
pub fn parse_index(body: &str) -> Result<Vec<ManifestVersion>> {
    let listing = scan_index(body)?;
    for err in &listing.ignored {
        println!("   {} {}", "⚠".yellow(), ignored_entry_message(err));
    }
    Ok(listing.versions)
}

/// Fetch the listing at `base_url` and return the manifests to process.
///
/// With `min_version`, older manifests are dropped; discovery order is kept.
pub fn discover_versions<T: Transport>(
    transport: &T,
    base_url: &str,
    min_version: Option<&ManifestVersion>,
) -> Result<Vec<ManifestVersion>> {
    println!("{} Fetching manifest index {}", "🔍".blue(), base_url);
    let body = transport
        .get_text(base_url)
        .context("Failed to fetch manifest index")?;

    let mut versions = parse_index(&body)?;
    if let Some(min) = min_version {
        versions.retain(|v| v >= min);
    }
    Ok(versions)
}
