use crate::error::LinksError;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` manifest version.
///
/// The text is kept exactly as published so URLs and rendered tables use the
/// vendor's spelling; the parsed form is only used for comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestVersion {
    raw: String,
    parsed: Version,
}

impl ManifestVersion {
    pub fn parse(s: &str) -> Result<Self, LinksError> {
        let parsed = Version::parse(s).map_err(|_| LinksError::InvalidVersion(s.to_string()))?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(LinksError::InvalidVersion(s.to_string()));
        }
        Ok(Self {
            raw: s.to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn semver(&self) -> &Version {
        &self.parsed
    }
}

impl FromStr for ManifestVersion {
    type Err = LinksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for ManifestVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed
            .cmp(&other.parsed)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ManifestVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
