//! Domain errors for the link-table pipeline.
//!
//! Transport and I/O plumbing flows through `anyhow`; the variants here are the
//! conditions callers need to tell apart (fatal upstream data problems versus
//! per-file rewrite failures).

use crate::platform::PlatformId;
use crate::rewrite::BlockError;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LinksError {
    /// A variant tag did not have the `cuda<N>` shape.
    MalformedVariantTag {
        platform: PlatformId,
        version: String,
        tag: String,
    },
    /// A variant entry was missing fields or had the wrong types.
    MalformedVariantEntry {
        platform: PlatformId,
        version: String,
        tag: String,
        reason: String,
    },
    /// A platform key mapped to something other than an object of variants.
    MalformedPlatformSection { platform: PlatformId, version: String },
    /// The generated block in a target file could not be located or replaced.
    Block { path: PathBuf, kind: BlockError },
    /// A platform name outside the supported set.
    UnknownPlatform(String),
    /// A version string that is not plain `major.minor.patch`.
    InvalidVersion(String),
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for LinksError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinksError::MalformedVariantTag {
                platform,
                version,
                tag,
            } => write!(
                f,
                "Malformed variant tag '{}' for {} in manifest {} (expected 'cuda<N>')",
                tag, platform, version
            ),
            LinksError::MalformedVariantEntry {
                platform,
                version,
                tag,
                reason,
            } => write!(
                f,
                "Malformed entry '{}' for {} in manifest {}: {}",
                tag, platform, version, reason
            ),
            LinksError::MalformedPlatformSection { platform, version } => write!(
                f,
                "Platform section {} in manifest {} is not an object",
                platform, version
            ),
            LinksError::Block { path, kind } => write!(f, "{}: {}", path.display(), kind),
            LinksError::UnknownPlatform(name) => write!(f, "Unknown platform: {}", name),
            LinksError::InvalidVersion(v) => {
                write!(f, "Invalid version '{}' (expected major.minor.patch)", v)
            }
            LinksError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for LinksError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinksError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LinksError {
    fn from(e: std::io::Error) -> Self {
        LinksError::Io(e)
    }
}
