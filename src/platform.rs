use crate::error::LinksError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target platforms that have a generated links file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlatformId {
    #[serde(rename = "linux-aarch64")]
    LinuxAarch64,
    #[serde(rename = "linux-x86_64")]
    LinuxX86_64,
    #[serde(rename = "linux-ppc64le")]
    LinuxPpc64le,
    #[serde(rename = "linux-sbsa")]
    LinuxSbsa,
    #[serde(rename = "windows-x86_64")]
    WindowsX86_64,
}

impl PlatformId {
    pub const ALL: [PlatformId; 5] = [
        PlatformId::LinuxAarch64,
        PlatformId::LinuxX86_64,
        PlatformId::LinuxPpc64le,
        PlatformId::LinuxSbsa,
        PlatformId::WindowsX86_64,
    ];

    /// Key used both in the vendor manifest and in target file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::LinuxAarch64 => "linux-aarch64",
            PlatformId::LinuxX86_64 => "linux-x86_64",
            PlatformId::LinuxPpc64le => "linux-ppc64le",
            PlatformId::LinuxSbsa => "linux-sbsa",
            PlatformId::WindowsX86_64 => "windows-x86_64",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = LinksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| LinksError::UnknownPlatform(s.to_string()))
    }
}
