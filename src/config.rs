//! Configuration file parsing (`links.toml`).
//!
//! Every field has a default, so a missing file or a partial file still yields
//! the stock cuDNN setup.

use crate::platform::PlatformId;
use crate::rewrite::{BlockMarkers, ClosingMatch};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "links.toml";

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory listing that links every `redistrib_<version>.json`.
    pub base_url: String,
    /// Top-level manifest key holding the per-platform data.
    pub library: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub dir: PathBuf,
    /// File name inside `dir`; `{platform}` is replaced by the platform key.
    pub file_pattern: String,
    pub open_marker: String,
    pub close_marker: String,
    pub close_match: ClosingMatch,
    pub platforms: Vec<PlatformId>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://developer.download.nvidia.com/compute/cudnn/redist".to_string(),
            library: "cudnn".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("src/links"),
            file_pattern: "{platform}-links.ts".to_string(),
            open_marker: "this.cudnnVersionToURL = new Map([".to_string(),
            close_marker: "    ])".to_string(),
            close_match: ClosingMatch::default(),
            platforms: PlatformId::ALL.to_vec(),
        }
    }
}

impl LinksConfig {
    /// Load from an explicit path, else `links.toml` in the working
    /// directory if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if !local.exists() {
                    return Ok(Self::default());
                }
                local
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LinksConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            bail!("[source] base_url must not be empty");
        }
        if self.source.library.trim().is_empty() {
            bail!("[source] library must not be empty");
        }
        if self.target.open_marker.trim().is_empty() || self.target.close_marker.trim().is_empty()
        {
            bail!("[target] open_marker and close_marker must not be blank");
        }
        if !self.target.file_pattern.contains("{platform}") {
            bail!("[target] file_pattern must contain '{{platform}}'");
        }
        if self.target.platforms.is_empty() {
            bail!("[target] platforms must list at least one platform");
        }
        let mut seen = HashSet::new();
        for platform in &self.target.platforms {
            if !seen.insert(platform) {
                bail!("[target] platform '{}' is listed twice", platform);
            }
        }
        Ok(())
    }

    /// Resolve a relative target directory against `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        if self.target.dir.is_relative() {
            self.target.dir = root.join(&self.target.dir);
        }
        self
    }

    pub fn target_path(&self, platform: PlatformId) -> PathBuf {
        self.target.dir.join(
            self.target
                .file_pattern
                .replace("{platform}", platform.as_str()),
        )
    }

    pub fn markers(&self) -> BlockMarkers {
        BlockMarkers {
            open: self.target.open_marker.clone(),
            close: self.target.close_marker.clone(),
            close_match: self.target.close_match,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.source.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_cudnn_defaults() {
        let config = LinksConfig::from_toml_str("").unwrap();
        assert_eq!(config.source.library, "cudnn");
        assert_eq!(config.target.platforms, PlatformId::ALL.to_vec());
        assert_eq!(config.target.close_match, ClosingMatch::Prefix);
        assert_eq!(
            config.target_path(PlatformId::LinuxSbsa),
            PathBuf::from("src/links/linux-sbsa-links.ts")
        );
    }

    #[test]
    fn test_partial_config_overrides_fields() {
        let config = LinksConfig::from_toml_str(
            r#"
[source]
base_url = "http://mirror.local/cudnn"
timeout_secs = 15

[target]
platforms = ["linux-x86_64", "windows-x86_64"]
close_match = "exact"
"#,
        )
        .unwrap();
        assert_eq!(config.source.base_url, "http://mirror.local/cudnn");
        assert_eq!(config.source.library, "cudnn");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(
            config.target.platforms,
            vec![PlatformId::LinuxX86_64, PlatformId::WindowsX86_64]
        );
        assert_eq!(config.markers().close_match, ClosingMatch::Exact);
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let err = LinksConfig::from_toml_str("[target]\nplatforms = [\"macos-arm64\"]\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_duplicate_platform_is_rejected() {
        let err = LinksConfig::from_toml_str(
            "[target]\nplatforms = [\"linux-sbsa\", \"linux-sbsa\"]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_pattern_without_placeholder_is_rejected() {
        assert!(LinksConfig::from_toml_str("[target]\nfile_pattern = \"links.ts\"\n").is_err());
    }

    #[test]
    fn test_with_root_only_touches_relative_dirs() {
        let config = LinksConfig::default().with_root(Path::new("/repo"));
        assert_eq!(config.target.dir, PathBuf::from("/repo/src/links"));

        let mut absolute = LinksConfig::default();
        absolute.target.dir = PathBuf::from("/abs/links");
        let absolute = absolute.with_root(Path::new("/repo"));
        assert_eq!(absolute.target.dir, PathBuf::from("/abs/links"));
    }
}
