//! Per-platform accumulation of manifest data.
//!
//! A [`ReleaseTables`] is created once per run and fed every loaded manifest
//! in discovery order. Each platform gets its own [`PlatformTable`]; a version
//! appears in a table only if that manifest had data for the platform.

use crate::error::LinksError;
use crate::platform::PlatformId;
use crate::redist::{LibrarySection, VariantRecord};
use crate::version::ManifestVersion;
use colored::*;
use serde::Deserialize;
use serde_json::Value;

/// Variant tags are `cuda` followed by the CUDA major version.
pub const VARIANT_TAG_PREFIX: &str = "cuda";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantEntry {
    pub ordinal: u32,
    pub url: String,
    pub sha256: String,
    pub size: u64,
}

/// Parse the CUDA major version out of a variant tag such as `cuda12`.
pub fn parse_variant_ordinal(tag: &str) -> Option<u32> {
    let digits = tag.strip_prefix(VARIANT_TAG_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone)]
pub struct PlatformTable {
    platform: PlatformId,
    versions: Vec<(ManifestVersion, Vec<VariantEntry>)>,
}

impl PlatformTable {
    pub fn new(platform: PlatformId) -> Self {
        Self {
            platform,
            versions: Vec::new(),
        }
    }

    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn variant_count(&self) -> usize {
        self.versions.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn get(&self, version: &ManifestVersion) -> Option<&[VariantEntry]> {
        self.versions
            .iter()
            .find(|(v, _)| v == version)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ManifestVersion, &[VariantEntry])> {
        self.versions.iter().map(|(v, e)| (v, e.as_slice()))
    }

    /// Store the variants for `version`. A version seen before keeps its
    /// position and has its variants replaced.
    pub fn set_version(&mut self, version: ManifestVersion, entries: Vec<VariantEntry>) {
        match self.versions.iter_mut().find(|(v, _)| *v == version) {
            Some((_, slot)) => *slot = entries,
            None => self.versions.push((version, entries)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseTables {
    base_url: String,
    tables: Vec<PlatformTable>,
}

impl ReleaseTables {
    /// `base_url` is the redist root that manifest `relative_path`s hang off.
    pub fn new(base_url: &str, platforms: &[PlatformId]) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tables: platforms.iter().copied().map(PlatformTable::new).collect(),
        }
    }

    pub fn get(&self, platform: PlatformId) -> Option<&PlatformTable> {
        self.tables.iter().find(|t| t.platform == platform)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformTable> {
        self.tables.iter()
    }

    /// Record every supported platform's variants from one manifest.
    ///
    /// Returns the number of variants recorded. Unknown platform keys are
    /// ignored; malformed variant data is an error and nothing from this
    /// manifest is recorded.
    pub fn ingest(
        &mut self,
        version: &ManifestVersion,
        section: &LibrarySection,
    ) -> Result<usize, LinksError> {
        let mut staged = Vec::new();

        for table in &self.tables {
            let platform = table.platform;
            let Some(platform_data) = section.get(platform.as_str()) else {
                continue;
            };
            let Value::Object(variants) = platform_data else {
                return Err(LinksError::MalformedPlatformSection {
                    platform,
                    version: version.to_string(),
                });
            };

            let mut entries = Vec::with_capacity(variants.len());
            for (tag, data) in variants {
                println!(
                    "   {} platform={}, cuda_variant={}",
                    "-".dimmed(),
                    platform,
                    tag
                );
                entries.push(self.variant_entry(platform, version, tag, data)?);
            }
            if !entries.is_empty() {
                staged.push((platform, entries));
            }
        }

        let mut recorded = 0;
        for (platform, entries) in staged {
            recorded += entries.len();
            if let Some(table) = self.tables.iter_mut().find(|t| t.platform == platform) {
                table.set_version(version.clone(), entries);
            }
        }
        Ok(recorded)
    }

    fn variant_entry(
        &self,
        platform: PlatformId,
        version: &ManifestVersion,
        tag: &str,
        data: &Value,
    ) -> Result<VariantEntry, LinksError> {
        let ordinal =
            parse_variant_ordinal(tag).ok_or_else(|| LinksError::MalformedVariantTag {
                platform,
                version: version.to_string(),
                tag: tag.to_string(),
            })?;

        let record = VariantRecord::deserialize(data).map_err(|e| {
            LinksError::MalformedVariantEntry {
                platform,
                version: version.to_string(),
                tag: tag.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(VariantEntry {
            ordinal,
            url: format!(
                "{}/{}",
                self.base_url,
                record.relative_path.trim_start_matches('/')
            ),
            sha256: record.sha256,
            size: record.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redist::parse_manifest;

    const BASE: &str = "https://developer.download.nvidia.com/compute/cudnn/redist";

    fn v(s: &str) -> ManifestVersion {
        ManifestVersion::parse(s).unwrap()
    }

    fn section(body: &str) -> LibrarySection {
        parse_manifest(body, "cudnn").unwrap()
    }

    const MANIFEST_9_1_0: &str = r#"{
        "cudnn": {
            "name": "NVIDIA CUDA Deep Neural Network library",
            "license": "cudnn",
            "version": "9.1.0.70",
            "linux-x86_64": {
                "cuda11": {
                    "relative_path": "cudnn/linux-x86_64/cudnn-linux-x86_64-9.1.0.70_cuda11-archive.tar.xz",
                    "sha256": "aaa1",
                    "size": "100"
                },
                "cuda12": {
                    "relative_path": "cudnn/linux-x86_64/cudnn-linux-x86_64-9.1.0.70_cuda12-archive.tar.xz",
                    "sha256": "bbb2",
                    "size": 200
                }
            },
            "linux-aarch64": {
                "cuda12": {
                    "relative_path": "cudnn/linux-aarch64/cudnn-linux-aarch64-9.1.0.70_cuda12-archive.tar.xz",
                    "sha256": "ccc3",
                    "size": "300"
                }
            },
            "macos-arm64": {
                "cuda12": { "relative_path": "x", "sha256": "y", "size": 1 }
            }
        }
    }"#;

    #[test]
    fn test_parse_variant_ordinal() {
        assert_eq!(parse_variant_ordinal("cuda12"), Some(12));
        assert_eq!(parse_variant_ordinal("cuda11"), Some(11));
        assert_eq!(parse_variant_ordinal("cuda"), None);
        assert_eq!(parse_variant_ordinal("cudx12"), None);
        assert_eq!(parse_variant_ordinal("cu12"), None);
        assert_eq!(parse_variant_ordinal("cuda1x"), None);
        assert_eq!(parse_variant_ordinal("cuda+12"), None);
    }

    #[test]
    fn test_ingest_records_supported_platforms_in_order() {
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        let recorded = tables
            .ingest(&v("9.1.0"), &section(MANIFEST_9_1_0))
            .unwrap();
        assert_eq!(recorded, 3);

        let x86 = tables.get(PlatformId::LinuxX86_64).unwrap();
        let entries = x86.get(&v("9.1.0")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ordinal, 11);
        assert_eq!(entries[1].ordinal, 12);
        assert_eq!(
            entries[0].url,
            format!("{BASE}/cudnn/linux-x86_64/cudnn-linux-x86_64-9.1.0.70_cuda11-archive.tar.xz")
        );
        assert_eq!(entries[0].sha256, "aaa1");
        assert_eq!(entries[0].size, 100);
        assert_eq!(entries[1].size, 200);

        assert_eq!(tables.get(PlatformId::LinuxAarch64).unwrap().variant_count(), 1);
        assert!(tables.get(PlatformId::WindowsX86_64).unwrap().is_empty());
        assert!(tables.get(PlatformId::LinuxSbsa).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_only_tracks_configured_platforms() {
        let mut tables = ReleaseTables::new(BASE, &[PlatformId::LinuxAarch64]);
        tables
            .ingest(&v("9.1.0"), &section(MANIFEST_9_1_0))
            .unwrap();
        assert!(tables.get(PlatformId::LinuxX86_64).is_none());
        assert_eq!(tables.iter().count(), 1);
    }

    #[test]
    fn test_ingest_is_idempotent_per_version() {
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        let manifest = section(MANIFEST_9_1_0);
        tables.ingest(&v("9.0.0"), &manifest).unwrap();
        tables.ingest(&v("9.1.0"), &manifest).unwrap();
        tables.ingest(&v("9.0.0"), &manifest).unwrap();

        let x86 = tables.get(PlatformId::LinuxX86_64).unwrap();
        let order: Vec<&str> = x86.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(order, vec!["9.0.0", "9.1.0"]);
        assert_eq!(x86.variant_count(), 4);
    }

    #[test]
    fn test_ingest_rejects_malformed_tag_without_recording() {
        let body = r#"{"cudnn": {
            "linux-x86_64": { "cuda12": { "relative_path": "a", "sha256": "b", "size": 1 } },
            "linux-sbsa": { "rocm6": { "relative_path": "a", "sha256": "b", "size": 1 } }
        }}"#;
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        let err = tables.ingest(&v("9.1.0"), &section(body)).unwrap_err();
        assert!(matches!(
            err,
            LinksError::MalformedVariantTag { platform: PlatformId::LinuxSbsa, ref tag, .. } if tag == "rocm6"
        ));
        assert!(tables.get(PlatformId::LinuxX86_64).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_rejects_entry_missing_fields() {
        let body = r#"{"cudnn": {
            "linux-x86_64": { "cuda12": { "relative_path": "a", "size": 1 } }
        }}"#;
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        let err = tables.ingest(&v("9.1.0"), &section(body)).unwrap_err();
        assert!(matches!(err, LinksError::MalformedVariantEntry { .. }));
    }

    #[test]
    fn test_ingest_rejects_non_object_platform() {
        let body = r#"{"cudnn": { "linux-x86_64": "cudnn-linux.tar.xz" }}"#;
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        let err = tables.ingest(&v("9.1.0"), &section(body)).unwrap_err();
        assert!(matches!(err, LinksError::MalformedPlatformSection { .. }));
    }

    #[test]
    fn test_empty_platform_object_records_nothing() {
        let body = r#"{"cudnn": { "linux-x86_64": {} }}"#;
        let mut tables = ReleaseTables::new(BASE, &PlatformId::ALL);
        assert_eq!(tables.ingest(&v("9.1.0"), &section(body)).unwrap(), 0);
        assert!(tables.get(PlatformId::LinuxX86_64).unwrap().is_empty());
    }
}
