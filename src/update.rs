//! The update pipeline.
//!
//! [`Updater::collect`] fetches and aggregates every manifest before any file
//! is opened, so a transport failure or malformed upstream data aborts the run
//! with all links files untouched. [`Updater::apply`] then rewrites each
//! platform's file independently; one broken file does not stop the others.

use crate::aggregate::ReleaseTables;
use crate::config::LinksConfig;
use crate::platform::PlatformId;
use crate::redist::{Transport, discover_versions, load_manifest};
use crate::render::render_table;
use crate::rewrite::{RewriteOutcome, rewrite_file};
use crate::ui::Table;
use crate::version::ManifestVersion;
use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Updated,
    Unchanged,
    WouldUpdate,
    /// No manifest had data for the platform; the file was not opened.
    NoData,
    Failed(String),
}

impl FileStatus {
    fn label(&self) -> String {
        match self {
            FileStatus::Updated => "updated".green().to_string(),
            FileStatus::Unchanged => "up to date".dimmed().to_string(),
            FileStatus::WouldUpdate => "would update".yellow().to_string(),
            FileStatus::NoData => "no data".dimmed().to_string(),
            FileStatus::Failed(_) => "failed".red().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlatformReport {
    pub platform: PlatformId,
    pub file: PathBuf,
    pub versions: usize,
    pub variants: usize,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub platforms: Vec<PlatformReport>,
}

impl UpdateReport {
    pub fn failures(&self) -> impl Iterator<Item = &PlatformReport> {
        self.platforms
            .iter()
            .filter(|p| matches!(p.status, FileStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// True when no file needs (or needed, in dry-run) a rewrite.
    pub fn is_up_to_date(&self) -> bool {
        self.platforms
            .iter()
            .all(|p| matches!(p.status, FileStatus::Unchanged | FileStatus::NoData))
    }

    /// True when at least one platform had manifest data to write.
    pub fn has_data(&self) -> bool {
        self.platforms
            .iter()
            .any(|p| p.status != FileStatus::NoData)
    }

    pub fn print_summary(&self) {
        let mut table = Table::new(&["Platform", "Versions", "Variants", "File", "Status"]);
        for p in &self.platforms {
            table.add_row(vec![
                p.platform.to_string(),
                p.versions.to_string(),
                p.variants.to_string(),
                p.file.display().to_string(),
                p.status.label(),
            ]);
        }
        table.print();
    }
}

pub struct Updater<'a, T: Transport> {
    config: &'a LinksConfig,
    transport: T,
}

impl<'a, T: Transport> Updater<'a, T> {
    pub fn new(config: &'a LinksConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn discover(
        &self,
        min_version: Option<&ManifestVersion>,
    ) -> Result<Vec<ManifestVersion>> {
        discover_versions(&self.transport, &self.config.source.base_url, min_version)
    }

    /// Fetch every discovered manifest and fold it into per-platform tables.
    pub fn collect(&self, min_version: Option<&ManifestVersion>) -> Result<ReleaseTables> {
        let source = &self.config.source;
        let versions = self.discover(min_version)?;
        if versions.is_empty() {
            println!(
                "{} No manifests found in index {}; the listing format may have changed",
                "⚠".yellow(),
                source.base_url
            );
        } else {
            println!("{} Found {} manifest(s)", "✓".green(), versions.len());
        }

        let mut tables = ReleaseTables::new(&source.base_url, &self.config.target.platforms);
        for version in &versions {
            println!("{} {}_version={}", "+".green(), source.library, version);
            let Some(section) =
                load_manifest(&self.transport, &source.base_url, &source.library, version)?
            else {
                continue;
            };
            tables
                .ingest(version, &section)
                .with_context(|| format!("Refusing to use manifest {}", version))?;
        }
        Ok(tables)
    }

    /// Rewrite each platform's links file from `tables`.
    pub fn apply(&self, tables: &ReleaseTables, mode: WriteMode) -> UpdateReport {
        let markers = self.config.markers();
        let mut report = UpdateReport::default();

        for table in tables.iter() {
            let platform = table.platform();
            let file = self.config.target_path(platform);

            let status = if table.is_empty() {
                println!("   {} {}: no data, leaving file as is", "→".dimmed(), platform);
                FileStatus::NoData
            } else {
                let block = render_table(table);
                match rewrite_file(&file, &block, &markers, mode == WriteMode::DryRun) {
                    Ok(RewriteOutcome::Updated) => FileStatus::Updated,
                    Ok(RewriteOutcome::Unchanged) => FileStatus::Unchanged,
                    Ok(RewriteOutcome::WouldUpdate) => FileStatus::WouldUpdate,
                    Err(e) => {
                        eprintln!("{} {} ({}): {}", "x".red(), platform, file.display(), e);
                        FileStatus::Failed(e.to_string())
                    }
                }
            };

            if !matches!(status, FileStatus::NoData | FileStatus::Failed(_)) {
                println!(
                    "{} {} -> {} [{}]",
                    "✓".green(),
                    platform,
                    file.display(),
                    status.label()
                );
            }

            report.platforms.push(PlatformReport {
                platform,
                file,
                versions: table.version_count(),
                variants: table.variant_count(),
                status,
            });
        }
        report
    }

    pub fn run(
        &self,
        min_version: Option<&ManifestVersion>,
        mode: WriteMode,
    ) -> Result<UpdateReport> {
        let tables = self.collect(min_version)?;
        Ok(self.apply(&tables, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    const BASE: &str = "http://redist.test/cudnn";

    #[derive(Default)]
    struct FakeRedist(HashMap<String, String>);

    impl FakeRedist {
        fn index(versions: &[&str]) -> Self {
            let listing = versions
                .iter()
                .map(|v| format!("<a href=\"redistrib_{v}.json\">redistrib_{v}.json</a>"))
                .collect::<Vec<_>>()
                .join("\n");
            Self::default().page(BASE, &listing)
        }

        fn page(mut self, url: impl Into<String>, body: &str) -> Self {
            self.0.insert(url.into(), body.to_string());
            self
        }

        fn manifest(self, version: &str, body: &str) -> Self {
            self.page(format!("{BASE}/redistrib_{version}.json"), body)
        }
    }

    impl Transport for FakeRedist {
        fn get_text(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {}", url))
        }
    }

    fn config(dir: &std::path::Path) -> LinksConfig {
        let mut config = LinksConfig::default();
        config.source.base_url = BASE.to_string();
        config.target.dir = dir.to_path_buf();
        config.target.platforms = vec![PlatformId::LinuxX86_64, PlatformId::LinuxSbsa];
        config
    }

    const ONE_X86_VARIANT: &str = r#"{"cudnn": {"linux-x86_64": {"cuda12": {"relative_path": "a.tar.xz", "sha256": "s", "size": 1}}}}"#;

    const LINKS: &str = "class Links {\n  constructor() {\n    this.cudnnVersionToURL = new Map([\n    ])\n  }\n}\n";

    #[test]
    fn test_missing_library_key_skips_only_that_version() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let transport = FakeRedist::index(&["9.0.0", "9.1.0"])
            .manifest("9.0.0", r#"{"cutensor": {}}"#)
            .manifest("9.1.0", ONE_X86_VARIANT);

        let tables = Updater::new(&config, &transport).collect(None).unwrap();
        let x86 = tables.get(PlatformId::LinuxX86_64).unwrap();
        let versions: Vec<&str> = x86.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(versions, vec!["9.1.0"]);
    }

    #[test]
    fn test_apply_leaves_platforms_without_data_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let x86 = config.target_path(PlatformId::LinuxX86_64);
        let sbsa = config.target_path(PlatformId::LinuxSbsa);
        fs::write(&x86, LINKS).unwrap();
        fs::write(&sbsa, LINKS).unwrap();

        let transport = FakeRedist::index(&["9.1.0"]).manifest("9.1.0", ONE_X86_VARIANT);
        let report = Updater::new(&config, &transport)
            .run(None, WriteMode::Write)
            .unwrap();

        assert_eq!(report.platforms[0].status, FileStatus::Updated);
        assert_eq!(report.platforms[1].status, FileStatus::NoData);
        assert_eq!(fs::read_to_string(&sbsa).unwrap(), LINKS);
        assert!(fs::read_to_string(&x86)
            .unwrap()
            .contains(&format!("'{BASE}/a.tar.xz'")));
        assert!(!report.is_up_to_date());
    }

    #[test]
    fn test_apply_isolates_failing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let x86 = config.target_path(PlatformId::LinuxX86_64);
        let sbsa = config.target_path(PlatformId::LinuxSbsa);
        fs::write(&x86, "// drifted format, no marker\n").unwrap();
        fs::write(&sbsa, LINKS).unwrap();

        let manifest = r#"{"cudnn": {
            "linux-x86_64": {"cuda12": {"relative_path": "x.tar.xz", "sha256": "s", "size": 1}},
            "linux-sbsa": {"cuda12": {"relative_path": "s.tar.xz", "sha256": "s", "size": 1}}
        }}"#;
        let transport = FakeRedist::index(&["9.1.0"]).manifest("9.1.0", manifest);
        let report = Updater::new(&config, &transport)
            .run(None, WriteMode::Write)
            .unwrap();

        assert!(matches!(report.platforms[0].status, FileStatus::Failed(_)));
        assert_eq!(report.platforms[1].status, FileStatus::Updated);
        assert!(report.has_failures());
        assert_eq!(
            fs::read_to_string(&x86).unwrap(),
            "// drifted format, no marker\n"
        );
    }

    #[test]
    fn test_malformed_variant_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let x86 = config.target_path(PlatformId::LinuxX86_64);
        fs::write(&x86, LINKS).unwrap();

        let transport = FakeRedist::index(&["9.0.0", "9.1.0"])
            .manifest("9.0.0", ONE_X86_VARIANT)
            .manifest(
                "9.1.0",
                r#"{"cudnn": {"linux-x86_64": {"cu12": {"relative_path": "b", "sha256": "s", "size": 1}}}}"#,
            );
        let err = Updater::new(&config, &transport)
            .run(None, WriteMode::Write)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("cu12"));
        assert_eq!(fs::read_to_string(&x86).unwrap(), LINKS);
    }

    #[test]
    fn test_missing_manifest_is_a_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let transport = FakeRedist::index(&["9.1.0"]);
        let err = Updater::new(&config, &transport).collect(None).unwrap_err();
        assert!(format!("{:#}", err).contains("404"));
    }

    #[test]
    fn test_dry_run_reports_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let x86 = config.target_path(PlatformId::LinuxX86_64);
        fs::write(&x86, LINKS).unwrap();

        let transport = FakeRedist::index(&["9.1.0"]).manifest("9.1.0", ONE_X86_VARIANT);
        let report = Updater::new(&config, &transport)
            .run(None, WriteMode::DryRun)
            .unwrap();
        assert_eq!(report.platforms[0].status, FileStatus::WouldUpdate);
        assert_eq!(fs::read_to_string(&x86).unwrap(), LINKS);
    }

    #[test]
    fn test_empty_index_yields_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let x86 = config.target_path(PlatformId::LinuxX86_64);
        fs::write(&x86, LINKS).unwrap();

        let transport = FakeRedist::default().page(BASE, "<html><body>moved</body></html>");
        let report = Updater::new(&config, &transport)
            .run(None, WriteMode::DryRun)
            .unwrap();

        assert!(!report.has_data());
        assert!(report.is_up_to_date());
        assert_eq!(fs::read_to_string(&x86).unwrap(), LINKS);
    }
}
