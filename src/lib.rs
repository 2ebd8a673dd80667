//! # cudnn-links - cuDNN link table updater
//!
//! Keeps the generated cuDNN download tables in `src/links/*-links.ts` in
//! sync with NVIDIA's published redistribution manifests.
//!
//! ## Pipeline
//!
//! 1. Discover `redistrib_<version>.json` manifests from the redist listing
//! 2. Load each manifest and pull out the `cudnn` section
//! 3. Aggregate variants into one table per platform
//! 4. Render each table in the links-file `Map` syntax
//! 5. Replace the generated block in each platform's links file
//!
//! ## Quick Start
//!
//! ```bash
//! # Rewrite every links file from the live manifests
//! cudnn-links update
//!
//! # Fail (exit 1) if any links file is stale
//! cudnn-links check
//! ```
//!
//! ## Module Organization
//!
//! - [`redist`] - Manifest discovery and loading
//! - [`aggregate`] - Per-platform release tables
//! - [`render`] - Links-file syntax
//! - [`rewrite`] - Generated-block replacement
//! - [`update`] - Pipeline orchestration and reporting

/// Per-platform accumulation of manifest data.
pub mod aggregate;

/// Configuration file parsing (`links.toml`).
pub mod config;

/// Domain error type.
pub mod error;

/// Supported target platforms.
pub mod platform;

/// Vendor manifest index and manifest loading.
pub mod redist;

/// Rendering of platform tables.
pub mod render;

/// Generated-block replacement in links files.
pub mod rewrite;

/// Terminal UI utilities (tables, colors).
pub mod ui;

/// End-to-end update pipeline.
pub mod update;

/// Manifest version identifiers.
pub mod version;

pub use error::LinksError;
