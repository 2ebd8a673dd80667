//! Vendor redistribution source.
//!
//! This module talks to the vendor's `redist` directory:
//!
//! - **Transport**: the blocking GET seam (`ureq` in production)
//! - **Index**: discovers `redistrib_<version>.json` manifests from the listing
//! - **Manifest**: loads one manifest and extracts the library section

mod index;
mod manifest;
mod transport;

pub use index::{IndexListing, discover_versions, parse_index, scan_index};
pub use manifest::{
    LibrarySection, SkipReason, VariantRecord, load_manifest, manifest_url, parse_manifest,
};
pub use transport::{HttpTransport, Transport};
