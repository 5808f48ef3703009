//! # mls-photos
//!
//! Pull the photos out of an MLS listing PDF and publish them to a draft
//! listing through its HTTP API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate the local path and %PDF header
//!  ├─ 2. Extract  walk page image objects via pdfium (spawn_blocking)
//!  ├─ 3. Dedupe   write files, drop byte-identical copies (SHA-256)
//!  ├─ 4. Order    landscape first, largest first; #0 is the cover
//!  ├─ 5. Upload   sequential multipart POSTs, linear backoff retries
//!  └─ 6. Patch    one PATCH with {hasPhotos, photoCount}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mls_photos::{sync_listing, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::builder()
//!         .listing_id("draft-1234")
//!         .api_base("https://api.example.com")
//!         .token(std::env::var("MLS_PHOTOS_TOKEN")?)
//!         .build()?;
//!
//!     let report = sync_listing("listing.pdf", &config).await?;
//!     eprintln!("uploaded {}/{}", report.uploaded, report.uploads.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mls-photos` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! The pdfium shared library is loaded at runtime; see
//! [`pipeline::extract::bind_pdfium`] for where it is looked up.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sync;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SyncConfig, SyncConfigBuilder, DEFAULT_STATUS_PATH, DEFAULT_UPLOAD_PATH};
pub use error::MlsPhotosError;
pub use output::{ExtractedImage, PatchResult, PhotoUpload, SyncReport, UploadResult};
pub use pipeline::api::{ListingApi, UploadOptions};
pub use pipeline::order::order_for_upload;
pub use progress::{NoopProgressCallback, ProgressCallback, SyncProgressCallback};
pub use sync::{extract_and_order, publish_photos, sync_listing, sync_listing_blocking};
