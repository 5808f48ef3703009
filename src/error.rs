//! Error types for the mls-photos library.
//!
//! Only conditions that stop the run are errors here:
//!
//! * [`MlsPhotosError`] is **fatal**: the sync cannot proceed at all (PDF
//!   missing or unreadable, nothing extracted, pdfium unavailable, bad
//!   configuration). Returned as `Err(MlsPhotosError)` from the top-level
//!   `sync_*` / `extract_*` functions.
//!
//! A photo that fails to upload, or a status patch the API rejects, is
//! *not* an error in this sense. Those outcomes are values
//! ([`crate::output::UploadResult`], [`crate::output::PatchResult`]) carried
//! in the [`crate::output::SyncReport`], so one bad photo never loses the
//! rest of the listing.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mls-photos library.
#[derive(Debug, Error)]
pub enum MlsPhotosError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document was opened but contains no extractable images.
    #[error("No images found in '{path}'. Aborting.")]
    NoImagesFound { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the scratch directory for extracted images.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write, hash, or remove an extracted image file.
    #[error("Failed to write image file '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── HTTP setup errors ─────────────────────────────────────────────────
    /// The HTTP client could not be constructed (TLS backend, etc.).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
