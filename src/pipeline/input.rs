//! Input validation: make sure the user-supplied path is a readable PDF.
//!
//! pdfium reports a missing file and a truncated download with the same
//! opaque error, so the cheap checks happen here first: existence, read
//! permission, and the `%PDF` magic bytes.

use crate::error::MlsPhotosError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path and return its canonical form.
pub fn validate_pdf(path: &Path) -> Result<PathBuf, MlsPhotosError> {
    if !path.exists() {
        return Err(MlsPhotosError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(MlsPhotosError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MlsPhotosError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(MlsPhotosError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    debug!("Resolved local PDF: {}", resolved.display());
    Ok(resolved)
}
