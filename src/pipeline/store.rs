//! Writing extracted images to disk, deduplicated by content hash.
//!
//! Listing PDFs repeat the same photo constantly: the hero shot on the cover
//! and again in the gallery, an agent headshot on every page. Each image is
//! written under a deterministic name, hashed from disk, and deleted again
//! if an identical file was already kept. The first occurrence in
//! page-then-index order wins.

use crate::error::MlsPhotosError;
use crate::output::ExtractedImage;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One encoded image as it came out of the PDF, before deduplication.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub page_index: usize,
    pub image_index: usize,
    pub width: u32,
    pub height: u32,
    /// File extension without the dot, e.g. `jpg`.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Deterministic output name: `page01_img01.jpg` for the first image on
/// the first page.
pub fn image_file_name(page_index: usize, image_index: usize, extension: &str) -> String {
    format!(
        "page{:02}_img{:02}.{}",
        page_index + 1,
        image_index + 1,
        extension
    )
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Accumulates unique images in one output directory.
#[derive(Debug)]
pub struct ImageStore {
    output_dir: PathBuf,
    seen: HashSet<String>,
    images: Vec<ExtractedImage>,
    duplicates: usize,
}

impl ImageStore {
    /// Open a store, creating `output_dir` if it does not exist.
    pub fn create(output_dir: &Path) -> Result<Self, MlsPhotosError> {
        std::fs::create_dir_all(output_dir).map_err(|e| MlsPhotosError::OutputDirFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            seen: HashSet::new(),
            images: Vec::new(),
            duplicates: 0,
        })
    }

    /// Write `image`, keeping it only if its content has not been seen.
    ///
    /// Returns the kept record, or `None` when the image was a duplicate and
    /// its file has been removed again.
    pub fn accept(
        &mut self,
        image: EmbeddedImage,
    ) -> Result<Option<&ExtractedImage>, MlsPhotosError> {
        let name = image_file_name(image.page_index, image.image_index, &image.extension);
        let path = self.output_dir.join(name);
        let write_err = |source| MlsPhotosError::ImageWriteFailed {
            path: path.clone(),
            source,
        };

        std::fs::write(&path, &image.bytes).map_err(write_err)?;
        let digest = hash_file(&path).map_err(write_err)?;

        if !self.seen.insert(digest.clone()) {
            std::fs::remove_file(&path).map_err(write_err)?;
            self.duplicates += 1;
            debug!("Dropped duplicate image {}", path.display());
            return Ok(None);
        }

        self.images.push(ExtractedImage::new(
            path,
            image.width,
            image.height,
            image.page_index,
            image.image_index,
            digest,
        ));
        Ok(self.images.last())
    }

    /// Number of duplicates dropped so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Unique images in the order they were accepted.
    pub fn into_images(self) -> Vec<ExtractedImage> {
        self.images
    }
}
