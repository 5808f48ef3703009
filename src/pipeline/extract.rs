//! Embedded image extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to call
//! from async contexts. [`extract_images`] moves the whole walk onto Tokio's
//! blocking pool so the runtime threads stay free.
//!
//! ## Order
//!
//! Pages are visited in document order and image objects in the order pdfium
//! lists them on the page. Form XObjects are opened in place, so an image
//! drawn through a form takes the next in-page index. That order decides
//! which copy of a repeated photo survives deduplication and how files are
//! named.

use crate::error::MlsPhotosError;
use crate::output::ExtractedImage;
use crate::pipeline::encode::{encode_png, ImageKind};
use crate::pipeline::store::{EmbeddedImage, ImageStore};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming a pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (file or directory), the working
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, MlsPhotosError> {
    let mut attempts: Vec<String> = Vec::new();

    if let Ok(configured) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        let lib = if Path::new(&configured).is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&configured))
        } else {
            PathBuf::from(configured)
        };
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => attempts.push(format!("{}: {e}", lib.display())),
        }
    }

    let local = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path("./"));
    match Pdfium::bind_to_library(&local) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(e) => attempts.push(format!("{}: {e}", local.display())),
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(e) => {
            attempts.push(format!("system library: {e}"));
            Err(MlsPhotosError::PdfiumBindingFailed(attempts.join("; ")))
        }
    }
}

/// Extract every unique embedded image of `pdf_path` into `output_dir`.
///
/// Returns records in extraction order (not upload order). An empty result
/// is not an error here; the caller decides whether that is fatal.
pub async fn extract_images(
    pdf_path: &Path,
    output_dir: &Path,
) -> Result<Vec<ExtractedImage>, MlsPhotosError> {
    let path = pdf_path.to_path_buf();
    let out = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || extract_images_blocking(&path, &out))
        .await
        .map_err(|e| MlsPhotosError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of image extraction.
fn extract_images_blocking(
    pdf_path: &Path,
    output_dir: &Path,
) -> Result<Vec<ExtractedImage>, MlsPhotosError> {
    let pdfium = bind_pdfium()?;
    let mut store = ImageStore::create(output_dir)?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| MlsPhotosError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    for (page_index, page) in pages.iter().enumerate() {
        let mut walker = PageImages {
            store: &mut store,
            page_index,
            next_index: 0,
        };
        for object in page.objects().iter() {
            walker.visit(&object, 0)?;
        }
        debug!(
            "Page {}: {} image object(s)",
            page_index + 1,
            walker.next_index
        );
    }

    info!(
        "Extracted {} unique image(s), dropped {} duplicate(s)",
        store.len(),
        store.duplicates()
    );
    Ok(store.into_images())
}

/// Form XObjects nested deeper than this are not searched.
const MAX_FORM_DEPTH: usize = 16;

/// Walks one page's objects, numbering images in content order.
struct PageImages<'s> {
    store: &'s mut ImageStore,
    page_index: usize,
    next_index: usize,
}

impl PageImages<'_> {
    /// Handle an image object, or descend into a form XObject.
    fn visit(&mut self, object: &PdfPageObject<'_>, depth: usize) -> Result<(), MlsPhotosError> {
        if let Some(image_object) = object.as_image_object() {
            let image_index = self.next_index;
            self.next_index += 1;

            match embedded_image(image_object, self.page_index, image_index) {
                Ok(embedded) => {
                    self.store.accept(embedded)?;
                }
                Err(detail) => warn!(
                    "Skipping image {} on page {}: {}",
                    image_index + 1,
                    self.page_index + 1,
                    detail
                ),
            }
            return Ok(());
        }

        if let Some(form) = object.as_x_object_form_object() {
            if depth >= MAX_FORM_DEPTH {
                warn!(
                    "Page {}: form nesting deeper than {}; not descending",
                    self.page_index + 1,
                    MAX_FORM_DEPTH
                );
                return Ok(());
            }
            for child in form.iter() {
                self.visit(&child, depth + 1)?;
            }
        }
        Ok(())
    }
}

/// Turn one image object into the bytes that get written.
///
/// Standalone JPEG / JPEG 2000 streams are copied verbatim; everything else
/// is decoded by pdfium and written as PNG. The decoded raster also supplies
/// the pixel dimensions.
fn embedded_image(
    image_object: &PdfPageImageObject<'_>,
    page_index: usize,
    image_index: usize,
) -> Result<EmbeddedImage, String> {
    let raster = image_object
        .get_raw_image()
        .map_err(|e| format!("decode failed: {:?}", e))?;

    let filter_names: Vec<String> = image_object
        .filters()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let kind = ImageKind::from_filters(filter_names.iter().map(String::as_str));

    let bytes = if kind.keeps_embedded_bytes() {
        image_object
            .get_raw_image_data()
            .map_err(|e| format!("reading stream data failed: {:?}", e))?
    } else {
        encode_png(&raster).map_err(|e| format!("encode failed: {}", e))?
    };
    if bytes.is_empty() {
        return Err("image stream is empty".to_string());
    }

    Ok(EmbeddedImage {
        page_index,
        image_index,
        width: raster.width(),
        height: raster.height(),
        extension: kind.extension().to_string(),
        bytes,
    })
}
