//! Choosing the bytes an extracted image is written as.
//!
//! A stream whose only filter is `DCTDecode` or `JPXDecode` already is a
//! complete JPEG or JPEG 2000 file, so those bytes are written untouched.
//! Anything else (flate-compressed rasters, chained filters, CCITT scans,
//! masks) has no standalone file format and is written as a lossless PNG of
//! the pixels pdfium decoded.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// The file format an extracted image is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Embedded `DCTDecode` stream, written as stored.
    Jpeg,
    /// Embedded `JPXDecode` stream, written as stored.
    Jpeg2000,
    /// Decoded pixels re-encoded losslessly.
    Png,
}

impl ImageKind {
    /// Pick the output format from the PDF stream filter names.
    pub fn from_filters<'a>(filters: impl IntoIterator<Item = &'a str>) -> Self {
        let filters: Vec<&str> = filters.into_iter().collect();
        match filters.as_slice() {
            ["DCTDecode"] => ImageKind::Jpeg,
            ["JPXDecode"] => ImageKind::Jpeg2000,
            _ => ImageKind::Png,
        }
    }

    /// Whether the raw stream data is itself a valid image file.
    pub fn keeps_embedded_bytes(self) -> bool {
        matches!(self, ImageKind::Jpeg | ImageKind::Jpeg2000)
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Jpeg2000 => "jp2",
            ImageKind::Png => "png",
        }
    }
}

/// Encode decoded pixels as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes png",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
