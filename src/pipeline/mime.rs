//! MIME type for an upload part, from the file extension.

/// Fallback for extensions nothing recognises.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Look up the MIME type of a file extension (without the dot).
///
/// The `mime_guess` table is consulted first; `jpg`/`jpeg`, `png` and `tif`
/// have explicit fallbacks, anything else is `application/octet-stream`.
pub fn mime_for_extension(extension: &str) -> String {
    let ext = extension.trim_start_matches('.').to_lowercase();

    if let Some(mime) = mime_guess::from_ext(&ext).first() {
        return mime.essence_str().to_string();
    }

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" => "image/tiff",
        _ => OCTET_STREAM,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_image_types() {
        assert_eq!(mime_for_extension("jpg"), "image/jpeg");
        assert_eq!(mime_for_extension("JPEG"), "image/jpeg");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("tif"), "image/tiff");
    }

    #[test]
    fn leading_dot_is_ignored() {
        assert_eq!(mime_for_extension(".png"), "image/png");
    }

    #[test]
    fn unknown_is_octet_stream() {
        assert_eq!(mime_for_extension("zzqx"), OCTET_STREAM);
        assert_eq!(mime_for_extension(""), OCTET_STREAM);
    }
}
