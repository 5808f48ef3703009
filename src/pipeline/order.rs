//! Cover selection and upload order.
//!
//! Listing sites show the first photo as the cover, and a wide exterior shot
//! makes the best one. Landscape images come first, larger before smaller,
//! with the source page breaking ties so the result never depends on
//! extraction quirks.

use crate::output::ExtractedImage;
use std::cmp::Reverse;

/// Sort key: landscape first, then area descending, then page ascending.
fn cover_key(img: &ExtractedImage) -> (bool, Reverse<u64>, usize) {
    (!img.is_landscape(), Reverse(img.area), img.page_index)
}

/// Return `images` in upload order. The first element is the cover.
///
/// Stable, so images that tie on every key keep their extraction order.
pub fn order_for_upload(images: &[ExtractedImage]) -> Vec<ExtractedImage> {
    let mut ordered = images.to_vec();
    ordered.sort_by_key(cover_key);
    ordered
}
