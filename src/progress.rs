//! Progress-callback trait for sync events.
//!
//! Inject an [`Arc<dyn SyncProgressCallback>`] via
//! [`crate::config::SyncConfigBuilder::progress_callback`] to receive events
//! as the pipeline extracts, orders, and uploads photos. The library itself
//! never prints; the CLI renders these events as its console output.
//!
//! # Example
//!
//! ```rust
//! use mls_photos::{ExtractedImage, SyncConfig, SyncProgressCallback, UploadResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl SyncProgressCallback for FailureCounter {
//!     fn on_upload_complete(
//!         &self,
//!         index: usize,
//!         _total: usize,
//!         image: &ExtractedImage,
//!         result: &UploadResult,
//!     ) {
//!         if !result.success {
//!             self.failed.fetch_add(1, Ordering::SeqCst);
//!             eprintln!("[{index:02}] {} failed", image.file_name());
//!         }
//!     }
//! }
//!
//! let config = SyncConfig::builder()
//!     .listing_id("draft-1")
//!     .api_base("https://api.example.com")
//!     .token("t")
//!     .progress_callback(Arc::new(FailureCounter { failed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! # let _ = config;
//! ```

use crate::output::{ExtractedImage, PatchResult, UploadResult};
use std::path::Path;
use std::sync::Arc;

/// Called by the sync pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, but the trait is
/// `Send + Sync` so a callback can be shared with other tasks.
pub trait SyncProgressCallback: Send + Sync {
    /// Called once extraction and deduplication have finished.
    ///
    /// # Arguments
    /// * `image_count`: number of unique images written
    /// * `output_dir` : directory they were written to
    fn on_extraction_complete(&self, image_count: usize, output_dir: &Path) {
        let _ = (image_count, output_dir);
    }

    /// Called with the image chosen as cover (first in upload order).
    fn on_cover_selected(&self, cover: &ExtractedImage) {
        let _ = cover;
    }

    /// Called just before the first upload attempt of a photo.
    ///
    /// # Arguments
    /// * `index`: 0-based position in upload order
    /// * `total`: number of photos to upload
    fn on_upload_start(&self, index: usize, total: usize, image: &ExtractedImage) {
        let _ = (index, total, image);
    }

    /// Called once a photo has succeeded or exhausted its attempts.
    fn on_upload_complete(
        &self,
        index: usize,
        total: usize,
        image: &ExtractedImage,
        result: &UploadResult,
    ) {
        let _ = (index, total, image, result);
    }

    /// Called after every photo has been attempted.
    ///
    /// # Arguments
    /// * `success_count`: photos uploaded successfully
    /// * `min_photos`   : configured (informational) minimum
    fn on_uploads_finished(&self, success_count: usize, min_photos: usize) {
        let _ = (success_count, min_photos);
    }

    /// Called after the listing status PATCH returns (or fails).
    fn on_patch_complete(&self, photo_count: usize, result: &PatchResult) {
        let _ = (photo_count, result);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SyncProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SyncConfig`].
pub type ProgressCallback = Arc<dyn SyncProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn image() -> ExtractedImage {
        ExtractedImage::new(PathBuf::from("page01_img01.jpg"), 800, 600, 0, 0, "ab".into())
    }

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        successes: AtomicUsize,
        failures: AtomicUsize,
        patched_count: AtomicUsize,
    }

    impl SyncProgressCallback for TrackingCallback {
        fn on_upload_start(&self, _index: usize, _total: usize, _image: &ExtractedImage) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_upload_complete(
            &self,
            _index: usize,
            _total: usize,
            _image: &ExtractedImage,
            result: &UploadResult,
        ) {
            if result.success {
                self.successes.fetch_add(1, Ordering::SeqCst);
            } else {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_patch_complete(&self, photo_count: usize, _result: &PatchResult) {
            self.patched_count.store(photo_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let img = image();
        cb.on_extraction_complete(1, Path::new("mls_photos"));
        cb.on_cover_selected(&img);
        cb.on_upload_start(0, 1, &img);
        cb.on_upload_complete(0, 1, &img, &UploadResult::failed(500, "boom", 3));
        cb.on_uploads_finished(0, 5);
        cb.on_patch_complete(0, &PatchResult::ok(200));
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let img = image();

        tracker.on_upload_start(0, 2, &img);
        tracker.on_upload_complete(0, 2, &img, &UploadResult::succeeded(201, 1));
        tracker.on_upload_start(1, 2, &img);
        tracker.on_upload_complete(1, 2, &img, &UploadResult::failed(0, "timeout", 3));
        tracker.on_patch_complete(1, &PatchResult::ok(204));

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.patched_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn SyncProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_extraction_complete(10, Path::new("out"));
        cb.on_uploads_finished(10, 5);
    }
}
