//! Pipeline stages for turning a listing PDF into uploaded photos.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the PDF backend never leaks into the HTTP code.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ store ──▶ order ──▶ api
//! (path)    (pdfium)   (sha256)   (cover)  (upload, patch)
//! ```
//!
//! 1. [`input`]: check the PDF exists and starts with `%PDF`
//! 2. [`extract`]: walk page image objects, including those inside forms;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: keep embedded JPEG bytes, write other rasters as PNG
//! 4. [`store`]: write files, drop byte-identical duplicates
//! 5. [`order`]: landscape-first, largest-first upload order
//! 6. [`api`]: multipart uploads with linear backoff, then one PATCH
//! 7. [`mime`]: MIME type of each upload part

pub mod api;
pub mod encode;
pub mod extract;
pub mod input;
pub mod mime;
pub mod order;
pub mod store;
