//! Shared helpers for the integration tests: a scripted in-process listing
//! API and sample PDF builders.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{patch, post};
use axum::{Json, Router};
use image::{DynamicImage, Rgb, RgbImage};
use mls_photos::{ExtractedImage, SyncConfig, SyncConfigBuilder};
use std::collections::{HashMap, VecDeque};
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Serialises tests that bind pdfium.
pub static PDFIUM_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

// ── Mock listing API ─────────────────────────────────────────────────────────

/// One multipart POST as the server saw it.
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub listing_id: String,
    pub authorization: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file_len: usize,
    /// When the request body had been read.
    pub received_at: Option<Instant>,
    /// Text fields other than `file`.
    pub fields: HashMap<String, String>,
}

/// One PATCH as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedPatch {
    pub listing_id: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct Script {
    upload_statuses: VecDeque<u16>,
    default_upload_status: u16,
    patch_status: u16,
    uploads: Vec<RecordedUpload>,
    patches: Vec<RecordedPatch>,
}

type Shared = Arc<Mutex<Script>>;

/// A listing API on `127.0.0.1` that answers with scripted statuses and
/// records every request.
pub struct MockApi {
    pub base: String,
    script: Shared,
}

impl MockApi {
    /// Every upload gets `200`, the patch gets `200`.
    pub async fn start() -> Self {
        Self::with_statuses(Vec::new(), 200, 200).await
    }

    /// Upload responses are taken from `upload_statuses` in order, then
    /// `default_upload_status` once those run out.
    pub async fn with_statuses(
        upload_statuses: Vec<u16>,
        default_upload_status: u16,
        patch_status: u16,
    ) -> Self {
        let script: Shared = Arc::new(Mutex::new(Script {
            upload_statuses: upload_statuses.into(),
            default_upload_status,
            patch_status,
            ..Script::default()
        }));

        let app = Router::new()
            .route("/api/listings/:id/photos", post(record_upload))
            .route("/api/listings/:id/status", patch(record_patch))
            .route("/v2/:id/media", post(record_upload))
            .route("/v2/:id/flags", patch(record_patch))
            .with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("mock api addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock api");
        });

        Self {
            base: format!("http://{addr}"),
            script,
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.script.lock().unwrap().uploads.clone()
    }

    pub fn patches(&self) -> Vec<RecordedPatch> {
        self.script.lock().unwrap().patches.clone()
    }

    /// Builder pointed at this server with fast retries.
    pub fn config(&self, listing_id: &str) -> SyncConfigBuilder {
        SyncConfig::builder()
            .listing_id(listing_id)
            .api_base(format!("{}/", self.base))
            .token("test-token")
            .timeout(Duration::from_secs(5))
            .retry_backoff(Duration::from_millis(5))
    }
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn record_upload(
    State(script): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut recorded = RecordedUpload {
        listing_id: id,
        authorization: auth_header(&headers),
        ..RecordedUpload::default()
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default();

        if name == "file" {
            recorded.file_name = file_name;
            recorded.content_type = content_type;
            recorded.file_len = data.len();
        } else {
            recorded
                .fields
                .insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }

    recorded.received_at = Some(Instant::now());
    let mut script = script.lock().unwrap();
    script.uploads.push(recorded);
    let status = script
        .upload_statuses
        .pop_front()
        .unwrap_or(script.default_upload_status);
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if code.is_success() {
        r#"{"ok":true}"#.to_string()
    } else {
        format!("upload rejected with {status}")
    };
    (code, body)
}

async fn record_patch(
    State(script): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    let mut script = script.lock().unwrap();
    script.patches.push(RecordedPatch {
        listing_id: id,
        authorization: auth_header(&headers),
        body,
    });
    let status = script.patch_status;
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if code.is_success() {
        String::new()
    } else {
        "listing locked".to_string()
    };
    (code, body)
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Write a small PNG to `dir` and describe it as if extracted from a PDF.
pub fn photo(dir: &FsPath, width: u32, height: u32, page_index: usize) -> ExtractedImage {
    let name = format!("page{:02}_img{:02}_{}x{}.png", page_index + 1, 1, width, height);
    let path = dir.join(name);
    let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
    img.save(&path).expect("write fixture png");
    ExtractedImage::new(path, width, height, page_index, 0, format!("{width}x{height}"))
}

/// A solid-colour raster for embedding into generated PDFs.
pub fn raster(width: u32, height: u32, shade: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 90])))
}

/// Build a PDF with one page per entry; each page holds the given images.
///
/// Returns `None` when pdfium cannot be loaded on this machine.
pub fn write_pdf(path: &FsPath, pages: &[Vec<DynamicImage>]) -> Option<PathBuf> {
    use pdfium_render::prelude::*;

    let pdfium = match mls_photos::pipeline::extract::bind_pdfium() {
        Ok(p) => p,
        Err(e) => {
            println!("SKIP: pdfium not available ({e})");
            return None;
        }
    };

    let mut document = pdfium.create_new_pdf().expect("new pdf");
    for images in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .expect("new page");
        for (i, img) in images.iter().enumerate() {
            let offset = PdfPoints::new(40.0 + 60.0 * i as f32);
            page.objects_mut()
                .create_image_object(offset, offset, img, Some(PdfPoints::new(200.0)), None)
                .expect("image object");
        }
    }
    document.save_to_file(path).expect("save pdf");
    Some(path.to_path_buf())
}

/// Whether pdfium can be bound here; prints `SKIP` when it cannot.
pub fn pdfium_available() -> bool {
    match mls_photos::pipeline::extract::bind_pdfium() {
        Ok(_) => true,
        Err(e) => {
            println!("SKIP: pdfium not available ({e})");
            false
        }
    }
}

// ── Hand-assembled PDFs ──────────────────────────────────────────────────────
//
// pdfium re-encodes images it is given, so fixtures that need an exact
// embedded stream (a DCTDecode JPEG) or a form XObject are written directly.

/// A gradient JPEG, as a camera or layout tool would embed it.
pub fn jpeg_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    use image::codecs::jpeg::JpegEncoder;

    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, seed])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 92)
        .encode_image(&img)
        .expect("encode jpeg");
    buf
}

/// How an image is drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `Do` on the image from the page content stream.
    Direct,
    /// `Do` on a form XObject whose content draws the image.
    InForm,
}

/// An embedded JPEG stream and where it is drawn.
pub struct JpegOnPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub placement: Placement,
}

/// Minimal PDF object writer with a correct xref table.
#[derive(Default)]
struct PdfAssembler {
    objects: Vec<Vec<u8>>,
}

impl PdfAssembler {
    /// Reserve an object number to fill in later.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: impl Into<Vec<u8>>) {
        self.objects[id - 1] = body.into();
    }

    fn add(&mut self, body: impl Into<Vec<u8>>) -> usize {
        let id = self.reserve();
        self.set(id, body);
        id
    }

    fn add_stream(&mut self, dict: &str, data: &[u8]) -> usize {
        let mut body = format!("<< {dict} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    fn finish(self, root: usize) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());
        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {root} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                self.objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }
}

/// Write a one-page PDF drawing each JPEG stream in order.
pub fn write_jpeg_pdf(path: &FsPath, images: &[JpegOnPage]) -> PathBuf {
    let mut pdf = PdfAssembler::default();
    let catalog = pdf.reserve();
    let pages = pdf.reserve();
    let page = pdf.reserve();

    let mut xobjects = String::new();
    let mut content = String::new();
    for (i, img) in images.iter().enumerate() {
        let image_id = pdf.add_stream(
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                img.width, img.height
            ),
            &img.jpeg,
        );
        let drawn_id = match img.placement {
            Placement::Direct => image_id,
            Placement::InForm => pdf.add_stream(
                &format!(
                    "/Type /XObject /Subtype /Form /BBox [0 0 1 1] \
                     /Resources << /XObject << /Im0 {image_id} 0 R >> >>"
                ),
                b"q 1 0 0 1 0 0 cm /Im0 Do Q",
            ),
        };
        xobjects.push_str(&format!("/X{i} {drawn_id} 0 R "));
        content.push_str(&format!(
            "q {} 0 0 {} {} {} cm /X{i} Do Q\n",
            img.width,
            img.height,
            36 + 20 * i,
            400 - 20 * i
        ));
    }

    let contents = pdf.add_stream("", content.as_bytes());
    pdf.set(
        page,
        format!(
            "<< /Type /Page /Parent {pages} 0 R /MediaBox [0 0 612 792] \
             /Resources << /XObject << {xobjects}>> >> /Contents {contents} 0 R >>"
        ),
    );
    pdf.set(pages, format!("<< /Type /Pages /Kids [{page} 0 R] /Count 1 >>"));
    pdf.set(catalog, format!("<< /Type /Catalog /Pages {pages} 0 R >>"));

    std::fs::write(path, pdf.finish(catalog)).expect("write pdf");
    path.to_path_buf()
}
