//! CLI binary for mls-photos.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SyncConfig` and prints the per-photo outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mls_photos::{
    extract_and_order, sync_listing, ExtractedImage, PatchResult, ProgressCallback, SyncConfig,
    SyncProgressCallback, SyncReport, UploadResult, DEFAULT_STATUS_PATH, DEFAULT_UPLOAD_PATH,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one log line per pipeline event, with an
/// optional progress bar pinned below them while uploads run.
struct CliProgressCallback {
    /// Hidden when `--no-progress` is set; lines then go straight to stderr.
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS);
            bar.set_style(spinner_style);
            bar.set_prefix("Extracting");
            bar.set_message("Reading PDF…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        } else {
            ProgressBar::hidden()
        };
        Arc::new(Self { bar })
    }

    fn line(&self, msg: String) {
        if self.bar.is_hidden() {
            eprintln!("{msg}");
        } else {
            self.bar.println(msg);
        }
    }

    /// Switch to the counting style once the number of uploads is known.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} photos  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Uploading");
        self.bar.reset_eta();
    }
}

impl SyncProgressCallback for CliProgressCallback {
    fn on_extraction_complete(&self, image_count: usize, output_dir: &Path) {
        let mark = if image_count == 0 { red("✗") } else { cyan("◆") };
        self.line(format!(
            "{} Extracted {} image(s) to {}",
            mark,
            bold(&image_count.to_string()),
            output_dir.display()
        ));
    }

    fn on_cover_selected(&self, cover: &ExtractedImage) {
        self.line(format!(
            "{} Cover: {} ({}×{})",
            cyan("◆"),
            bold(&cover.file_name()),
            cover.width,
            cover.height
        ));
    }

    fn on_upload_start(&self, index: usize, total: usize, image: &ExtractedImage) {
        if index == 0 {
            self.activate_bar(total);
        }
        self.bar.set_message(image.file_name());
    }

    fn on_upload_complete(
        &self,
        index: usize,
        _total: usize,
        image: &ExtractedImage,
        result: &UploadResult,
    ) {
        let attempts = if result.attempts > 1 {
            dim(&format!("  {} attempts", result.attempts))
        } else {
            String::new()
        };
        if result.success {
            self.line(format!(
                "  {} [{:02}] {} (HTTP {}){}",
                green("✓"),
                index,
                image.file_name(),
                result.status,
                attempts
            ));
        } else {
            let msg = if result.error.chars().count() > 80 {
                let head: String = result.error.chars().take(79).collect();
                format!("{head}\u{2026}")
            } else {
                result.error.clone()
            };
            self.line(format!(
                "  {} [{:02}] {} (HTTP {}) {}{}",
                red("✗"),
                index,
                image.file_name(),
                result.status,
                red(&msg),
                attempts
            ));
        }
        self.bar.inc(1);
    }

    fn on_uploads_finished(&self, success_count: usize, min_photos: usize) {
        self.bar.finish_and_clear();
        if success_count >= min_photos {
            self.line(format!(
                "{} {} photo(s) uploaded (minimum {})",
                green("✔"),
                bold(&success_count.to_string()),
                min_photos
            ));
        } else {
            self.line(format!(
                "{} {} photo(s) uploaded, below minimum {}",
                yellow("⚠"),
                bold(&success_count.to_string()),
                min_photos
            ));
        }
    }

    fn on_patch_complete(&self, photo_count: usize, result: &PatchResult) {
        if result.success {
            self.line(format!(
                "{} Status patched: photoCount={} (HTTP {})",
                green("✔"),
                photo_count,
                result.status
            ));
        } else {
            self.line(format!(
                "{} Status patch failed (HTTP {}) {}",
                red("✘"),
                result.status,
                red(&result.error)
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract, upload, and mark the listing as having photos
  mls-photos --pdf listing.pdf --listing draft-1234 \
    --api-base https://api.example.com --token "$TOKEN"

  # Look at what would be uploaded, and in which order
  mls-photos --pdf listing.pdf --extract-only

  # Older API without the isCover/order form fields
  mls-photos --pdf listing.pdf --listing draft-1234 \
    --api-base https://api.example.com --no-cover-flag --no-ordering

  # Machine-readable report
  mls-photos --pdf listing.pdf --listing draft-1234 --json > report.json

ENVIRONMENT VARIABLES:
  MLS_PHOTOS_TOKEN        Bearer token (preferred over --token)
  MLS_PHOTOS_API_BASE     API base URL
  MLS_PHOTOS_LISTING      Listing id
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter

EXIT STATUS:
  0  pipeline completed, even with failed uploads or a failed status patch
  1  PDF missing or invalid, no images extracted, or bad configuration
"#;

/// Extract listing photos from an MLS PDF and upload them.
#[derive(Parser, Debug)]
#[command(
    name = "mls-photos",
    version,
    about = "Extract listing photos from an MLS PDF and upload them",
    long_about = "Extract every embedded image from an MLS listing PDF, drop byte-identical \
duplicates, upload them landscape-first and largest-first (the first upload is the cover), \
then set hasPhotos/photoCount on the listing.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Listing PDF to read.
    #[arg(long, env = "MLS_PHOTOS_PDF")]
    pdf: PathBuf,

    /// Listing id substituted into the endpoint templates.
    #[arg(long, env = "MLS_PHOTOS_LISTING", required_unless_present = "extract_only")]
    listing: Option<String>,

    /// API base URL, e.g. https://api.example.com.
    #[arg(long, env = "MLS_PHOTOS_API_BASE", required_unless_present = "extract_only")]
    api_base: Option<String>,

    /// Bearer token for the listing API.
    #[arg(
        long,
        env = "MLS_PHOTOS_TOKEN",
        hide_env_values = true,
        required_unless_present = "extract_only"
    )]
    token: Option<String>,

    /// Directory the extracted images are written to.
    #[arg(long, env = "MLS_PHOTOS_OUTPUT_DIR", default_value = "mls_photos")]
    output_dir: PathBuf,

    /// Photo count the listing should reach (reported, never enforced).
    #[arg(long, env = "MLS_PHOTOS_MIN_PHOTOS", default_value_t = 5)]
    min_photos: usize,

    /// Per-request timeout in seconds.
    #[arg(long, env = "MLS_PHOTOS_TIMEOUT", default_value_t = 30.0)]
    timeout: f64,

    /// Upload attempts per photo (values below 1 act as 1).
    #[arg(
        long,
        env = "MLS_PHOTOS_RETRIES",
        default_value_t = 3,
        allow_negative_numbers = true
    )]
    retries: i64,

    /// Do not send the isCover form field.
    #[arg(long)]
    no_cover_flag: bool,

    /// Do not send the order form field.
    #[arg(long)]
    no_ordering: bool,

    /// Upload endpoint template; {listing_id} is substituted.
    #[arg(long, env = "MLS_PHOTOS_UPLOAD_PATH", default_value = DEFAULT_UPLOAD_PATH)]
    upload_path: String,

    /// Status endpoint template; {listing_id} is substituted.
    #[arg(long, env = "MLS_PHOTOS_STATUS_PATH", default_value = DEFAULT_STATUS_PATH)]
    status_path: String,

    /// Extract and order only; print the upload order and exit.
    #[arg(long)]
    extract_only: bool,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MLS_PHOTOS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MLS_PHOTOS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MLS_PHOTOS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are muted while the progress bar is drawn; the
    // callback lines carry the same information.
    let show_lines = !cli.quiet && !cli.json;
    let show_progress = show_lines && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let ordered = extract_and_order(&cli.pdf, &cli.output_dir)
            .await
            .context("Extraction failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&ordered).context("Failed to serialise images")?
            );
        } else {
            print_order(&ordered);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_lines {
        let cb = CliProgressCallback::new(show_progress);
        Some(cb as Arc<dyn SyncProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run sync ─────────────────────────────────────────────────────────
    let report = sync_listing(&cli.pdf, &config)
        .await
        .with_context(|| format!("Photo sync failed for {}", cli.pdf.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `SyncConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SyncConfig> {
    let mut builder = SyncConfig::builder()
        .listing_id(cli.listing.clone().unwrap_or_default())
        .api_base(cli.api_base.clone().unwrap_or_default())
        .token(cli.token.clone().unwrap_or_default())
        .output_dir(cli.output_dir.clone())
        .min_photos(cli.min_photos)
        .timeout_secs(cli.timeout)
        .max_retries(attempts_from_cli(cli.retries))
        .send_cover_flag(!cli.no_cover_flag)
        .send_ordering(!cli.no_ordering)
        .upload_path(cli.upload_path.clone())
        .status_path(cli.status_path.clone());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `--retries` accepts any integer; anything below 1 means a single attempt.
fn attempts_from_cli(retries: i64) -> u32 {
    u32::try_from(retries.max(1)).unwrap_or(u32::MAX)
}

fn print_order(ordered: &[ExtractedImage]) {
    for (index, image) in ordered.iter().enumerate() {
        let orientation = if image.is_landscape() {
            "landscape"
        } else {
            "portrait"
        };
        println!(
            "[{:02}] {}  {}×{}  {}{}",
            index,
            image.file_name(),
            image.width,
            image.height,
            orientation,
            if index == 0 { "  (cover)" } else { "" }
        );
    }
}

fn print_summary(report: &SyncReport) {
    let failed = report.failed_uploads().count();
    if failed > 0 {
        eprintln!(
            "   {} of {} upload(s) failed",
            red(&failed.to_string()),
            report.uploads.len()
        );
    }
    eprintln!("{}", bold("DONE"));
}
