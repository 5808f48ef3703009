//! Configuration types for a listing photo sync.
//!
//! Every knob lives in [`SyncConfig`], built via its [`SyncConfigBuilder`].
//! The builder clamps values that have an obvious safe floor (the retry
//! count) and `build()` rejects what cannot be repaired: a missing listing
//! id, a base URL that does not parse, or an endpoint template with a
//! placeholder other than `{listing_id}`.

use crate::error::MlsPhotosError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default photo upload endpoint, relative to the API base.
pub const DEFAULT_UPLOAD_PATH: &str = "/api/listings/{listing_id}/photos";

/// Default listing status endpoint, relative to the API base.
pub const DEFAULT_STATUS_PATH: &str = "/api/listings/{listing_id}/status";

/// The only placeholder endpoint templates may contain.
const LISTING_PLACEHOLDER: &str = "{listing_id}";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"));

/// Configuration for extracting and uploading a listing's photos.
///
/// Built via [`SyncConfig::builder()`].
///
/// # Example
/// ```rust
/// use mls_photos::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .listing_id("draft-42")
///     .api_base("https://api.example.com/")
///     .token("secret")
///     .max_retries(5)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     config.upload_url(),
///     "https://api.example.com/api/listings/draft-42/photos"
/// );
/// ```
#[derive(Clone)]
pub struct SyncConfig {
    /// Opaque draft listing identifier, substituted into endpoint templates.
    pub listing_id: String,

    /// API base URL, e.g. `https://api.example.com`. A trailing `/` is ignored.
    pub api_base: String,

    /// Bearer token sent with every request.
    pub token: String,

    /// Scratch directory for extracted images. Default: `mls_photos`.
    ///
    /// Created if absent. Files are left in place after the run.
    pub output_dir: PathBuf,

    /// Photo count the listing is expected to reach. Default: 5.
    ///
    /// Informational only: falling short is reported but the status patch
    /// still runs.
    pub min_photos: usize,

    /// Per-request HTTP timeout. Default: 30 s.
    pub timeout: Duration,

    /// Maximum upload attempts per photo (never below 1). Default: 3.
    pub max_retries: u32,

    /// Linear backoff unit. Default: 1 s.
    ///
    /// Before retry *n* the uploader sleeps `n × retry_backoff`
    /// (1 s, 2 s, 3 s, …).
    pub retry_backoff: Duration,

    /// Send the `isCover` form field with each upload. Default: true.
    pub send_cover_flag: bool,

    /// Send the `order` form field with each upload. Default: true.
    pub send_ordering: bool,

    /// Upload endpoint template. Default: [`DEFAULT_UPLOAD_PATH`].
    pub upload_path: String,

    /// Status endpoint template. Default: [`DEFAULT_STATUS_PATH`].
    pub status_path: String,

    /// Optional progress callback for per-photo events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            listing_id: String::new(),
            api_base: String::new(),
            token: String::new(),
            output_dir: PathBuf::from("mls_photos"),
            min_photos: 5,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            send_cover_flag: true,
            send_ordering: true,
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("listing_id", &self.listing_id)
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("min_photos", &self.min_photos)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("send_cover_flag", &self.send_cover_flag)
            .field("send_ordering", &self.send_ordering)
            .field("upload_path", &self.upload_path)
            .field("status_path", &self.status_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SyncProgressCallback>"),
            )
            .finish()
    }
}

impl SyncConfig {
    /// Create a new builder for `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL photos are POSTed to.
    pub fn upload_url(&self) -> String {
        render_endpoint(&self.api_base, &self.upload_path, &self.listing_id)
    }

    /// Absolute URL the status PATCH is sent to.
    pub fn status_url(&self) -> String {
        render_endpoint(&self.api_base, &self.status_path, &self.listing_id)
    }

    /// Upload attempts per photo, never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Join `api_base` and `template`, substituting the listing id.
///
/// A trailing `/` on the base is dropped so `https://host/` and
/// `https://host` produce the same URL.
pub fn render_endpoint(api_base: &str, template: &str, listing_id: &str) -> String {
    format!(
        "{}{}",
        api_base.trim_end_matches('/'),
        template.replace(LISTING_PLACEHOLDER, listing_id)
    )
}

/// Builder for [`SyncConfig`].
#[derive(Debug)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn listing_id(mut self, id: impl Into<String>) -> Self {
        self.config.listing_id = id.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn min_photos(mut self, n: usize) -> Self {
        self.config.min_photos = n;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout from fractional seconds, as the CLI accepts it.
    ///
    /// Negative, zero, or non-finite values leave a zero timeout, which
    /// `build()` rejects.
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.config.timeout = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        self
    }

    /// Maximum upload attempts; values below 1 are raised to 1.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_backoff(mut self, unit: Duration) -> Self {
        self.config.retry_backoff = unit;
        self
    }

    pub fn send_cover_flag(mut self, v: bool) -> Self {
        self.config.send_cover_flag = v;
        self
    }

    pub fn send_ordering(mut self, v: bool) -> Self {
        self.config.send_ordering = v;
        self
    }

    pub fn upload_path(mut self, template: impl Into<String>) -> Self {
        self.config.upload_path = template.into();
        self
    }

    pub fn status_path(mut self, template: impl Into<String>) -> Self {
        self.config.status_path = template.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SyncConfig, MlsPhotosError> {
        let c = &self.config;
        if c.listing_id.trim().is_empty() {
            return Err(MlsPhotosError::InvalidConfig(
                "listing id must not be empty".into(),
            ));
        }
        if c.token.is_empty() {
            return Err(MlsPhotosError::InvalidConfig(
                "API token must not be empty".into(),
            ));
        }
        if c.timeout.is_zero() {
            return Err(MlsPhotosError::InvalidConfig(
                "timeout must be a positive number of seconds".into(),
            ));
        }
        check_template("upload path", &c.upload_path)?;
        check_template("status path", &c.status_path)?;

        for url in [c.upload_url(), c.status_url()] {
            reqwest::Url::parse(&url).map_err(|e| {
                MlsPhotosError::InvalidConfig(format!("invalid endpoint URL '{url}': {e}"))
            })?;
        }
        Ok(self.config)
    }
}

/// Reject templates with placeholders other than `{listing_id}`.
fn check_template(what: &str, template: &str) -> Result<(), MlsPhotosError> {
    for cap in PLACEHOLDER.captures_iter(template) {
        if &cap[0] != LISTING_PLACEHOLDER {
            return Err(MlsPhotosError::InvalidConfig(format!(
                "{what} '{template}' has unknown placeholder {}; only {LISTING_PLACEHOLDER} is supported",
                &cap[0]
            )));
        }
    }
    Ok(())
}
