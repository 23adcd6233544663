//! Pipeline configuration.
//!
//! [`PipelineConfig`] is a builder that carries the input and output paths,
//! credentials, timeouts, sampling parameters, progress callbacks, and
//! cancellation tokens into [`Pipeline::run`](crate::Pipeline::run) without
//! any process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use shotmark::{CancellationToken, CredentialSource, PipelineConfig};
//!
//! let token = CancellationToken::new();
//! let config = PipelineConfig::new("sample_video.mp4")
//!     .with_output_path("Landmarks.json")
//!     .with_credentials(CredentialSource::api_key_env("GOOGLE_API_KEY"))
//!     .with_shot_detection_timeout(Duration::from_secs(90))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::RequestBuilder;

use crate::error::ShotmarkError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::sampler::FrameLabel;

/// Default output file written by the pipeline.
pub const DEFAULT_OUTPUT_PATH: &str = "Landmarks.json";
/// Default environment variable holding a Google API key.
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Default environment variable holding an OAuth2 access token.
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
/// Default base URL of the Video Intelligence service.
pub const DEFAULT_VIDEO_INTELLIGENCE_ENDPOINT: &str = "https://videointelligence.googleapis.com";
/// Default base URL of the Vision service.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// A resolved credential, ready to be attached to outgoing requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `key` query parameter.
    ApiKey(String),
    /// Sent as an `Authorization: Bearer` header.
    AccessToken(String),
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

impl Credentials {
    /// Attach this credential to a request.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::ApiKey(key) => request.query(&[("key", key)]),
            Credentials::AccessToken(token) => request.bearer_auth(token),
        }
    }
}

/// Where to find the credential used for both services.
///
/// The source names environment variables rather than holding the secret,
/// so a config can be logged and cloned freely. Resolution happens once,
/// when the service clients are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read an API key from the named environment variable.
    ApiKeyEnv(String),
    /// Read an OAuth2 access token from the named environment variable.
    AccessTokenEnv(String),
    /// Try the API key variable first, then the access token variable.
    Either {
        /// API key variable name.
        api_key_env: String,
        /// Access token variable name.
        access_token_env: String,
    },
    /// Use an explicit credential.
    Explicit(Credentials),
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::Either {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
        }
    }
}

impl CredentialSource {
    /// Read an API key from `name`.
    pub fn api_key_env(name: impl Into<String>) -> Self {
        CredentialSource::ApiKeyEnv(name.into())
    }

    /// Read an access token from `name`.
    pub fn access_token_env(name: impl Into<String>) -> Self {
        CredentialSource::AccessTokenEnv(name.into())
    }

    /// Resolve the credential.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::MissingCredentials`] naming the variable(s)
    /// that were consulted when none of them is set to a non-empty value.
    pub fn resolve(&self) -> Result<Credentials, ShotmarkError> {
        match self {
            CredentialSource::ApiKeyEnv(name) => {
                read_env(name)
                    .map(Credentials::ApiKey)
                    .ok_or_else(|| ShotmarkError::MissingCredentials(name.clone()))
            }
            CredentialSource::AccessTokenEnv(name) => read_env(name)
                .map(Credentials::AccessToken)
                .ok_or_else(|| ShotmarkError::MissingCredentials(name.clone())),
            CredentialSource::Either {
                api_key_env,
                access_token_env,
            } => read_env(api_key_env)
                .map(Credentials::ApiKey)
                .or_else(|| read_env(access_token_env).map(Credentials::AccessToken))
                .ok_or_else(|| {
                    ShotmarkError::MissingCredentials(format!("{api_key_env} or {access_token_env}"))
                }),
            CredentialSource::Explicit(credentials) => Ok(credentials.clone()),
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Base URLs of the external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Video Intelligence base URL (shot detection).
    pub video_intelligence: String,
    /// Vision base URL (landmark detection).
    pub vision: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            video_intelligence: DEFAULT_VIDEO_INTELLIGENCE_ENDPOINT.to_string(),
            vision: DEFAULT_VISION_ENDPOINT.to_string(),
        }
    }
}

/// Configuration for a pipeline run.
///
/// Defaults: ten frames per shot, a 90 second shot-detection timeout, a
/// bounding-box padding of 10 pixels, JPEG quality 95, and output to
/// `Landmarks.json`.
#[derive(Clone)]
pub struct PipelineConfig {
    pub(crate) video_path: PathBuf,
    pub(crate) output_path: PathBuf,
    pub(crate) credentials: CredentialSource,
    pub(crate) endpoints: Endpoints,
    pub(crate) shot_detection_timeout: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) frames_per_shot: u64,
    pub(crate) bounding_box_padding: i64,
    pub(crate) jpeg_quality: u8,
    pub(crate) label: Option<FrameLabel>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineConfig")
            .field("video_path", &self.video_path)
            .field("output_path", &self.output_path)
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("shot_detection_timeout", &self.shot_detection_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("frames_per_shot", &self.frames_per_shot)
            .field("bounding_box_padding", &self.bounding_box_padding)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("label", &self.label)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl PipelineConfig {
    /// Create a configuration for the given input video with default settings.
    pub fn new<P: AsRef<Path>>(video_path: P) -> Self {
        Self {
            video_path: video_path.as_ref().to_path_buf(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            credentials: CredentialSource::default(),
            endpoints: Endpoints::default(),
            shot_detection_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
            frames_per_shot: 10,
            bounding_box_padding: 10,
            jpeg_quality: 95,
            label: Some(FrameLabel::default()),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set where the landmark JSON is written.
    #[must_use]
    pub fn with_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = path.as_ref().to_path_buf();
        self
    }

    /// Set where credentials come from.
    #[must_use]
    pub fn with_credentials(mut self, source: CredentialSource) -> Self {
        self.credentials = source;
        self
    }

    /// Override the service base URLs.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set how long to wait for shot detection to finish.
    #[must_use]
    pub fn with_shot_detection_timeout(mut self, timeout: Duration) -> Self {
        self.shot_detection_timeout = timeout;
        self
    }

    /// Set how often the shot-detection operation is polled.
    ///
    /// Clamped to a minimum of 100 milliseconds.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(100));
        self
    }

    /// Set how many consecutive frames are sampled after each shot change.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_frames_per_shot(mut self, count: u64) -> Self {
        self.frames_per_shot = count.max(1);
        self
    }

    /// Set the padding added on each side of a landmark bounding box.
    #[must_use]
    pub fn with_bounding_box_padding(mut self, padding: i64) -> Self {
        self.bounding_box_padding = padding;
        self
    }

    /// Set the JPEG quality (1–100) used for sampled frames.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the text label burned into sampled frames.
    ///
    /// Pass `None` to forward frames untouched.
    #[must_use]
    pub fn with_label(mut self, label: Option<FrameLabel>) -> Self {
        self.label = label;
        self
    }

    /// Attach a progress callback, fired once per sampled frame.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the landmark loop stops before its next
    /// frame and the results gathered so far are written out.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The input video path.
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// The output JSON path.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// The configured credential source.
    pub fn credentials(&self) -> &CredentialSource {
        &self.credentials
    }

    /// The configured service endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The shot-detection timeout.
    pub fn shot_detection_timeout(&self) -> Duration {
        self.shot_detection_timeout
    }

    /// The shot-detection poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Frames sampled after each shot change.
    pub fn frames_per_shot(&self) -> u64 {
        self.frames_per_shot
    }

    /// Bounding-box padding.
    pub fn bounding_box_padding(&self) -> i64 {
        self.bounding_box_padding
    }

    /// The cancellation token, if one was attached.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
