//! Shot detection through the Cloud Video Intelligence REST API.
//!
//! [`VideoIntelligenceClient`] uploads the video inline, starts a
//! `SHOT_CHANGE_DETECTION` long-running operation, and polls it until it
//! finishes or the timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::{Credentials, PipelineConfig},
    error::ShotmarkError,
    google::{self, Status},
    progress::CancellationToken,
    shot::{ShotBoundary, ShotDetector},
};

const SERVICE: &str = "Video Intelligence";

/// A long-running `videos:annotate` operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<Status>,
    #[serde(default)]
    pub response: Option<AnnotateVideoResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateVideoResponse {
    #[serde(default)]
    pub annotation_results: Vec<VideoAnnotationResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnnotationResults {
    #[serde(default)]
    pub shot_annotations: Vec<VideoSegment>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSegment {
    #[serde(default)]
    pub start_time_offset: Option<TimeOffset>,
    #[serde(default)]
    pub end_time_offset: Option<TimeOffset>,
}

/// A `google.protobuf.Duration`, which the REST API renders as `"1.5s"`.
/// Some proxies pass through the `{seconds, nanos}` object form instead.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimeOffset {
    Text(String),
    Parts {
        #[serde(default, deserialize_with = "int_or_string")]
        seconds: i64,
        #[serde(default)]
        nanos: i32,
    },
}

impl TimeOffset {
    /// Convert to a [`Duration`]. Negative offsets clamp to zero.
    pub fn to_duration(&self) -> Result<Duration, ShotmarkError> {
        match self {
            TimeOffset::Text(text) => parse_duration(text),
            TimeOffset::Parts { seconds, nanos } => {
                if *seconds < 0 || *nanos < 0 {
                    return Ok(Duration::ZERO);
                }
                Ok(Duration::new(*seconds as u64, *nanos as u32))
            }
        }
    }
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Text(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// Parse a protobuf JSON duration such as `"4.2s"` or `"12s"`.
pub fn parse_duration(text: &str) -> Result<Duration, ShotmarkError> {
    let malformed = || ShotmarkError::MalformedResponse {
        service: SERVICE,
        reason: format!("invalid duration: {text:?}"),
    };

    let body = text.trim().strip_suffix('s').ok_or_else(malformed)?;
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));

    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) || fraction.len() > 9 {
        return Err(malformed());
    }

    let seconds: u64 = whole.parse().map_err(|_| malformed())?;
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().map_err(|_| malformed())?
    };

    if negative {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::new(seconds, nanos))
}

impl Operation {
    /// Shot boundaries of a finished operation.
    ///
    /// Returns `Ok(None)` while the operation is still running. A finished
    /// operation with no annotation results yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::ServiceError`] if the operation (or its
    /// first annotation result) carries an error status.
    pub fn shots(&self) -> Result<Option<Vec<ShotBoundary>>, ShotmarkError> {
        if !self.done {
            return Ok(None);
        }
        if let Some(status) = &self.error {
            return Err(status.clone().into_error(SERVICE));
        }

        let Some(result) = self
            .response
            .as_ref()
            .and_then(|response| response.annotation_results.first())
        else {
            return Ok(Some(Vec::new()));
        };

        if let Some(status) = &result.error {
            return Err(status.clone().into_error(SERVICE));
        }

        let mut shots = Vec::with_capacity(result.shot_annotations.len());
        for segment in &result.shot_annotations {
            let start = match &segment.start_time_offset {
                Some(offset) => offset.to_duration()?,
                None => Duration::ZERO,
            };
            shots.push(ShotBoundary::new(start));
        }
        Ok(Some(shots))
    }
}

/// [`ShotDetector`] backed by Cloud Video Intelligence.
pub struct VideoIntelligenceClient {
    client: Client,
    endpoint: String,
    credentials: Credentials,
    poll_interval: Duration,
    cancellation: Option<CancellationToken>,
}

impl VideoIntelligenceClient {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
            poll_interval: Duration::from_secs(2),
            cancellation: None,
        }
    }

    /// Build a client from a pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::MissingCredentials`] if the configured
    /// credential source is empty.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ShotmarkError> {
        let mut client = Self::new(
            config.endpoints().video_intelligence.clone(),
            config.credentials().resolve()?,
        )
        .with_poll_interval(config.poll_interval());
        client.cancellation = config.cancellation().cloned();
        Ok(client)
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Abort polling when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn start_operation(&self, video: &[u8], timeout: Duration) -> Result<Operation, ShotmarkError> {
        let url = format!("{}/v1/videos:annotate", self.endpoint);
        let body = json!({
            "inputContent": google::encode_content(video),
            "features": ["SHOT_CHANGE_DETECTION"],
        });

        let request = self.client.post(&url).timeout(timeout).json(&body);
        let response = self.credentials.authorize(request).send()?;
        Ok(google::check_status(SERVICE, response)?.json()?)
    }

    fn poll_operation(&self, name: &str, timeout: Duration) -> Result<Operation, ShotmarkError> {
        let url = format!("{}/v1/{}", self.endpoint, name);
        let request = self.client.get(&url).timeout(timeout);
        let response = self.credentials.authorize(request).send()?;
        Ok(google::check_status(SERVICE, response)?.json()?)
    }
}

impl ShotDetector for VideoIntelligenceClient {
    fn detect_shots(
        &self,
        video: &[u8],
        timeout: Duration,
    ) -> Result<Vec<ShotBoundary>, ShotmarkError> {
        let deadline = Instant::now() + timeout;

        log::info!("Submitting {} bytes for shot change detection", video.len());
        let mut operation = self.start_operation(video, timeout)?;
        if operation.name.is_empty() && !operation.done {
            return Err(ShotmarkError::MalformedResponse {
                service: SERVICE,
                reason: "operation has no name".to_string(),
            });
        }
        log::debug!("Shot detection operation started: {}", operation.name);

        loop {
            if let Some(shots) = operation.shots()? {
                log::info!("Shot detection finished with {} shot(s)", shots.len());
                return Ok(shots);
            }

            if self
                .cancellation
                .as_ref()
                .is_some_and(|token| token.is_cancelled())
            {
                return Err(ShotmarkError::Cancelled);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ShotmarkError::ShotDetectionTimeout(timeout));
            }

            thread::sleep(self.poll_interval.min(remaining));

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ShotmarkError::ShotDetectionTimeout(timeout));
            }
            operation = self.poll_operation(&operation.name, remaining)?;
        }
    }
}
