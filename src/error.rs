//! Error types for the `shotmark` crate.
//!
//! This module defines [`ShotmarkError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the file paths,
//! service names, and upstream messages needed to diagnose a failed run.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `shotmark` operations.
///
/// Frame read failures are deliberately absent: a frame that cannot be
/// decoded is skipped by the sampler rather than reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShotmarkError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoReader::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading the video or writing results.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a sampled frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The HTTP request to an external service could not be completed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] HttpError),

    /// An external service answered with an error.
    #[error("{service} returned an error (status {status}): {message}")]
    ServiceError {
        /// Human-readable service name.
        service: &'static str,
        /// HTTP status code, or the status code embedded in the payload.
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// An external service answered with a payload we could not interpret.
    #[error("Malformed response from {service}: {reason}")]
    MalformedResponse {
        /// Human-readable service name.
        service: &'static str,
        /// What was wrong with the payload.
        reason: String,
    },

    /// Shot detection did not finish within the configured timeout.
    #[error("Shot detection did not complete within {0:?}")]
    ShotDetectionTimeout(Duration),

    /// No credential was found in the configured environment variable.
    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for ShotmarkError {
    fn from(error: FfmpegError) -> Self {
        ShotmarkError::FfmpegError(error.to_string())
    }
}
