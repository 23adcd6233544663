//! # shotmark
//!
//! Detect shot changes in a video and recognise landmarks in the frames that
//! follow each cut.
//!
//! `shotmark` is a single-pass batch pipeline: the video is sent to a
//! shot-detection service, each reported shot start is expanded into a short
//! run of frame numbers, those frames are decoded with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), labelled, encoded
//! as JPEG, and sent to a landmark-recognition service. The landmarks found
//! per frame are written to a JSON file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shotmark::{CredentialSource, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("sample_video.mp4")
//!     .with_output_path("Landmarks.json")
//!     .with_credentials(CredentialSource::api_key_env("GOOGLE_API_KEY"));
//!
//! let report = Pipeline::google(config)?.run()?;
//! println!(
//!     "{} landmark(s) in {} frame(s)",
//!     report.landmark_count, report.frames_with_landmarks
//! );
//! # Ok::<(), shotmark::ShotmarkError>(())
//! ```
//!
//! ## Bring your own services
//!
//! The external services sit behind the [`ShotDetector`] and
//! [`LandmarkDetector`] traits, and frames come from any [`FrameSource`],
//! so [`Pipeline::new`] and [`Pipeline::run_with_source`] accept other
//! backends.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod error;
pub mod ffmpeg;
mod google;
pub mod landmark;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod shot;
pub mod sink;
mod utilities;
pub mod video;
pub mod video_intelligence;
pub mod vision;

pub use config::{CredentialSource, Credentials, Endpoints, PipelineConfig};
pub use error::ShotmarkError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use google::Status;
pub use landmark::{
    BoundingBox, DetectedLandmark, LandmarkAnnotation, LandmarkDetector, LatLng, Vertex,
    approximate_bounding_box, detected_landmarks,
};
pub use metadata::VideoMetadata;
pub use pipeline::{Pipeline, PipelineReport, ShotFrames};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameLabel, FrameSampler, SampledFrame};
pub use shot::{ShotBoundary, ShotDetector, expand_shot_frames};
pub use sink::FrameLandmarkMap;
pub use video::{FrameSource, VideoReader};
pub use video_intelligence::VideoIntelligenceClient;
pub use vision::VisionClient;
