//! Shot boundaries and frame expansion.
//!
//! A [`ShotDetector`] turns the raw bytes of a video into a list of
//! [`ShotBoundary`] start offsets. [`expand_shot_frames`] then converts
//! each offset to a frame number with the stream's frame rate and expands
//! it into a short run of consecutive frames to sample.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use shotmark::{ShotBoundary, expand_shot_frames};
//!
//! let shots = [ShotBoundary::new(Duration::ZERO), ShotBoundary::new(Duration::from_secs(2))];
//! let frames = expand_shot_frames(&shots, 25.0, 55, 10);
//! assert_eq!(frames[..3], [0, 1, 2]);
//! assert_eq!(frames[10..], [50, 51, 52, 53, 54]);
//! ```

use std::time::Duration;

use crate::error::ShotmarkError;

/// The start of a shot, as reported by the shot-detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShotBoundary {
    /// Offset of the first frame of the shot from the start of the video.
    pub start: Duration,
}

impl ShotBoundary {
    pub fn new(start: Duration) -> Self {
        Self { start }
    }

    /// Frame number of the shot start: `floor(start * fps)`.
    pub fn start_frame(&self, frames_per_second: f64) -> u64 {
        (self.start.as_secs_f64() * frames_per_second).floor().max(0.0) as u64
    }
}

/// External service that finds shot changes in a video.
pub trait ShotDetector {
    /// Detect shot boundaries in `video`, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Implementations fail fast: a transport error, a service error, or an
    /// elapsed timeout is returned as-is and never retried.
    fn detect_shots(
        &self,
        video: &[u8],
        timeout: Duration,
    ) -> Result<Vec<ShotBoundary>, ShotmarkError>;
}

/// Expand shot boundaries into the frame numbers to sample.
///
/// Each boundary contributes `frames_per_shot` consecutive frame numbers
/// starting at its start frame. Numbers at or past `total_frames` are
/// dropped. The result keeps boundary order and is not deduplicated, so
/// shots closer together than `frames_per_shot` frames overlap.
pub fn expand_shot_frames(
    shots: &[ShotBoundary],
    frames_per_second: f64,
    total_frames: u64,
    frames_per_shot: u64,
) -> Vec<u64> {
    let mut frames = Vec::new();

    for shot in shots {
        let start_frame = shot.start_frame(frames_per_second);
        let end_frame = start_frame.saturating_add(frames_per_shot).min(total_frames);
        frames.extend(start_frame..end_frame);
    }

    frames
}
