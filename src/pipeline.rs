//! The shot-change → landmark pipeline.
//!
//! [`Pipeline`] ties the stages together: read the video bytes, detect
//! shots, expand them into frame numbers, sample each frame, query the
//! landmark service, and write the accumulated [`FrameLandmarkMap`].
//!
//! Once the landmark loop has started, the output file is always written:
//! on normal completion, after a cancellation, and when a landmark request
//! fails (the error is returned after the flush). The frame source is
//! released exactly once, before the flush, on every path.
//!
//! # Example
//!
//! ```no_run
//! use shotmark::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("sample_video.mp4").with_output_path("Landmarks.json");
//! let report = Pipeline::google(config)?.run()?;
//! println!("{} frame(s) with landmarks", report.frames_with_landmarks);
//! # Ok::<(), shotmark::ShotmarkError>(())
//! ```

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use crate::{
    config::PipelineConfig,
    error::ShotmarkError,
    landmark::{LandmarkDetector, detected_landmarks},
    metadata::VideoMetadata,
    progress::{OperationType, ProgressTracker},
    sampler::FrameSampler,
    shot::{ShotDetector, expand_shot_frames},
    sink::FrameLandmarkMap,
    video::{FrameSource, VideoReader},
    video_intelligence::VideoIntelligenceClient,
    vision::VisionClient,
};

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Number of shot boundaries reported by the shot detector.
    pub shot_count: usize,
    /// Frame numbers selected for sampling, in sampling order.
    pub shot_frames: Vec<u64>,
    /// Frames read and sent to the landmark detector.
    pub frames_sampled: u64,
    /// Frames that could not be read and were skipped.
    pub frames_skipped: u64,
    /// Frames with at least one landmark in the output.
    pub frames_with_landmarks: usize,
    /// Landmark records in the output.
    pub landmark_count: usize,
    /// Whether the loop stopped early on cancellation.
    pub interrupted: bool,
    /// Where the results were written.
    pub output_path: PathBuf,
}

/// Releases the wrapped source when dropped, unless released already.
struct ReleaseGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> ReleaseGuard<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl<S: FrameSource> Deref for ReleaseGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> DerefMut for ReleaseGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for ReleaseGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Batch pipeline over one video.
pub struct Pipeline<D, L> {
    config: PipelineConfig,
    shot_detector: D,
    landmark_detector: L,
    sampler: FrameSampler,
}

impl Pipeline<VideoIntelligenceClient, VisionClient> {
    /// Build a pipeline that talks to Google Cloud Video Intelligence and
    /// Vision with the credentials and endpoints from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::MissingCredentials`] if no credential can be
    /// resolved.
    pub fn google(config: PipelineConfig) -> Result<Self, ShotmarkError> {
        let shot_detector = VideoIntelligenceClient::from_config(&config)?;
        let landmark_detector = VisionClient::from_config(&config)?;
        Ok(Self::new(config, shot_detector, landmark_detector))
    }
}

impl<D: ShotDetector, L: LandmarkDetector> Pipeline<D, L> {
    pub fn new(config: PipelineConfig, shot_detector: D, landmark_detector: L) -> Self {
        let sampler = FrameSampler::new(config.label.as_ref(), config.jpeg_quality);
        Self {
            config,
            shot_detector,
            landmark_detector,
            sampler,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Open the configured video with FFmpeg and run the pipeline.
    ///
    /// # Errors
    ///
    /// See [`run_with_source`](Pipeline::run_with_source); additionally
    /// returns [`ShotmarkError::FileOpen`] if the video cannot be opened.
    pub fn run(&self) -> Result<PipelineReport, ShotmarkError> {
        let reader = VideoReader::open(&self.config.video_path)?;
        self.run_with_source(reader)
    }

    /// Run the pipeline over an already-open frame source.
    ///
    /// The source is consumed and released before this returns.
    ///
    /// # Errors
    ///
    /// - Errors from reading the video bytes or from shot detection are
    ///   returned before any output is written.
    /// - A landmark detection or frame encoding error is returned after the
    ///   results gathered so far have been written.
    /// - [`ShotmarkError::IoError`] if the output file cannot be written.
    pub fn run_with_source<S: FrameSource>(
        &self,
        source: S,
    ) -> Result<PipelineReport, ShotmarkError> {
        let mut source = ReleaseGuard::new(source);

        let shots = self.detect_shot_frames(source.metadata())?;
        let mut report = PipelineReport {
            shot_count: shots.shot_count,
            shot_frames: shots.frames,
            frames_sampled: 0,
            frames_skipped: 0,
            frames_with_landmarks: 0,
            landmark_count: 0,
            interrupted: false,
            output_path: self.config.output_path.clone(),
        };

        let mut landmarks = FrameLandmarkMap::new();
        let outcome = self.detect_landmarks(&mut *source, &mut landmarks, &mut report);

        source.release();

        report.frames_with_landmarks = landmarks.len();
        report.landmark_count = landmarks.landmark_count();
        let written = landmarks.write(&self.config.output_path);

        match (outcome, written) {
            (Ok(()), Ok(())) => Ok(report),
            (Err(error), Ok(())) => Err(error),
            (Ok(()), Err(error)) => Err(error),
            (Err(error), Err(write_error)) => {
                log::error!(
                    "Could not write {}: {write_error}",
                    self.config.output_path.display()
                );
                Err(error)
            }
        }
    }

    /// Run shot detection on the configured video and expand the result
    /// into frame numbers to sample.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::IoError`] if the video cannot be read, or
    /// any error from the shot detector.
    pub fn detect_shot_frames(&self, metadata: &VideoMetadata) -> Result<ShotFrames, ShotmarkError> {
        log::info!(
            "FPS: {:.3}, total frames: {}",
            metadata.frames_per_second,
            metadata.frame_count
        );

        let video = fs::read(&self.config.video_path)?;
        let shots = self
            .shot_detector
            .detect_shots(&video, self.config.shot_detection_timeout)?;

        let frames = expand_shot_frames(
            &shots,
            metadata.frames_per_second,
            metadata.frame_count,
            self.config.frames_per_shot,
        );
        log::debug!("Frames selected after shot change detection: {frames:?}");

        Ok(ShotFrames {
            shot_count: shots.len(),
            frames,
        })
    }

    fn detect_landmarks<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        landmarks: &mut FrameLandmarkMap,
        report: &mut PipelineReport,
    ) -> Result<(), ShotmarkError> {
        let mut progress = ProgressTracker::new(
            self.config.progress.clone(),
            OperationType::LandmarkDetection,
            Some(report.shot_frames.len() as u64),
        );

        for &frame_number in &report.shot_frames {
            if self.config.is_cancelled() {
                log::warn!("Interrupted; keeping landmarks found so far");
                report.interrupted = true;
                break;
            }

            match self.sampler.sample(source, frame_number)? {
                None => report.frames_skipped += 1,
                Some(frame) => {
                    report.frames_sampled += 1;
                    let annotations = self.landmark_detector.detect_landmarks(&frame.jpeg)?;
                    let detected =
                        detected_landmarks(&annotations, self.config.bounding_box_padding);

                    for landmark in &detected {
                        log::info!(
                            "Frame {frame_number}: {} (lat {:?}, lng {:?})",
                            landmark.landmark_name,
                            landmark.latitude,
                            landmark.longitude
                        );
                    }
                    landmarks.record(frame_number, detected);
                }
            }

            progress.advance(Some(frame_number));
        }

        Ok(())
    }
}

/// Output of [`Pipeline::detect_shot_frames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotFrames {
    /// Number of shot boundaries reported.
    pub shot_count: usize,
    /// Expanded frame numbers, in sampling order.
    pub frames: Vec<u64>,
}
