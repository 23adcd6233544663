//! Video frame access.
//!
//! This module provides the [`FrameSource`] trait consumed by the pipeline
//! and [`VideoReader`], its FFmpeg-backed implementation. A reader exposes
//! the stream metadata, a seek-to-frame operation, and sequential
//! read-next-frame, returning frames as [`image::RgbImage`] buffers.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{error::ShotmarkError, metadata::VideoMetadata, utilities};

/// A seekable source of decoded frames.
///
/// The pipeline owns its source for the whole run and calls
/// [`release`](FrameSource::release) exactly once when it is done with it.
pub trait FrameSource {
    /// Metadata of the underlying stream.
    fn metadata(&self) -> &VideoMetadata;

    /// Position the source so the next [`read_frame`](FrameSource::read_frame)
    /// returns `frame_number`.
    fn seek(&mut self, frame_number: u64);

    /// Decode the frame at the current position and advance by one.
    ///
    /// Returns `None` when the frame cannot be read. Callers treat that as a
    /// skip, not an error.
    fn read_frame(&mut self) -> Option<RgbImage>;

    /// Release the underlying resources. Further reads return `None`.
    fn release(&mut self);
}

/// Decoder state that lives until [`VideoReader::release`].
struct OpenStream {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    end_of_stream: bool,
}

/// FFmpeg-backed [`FrameSource`] over a local video file.
///
/// The decoder is kept alive between reads, so consecutive frame numbers
/// are decoded without re-seeking. Seeking elsewhere jumps to the nearest
/// keyframe before the target and decodes forward.
///
/// # Example
///
/// ```no_run
/// use shotmark::{FrameSource, VideoReader};
///
/// let mut reader = VideoReader::open("sample_video.mp4")?;
/// println!("{} frames at {:.2} fps", reader.metadata().frame_count, reader.metadata().frames_per_second);
///
/// reader.seek(120);
/// if let Some(frame) = reader.read_frame() {
///     frame.save("frame_120.png")?;
/// }
/// reader.release();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VideoReader {
    stream: Option<OpenStream>,
    stream_index: usize,
    time_base: Rational,
    metadata: VideoMetadata,
    path: PathBuf,
    position: u64,
    needs_seek: bool,
}

impl Debug for VideoReader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoReader")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .field("position", &self.position)
            .field("released", &self.stream.is_none())
            .finish_non_exhaustive()
    }
}

impl VideoReader {
    /// Open a video file for frame sampling.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// - [`ShotmarkError::FileOpen`] if the file cannot be opened or its
    ///   decoder cannot be created.
    /// - [`ShotmarkError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ShotmarkError> {
        let path = path.as_ref().to_path_buf();

        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| ShotmarkError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| ShotmarkError::FileOpen {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(ShotmarkError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                ShotmarkError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read codec parameters: {error}"),
                }
            })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| ShotmarkError::FileOpen {
                path: path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let duration = if stream.duration() > 0 {
            Duration::from_secs_f64(utilities::pts_to_seconds(stream.duration(), time_base))
        } else if input.duration() > 0 {
            Duration::from_micros(input.duration() as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            ScalingFlags::BILINEAR,
        )?;

        log::info!(
            "Opened {}: {}x{} @ {:.3} fps, {} frames [{}]",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            stream: Some(OpenStream {
                input,
                decoder,
                scaler,
                end_of_stream: false,
            }),
            stream_index,
            time_base,
            metadata,
            path,
            position: 0,
            needs_seek: false,
        })
    }

    /// Path of the opened file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frame number the next read will return.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether [`release`](FrameSource::release) has been called.
    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    fn decode_at_position(&mut self) -> Result<Option<RgbImage>, ShotmarkError> {
        let target = self.position;
        let frames_per_second = self.metadata.frames_per_second;
        let (width, height) = (self.metadata.width, self.metadata.height);

        if self.metadata.frame_count > 0 && target >= self.metadata.frame_count {
            return Ok(None);
        }

        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        if self.needs_seek {
            let timestamp = utilities::frame_number_to_seek_timestamp(target, frames_per_second);
            stream.input.seek(timestamp, ..timestamp)?;
            stream.decoder.flush();
            stream.end_of_stream = false;
            self.needs_seek = false;
        }

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        loop {
            while stream.decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame
                    .timestamp()
                    .or_else(|| decoded_frame.pts())
                    .unwrap_or(0);
                let frame_number =
                    utilities::pts_to_frame_number(pts, self.time_base, frames_per_second);

                // Frames before the target are leftovers from the keyframe
                // the seek landed on.
                if frame_number < target {
                    continue;
                }

                stream.scaler.run(&decoded_frame, &mut rgb_frame)?;
                let buffer = utilities::frame_to_rgb_buffer(&rgb_frame, width, height);
                let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
                    ShotmarkError::FfmpegError(
                        "Decoded frame does not match the stream dimensions".to_string(),
                    )
                })?;
                self.position = target + 1;
                return Ok(Some(image));
            }

            if stream.end_of_stream {
                return Ok(None);
            }

            match next_packet(&mut stream.input, self.stream_index) {
                Some(packet) => stream.decoder.send_packet(&packet)?,
                None => {
                    stream.decoder.send_eof()?;
                    stream.end_of_stream = true;
                }
            }
        }
    }
}

impl FrameSource for VideoReader {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek(&mut self, frame_number: u64) {
        if frame_number != self.position {
            self.needs_seek = true;
        }
        self.position = frame_number;
    }

    fn read_frame(&mut self) -> Option<RgbImage> {
        match self.decode_at_position() {
            Ok(frame) => frame,
            Err(error) => {
                log::debug!("Could not read frame {}: {error}", self.position);
                // Force a fresh seek so the decoder does not continue from a
                // half-consumed packet.
                self.needs_seek = true;
                None
            }
        }
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Released video file: {}", self.path.display());
        }
    }
}

/// Pull the next packet that belongs to `stream_index`.
fn next_packet(input: &mut Input, stream_index: usize) -> Option<Packet> {
    input
        .packets()
        .find(|(stream, _)| stream.index() == stream_index)
        .map(|(_, packet)| packet)
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    (rate.denominator() != 0 && rate.numerator() > 0)
        .then(|| rate.numerator() as f64 / rate.denominator() as f64)
}
