//! Frame sampling: seek, read, label, encode.
//!
//! [`FrameSampler`] pulls one frame from a [`FrameSource`], burns a text
//! label into it, and encodes it as JPEG for the landmark service. A frame
//! that cannot be read produces no [`SampledFrame`] and no error.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontRef, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use imageproc::drawing::draw_text_mut;

use crate::{error::ShotmarkError, video::FrameSource};

/// DejaVu Sans, used unless a label names its own font file.
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Text burned into every sampled frame.
///
/// The position is the left end of the text baseline, matching how
/// on-screen captions are usually specified.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLabel {
    pub text: String,
    pub x: i32,
    pub baseline_y: i32,
    pub color: [u8; 3],
    /// Text height in pixels.
    pub scale: f32,
    /// Stroke thickness in pixels; the text is stamped this many times per axis.
    pub thickness: u32,
    /// TrueType/OpenType font file overriding the bundled DejaVu Sans.
    pub font_path: Option<PathBuf>,
}

impl Default for FrameLabel {
    fn default() -> Self {
        Self {
            text: "Shot Change".to_string(),
            x: 20,
            baseline_y: 50,
            color: [255, 0, 0],
            scale: 32.0,
            thickness: 2,
            font_path: None,
        }
    }
}

impl FrameLabel {
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn with_font_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.font_path = Some(path.as_ref().to_path_buf());
        self
    }

    fn load_font(&self) -> Option<FontArc> {
        if let Some(path) = &self.font_path {
            let loaded = fs::read(path)
                .map_err(|error| error.to_string())
                .and_then(|data| FontVec::try_from_vec(data).map_err(|error| error.to_string()));
            match loaded {
                Ok(font) => {
                    log::debug!("Loaded label font {}", path.display());
                    return Some(FontArc::new(font));
                }
                Err(reason) => log::warn!(
                    "Cannot use label font {}: {reason}; falling back to the bundled font",
                    path.display()
                ),
            }
        }

        match FontRef::try_from_slice(BUNDLED_FONT) {
            Ok(font) => Some(FontArc::new(font)),
            Err(error) => {
                log::error!("Bundled label font is unreadable: {error}");
                None
            }
        }
    }
}

/// A frame ready to be sent to the landmark service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledFrame {
    pub frame_number: u64,
    /// JPEG-encoded image.
    pub jpeg: Vec<u8>,
}

/// Reads, labels, and encodes frames.
pub struct FrameSampler {
    label: Option<(FrameLabel, FontArc)>,
    jpeg_quality: u8,
}

impl Debug for FrameSampler {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameSampler")
            .field("label", &self.label.as_ref().map(|(label, _)| label))
            .field("jpeg_quality", &self.jpeg_quality)
            .finish()
    }
}

impl FrameSampler {
    /// Create a sampler.
    ///
    /// The label is drawn with its `font_path` when that file loads, and with
    /// the bundled font otherwise.
    pub fn new(label: Option<&FrameLabel>, jpeg_quality: u8) -> Self {
        let label = label.and_then(|label| label.load_font().map(|font| (label.clone(), font)));

        Self {
            label,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Whether frames will carry the text label.
    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    /// Seek `source` to `frame_number` and produce a labelled JPEG.
    ///
    /// Returns `Ok(None)` when the frame cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::ImageError`] if JPEG encoding fails.
    pub fn sample<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        frame_number: u64,
    ) -> Result<Option<SampledFrame>, ShotmarkError> {
        source.seek(frame_number);
        let Some(mut frame) = source.read_frame() else {
            return Ok(None);
        };

        self.draw_label(&mut frame);
        let jpeg = self.encode(&frame)?;

        Ok(Some(SampledFrame { frame_number, jpeg }))
    }

    /// Burn the label into `frame`. No-op without a label.
    pub fn draw_label(&self, frame: &mut RgbImage) {
        let Some((label, font)) = &self.label else {
            return;
        };

        let scale = PxScale::from(label.scale);
        let top = label.baseline_y - font.as_scaled(scale).ascent().round() as i32;
        let color = Rgb(label.color);

        for dx in 0..label.thickness.max(1) as i32 {
            for dy in 0..label.thickness.max(1) as i32 {
                draw_text_mut(frame, color, label.x + dx, top + dy, scale, font, &label.text);
            }
        }
    }

    /// Encode `frame` as JPEG.
    pub fn encode(&self, frame: &RgbImage) -> Result<Vec<u8>, ShotmarkError> {
        let mut buffer = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
            encoder.encode_image(frame)?;
        }
        Ok(buffer)
    }
}
