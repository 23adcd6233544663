//! Per-frame landmark accumulation and JSON output.
//!
//! [`FrameLandmarkMap`] collects the landmarks found in each sampled frame
//! and writes them as a single pretty-printed JSON object keyed by frame
//! number:
//!
//! ```json
//! {
//!   "42": [
//!     {
//!       "landmark_name": "Eiffel Tower",
//!       "latitude": 48.858461,
//!       "longitude": 2.294351,
//!       "bounding_box": [[90, 30], [230, 30], [230, 410], [90, 410]]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::ShotmarkError, landmark::DetectedLandmark};

/// Landmarks keyed by frame number. Frames without landmarks are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameLandmarkMap {
    frames: BTreeMap<u64, Vec<DetectedLandmark>>,
}

impl FrameLandmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the landmarks found in `frame_number`.
    ///
    /// An empty list is ignored and returns `false`. A frame recorded twice
    /// keeps the later list.
    pub fn record(&mut self, frame_number: u64, landmarks: Vec<DetectedLandmark>) -> bool {
        if landmarks.is_empty() {
            return false;
        }
        self.frames.insert(frame_number, landmarks);
        true
    }

    pub fn get(&self, frame_number: u64) -> Option<&[DetectedLandmark]> {
        self.frames.get(&frame_number).map(Vec::as_slice)
    }

    pub fn contains(&self, frame_number: u64) -> bool {
        self.frames.contains_key(&frame_number)
    }

    /// Number of frames with at least one landmark.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total landmark records across all frames.
    pub fn landmark_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Frame numbers in ascending order.
    pub fn frame_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.frames.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[DetectedLandmark])> {
        self.frames
            .iter()
            .map(|(frame_number, landmarks)| (*frame_number, landmarks.as_slice()))
    }

    /// Render as JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, ShotmarkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the map to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::IoError`] if the file cannot be written.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ShotmarkError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;

        log::info!(
            "Wrote {} landmark(s) across {} frame(s) to {}",
            self.landmark_count(),
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a map previously written with [`write`](FrameLandmarkMap::write).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShotmarkError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
