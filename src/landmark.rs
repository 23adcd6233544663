//! Landmark records and bounding-box approximation.
//!
//! A [`LandmarkDetector`] returns raw [`LandmarkAnnotation`]s for one
//! encoded frame. [`detected_landmarks`] flattens them into the
//! [`DetectedLandmark`] records that end up in the output file, one record
//! per reported location, each with a padded axis-aligned rectangle
//! approximating the landmark's polygon.

use serde::{Deserialize, Serialize};

use crate::error::ShotmarkError;

/// A polygon vertex in image coordinates (y grows downward).
///
/// The REST API omits coordinates equal to zero, hence the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

impl Vertex {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// One landmark as reported by the recognition service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkAnnotation {
    /// Landmark name, e.g. `"Eiffel Tower"`.
    pub description: String,
    /// Reported locations. An entry is `None` when the service listed a
    /// location without coordinates.
    pub locations: Vec<Option<LatLng>>,
    /// Bounding polygon, empty when the service gave none.
    pub vertices: Vec<Vertex>,
}

/// Axis-aligned rectangle stored as its four corners in the order
/// top-left, top-right, bottom-right, bottom-left.
///
/// Serializes as `[[x, y], [x, y], [x, y], [x, y]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox {
    pub corners: [(i64, i64); 4],
}

/// A landmark as written to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLandmark {
    pub landmark_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bounding_box: Option<BoundingBox>,
}

/// External service that recognises landmarks in a single image.
pub trait LandmarkDetector {
    /// Detect landmarks in an encoded (JPEG) image.
    ///
    /// # Errors
    ///
    /// Transport and service errors are returned as-is.
    fn detect_landmarks(&self, image: &[u8]) -> Result<Vec<LandmarkAnnotation>, ShotmarkError>;
}

/// Approximate a polygon with its padded axis-aligned bounding rectangle.
///
/// Returns `None` for an empty polygon.
///
/// # Example
///
/// ```
/// use shotmark::{Vertex, approximate_bounding_box};
///
/// let square = [Vertex::new(0, 0), Vertex::new(10, 0), Vertex::new(10, 10), Vertex::new(0, 10)];
/// let rect = approximate_bounding_box(&square, 10).unwrap();
/// assert_eq!(rect.corners, [(-10, -10), (20, -10), (20, 20), (-10, 20)]);
/// ```
pub fn approximate_bounding_box(vertices: &[Vertex], padding: i64) -> Option<BoundingBox> {
    let first = vertices.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for vertex in &vertices[1..] {
        min_x = min_x.min(vertex.x);
        min_y = min_y.min(vertex.y);
        max_x = max_x.max(vertex.x);
        max_y = max_y.max(vertex.y);
    }

    let (left, top) = (min_x - padding, min_y - padding);
    let (right, bottom) = (max_x + padding, max_y + padding);

    Some(BoundingBox {
        corners: [(left, top), (right, top), (right, bottom), (left, bottom)],
    })
}

/// Flatten service annotations into output records.
///
/// Each annotation yields one record per location. Annotations without
/// any location yield nothing.
pub fn detected_landmarks(annotations: &[LandmarkAnnotation], padding: i64) -> Vec<DetectedLandmark> {
    let mut detected = Vec::new();

    for annotation in annotations {
        let bounding_box = approximate_bounding_box(&annotation.vertices, padding);

        for location in &annotation.locations {
            detected.push(DetectedLandmark {
                landmark_name: annotation.description.clone(),
                latitude: location.map(|lat_lng| lat_lng.latitude),
                longitude: location.map(|lat_lng| lat_lng.longitude),
                bounding_box,
            });
        }
    }

    detected
}
