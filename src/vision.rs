//! Landmark detection through the Cloud Vision REST API.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::{Credentials, PipelineConfig},
    error::ShotmarkError,
    google::{self, Status},
    landmark::{LandmarkAnnotation, LandmarkDetector, LatLng, Vertex},
};

const SERVICE: &str = "Vision";

/// Body of an `images:annotate` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnnotateImagesResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub landmark_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
    #[serde(default)]
    pub locations: Vec<LocationInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    #[serde(default)]
    pub lat_lng: Option<WireLatLng>,
}

/// `google.type.LatLng` with both fields optional, as the API drops zeros.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireLatLng {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<EntityAnnotation> for LandmarkAnnotation {
    fn from(entity: EntityAnnotation) -> Self {
        let locations = entity
            .locations
            .iter()
            .map(|location| {
                // An empty latLng object is an unset message.
                location.lat_lng.and_then(|lat_lng| {
                    (lat_lng.latitude.is_some() || lat_lng.longitude.is_some()).then(|| LatLng {
                        latitude: lat_lng.latitude.unwrap_or_default(),
                        longitude: lat_lng.longitude.unwrap_or_default(),
                    })
                })
            })
            .collect();

        LandmarkAnnotation {
            description: entity.description,
            locations,
            vertices: entity
                .bounding_poly
                .map(|poly| poly.vertices)
                .unwrap_or_default(),
        }
    }
}

impl BatchAnnotateImagesResponse {
    /// Landmarks of the first (only) image in the batch.
    ///
    /// A per-image error status only affects that image: it is logged and
    /// yields no landmarks. Transport and HTTP status failures are reported
    /// by [`VisionClient`] before the body is decoded.
    pub fn into_landmarks(self) -> Vec<LandmarkAnnotation> {
        let Some(response) = self.responses.into_iter().next() else {
            return Vec::new();
        };
        if let Some(status) = response.error {
            log::warn!(
                "{SERVICE} could not annotate the image (status {}): {}",
                status.code,
                status.message
            );
            return Vec::new();
        }
        response
            .landmark_annotations
            .into_iter()
            .map(LandmarkAnnotation::from)
            .collect()
    }
}

/// [`LandmarkDetector`] backed by Cloud Vision.
pub struct VisionClient {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl VisionClient {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Build a client from a pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ShotmarkError::MissingCredentials`] if the configured
    /// credential source is empty.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ShotmarkError> {
        Ok(Self::new(
            config.endpoints().vision.clone(),
            config.credentials().resolve()?,
        ))
    }
}

impl LandmarkDetector for VisionClient {
    fn detect_landmarks(&self, image: &[u8]) -> Result<Vec<LandmarkAnnotation>, ShotmarkError> {
        let url = format!("{}/v1/images:annotate", self.endpoint);
        let body = json!({
            "requests": [{
                "image": { "content": google::encode_content(image) },
                "features": [{ "type": "LANDMARK_DETECTION" }],
            }],
        });

        let request = self.client.post(&url).json(&body);
        let response = self.credentials.authorize(request).send()?;
        let batch: BatchAnnotateImagesResponse = google::check_status(SERVICE, response)?.json()?;
        Ok(batch.into_landmarks())
    }
}
