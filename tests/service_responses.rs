//! Decoding of Video Intelligence and Vision REST payloads.

use std::time::Duration;

use shotmark::video_intelligence::{Operation, TimeOffset, parse_duration};
use shotmark::vision::BatchAnnotateImagesResponse;
use shotmark::{LatLng, ShotBoundary, ShotmarkError, Vertex};

// ── Video Intelligence ───────────────────────────────────────────────

#[test]
fn duration_strings() {
    assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    assert_eq!(parse_duration("12s").unwrap(), Duration::from_secs(12));
    assert_eq!(parse_duration("4.250s").unwrap(), Duration::from_millis(4250));
    assert!(parse_duration("4.2").is_err());
    assert!(parse_duration("abcs").is_err());
}

#[test]
fn duration_object_form() {
    let offset: TimeOffset = serde_json::from_str(r#"{"seconds": "3", "nanos": 500000000}"#).unwrap();
    assert_eq!(offset.to_duration().unwrap(), Duration::from_millis(3500));

    let offset: TimeOffset = serde_json::from_str(r#"{"nanos": 40000000}"#).unwrap();
    assert_eq!(offset.to_duration().unwrap(), Duration::from_millis(40));
}

#[test]
fn running_operation_has_no_shots_yet() {
    let operation: Operation =
        serde_json::from_str(r#"{"name": "projects/1/locations/us-east1/operations/42"}"#).unwrap();
    assert_eq!(operation.name, "projects/1/locations/us-east1/operations/42");
    assert!(operation.shots().unwrap().is_none());
}

#[test]
fn finished_operation_yields_shot_starts() {
    let payload = r#"{
        "name": "projects/1/locations/us-east1/operations/42",
        "done": true,
        "response": {
            "@type": "type.googleapis.com/google.cloud.videointelligence.v1.AnnotateVideoResponse",
            "annotationResults": [{
                "shotAnnotations": [
                    {"endTimeOffset": "3.120s"},
                    {"startTimeOffset": "3.160s", "endTimeOffset": "7.800s"},
                    {"startTimeOffset": "7.840s", "endTimeOffset": "10s"}
                ]
            }]
        }
    }"#;

    let operation: Operation = serde_json::from_str(payload).unwrap();
    let shots = operation.shots().unwrap().unwrap();
    assert_eq!(
        shots,
        vec![
            ShotBoundary::new(Duration::ZERO),
            ShotBoundary::new(Duration::from_millis(3160)),
            ShotBoundary::new(Duration::from_millis(7840)),
        ]
    );
}

#[test]
fn finished_operation_without_results_has_no_shots() {
    let operation: Operation =
        serde_json::from_str(r#"{"name": "op", "done": true, "response": {}}"#).unwrap();
    assert_eq!(operation.shots().unwrap(), Some(vec![]));
}

#[test]
fn failed_operation_is_a_service_error() {
    let payload = r#"{
        "name": "op",
        "done": true,
        "error": {"code": 3, "message": "Invalid video content"}
    }"#;
    let operation: Operation = serde_json::from_str(payload).unwrap();

    match operation.shots() {
        Err(ShotmarkError::ServiceError {
            status, message, ..
        }) => {
            assert_eq!(status, 3);
            assert_eq!(message, "Invalid video content");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}

// ── Vision ───────────────────────────────────────────────────────────

#[test]
fn landmark_annotations_are_decoded() {
    let payload = r#"{
        "responses": [{
            "landmarkAnnotations": [{
                "mid": "/m/02j81",
                "description": "Eiffel Tower",
                "score": 0.92,
                "boundingPoly": {
                    "vertices": [{"x": 100, "y": 40}, {"x": 220}, {"x": 220, "y": 400}, {"y": 400}]
                },
                "locations": [{"latLng": {"latitude": 48.858461, "longitude": 2.294351}}]
            }, {
                "description": "Null Island",
                "locations": [{"latLng": {}}, {}]
            }]
        }]
    }"#;

    let response: BatchAnnotateImagesResponse = serde_json::from_str(payload).unwrap();
    let landmarks = response.into_landmarks();
    assert_eq!(landmarks.len(), 2);

    let tower = &landmarks[0];
    assert_eq!(tower.description, "Eiffel Tower");
    assert_eq!(
        tower.vertices,
        vec![
            Vertex::new(100, 40),
            Vertex::new(220, 0),
            Vertex::new(220, 400),
            Vertex::new(0, 400)
        ]
    );
    assert_eq!(
        tower.locations,
        vec![Some(LatLng {
            latitude: 48.858461,
            longitude: 2.294351
        })]
    );

    let island = &landmarks[1];
    assert!(island.vertices.is_empty());
    assert_eq!(island.locations, vec![None, None]);
}

#[test]
fn empty_vision_response_has_no_landmarks() {
    let response: BatchAnnotateImagesResponse = serde_json::from_str(r#"{"responses": [{}]}"#).unwrap();
    assert!(response.into_landmarks().is_empty());

    let response: BatchAnnotateImagesResponse = serde_json::from_str("{}").unwrap();
    assert!(response.into_landmarks().is_empty());
}

#[test]
fn per_image_error_yields_no_landmarks() {
    let payload = r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#;
    let response: BatchAnnotateImagesResponse = serde_json::from_str(payload).unwrap();
    assert!(response.into_landmarks().is_empty());
}
