//! FrameLandmarkMap accumulation and JSON output tests.

use shotmark::{BoundingBox, DetectedLandmark, FrameLandmarkMap};

fn landmark(name: &str) -> DetectedLandmark {
    DetectedLandmark {
        landmark_name: name.to_string(),
        latitude: Some(51.5007),
        longitude: Some(-0.1246),
        bounding_box: Some(BoundingBox {
            corners: [(90, 30), (230, 30), (230, 410), (90, 410)],
        }),
    }
}

#[test]
fn empty_lists_are_not_recorded() {
    let mut map = FrameLandmarkMap::new();
    assert!(!map.record(7, Vec::new()));
    assert!(map.is_empty());
    assert!(!map.contains(7));
}

#[test]
fn later_record_replaces_earlier() {
    let mut map = FrameLandmarkMap::new();
    assert!(map.record(12, vec![landmark("Big Ben")]));
    assert!(map.record(12, vec![landmark("Tower Bridge"), landmark("London Eye")]));

    assert_eq!(map.len(), 1);
    assert_eq!(map.landmark_count(), 2);
    let names: Vec<&str> = map
        .get(12)
        .unwrap()
        .iter()
        .map(|l| l.landmark_name.as_str())
        .collect();
    assert_eq!(names, ["Tower Bridge", "London Eye"]);
}

#[test]
fn frames_iterate_in_ascending_order() {
    let mut map = FrameLandmarkMap::new();
    map.record(300, vec![landmark("c")]);
    map.record(4, vec![landmark("a")]);
    map.record(41, vec![landmark("b")]);

    assert_eq!(map.frame_numbers().collect::<Vec<_>>(), vec![4, 41, 300]);
    let names: Vec<&str> = map
        .iter()
        .map(|(_, landmarks)| landmarks[0].landmark_name.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn empty_map_renders_as_empty_object() {
    assert_eq!(FrameLandmarkMap::new().to_json().unwrap(), "{}");
}

#[test]
fn json_is_keyed_by_frame_number_string() {
    let mut map = FrameLandmarkMap::new();
    map.record(42, vec![landmark("Big Ben")]);

    let value: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
    let record = &value["42"][0];
    assert_eq!(record["landmark_name"], "Big Ben");
    assert_eq!(record["latitude"], 51.5007);
    assert_eq!(record["longitude"], -0.1246);
    assert_eq!(
        record["bounding_box"],
        serde_json::json!([[90, 30], [230, 30], [230, 410], [90, 410]])
    );
}

#[test]
fn write_then_load() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("Landmarks.json");

    let mut map = FrameLandmarkMap::new();
    map.record(3, vec![landmark("Big Ben")]);
    map.record(
        9,
        vec![DetectedLandmark {
            landmark_name: "Unknown".to_string(),
            latitude: None,
            longitude: None,
            bounding_box: None,
        }],
    );
    map.write(&path).expect("Failed to write landmarks");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\n  \"3\": ["), "{contents}");
    assert_eq!(FrameLandmarkMap::load(&path).unwrap(), map);
}

#[test]
fn write_replaces_existing_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("Landmarks.json");
    std::fs::write(&path, "stale contents that are longer than an empty object").unwrap();

    FrameLandmarkMap::new().write(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn write_to_missing_directory_fails() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("missing").join("Landmarks.json");
    assert!(FrameLandmarkMap::new().write(&path).is_err());
}
