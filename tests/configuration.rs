//! PipelineConfig builder and credential resolution tests.

use std::path::Path;
use std::time::Duration;

use shotmark::{
    CancellationToken, CredentialSource, Credentials, Endpoints, FrameLabel, PipelineConfig,
    ShotmarkError,
};

// ── PipelineConfig builder ───────────────────────────────────────────

#[test]
fn config_defaults() {
    let config = PipelineConfig::new("sample_video.mp4");
    assert_eq!(config.video_path(), Path::new("sample_video.mp4"));
    assert_eq!(config.output_path(), Path::new("Landmarks.json"));
    assert_eq!(config.shot_detection_timeout(), Duration::from_secs(90));
    assert_eq!(config.frames_per_shot(), 10);
    assert_eq!(config.bounding_box_padding(), 10);
    assert_eq!(config.endpoints(), &Endpoints::default());
    assert!(config.cancellation().is_none());

    let debug = format!("{config:?}");
    assert!(debug.contains("PipelineConfig"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("jpeg_quality: 95"));
    assert!(debug.contains("Shot Change"));
}

#[test]
fn config_builder_overrides() {
    let config = PipelineConfig::new("in.mp4")
        .with_output_path("out/result.json")
        .with_shot_detection_timeout(Duration::from_secs(5))
        .with_frames_per_shot(3)
        .with_bounding_box_padding(0)
        .with_label(None)
        .with_cancellation(CancellationToken::new());

    assert_eq!(config.output_path(), Path::new("out/result.json"));
    assert_eq!(config.shot_detection_timeout(), Duration::from_secs(5));
    assert_eq!(config.frames_per_shot(), 3);
    assert_eq!(config.bounding_box_padding(), 0);
    assert!(config.cancellation().is_some());

    let debug = format!("{config:?}");
    assert!(debug.contains("has_cancellation: true"));
    assert!(debug.contains("label: None"));
}

#[test]
fn config_clamps_out_of_range_values() {
    let config = PipelineConfig::new("in.mp4")
        .with_frames_per_shot(0)
        .with_poll_interval(Duration::ZERO)
        .with_jpeg_quality(0);

    assert_eq!(config.frames_per_shot(), 1);
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    assert!(format!("{config:?}").contains("jpeg_quality: 1"));

    let config = PipelineConfig::new("in.mp4").with_jpeg_quality(250);
    assert!(format!("{config:?}").contains("jpeg_quality: 100"));
}

#[test]
fn custom_label_text() {
    let label = FrameLabel::default().with_text("Cut");
    assert_eq!(label.text, "Cut");
    assert_eq!(label.color, [255, 0, 0]);
    assert_eq!((label.x, label.baseline_y), (20, 50));

    let config = PipelineConfig::new("in.mp4").with_label(Some(label));
    assert!(format!("{config:?}").contains("\"Cut\""));
}

// ── Credentials ──────────────────────────────────────────────────────

#[test]
fn explicit_credentials_resolve_unchanged() {
    let source = CredentialSource::Explicit(Credentials::ApiKey("abc123".to_string()));
    assert_eq!(
        source.resolve().unwrap(),
        Credentials::ApiKey("abc123".to_string())
    );
}

#[test]
fn missing_environment_variable_is_reported() {
    let source = CredentialSource::api_key_env("SHOTMARK_TEST_UNSET_API_KEY");
    match source.resolve() {
        Err(ShotmarkError::MissingCredentials(name)) => {
            assert_eq!(name, "SHOTMARK_TEST_UNSET_API_KEY");
        }
        other => panic!("expected missing credentials, got {other:?}"),
    }
}

#[test]
fn missing_either_names_both_variables() {
    let source = CredentialSource::Either {
        api_key_env: "SHOTMARK_TEST_UNSET_KEY".to_string(),
        access_token_env: "SHOTMARK_TEST_UNSET_TOKEN".to_string(),
    };
    let message = source.resolve().unwrap_err().to_string();
    assert!(message.contains("SHOTMARK_TEST_UNSET_KEY"), "{message}");
    assert!(message.contains("SHOTMARK_TEST_UNSET_TOKEN"), "{message}");
}

#[test]
fn credentials_debug_is_redacted() {
    let key = Credentials::ApiKey("super-secret".to_string());
    let token = Credentials::AccessToken("ya29.secret".to_string());
    assert_eq!(format!("{key:?}"), "ApiKey(<redacted>)");
    assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");

    let config = PipelineConfig::new("in.mp4").with_credentials(CredentialSource::Explicit(key));
    assert!(!format!("{config:?}").contains("super-secret"));
}
