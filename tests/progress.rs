//! Progress and cancellation tests.

use std::sync::{Arc, Mutex};

use shotmark::{CancellationToken, OperationType, PipelineConfig, ProgressCallback, ProgressInfo};

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_default_trait() {
    let token = CancellationToken::default();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_across_threads() {
    let token = CancellationToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel())
        .join()
        .expect("cancel thread panicked");
    assert!(token.is_cancelled());
}

#[test]
fn config_shares_token_with_caller() {
    let token = CancellationToken::new();
    let config = PipelineConfig::new("in.mp4").with_cancellation(token.clone());

    token.cancel();
    assert!(config.cancellation().is_some_and(CancellationToken::is_cancelled));
}

// ── ProgressCallback ───────────────────────────────────────────────

struct Recorder {
    seen: Mutex<Vec<(OperationType, u64)>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.seen
            .lock()
            .expect("lock poisoned")
            .push((info.operation, info.current));
    }
}

#[test]
fn progress_callback_is_object_safe() {
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
    });
    let callback: Arc<dyn ProgressCallback> = recorder.clone();
    callback.on_progress(&ProgressInfo {
        operation: OperationType::LandmarkDetection,
        current: 3,
        total: Some(10),
        percentage: Some(30.0),
        elapsed: std::time::Duration::from_millis(5),
        estimated_remaining: None,
        current_frame: Some(42),
    });

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[(OperationType::LandmarkDetection, 3)]);
}
