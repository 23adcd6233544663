//! Shot boundary to frame number expansion tests.

use std::time::Duration;

use shotmark::{ShotBoundary, expand_shot_frames};

fn shot(seconds: f64) -> ShotBoundary {
    ShotBoundary::new(Duration::from_secs_f64(seconds))
}

#[test]
fn start_frame_is_floored() {
    assert_eq!(shot(0.0).start_frame(29.97), 0);
    assert_eq!(shot(1.0).start_frame(29.97), 29);
    assert_eq!(shot(2.5).start_frame(24.0), 60);
    assert_eq!(shot(0.999).start_frame(1.0), 0);
}

#[test]
fn each_shot_expands_to_ten_consecutive_frames() {
    let frames = expand_shot_frames(&[shot(1.0)], 30.0, 1_000, 10);
    assert_eq!(frames, (30..40).collect::<Vec<u64>>());
}

#[test]
fn expansion_never_reaches_total_frames() {
    let total_frames = 100;
    for (start, fps) in [(3.0, 30.0), (3.25, 30.0), (9.95, 10.0), (12.0, 10.0), (0.0, 10.0)] {
        let frames = expand_shot_frames(&[shot(start)], fps, total_frames, 10);
        let start_frame = shot(start).start_frame(fps);
        let expected = 10.min(total_frames.saturating_sub(start_frame));

        assert_eq!(frames.len() as u64, expected, "start {start}s at {fps} fps");
        assert!(frames.iter().all(|&frame| frame < total_frames));
        for (offset, frame) in frames.iter().enumerate() {
            assert_eq!(*frame, start_frame + offset as u64);
        }
    }
}

#[test]
fn shots_keep_order_and_duplicates() {
    let frames = expand_shot_frames(&[shot(0.0), shot(0.4)], 10.0, 100, 10);
    assert_eq!(frames.len(), 20);
    assert_eq!(&frames[..10], &(0..10).collect::<Vec<u64>>()[..]);
    assert_eq!(&frames[10..], &(4..14).collect::<Vec<u64>>()[..]);
}

#[test]
fn no_shots_no_frames() {
    assert!(expand_shot_frames(&[], 25.0, 100, 10).is_empty());
}

#[test]
fn unknown_frame_count_selects_nothing() {
    assert!(expand_shot_frames(&[shot(1.0)], 25.0, 0, 10).is_empty());
}

#[test]
fn frames_per_shot_is_honoured() {
    let frames = expand_shot_frames(&[shot(1.0)], 10.0, 100, 3);
    assert_eq!(frames, vec![10, 11, 12]);
}

#[test]
fn huge_frames_per_shot_is_bounded_by_frame_count() {
    let frames = expand_shot_frames(&[shot(9.0), shot(0.0)], 10.0, 95, u64::MAX);
    assert_eq!(frames.len(), 5 + 95);
    assert_eq!(&frames[..5], &[90, 91, 92, 93, 94]);
    assert_eq!(frames.last(), Some(&94));
}
