//! Unit tests for facade.rs
//!
//! Verifies that the free functions sequence the synchronizer's primitives
//! in the protocol order and propagate the skip-frame sentinel.

use crate::error::Error;
use crate::frame::backend::INVALID_IMAGE_INDEX;
use crate::frame::facade::{begin, begin_compute, end, end_compute, prepare_compute, prepare_frame};
use crate::frame::mock_backend::MockFrameBackend;
use crate::frame::sync::FrameSync;

// ============================================================================
// RENDER PATH
// ============================================================================

#[test]
fn test_full_tick_through_facade() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    let image_index = prepare_frame(&mut sync).unwrap();
    assert_eq!(image_index, 0);
    begin(&mut sync).unwrap();
    end(&mut sync, image_index).unwrap();

    assert_eq!(sync.current_frame(), 1);
    assert_eq!(
        sync.backend().ops,
        vec![
            "wait_render_fence(0)".to_string(),
            "acquire_image(0)".to_string(),
            "reset_render_fence(0)".to_string(),
            "reset_render_commands(0)".to_string(),
            "begin_render_commands(0)".to_string(),
            "end_render_commands(0)".to_string(),
            "submit_render(0)".to_string(),
            "present(0, 0)".to_string(),
        ]
    );
}

#[test]
fn test_two_ticks_alternate_slots_without_deadlock() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    for expected_slot in [0usize, 1usize] {
        let image_index = prepare_frame(&mut sync).unwrap();
        begin(&mut sync).unwrap();
        end(&mut sync, image_index).unwrap();
        assert!(sync
            .backend()
            .ops
            .contains(&format!("submit_render({})", expected_slot)));
    }
    assert_eq!(sync.current_frame(), 0);
}

#[test]
fn test_prepare_frame_surfaces_sentinel_on_staleness() {
    let mut backend = MockFrameBackend::new();
    backend.script_out_of_date();
    let mut sync = FrameSync::new(backend);
    sync.push_window_size(1024, 768);

    assert_eq!(prepare_frame(&mut sync).unwrap(), INVALID_IMAGE_INDEX);
    assert_eq!(sync.backend().recreate_calls, vec![(1024, 768)]);

    // Skipping the tick and preparing again must succeed on the same slot
    let image_index = prepare_frame(&mut sync).unwrap();
    assert_ne!(image_index, INVALID_IMAGE_INDEX);
    assert_eq!(sync.current_frame(), 0);
}

#[test]
fn test_begin_without_prepare_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    assert!(matches!(
        begin(&mut sync),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_end_without_begin_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    prepare_frame(&mut sync).unwrap();
    assert!(matches!(
        end(&mut sync, 0),
        Err(Error::PreconditionViolated(_))
    ));
}

// ============================================================================
// COMPUTE PATH
// ============================================================================

#[test]
fn test_full_compute_tick_through_facade() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    prepare_compute(&mut sync).unwrap();
    begin_compute(&mut sync).unwrap();
    end_compute(&mut sync).unwrap();

    assert_eq!(sync.current_compute_frame(), 1);
    assert_eq!(
        sync.backend().ops,
        vec![
            "wait_compute_fence(0)".to_string(),
            "reset_compute_fence(0)".to_string(),
            "reset_compute_commands(0)".to_string(),
            "begin_compute_commands(0)".to_string(),
            "end_compute_commands(0)".to_string(),
            "submit_compute(0)".to_string(),
        ]
    );
}

#[test]
fn test_compute_and_render_facades_interleave() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    prepare_compute(&mut sync).unwrap();
    let image_index = prepare_frame(&mut sync).unwrap();
    begin_compute(&mut sync).unwrap();
    begin(&mut sync).unwrap();
    end_compute(&mut sync).unwrap();
    end(&mut sync, image_index).unwrap();

    assert_eq!(sync.current_frame(), 1);
    assert_eq!(sync.current_compute_frame(), 1);
}

#[test]
fn test_begin_compute_without_prepare_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    assert!(matches!(
        begin_compute(&mut sync),
        Err(Error::PreconditionViolated(_))
    ));
}
