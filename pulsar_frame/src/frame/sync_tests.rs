//! Unit tests for sync.rs
//!
//! Drives the full frame protocol against MockFrameBackend: slot rotation,
//! staleness recovery, window-size preconditions, the recording state
//! machine, and compute/graphics timeline independence.

use crate::error::Error;
use crate::frame::backend::{INVALID_IMAGE_INDEX, MAX_FRAMES_IN_FLIGHT};
use crate::frame::mock_backend::MockFrameBackend;
use crate::frame::sync::FrameSync;

/// Run one full graphics tick, returning the acquired image index
fn run_tick(sync: &mut FrameSync<MockFrameBackend>) -> u32 {
    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    if image_index == INVALID_IMAGE_INDEX {
        return image_index;
    }
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();
    sync.end_recording_commands().unwrap();
    sync.submit(image_index).unwrap();
    image_index
}

/// Run one full compute tick
fn run_compute_tick(sync: &mut FrameSync<MockFrameBackend>) {
    sync.wait_compute().unwrap();
    sync.reset_compute().unwrap();
    sync.begin_recording_compute().unwrap();
    sync.end_recording_compute().unwrap();
    sync.submit_compute().unwrap();
}

// ============================================================================
// SLOT ROTATION
// ============================================================================

#[test]
fn test_initial_slots_are_zero() {
    let sync = FrameSync::new(MockFrameBackend::new());
    assert_eq!(sync.current_frame(), 0);
    assert_eq!(sync.current_compute_frame(), 0);
}

#[test]
fn test_frame_index_cycles_mod_two() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    for k in 1..=6 {
        run_tick(&mut sync);
        assert_eq!(sync.current_frame(), k % MAX_FRAMES_IN_FLIGHT);
    }
}

#[test]
fn test_two_ticks_touch_alternating_slots() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    run_tick(&mut sync);
    run_tick(&mut sync);

    let ops = &sync.backend().ops;
    assert!(ops.contains(&"wait_render_fence(0)".to_string()));
    assert!(ops.contains(&"submit_render(0)".to_string()));
    assert!(ops.contains(&"wait_render_fence(1)".to_string()));
    assert!(ops.contains(&"submit_render(1)".to_string()));
}

#[test]
fn test_rotation_happens_only_on_submit() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();
    sync.end_recording_commands().unwrap();
    assert_eq!(sync.current_frame(), 0);

    sync.submit(image_index).unwrap();
    assert_eq!(sync.current_frame(), 1);
}

// ============================================================================
// IMAGE INDEX VS SLOT INDEX
// ============================================================================

#[test]
fn test_image_index_is_independent_of_slot_index() {
    // The mock swapchain has 3 images while there are only 2 slots, so the
    // two indices drift apart after a few ticks.
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    assert_eq!(run_tick(&mut sync), 0);
    assert_eq!(run_tick(&mut sync), 1);
    assert_eq!(run_tick(&mut sync), 2);
    assert_eq!(run_tick(&mut sync), 0);
    assert_eq!(sync.current_frame(), 0);
}

#[test]
fn test_present_targets_acquired_image_index() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    run_tick(&mut sync);
    run_tick(&mut sync);

    let ops = &sync.backend().ops;
    assert!(ops.contains(&"present(0, 0)".to_string()));
    assert!(ops.contains(&"present(1, 1)".to_string()));
}

// ============================================================================
// STALENESS AND RECREATION
// ============================================================================

#[test]
fn test_out_of_date_acquire_returns_sentinel_and_recreates_once() {
    let mut backend = MockFrameBackend::new();
    backend.script_out_of_date();
    let mut sync = FrameSync::new(backend);
    sync.push_window_size(1024, 768);

    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    assert_eq!(image_index, INVALID_IMAGE_INDEX);

    assert_eq!(sync.backend().recreate_calls, vec![(1024, 768)]);
    // The skipped tick must not rotate the slot
    assert_eq!(sync.current_frame(), 0);
}

#[test]
fn test_healthy_acquire_never_recreates() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    run_tick(&mut sync);
    assert!(sync.backend().recreate_calls.is_empty());
}

#[test]
fn test_recreate_uses_last_pushed_size() {
    let mut backend = MockFrameBackend::new();
    backend.script_out_of_date();
    let mut sync = FrameSync::new(backend);
    sync.push_window_size(800, 600);
    sync.push_window_size(1920, 1080);

    sync.wait_for_fences().unwrap();
    assert_eq!(sync.acquire_next_image().unwrap(), INVALID_IMAGE_INDEX);
    assert_eq!(sync.backend().recreate_calls, vec![(1920, 1080)]);
}

#[test]
fn test_stale_present_recreates_but_still_rotates() {
    let mut backend = MockFrameBackend::new();
    backend.script_stale_present();
    let mut sync = FrameSync::new(backend);
    sync.push_window_size(640, 480);

    run_tick(&mut sync);
    assert_eq!(sync.backend().recreate_calls, vec![(640, 480)]);
    assert_eq!(sync.current_frame(), 1);
}

#[test]
fn test_out_of_date_acquire_without_window_size_is_precondition_error() {
    let mut backend = MockFrameBackend::new();
    backend.script_out_of_date();
    let mut sync = FrameSync::new(backend);

    sync.wait_for_fences().unwrap();
    match sync.acquire_next_image() {
        Err(Error::PreconditionViolated(_)) => {}
        other => panic!("expected PreconditionViolated, got {:?}", other),
    }
    assert!(sync.backend().recreate_calls.is_empty());
}

// ============================================================================
// WINDOW SIZE PRECONDITION
// ============================================================================

#[test]
fn test_submit_without_window_size_fails_on_first_frame() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();
    sync.end_recording_commands().unwrap();

    match sync.submit(image_index) {
        Err(Error::PreconditionViolated(msg)) => {
            assert!(msg.contains("push_window_size"));
        }
        other => panic!("expected PreconditionViolated, got {:?}", other),
    }
    // A rejected submit must not rotate the slot
    assert_eq!(sync.current_frame(), 0);
    assert!(!sync
        .backend()
        .ops
        .iter()
        .any(|op| op.starts_with("submit_render")));
}

#[test]
fn test_window_size_persists_across_frames_and_recreation() {
    let mut backend = MockFrameBackend::new();
    backend.script_stale_present();
    let mut sync = FrameSync::new(backend);
    sync.push_window_size(800, 600);

    // First tick recreates on present; the cached size must still satisfy the
    // submit precondition on the next tick.
    run_tick(&mut sync);
    run_tick(&mut sync);
    assert_eq!(sync.current_frame(), 0);
}

// ============================================================================
// RECORDING STATE MACHINE
// ============================================================================

#[test]
fn test_reset_before_wait_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    match sync.reset_all() {
        Err(Error::PreconditionViolated(msg)) => {
            assert!(msg.contains("reset_all"));
            assert!(msg.contains("Idle"));
        }
        other => panic!("expected PreconditionViolated, got {:?}", other),
    }
    // The backend must never have seen the reset
    assert!(sync.backend().ops.is_empty());
}

#[test]
fn test_reset_after_submit_without_new_wait_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    // Complete one cycle on each slot so slot 0 is back under the cursor in
    // the Submitted state.
    run_tick(&mut sync);
    run_tick(&mut sync);
    assert_eq!(sync.current_frame(), 0);

    assert!(matches!(
        sync.reset_all(),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_nested_begin_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    sync.wait_for_fences().unwrap();
    sync.acquire_next_image().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();

    assert!(matches!(
        sync.begin_recording_commands(),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_end_without_begin_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    assert!(matches!(
        sync.end_recording_commands(),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_submit_without_end_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();

    assert!(matches!(
        sync.submit(image_index),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_wait_during_recording_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    sync.wait_for_fences().unwrap();
    sync.acquire_next_image().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();

    assert!(matches!(
        sync.wait_for_fences(),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_redundant_wait_is_allowed() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    sync.wait_for_fences().unwrap();
    sync.wait_for_fences().unwrap();
    assert_eq!(
        sync.backend()
            .ops
            .iter()
            .filter(|op| op.as_str() == "wait_render_fence(0)")
            .count(),
        2
    );
}

// ============================================================================
// COMPUTE TIMELINE
// ============================================================================

#[test]
fn test_compute_index_cycles_independently() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    run_compute_tick(&mut sync);
    run_compute_tick(&mut sync);
    run_compute_tick(&mut sync);
    assert_eq!(sync.current_compute_frame(), 1);
    // The graphics counter never moved
    assert_eq!(sync.current_frame(), 0);

    run_tick(&mut sync);
    assert_eq!(sync.current_frame(), 1);
    assert_eq!(sync.current_compute_frame(), 1);
}

#[test]
fn test_compute_wait_never_touches_graphics_fence() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    sync.wait_compute().unwrap();
    let ops = &sync.backend().ops;
    assert_eq!(ops, &vec!["wait_compute_fence(0)".to_string()]);
}

#[test]
fn test_interleaved_timelines_do_not_cross_block() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    // Interleave the two protocols step by step within one tick
    sync.wait_for_fences().unwrap();
    sync.wait_compute().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    sync.reset_compute().unwrap();
    sync.reset_all().unwrap();
    sync.begin_recording_compute().unwrap();
    sync.begin_recording_commands().unwrap();
    sync.end_recording_commands().unwrap();
    sync.end_recording_compute().unwrap();
    sync.submit_compute().unwrap();
    sync.submit(image_index).unwrap();

    assert_eq!(sync.current_frame(), 1);
    assert_eq!(sync.current_compute_frame(), 1);

    // No graphics op may appear with a compute name and vice versa
    let ops = &sync.backend().ops;
    assert!(ops.contains(&"wait_compute_fence(0)".to_string()));
    assert!(ops.contains(&"wait_render_fence(0)".to_string()));
}

#[test]
fn test_compute_reset_before_wait_is_rejected() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    assert!(matches!(
        sync.reset_compute(),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn test_compute_submit_needs_no_window_size() {
    let mut sync = FrameSync::new(MockFrameBackend::new());

    // No push_window_size at all; the compute timeline has no present step
    run_compute_tick(&mut sync);
    assert_eq!(sync.current_compute_frame(), 1);
}

// ============================================================================
// CONCRETE SCENARIO
// ============================================================================

#[test]
fn test_first_frame_scenario_800x600() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    sync.wait_for_fences().unwrap();
    let image_index = sync.acquire_next_image().unwrap();
    assert_eq!(image_index, 0);

    sync.reset_all().unwrap();
    sync.begin_recording_commands().unwrap();
    sync.end_recording_commands().unwrap();
    sync.submit(image_index).unwrap();

    assert_eq!(sync.current_frame(), 1);
    assert!(sync.backend().recreate_calls.is_empty());
}

// ============================================================================
// BACKEND CALL ORDER
// ============================================================================

#[test]
fn test_single_tick_backend_call_order() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.push_window_size(800, 600);

    run_tick(&mut sync);

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
fn test_backend_accessors() {
    let mut sync = FrameSync::new(MockFrameBackend::new());
    sync.backend_mut().next_image_index = 2;
    sync.wait_for_fences().unwrap();
    assert_eq!(sync.acquire_next_image().unwrap(), 2);
    assert_eq!(sync.backend().ops.len(), 2);
}
