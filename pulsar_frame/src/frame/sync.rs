//! Frame synchronizer - the slot rotation and recording state machine
//!
//! `FrameSync` is the sole arbiter of which double-buffered slot is active
//! and when the CPU may safely reuse a slot's resources. It sequences the
//! backend's primitive operations for two independent timelines (graphics +
//! present, and compute) and drives surface recreation when the backend
//! reports staleness.

use crate::error::{Error, Result};
use crate::frame::backend::{
    AcquireOutcome, FrameBackend, PresentOutcome, INVALID_IMAGE_INDEX, MAX_FRAMES_IN_FLIGHT,
};
use crate::{pulsar_debug, pulsar_info, pulsar_trace, pulsar_warn};

const LOG_SOURCE: &str = "pulsar::FrameSync";

/// Per-slot, per-timeline recording state
///
/// `Idle` means the slot may have an unobserved submission in flight (or has
/// never been used; backends create fences pre-signaled so the first wait
/// returns immediately). A fence wait moves the slot to `Ready`, the only
/// state from which its fence and command buffer may be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Ready,
    Recording,
    Recorded,
    Submitted,
}

impl SlotState {
    fn name(self) -> &'static str {
        match self {
            SlotState::Idle => "Idle",
            SlotState::Ready => "Ready",
            SlotState::Recording => "Recording",
            SlotState::Recorded => "Recorded",
            SlotState::Submitted => "Submitted",
        }
    }
}

/// Frame synchronizer
///
/// Owns the backend and replicates the slot state machine per timeline.
/// Graphics and compute rotate on independent counters; nothing orders the
/// two timelines against each other. A single thread drives all calls.
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar::frame::{FrameSync, FrameBackend, INVALID_IMAGE_INDEX};
/// # fn run<B: FrameBackend>(mut sync: FrameSync<B>) -> pulsar_frame::pulsar::Result<()> {
/// sync.push_window_size(800, 600);
/// sync.wait_for_fences()?;
/// let image_index = sync.acquire_next_image()?;
/// if image_index == INVALID_IMAGE_INDEX {
///     return Ok(()); // surface was rebuilt, skip this tick
/// }
/// sync.reset_all()?;
/// sync.begin_recording_commands()?;
/// // record draw calls against the backend's command buffer here
/// sync.end_recording_commands()?;
/// sync.submit(image_index)?;
/// # Ok(())
/// # }
/// ```
pub struct FrameSync<B: FrameBackend> {
    backend: B,

    /// Graphics timeline slot in [0, MAX_FRAMES_IN_FLIGHT)
    current_frame: usize,

    /// Compute timeline slot, rotated independently by submit_compute
    current_compute_frame: usize,

    /// Last extent pushed by the caller; needed for surface recreation
    window_size: Option<(u32, u32)>,

    render_slots: [SlotState; MAX_FRAMES_IN_FLIGHT],
    compute_slots: [SlotState; MAX_FRAMES_IN_FLIGHT],
}

impl<B: FrameBackend> FrameSync<B> {
    /// Create a synchronizer over a backend
    ///
    /// All slots start `Idle`; the backend is expected to create its fences
    /// pre-signaled so the first `wait_for_fences` does not block.
    pub fn new(backend: B) -> Self {
        pulsar_info!(
            LOG_SOURCE,
            "Frame synchronizer created ({} frames in flight)",
            MAX_FRAMES_IN_FLIGHT
        );
        Self {
            backend,
            current_frame: 0,
            current_compute_frame: 0,
            window_size: None,
            render_slots: [SlotState::Idle; MAX_FRAMES_IN_FLIGHT],
            compute_slots: [SlotState::Idle; MAX_FRAMES_IN_FLIGHT],
        }
    }

    /// Current graphics timeline slot
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Current compute timeline slot
    pub fn current_compute_frame(&self) -> usize {
        self.current_compute_frame
    }

    /// Borrow the backend (command buffer access during recording)
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Cache the window extent used for surface recreation
    ///
    /// Must be called at least once before the first [`submit`](Self::submit).
    /// Calling it every tick is the intended usage; the cache is only read,
    /// never consumed.
    pub fn push_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Some((width, height));
    }

    fn state_error(&self, op: &str, slot: usize, state: SlotState) -> Error {
        Error::PreconditionViolated(format!(
            "{} called on slot {} in state {}",
            op,
            slot,
            state.name()
        ))
    }

    // ===== GRAPHICS TIMELINE =====

    /// Block until the current slot's previous graphics submission completed
    ///
    /// Waits indefinitely on the slot's in-flight fence. Legal from `Idle`,
    /// `Submitted` or (redundantly) `Ready`.
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if the slot is mid-recording, or the backend
    /// error if the wait itself fails.
    pub fn wait_for_fences(&mut self) -> Result<()> {
        let slot = self.current_frame;
        match self.render_slots[slot] {
            SlotState::Idle | SlotState::Submitted | SlotState::Ready => {}
            state => return Err(self.state_error("wait_for_fences", slot, state)),
        }
        pulsar_trace!(LOG_SOURCE, "Waiting on render fence for slot {}", slot);
        self.backend.wait_render_fence(slot)?;
        self.render_slots[slot] = SlotState::Ready;
        Ok(())
    }

    /// Acquire the next presentable image
    ///
    /// Signals the current slot's image-available semaphore once the image is
    /// ready. If the backend reports the surface out of date, the surface is
    /// recreated at the cached window extent and [`INVALID_IMAGE_INDEX`] is
    /// returned; the caller must skip recording for this tick.
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if recreation is needed but no window size was
    /// ever pushed; any other backend failure is fatal and surfaced as-is.
    pub fn acquire_next_image(&mut self) -> Result<u32> {
        let slot = self.current_frame;
        match self.backend.acquire_image(slot)? {
            AcquireOutcome::Acquired(image_index) => Ok(image_index),
            AcquireOutcome::OutOfDate => {
                pulsar_warn!(LOG_SOURCE, "Surface out of date on acquire, recreating");
                self.recreate_surface()?;
                Ok(INVALID_IMAGE_INDEX)
            }
        }
    }

    /// Reset the current slot's fence and command buffer for re-recording
    ///
    /// Only legal after [`wait_for_fences`](Self::wait_for_fences) returned
    /// for this slot; resetting earlier would clobber resources the GPU may
    /// still be using.
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if the fence wait was skipped.
    pub fn reset_all(&mut self) -> Result<()> {
        let slot = self.current_frame;
        if self.render_slots[slot] != SlotState::Ready {
            return Err(self.state_error("reset_all", slot, self.render_slots[slot]));
        }
        self.backend.reset_render_fence(slot)?;
        self.backend.reset_render_commands(slot)?;
        Ok(())
    }

    /// Enter the recording state on the current slot's command buffer
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` on a nested begin or a begin without a prior
    /// [`reset_all`](Self::reset_all).
    pub fn begin_recording_commands(&mut self) -> Result<()> {
        let slot = self.current_frame;
        if self.render_slots[slot] != SlotState::Ready {
            return Err(self.state_error("begin_recording_commands", slot, self.render_slots[slot]));
        }
        self.backend.begin_render_commands(slot)?;
        self.render_slots[slot] = SlotState::Recording;
        Ok(())
    }

    /// Leave the recording state on the current slot's command buffer
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if the slot is not recording.
    pub fn end_recording_commands(&mut self) -> Result<()> {
        let slot = self.current_frame;
        if self.render_slots[slot] != SlotState::Recording {
            return Err(self.state_error("end_recording_commands", slot, self.render_slots[slot]));
        }
        self.backend.end_render_commands(slot)?;
        self.render_slots[slot] = SlotState::Recorded;
        Ok(())
    }

    /// Submit the recorded commands and present `image_index`
    ///
    /// Submits the current slot's command buffer (waiting on image-available,
    /// signaling render-finished and the in-flight fence), then queues the
    /// present gated on render-finished. A stale or suboptimal present result
    /// triggers surface recreation and is not an error. The graphics slot
    /// counter advances only after all of the above, making this the single
    /// point of slot rotation.
    ///
    /// # Arguments
    ///
    /// * `image_index` - The swapchain image returned by
    ///   [`acquire_next_image`](Self::acquire_next_image)
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if no window size was ever pushed or the slot
    /// was not fully recorded; backend submit/present failures are fatal.
    pub fn submit(&mut self, image_index: u32) -> Result<()> {
        let slot = self.current_frame;
        if self.window_size.is_none() {
            return Err(Error::PreconditionViolated(
                "submit called before any push_window_size".to_string(),
            ));
        }
        if self.render_slots[slot] != SlotState::Recorded {
            return Err(self.state_error("submit", slot, self.render_slots[slot]));
        }

        self.backend.submit_render(slot)?;
        self.render_slots[slot] = SlotState::Submitted;

        match self.backend.present(slot, image_index)? {
            PresentOutcome::Presented => {}
            PresentOutcome::Stale => {
                pulsar_warn!(LOG_SOURCE, "Surface stale on present, recreating");
                self.recreate_surface()?;
            }
        }

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
        pulsar_trace!(
            LOG_SOURCE,
            "Submitted slot {}, rotated to slot {}",
            slot,
            self.current_frame
        );
        Ok(())
    }

    // ===== COMPUTE TIMELINE =====

    /// Block until the current compute slot's previous submission completed
    ///
    /// Only the compute fence is waited on; the graphics timeline is never
    /// touched.
    pub fn wait_compute(&mut self) -> Result<()> {
        let slot = self.current_compute_frame;
        match self.compute_slots[slot] {
            SlotState::Idle | SlotState::Submitted | SlotState::Ready => {}
            state => return Err(self.state_error("wait_compute", slot, state)),
        }
        pulsar_trace!(LOG_SOURCE, "Waiting on compute fence for slot {}", slot);
        self.backend.wait_compute_fence(slot)?;
        self.compute_slots[slot] = SlotState::Ready;
        Ok(())
    }

    /// Reset the current compute slot's fence and command buffer
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` if [`wait_compute`](Self::wait_compute) has not
    /// returned for this slot.
    pub fn reset_compute(&mut self) -> Result<()> {
        let slot = self.current_compute_frame;
        if self.compute_slots[slot] != SlotState::Ready {
            return Err(self.state_error("reset_compute", slot, self.compute_slots[slot]));
        }
        self.backend.reset_compute_fence(slot)?;
        self.backend.reset_compute_commands(slot)?;
        Ok(())
    }

    /// Enter the recording state on the current compute command buffer
    pub fn begin_recording_compute(&mut self) -> Result<()> {
        let slot = self.current_compute_frame;
        if self.compute_slots[slot] != SlotState::Ready {
            return Err(self.state_error("begin_recording_compute", slot, self.compute_slots[slot]));
        }
        self.backend.begin_compute_commands(slot)?;
        self.compute_slots[slot] = SlotState::Recording;
        Ok(())
    }

    /// Leave the recording state on the current compute command buffer
    pub fn end_recording_compute(&mut self) -> Result<()> {
        let slot = self.current_compute_frame;
        if self.compute_slots[slot] != SlotState::Recording {
            return Err(self.state_error("end_recording_compute", slot, self.compute_slots[slot]));
        }
        self.backend.end_compute_commands(slot)?;
        self.compute_slots[slot] = SlotState::Recorded;
        Ok(())
    }

    /// Submit the recorded compute commands
    ///
    /// Signals the compute-finished semaphore and the compute fence. There is
    /// no present step and no window-size requirement on this timeline. The
    /// compute slot counter advances independently of the graphics counter.
    pub fn submit_compute(&mut self) -> Result<()> {
        let slot = self.current_compute_frame;
        if self.compute_slots[slot] != SlotState::Recorded {
            return Err(self.state_error("submit_compute", slot, self.compute_slots[slot]));
        }
        self.backend.submit_compute(slot)?;
        self.compute_slots[slot] = SlotState::Submitted;
        self.current_compute_frame = (self.current_compute_frame + 1) % MAX_FRAMES_IN_FLIGHT;
        pulsar_trace!(
            LOG_SOURCE,
            "Submitted compute slot {}, rotated to slot {}",
            slot,
            self.current_compute_frame
        );
        Ok(())
    }

    // ===== SURFACE RECREATION =====

    fn recreate_surface(&mut self) -> Result<()> {
        let (width, height) = self.window_size.ok_or_else(|| {
            Error::PreconditionViolated(
                "surface recreation required but no window size was pushed".to_string(),
            )
        })?;
        pulsar_debug!(LOG_SOURCE, "Recreating surface at {}x{}", width, height);
        self.backend.recreate_surface(width, height)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
