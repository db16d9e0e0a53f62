/// Mock frame backend for unit tests (no GPU required)
///
/// Records every operation the synchronizer performs into an ordered log and
/// lets tests script acquire/present outcomes, so the full frame protocol can
/// be exercised without a graphics device. Fences "signal" instantly, which
/// matches a backend whose fences are created pre-signaled and whose GPU is
/// infinitely fast.

#[cfg(test)]
use std::collections::VecDeque;

#[cfg(test)]
use crate::error::Result;
#[cfg(test)]
use crate::frame::backend::{AcquireOutcome, FrameBackend, PresentOutcome};

// ============================================================================
// Mock Frame Backend
// ============================================================================

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFrameBackend {
    /// Ordered log of every backend call, e.g. "wait_render_fence(0)"
    pub ops: Vec<String>,

    /// Scripted acquire outcomes, consumed front to back.
    /// When empty, acquires report `Acquired(next_image_index)`.
    pub acquire_script: VecDeque<AcquireOutcome>,

    /// Scripted present outcomes, consumed front to back.
    /// When empty, presents report `Presented`.
    pub present_script: VecDeque<PresentOutcome>,

    /// Image index returned by unscripted acquires, cycled mod 3 to mimic a
    /// swapchain with more images than frame slots
    pub next_image_index: u32,

    /// Every recreate_surface call, in order, with its extent
    pub recreate_calls: Vec<(u32, u32)>,
}

#[cfg(test)]
impl MockFrameBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next acquire to report an out-of-date surface
    pub fn script_out_of_date(&mut self) {
        self.acquire_script.push_back(AcquireOutcome::OutOfDate);
    }

    /// Script the next present to report a stale surface
    pub fn script_stale_present(&mut self) {
        self.present_script.push_back(PresentOutcome::Stale);
    }

    fn record(&mut self, op: &str, slot: usize) {
        self.ops.push(format!("{}({})", op, slot));
    }
}

#[cfg(test)]
impl FrameBackend for MockFrameBackend {
    fn wait_render_fence(&mut self, slot: usize) -> Result<()> {
        self.record("wait_render_fence", slot);
        Ok(())
    }

    fn reset_render_fence(&mut self, slot: usize) -> Result<()> {
        self.record("reset_render_fence", slot);
        Ok(())
    }

    fn reset_render_commands(&mut self, slot: usize) -> Result<()> {
        self.record("reset_render_commands", slot);
        Ok(())
    }

    fn begin_render_commands(&mut self, slot: usize) -> Result<()> {
        self.record("begin_render_commands", slot);
        Ok(())
    }

    fn end_render_commands(&mut self, slot: usize) -> Result<()> {
        self.record("end_render_commands", slot);
        Ok(())
    }

    fn submit_render(&mut self, slot: usize) -> Result<()> {
        self.record("submit_render", slot);
        Ok(())
    }

    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        self.record("acquire_image", slot);
        if let Some(outcome) = self.acquire_script.pop_front() {
            return Ok(outcome);
        }
        let index = self.next_image_index;
        self.next_image_index = (self.next_image_index + 1) % 3;
        Ok(AcquireOutcome::Acquired(index))
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        self.ops.push(format!("present({}, {})", slot, image_index));
        if let Some(outcome) = self.present_script.pop_front() {
            return Ok(outcome);
        }
        Ok(PresentOutcome::Presented)
    }

    fn recreate_surface(&mut self, width: u32, height: u32) -> Result<()> {
        self.ops
            .push(format!("recreate_surface({}, {})", width, height));
        self.recreate_calls.push((width, height));
        Ok(())
    }

    fn wait_compute_fence(&mut self, slot: usize) -> Result<()> {
        self.record("wait_compute_fence", slot);
        Ok(())
    }

    fn reset_compute_fence(&mut self, slot: usize) -> Result<()> {
        self.record("reset_compute_fence", slot);
        Ok(())
    }

    fn reset_compute_commands(&mut self, slot: usize) -> Result<()> {
        self.record("reset_compute_commands", slot);
        Ok(())
    }

    fn begin_compute_commands(&mut self, slot: usize) -> Result<()> {
        self.record("begin_compute_commands", slot);
        Ok(())
    }

    fn end_compute_commands(&mut self, slot: usize) -> Result<()> {
        self.record("end_compute_commands", slot);
        Ok(())
    }

    fn submit_compute(&mut self, slot: usize) -> Result<()> {
        self.record("submit_compute", slot);
        Ok(())
    }
}
