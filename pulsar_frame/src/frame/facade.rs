//! Dispatch/draw façade - the fixed call order as free functions
//!
//! Thin sequencing layer over [`FrameSync`]. These functions hold no state;
//! they exist to encode the correct protocol order so callers cannot
//! interleave the primitive steps incorrectly. They are deliberately kept
//! out of the synchronizer so the primitives stay independently testable.
//!
//! A render tick is:
//!
//! ```no_run
//! # use pulsar_frame::pulsar::frame::{self, FrameSync, FrameBackend, INVALID_IMAGE_INDEX};
//! # fn tick<B: FrameBackend>(sync: &mut FrameSync<B>) -> pulsar_frame::pulsar::Result<()> {
//! sync.push_window_size(800, 600);
//! let image_index = frame::prepare_frame(sync)?;
//! if image_index != INVALID_IMAGE_INDEX {
//!     frame::begin(sync)?;
//!     // record draw calls
//!     frame::end(sync, image_index)?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::frame::backend::FrameBackend;
use crate::frame::sync::FrameSync;

/// Wait for the current slot's fence and acquire the next presentable image
///
/// # Returns
///
/// The swapchain image index to render into, or [`INVALID_IMAGE_INDEX`]
/// (skip this tick) if the surface had to be recreated.
///
/// [`INVALID_IMAGE_INDEX`]: crate::frame::backend::INVALID_IMAGE_INDEX
pub fn prepare_frame<B: FrameBackend>(sync: &mut FrameSync<B>) -> Result<u32> {
    sync.wait_for_fences()?;
    sync.acquire_next_image()
}

/// Reset the current slot and open its command buffer for recording
pub fn begin<B: FrameBackend>(sync: &mut FrameSync<B>) -> Result<()> {
    sync.reset_all()?;
    sync.begin_recording_commands()
}

/// Close the command buffer, submit it and present `image_index`
pub fn end<B: FrameBackend>(sync: &mut FrameSync<B>, image_index: u32) -> Result<()> {
    sync.end_recording_commands()?;
    sync.submit(image_index)
}

/// Wait for the current compute slot's fence
pub fn prepare_compute<B: FrameBackend>(sync: &mut FrameSync<B>) -> Result<()> {
    sync.wait_compute()
}

/// Reset the current compute slot and open its command buffer for recording
pub fn begin_compute<B: FrameBackend>(sync: &mut FrameSync<B>) -> Result<()> {
    sync.reset_compute()?;
    sync.begin_recording_compute()
}

/// Close the compute command buffer and submit it (no present step)
pub fn end_compute<B: FrameBackend>(sync: &mut FrameSync<B>) -> Result<()> {
    sync.end_recording_compute()?;
    sync.submit_compute()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
