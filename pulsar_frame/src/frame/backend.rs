//! FrameBackend trait - the graphics-device boundary of the synchronizer
//!
//! The frame synchronizer drives a fixed protocol over whatever graphics API
//! sits underneath. This trait captures exactly the per-slot operations that
//! protocol needs: fence waits, fence/command-buffer resets, recording
//! scopes, submissions, swapchain acquire/present, and surface recreation.
//! Backend implementations provide concrete types (Vulkan in
//! `pulsar_frame_vulkan`, a scripted mock for unit tests).

use crate::error::Result;

/// Number of frames that can be in flight concurrently (double buffering)
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Sentinel returned by acquire when the surface was stale and has been
/// recreated. The caller must skip recording for this tick.
pub const INVALID_IMAGE_INDEX: u32 = u32::MAX;

/// Outcome of a swapchain image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is available for rendering. A suboptimal-but-usable surface
    /// also reports this outcome; only present decides to rebuild then.
    Acquired(u32),

    /// The surface no longer matches the window and must be recreated
    /// before any image can be acquired.
    OutOfDate,
}

/// Outcome of a present request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for presentation.
    Presented,

    /// The image was queued (or dropped), but the surface is stale or
    /// suboptimal and should be recreated before the next frame.
    Stale,
}

/// Per-slot operations the synchronizer sequences
///
/// Implementations own the actual synchronization primitives: for every slot
/// an image-available semaphore, a render-finished semaphore and an in-flight
/// fence for the graphics timeline, plus a compute-finished semaphore and a
/// compute in-flight fence for the compute timeline. All primitives are
/// created once at construction and live until teardown; surface recreation
/// must not touch them.
///
/// The synchronizer guarantees it never asks for a reset or a re-record of a
/// slot whose previous submission has not been observed complete, so
/// implementations do not need to re-check that invariant.
pub trait FrameBackend {
    // ===== GRAPHICS TIMELINE =====

    /// Block until the slot's graphics in-flight fence is signaled.
    /// Waits indefinitely; a wedged driver wedges the caller.
    fn wait_render_fence(&mut self, slot: usize) -> Result<()>;

    /// Reset the slot's graphics in-flight fence to unsignaled.
    fn reset_render_fence(&mut self, slot: usize) -> Result<()>;

    /// Clear the slot's graphics command buffer for re-recording.
    fn reset_render_commands(&mut self, slot: usize) -> Result<()>;

    /// Put the slot's graphics command buffer into the recording state.
    fn begin_render_commands(&mut self, slot: usize) -> Result<()>;

    /// Finish recording the slot's graphics command buffer.
    fn end_render_commands(&mut self, slot: usize) -> Result<()>;

    /// Submit the slot's graphics command buffer to the graphics queue,
    /// waiting on the slot's image-available semaphore at the
    /// color-attachment-output stage and signaling the slot's
    /// render-finished semaphore and in-flight fence.
    fn submit_render(&mut self, slot: usize) -> Result<()>;

    // ===== PRESENTATION =====

    /// Request the next presentable image, signaling the slot's
    /// image-available semaphore once it is ready.
    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome>;

    /// Queue `image_index` for presentation, gated on the slot's
    /// render-finished semaphore.
    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome>;

    /// Rebuild the presentation surface at the given size. Implementations
    /// must wait for the device to go idle before destroying anything and
    /// must be immediately usable afterwards.
    fn recreate_surface(&mut self, width: u32, height: u32) -> Result<()>;

    // ===== COMPUTE TIMELINE =====

    /// Block until the slot's compute in-flight fence is signaled.
    fn wait_compute_fence(&mut self, slot: usize) -> Result<()>;

    /// Reset the slot's compute in-flight fence to unsignaled.
    fn reset_compute_fence(&mut self, slot: usize) -> Result<()>;

    /// Clear the slot's compute command buffer for re-recording.
    fn reset_compute_commands(&mut self, slot: usize) -> Result<()>;

    /// Put the slot's compute command buffer into the recording state.
    fn begin_compute_commands(&mut self, slot: usize) -> Result<()>;

    /// Finish recording the slot's compute command buffer.
    fn end_compute_commands(&mut self, slot: usize) -> Result<()>;

    /// Submit the slot's compute command buffer to a compute-capable queue,
    /// signaling the slot's compute-finished semaphore and compute fence.
    /// There is no present step on this timeline.
    fn submit_compute(&mut self, slot: usize) -> Result<()>;
}
