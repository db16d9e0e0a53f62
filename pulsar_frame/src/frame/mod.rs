//! Frame lifecycle protocol
//!
//! Double-buffered slot rotation over an abstract graphics backend: the
//! [`FrameBackend`] trait at the device boundary, the [`FrameSync`] state
//! machine that sequences it, and the free-function façade fixing the
//! prepare/begin/end call order for the render and compute timelines.

mod backend;
mod facade;
mod sync;

#[cfg(test)]
pub(crate) mod mock_backend;

pub use backend::{
    AcquireOutcome, FrameBackend, PresentOutcome, INVALID_IMAGE_INDEX, MAX_FRAMES_IN_FLIGHT,
};
pub use facade::{begin, begin_compute, end, end_compute, prepare_compute, prepare_frame};
pub use sync::FrameSync;
