/*!
# Pulsar Frame

Core types for the Pulsar frame framework, a convenience layer over low-level
graphics APIs centered on a double-buffered frame lifecycle.

This crate is GPU-independent: it defines the frame protocol (slot rotation,
fence/semaphore sequencing, swapchain staleness recovery, an independent
compute timeline) against the `FrameBackend` trait. Backend implementations
(Vulkan in `pulsar_frame_vulkan`) provide the concrete device objects.

## Architecture

- **FrameBackend**: per-slot device operations at the backend boundary
- **FrameSync**: the slot state machine and sole arbiter of rotation
- **frame::prepare_frame / begin / end** (+ compute variants): the façade
  fixing the protocol call order
- **Framework**: logger registry singleton
*/

// Internal modules
mod config;
mod error;
mod framework;
pub mod frame;
pub mod log;

// Main pulsar namespace module
pub mod pulsar {
    // Error types
    pub use crate::error::{Error, Result};

    // Framework singleton
    pub use crate::framework::Framework;

    // Configuration
    pub use crate::config::FrameworkConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
        // Note: pulsar_* macros are NOT re-exported here, macro_export puts
        // them at the crate root
    }

    // Frame protocol sub-module
    pub mod frame {
        pub use crate::frame::*;
    }
}
