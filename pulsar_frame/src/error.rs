//! Error types for the Pulsar frame framework
//!
//! This module defines the error taxonomy used throughout the framework:
//! fatal construction failures, backend failures, and caller misuse of the
//! frame-lifecycle protocol.

use std::fmt;

/// Result type for framework operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pulsar frame framework errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Creation of a device/swapchain/synchronization object failed.
    /// Unrecoverable: the owning object cannot be used.
    InitializationFailed(String),

    /// A non-success result from the underlying graphics API during
    /// steady-state operation (acquire, submit, present, wait).
    BackendError(String),

    /// Caller misuse of the frame-lifecycle protocol, e.g. submitting
    /// without a pushed window size or resetting a slot before its fence
    /// wait. These indicate bugs, not transient conditions.
    PreconditionViolated(String),

    /// Invalid resource input (bad SPIR-V file, misaligned shader code)
    InvalidResource(String),

    /// Out of GPU memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::PreconditionViolated(msg) => write!(f, "Precondition violated: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
