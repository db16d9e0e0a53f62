//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone,
//! std::error::Error).

use crate::error::Error;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Failed to create fence".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Failed to create fence"));
}

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("Failed to acquire swapchain image".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("Failed to acquire swapchain image"));
}

#[test]
fn test_precondition_violated_display() {
    let err = Error::PreconditionViolated("window size not pushed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Precondition violated"));
    assert!(display.contains("window size not pushed"));
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("SPIR-V not aligned".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("SPIR-V not aligned"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let err1 = Error::BackendError("test".to_string());
    assert!(format!("{:?}", err1).contains("BackendError"));

    let err2 = Error::PreconditionViolated("test".to_string());
    assert!(format!("{:?}", err2).contains("PreconditionViolated"));

    let err3 = Error::InitializationFailed("test".to_string());
    assert!(format!("{:?}", err3).contains("InitializationFailed"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::PreconditionViolated("missing push_window_size".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));

    let err3 = Error::OutOfMemory;
    let err4 = err3.clone();
    assert_eq!(format!("{}", err3), format!("{}", err4));
}
