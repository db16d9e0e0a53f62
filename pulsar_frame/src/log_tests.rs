//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger, and the global
//! logger registry on the Framework singleton.

use crate::framework::Framework;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use serial_test::serial;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_equality() {
    assert_eq!(LogSeverity::Info, LogSeverity::Info);
    assert_ne!(LogSeverity::Trace, LogSeverity::Debug);
    assert_ne!(LogSeverity::Warn, LogSeverity::Error);
}

#[test]
fn test_log_severity_copy() {
    let sev1 = LogSeverity::Info;
    let sev2 = sev1; // Copy, not move
    assert_eq!(sev1, sev2);
    assert_eq!(sev1, LogSeverity::Info);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_creation_without_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "pulsar::FrameSync".to_string(),
        message: "Synchronizer created".to_string(),
        file: None,
        line: None,
    };

    assert_eq!(entry.severity, LogSeverity::Info);
    assert_eq!(entry.source, "pulsar::FrameSync");
    assert_eq!(entry.message, "Synchronizer created");
    assert!(entry.file.is_none());
    assert!(entry.line.is_none());
}

#[test]
fn test_log_entry_creation_with_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "pulsar::vulkan".to_string(),
        message: "Failed to create fence".to_string(),
        file: Some("vulkan_backend.rs"),
        line: Some(42),
    };

    assert_eq!(entry.file, Some("vulkan_backend.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "pulsar::vulkan".to_string(),
        message: "Suboptimal swapchain".to_string(),
        file: None,
        line: None,
    };

    let cloned = entry.clone();
    assert_eq!(cloned.severity, entry.severity);
    assert_eq!(cloned.source, entry.source);
    assert_eq!(cloned.message, entry.message);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "pulsar::test".to_string(),
        message: "message without location".to_string(),
        file: None,
        line: None,
    });
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "pulsar::test".to_string(),
        message: "message with location".to_string(),
        file: Some("log_tests.rs"),
        line: Some(1),
    });
}

// ============================================================================
// GLOBAL LOGGER / MACRO TESTS
// ============================================================================

/// Logger that captures entries into a shared vector for assertions
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
#[serial]
fn test_set_logger_captures_macro_output() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Framework::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    crate::pulsar_info!("pulsar::test", "hello {}", 42);
    crate::pulsar_warn!("pulsar::test", "watch out");

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "hello 42");
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[1].source, "pulsar::test");

    drop(captured);
    Framework::reset_logger();
}

#[test]
#[serial]
fn test_error_macro_records_file_and_line() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Framework::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    crate::pulsar_error!("pulsar::test", "boom: {}", "detail");

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());

    drop(captured);
    Framework::reset_logger();
}

#[test]
#[serial]
fn test_err_macro_constructs_backend_error() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Framework::set_logger(CaptureLogger {
        entries: entries.clone(),
    });

    let err = crate::pulsar_err!("pulsar::test", "failed to {}", "present");
    match err {
        crate::error::Error::BackendError(msg) => assert_eq!(msg, "failed to present"),
        other => panic!("expected BackendError, got {:?}", other),
    }

    // The same message must also have been logged
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "failed to present");

    drop(captured);
    Framework::reset_logger();
}
