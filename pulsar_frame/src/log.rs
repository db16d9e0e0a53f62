//! Internal logging system for the Pulsar frame framework
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to create custom loggers (file logging, network logging, etc.)
///
/// # Example
///
/// ```no_run
/// use pulsar_frame::pulsar::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The log entry to process
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "pulsar::FrameSync", "pulsar::vulkan::Swapchain")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information (typically disabled in release)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        // Format timestamp as YYYY-MM-DD HH:MM:SS.mmm
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        // Color severity string
        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        // Color source
        let source = entry.source.bright_blue();

        // Print with or without file:line
        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar_trace;
/// pulsar_trace!("pulsar::FrameSync", "Entering wait_for_fences()");
/// ```
#[macro_export]
macro_rules! pulsar_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Framework::log(
            $crate::pulsar::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar_debug;
/// # let slot = 0;
/// pulsar_debug!("pulsar::FrameSync", "Slot {} entered recording state", slot);
/// ```
#[macro_export]
macro_rules! pulsar_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Framework::log(
            $crate::pulsar::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar_info;
/// # let (width, height) = (800, 600);
/// pulsar_info!("pulsar::vulkan", "Swapchain recreated at {}x{}", width, height);
/// ```
#[macro_export]
macro_rules! pulsar_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Framework::log(
            $crate::pulsar::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar_warn;
/// pulsar_warn!("pulsar::vulkan", "Suboptimal swapchain, scheduling recreate");
/// ```
#[macro_export]
macro_rules! pulsar_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Framework::log(
            $crate::pulsar::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::pulsar_error;
/// # let result = "VK_ERROR_DEVICE_LOST";
/// pulsar_error!("pulsar::vulkan", "Failed to create fence: {:?}", result);
/// ```
#[macro_export]
macro_rules! pulsar_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::pulsar::Framework::log_detailed(
            $crate::pulsar::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and construct a [`BackendError`](crate::pulsar::Error::BackendError)
/// carrying the same message.
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::{pulsar_err, pulsar::Result};
/// # fn present() -> Result<()> {
/// # let e = "VK_ERROR_SURFACE_LOST_KHR";
/// return Err(pulsar_err!("pulsar::vulkan", "Failed to present: {:?}", e));
/// # }
/// ```
#[macro_export]
macro_rules! pulsar_err {
    ($source:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $crate::pulsar::Framework::log_detailed(
            $crate::pulsar::log::LogSeverity::Error,
            $source,
            __msg.clone(),
            file!(),
            line!()
        );
        $crate::pulsar::Error::BackendError(__msg)
    }};
}

/// Log an ERROR message and return early with a `BackendError`.
///
/// # Example
///
/// ```no_run
/// # use pulsar_frame::{pulsar_bail, pulsar::Result};
/// # fn check(image_index: u32) -> Result<()> {
/// pulsar_bail!("pulsar::vulkan", "image_index {} out of range", image_index);
/// # }
/// ```
#[macro_export]
macro_rules! pulsar_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::pulsar_err!($source, $($arg)*))
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
