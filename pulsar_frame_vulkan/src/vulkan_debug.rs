/// Vulkan debug messenger - validation layer output with colored formatting
///
/// Only compiled with the `vulkan-validation` feature. The callback receives
/// its configuration through the messenger's user-data pointer instead of a
/// process-wide static, so several instances can carry independent settings.

use ash::vk;
use colored::*;
use pulsar_frame::pulsar::{Error, Result};
use std::ffi::CStr;

/// Per-messenger callback context, reached via the user-data pointer.
/// Boxed and owned by [`DebugMessenger`] so the pointer stays valid for the
/// messenger's whole lifetime.
struct DebugContext {
    /// Suppress INFO/VERBOSE output, keeping warnings and errors
    errors_and_warnings_only: bool,
}

/// Owns the debug-utils messenger and its callback context
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    _context: Box<DebugContext>,
}

impl DebugMessenger {
    pub fn new(entry: &ash::Entry, instance: &ash::Instance) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);

        let context = Box::new(DebugContext {
            errors_and_warnings_only: true,
        });

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback))
            .user_data(&*context as *const DebugContext as *mut std::os::raw::c_void);

        let messenger = unsafe {
            loader
                .create_debug_utils_messenger(&create_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create debug messenger: {:?}",
                        e
                    ))
                })?
        };

        Ok(Self {
            loader,
            messenger,
            _context: context,
        })
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

/// Validation layer callback
///
/// `user_data` points at the owning messenger's [`DebugContext`].
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || user_data.is_null() {
        return vk::FALSE;
    }
    let context = &*(user_data as *const DebugContext);

    if context.errors_and_warnings_only
        && !message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
        && !message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING)
    {
        return vk::FALSE;
    }

    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let severity_colored = if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
    {
        "ERROR".red().bold()
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        "WARNING".yellow().bold()
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        "INFO".cyan()
    } else {
        "VERBOSE".bright_black()
    };

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    eprintln!(
        "{} {} [{}] {}: {}",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", severity_colored).bright_blue().bold(),
        type_str.bright_black(),
        message_id_name.white(),
        message.white()
    );

    vk::FALSE
}
