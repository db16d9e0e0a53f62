/// VulkanInstance - entry load, instance creation and the window surface
///
/// Owns the bottom of the Vulkan object stack: the loaded entry points, the
/// VkInstance (with the Khronos validation layer when the crate is built
/// with the `vulkan-validation` feature and validation is enabled in the
/// config) and the VkSurfaceKHR created from the caller's window. Everything
/// above (device, swapchain, sync objects) borrows handles from here and
/// must be dropped before this object.

use ash::vk;
use pulsar_frame::pulsar::{Error, FrameworkConfig, Result};
use pulsar_frame::pulsar_info;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use winit::window::Window;

#[cfg(feature = "vulkan-validation")]
use crate::vulkan_debug::DebugMessenger;

const LOG_SOURCE: &str = "pulsar::vulkan::Instance";

pub struct VulkanInstance {
    entry: ash::Entry,
    instance: ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<DebugMessenger>,
}

impl VulkanInstance {
    /// Create the instance and a surface for `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window the surface is created for
    /// * `config` - Application name/version and the validation switch
    ///
    /// # Errors
    ///
    /// Any creation failure is an `InitializationFailed`; the process cannot
    /// continue without an instance.
    pub fn new(window: &Window, config: &FrameworkConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                Error::InitializationFailed(format!("Failed to load Vulkan: {}", e))
            })?;

            let app_name = CString::new(config.app_name.as_str()).map_err(|e| {
                Error::InitializationFailed(format!("Invalid app name: {}", e))
            })?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(
                    0,
                    config.app_version.0,
                    config.app_version.1,
                    config.app_version.2,
                ))
                .engine_name(c"PulsarFrame")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle().map_err(|e| {
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            #[allow(unused_mut)]
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {:?}",
                            e
                        ))
                    })?
                    .to_vec();

            let validation = Self::validation_requested(config);

            #[cfg(feature = "vulkan-validation")]
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                Some(DebugMessenger::new(&entry, &instance)?)
            } else {
                None
            };

            let window_handle = window.window_handle().map_err(|e| {
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            pulsar_info!(
                LOG_SOURCE,
                "Instance created for '{}' (validation: {})",
                config.app_name,
                validation
            );

            Ok(Self {
                entry,
                instance,
                surface,
                surface_loader,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn validation_requested(config: &FrameworkConfig) -> bool {
        config.enable_validation
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn validation_requested(_config: &FrameworkConfig) -> bool {
        false
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(feature = "vulkan-validation")]
            {
                // Messenger must go before the instance
                self.debug_messenger = None;
            }
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}
