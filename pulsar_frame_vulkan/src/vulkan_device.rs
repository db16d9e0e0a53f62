/// DeviceContext - physical/logical device, queues, command pool, one-shot helpers
///
/// Picks a physical device exposing graphics + compute and present support,
/// creates the logical device and queue handles, a command pool for the
/// per-frame command buffers, and the gpu-allocator instance used for depth,
/// vertex, uniform and staging memory. One-shot command submission
/// (`begin_single_time_commands` / `end_single_time_commands`) blocks until
/// completion and is used by resource uploads, never by the per-frame
/// protocol.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::{pulsar_err, pulsar_info};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::vulkan_instance::VulkanInstance;

const LOG_SOURCE: &str = "pulsar::vulkan::DeviceContext";

pub struct DeviceContext {
    // Handle clone, owned and destroyed by VulkanInstance
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: Arc<ash::Device>,

    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    compute_queue: vk::Queue,
    graphics_family: u32,
    present_family: u32,

    command_pool: vk::CommandPool,

    // ManuallyDrop to control destruction order (before the device)
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,
}

impl DeviceContext {
    /// Pick a device and create the logical device stack
    ///
    /// Requires a queue family with both GRAPHICS and COMPUTE bits (the
    /// compute queue is taken from the same family), a present-capable
    /// family for the instance's surface, and the swapchain extension.
    pub fn new(vulkan_instance: &VulkanInstance) -> Result<Self> {
        let instance = vulkan_instance.instance().clone();
        let surface = vulkan_instance.surface();
        let surface_loader = vulkan_instance.surface_loader();

        unsafe {
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            let mut picked = None;
            for physical_device in physical_devices {
                let queue_families =
                    instance.get_physical_device_queue_family_properties(physical_device);

                let graphics_family = queue_families.iter().enumerate().find(|(_, qf)| {
                    qf.queue_flags
                        .contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                });
                let Some((graphics_family, _)) = graphics_family else {
                    continue;
                };

                let present_family = (0..queue_families.len() as u32).find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                });
                let Some(present_family) = present_family else {
                    continue;
                };

                picked = Some((physical_device, graphics_family as u32, present_family));
                break;
            }

            let (physical_device, graphics_family, present_family) = picked.ok_or_else(|| {
                Error::InitializationFailed(
                    "No GPU with graphics+compute and present support found".to_string(),
                )
            })?;

            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];
            if present_family != graphics_family {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = Arc::new(
                instance
                    .create_device(physical_device, &device_create_info, None)
                    .map_err(|e| {
                        Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                    })?,
            );

            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);
            // Same family as graphics; a dedicated compute family would need
            // queue-ownership transfers the frame protocol does not model
            let compute_queue = device.get_device_queue(graphics_family, 0);

            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
                })?;

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: (*device).clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown".to_string());
            pulsar_info!(LOG_SOURCE, "Using device '{}'", device_name);

            Ok(Self {
                instance,
                physical_device,
                device,
                graphics_queue,
                present_queue,
                compute_queue,
                graphics_family,
                present_family,
                command_pool,
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
            })
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn device_arc(&self) -> Arc<ash::Device> {
        self.device.clone()
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    pub fn compute_queue(&self) -> vk::Queue {
        self.compute_queue
    }

    pub fn graphics_family(&self) -> u32 {
        self.graphics_family
    }

    pub fn present_family(&self) -> u32 {
        self.present_family
    }

    pub fn command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    pub fn allocator(&self) -> Arc<Mutex<Allocator>> {
        (*self.allocator).clone()
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| pulsar_err!(LOG_SOURCE, "device_wait_idle failed: {:?}", e))
        }
    }

    // ===== ONE-SHOT COMMANDS =====

    /// Allocate and begin a one-time-submit command buffer
    pub fn begin_single_time_commands(&self) -> Result<vk::CommandBuffer> {
        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    pulsar_err!(LOG_SOURCE, "Failed to allocate one-shot buffer: {:?}", e)
                })?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to begin one-shot buffer: {:?}", e))?;

            Ok(command_buffer)
        }
    }

    /// End, submit and wait for a one-shot command buffer, then free it
    pub fn end_single_time_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to end one-shot buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            self.device
                .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| pulsar_err!(LOG_SOURCE, "One-shot submit failed: {:?}", e))?;
            self.device
                .queue_wait_idle(self.graphics_queue)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "One-shot wait failed: {:?}", e))?;

            self.device
                .free_command_buffers(self.command_pool, &command_buffers);
            Ok(())
        }
    }

    /// Copy `size` bytes between buffers through a one-shot command buffer
    pub fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) -> Result<()> {
        let command_buffer = self.begin_single_time_commands()?;
        unsafe {
            let region = vk::BufferCopy::default().size(size);
            self.device
                .cmd_copy_buffer(command_buffer, src, dst, std::slice::from_ref(&region));
        }
        self.end_single_time_commands(command_buffer)
    }

    // ===== FORMAT / MEMORY QUERIES =====

    /// Find a memory type index matching `type_filter` and `properties`
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Result<u32> {
        let memory_properties = unsafe {
            self.instance
                .get_physical_device_memory_properties(self.physical_device)
        };
        for i in 0..memory_properties.memory_type_count {
            if type_filter & (1 << i) != 0
                && memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
            {
                return Ok(i);
            }
        }
        Err(Error::InitializationFailed(
            "No suitable memory type found".to_string(),
        ))
    }

    /// First depth format supported with optimal tiling
    pub fn find_depth_format(&self) -> Result<vk::Format> {
        self.find_supported_format(
            &[
                vk::Format::D32_SFLOAT,
                vk::Format::D32_SFLOAT_S8_UINT,
                vk::Format::D24_UNORM_S8_UINT,
            ],
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )
    }

    fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> Result<vk::Format> {
        for &format in candidates {
            let properties = unsafe {
                self.instance
                    .get_physical_device_format_properties(self.physical_device, format)
            };
            let supported = match tiling {
                vk::ImageTiling::LINEAR => properties.linear_tiling_features.contains(features),
                _ => properties.optimal_tiling_features.contains(features),
            };
            if supported {
                return Ok(format);
            }
        }
        Err(Error::InitializationFailed(
            "No supported format among candidates".to_string(),
        ))
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
            // Allocator must be dropped before the device it allocates from
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
        }
    }
}
