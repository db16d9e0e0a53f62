/// CommandBufferSet - pre-allocated primary command buffers per frame slot
///
/// One graphics and one compute primary buffer per in-flight slot, all taken
/// from the device context's pool (created with RESET_COMMAND_BUFFER so the
/// synchronizer can reset buffers individually). The buffers are freed with
/// the pool, so no Drop is needed here.

use ash::vk;
use pulsar_frame::pulsar::frame::MAX_FRAMES_IN_FLIGHT;
use pulsar_frame::pulsar::{Error, Result};

use crate::vulkan_device::DeviceContext;

pub struct CommandBufferSet {
    graphics: Vec<vk::CommandBuffer>,
    compute: Vec<vk::CommandBuffer>,
}

impl CommandBufferSet {
    pub fn new(device_context: &DeviceContext) -> Result<Self> {
        let allocate = |count: u32| -> Result<Vec<vk::CommandBuffer>> {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(device_context.command_pool())
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(count);
            unsafe {
                device_context
                    .device()
                    .allocate_command_buffers(&allocate_info)
                    .map_err(|e| {
                        Error::InitializationFailed(format!(
                            "Failed to allocate command buffers: {:?}",
                            e
                        ))
                    })
            }
        };

        Ok(Self {
            graphics: allocate(MAX_FRAMES_IN_FLIGHT as u32)?,
            compute: allocate(MAX_FRAMES_IN_FLIGHT as u32)?,
        })
    }

    pub fn graphics(&self, slot: usize) -> vk::CommandBuffer {
        self.graphics[slot]
    }

    pub fn compute(&self, slot: usize) -> vk::CommandBuffer {
        self.compute[slot]
    }
}
