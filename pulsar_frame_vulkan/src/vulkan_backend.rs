/// VulkanFrameBackend - per-slot sync objects and the FrameBackend implementation
///
/// Owns the semaphores and fences for both timelines (created once, never
/// recreated), the per-slot command buffers and the swapchain, and maps the
/// core frame protocol onto the Vulkan calls: fence waits, command buffer
/// recording scopes, queue submission with the image-available wait at the
/// color-attachment-output stage, presentation, and staleness detection.
///
/// All fences are created signaled so the synchronizer's first wait per slot
/// returns immediately.

use ash::vk;
use pulsar_frame::pulsar::frame::{
    AcquireOutcome, FrameBackend, PresentOutcome, MAX_FRAMES_IN_FLIGHT,
};
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::{pulsar_err, pulsar_info};
use std::sync::Arc;

use crate::vulkan_command_buffers::CommandBufferSet;
use crate::vulkan_device::DeviceContext;
use crate::vulkan_swapchain::VulkanSwapchain;

const LOG_SOURCE: &str = "pulsar::vulkan::FrameBackend";

pub struct VulkanFrameBackend {
    device: Arc<ash::Device>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    compute_queue: vk::Queue,

    swapchain: VulkanSwapchain,
    commands: CommandBufferSet,

    // Graphics timeline, one per slot
    image_available_semaphores: Vec<vk::Semaphore>,
    render_finished_semaphores: Vec<vk::Semaphore>,
    in_flight_fences: Vec<vk::Fence>,

    // Compute timeline, one per slot
    compute_finished_semaphores: Vec<vk::Semaphore>,
    compute_in_flight_fences: Vec<vk::Fence>,
}

impl VulkanFrameBackend {
    /// Create the sync objects and take ownership of the swapchain
    ///
    /// # Errors
    ///
    /// Any semaphore/fence/command-buffer creation failure is an
    /// `InitializationFailed`; a partially constructed backend is unusable.
    pub fn new(device_context: &DeviceContext, swapchain: VulkanSwapchain) -> Result<Self> {
        let device = device_context.device_arc();
        let commands = CommandBufferSet::new(device_context)?;

        let semaphore_create_info = vk::SemaphoreCreateInfo::default();
        let fence_create_info =
            vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

        let mut image_available_semaphores = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut render_finished_semaphores = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut in_flight_fences = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut compute_finished_semaphores = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut compute_in_flight_fences = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        unsafe {
            for _ in 0..MAX_FRAMES_IN_FLIGHT {
                image_available_semaphores.push(
                    device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(Self::init_err("semaphore"))?,
                );
                render_finished_semaphores.push(
                    device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(Self::init_err("semaphore"))?,
                );
                in_flight_fences.push(
                    device
                        .create_fence(&fence_create_info, None)
                        .map_err(Self::init_err("fence"))?,
                );
                compute_finished_semaphores.push(
                    device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(Self::init_err("semaphore"))?,
                );
                compute_in_flight_fences.push(
                    device
                        .create_fence(&fence_create_info, None)
                        .map_err(Self::init_err("fence"))?,
                );
            }
        }

        pulsar_info!(LOG_SOURCE, "Sync objects created for {} slots", MAX_FRAMES_IN_FLIGHT);

        Ok(Self {
            device,
            graphics_queue: device_context.graphics_queue(),
            present_queue: device_context.present_queue(),
            compute_queue: device_context.compute_queue(),
            swapchain,
            commands,
            image_available_semaphores,
            render_finished_semaphores,
            in_flight_fences,
            compute_finished_semaphores,
            compute_in_flight_fences,
        })
    }

    fn init_err(what: &'static str) -> impl Fn(vk::Result) -> Error {
        move |e| Error::InitializationFailed(format!("Failed to create {}: {:?}", what, e))
    }

    /// The swapchain, for render pass / framebuffer / extent access
    pub fn swapchain(&self) -> &VulkanSwapchain {
        &self.swapchain
    }

    /// Graphics command buffer for a slot (record into this between the
    /// synchronizer's begin/end calls)
    pub fn command_buffer(&self, slot: usize) -> vk::CommandBuffer {
        self.commands.graphics(slot)
    }

    /// Compute command buffer for a slot
    pub fn compute_command_buffer(&self, slot: usize) -> vk::CommandBuffer {
        self.commands.compute(slot)
    }

    /// Compute-finished semaphore for a slot, for callers that insert their
    /// own cross-queue waits
    pub fn compute_finished_semaphore(&self, slot: usize) -> vk::Semaphore {
        self.compute_finished_semaphores[slot]
    }
}

impl FrameBackend for VulkanFrameBackend {
    fn wait_render_fence(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.in_flight_fences[slot]], true, u64::MAX)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "wait_for_fences failed: {:?}", e))
        }
    }

    fn reset_render_fence(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .reset_fences(&[self.in_flight_fences[slot]])
                .map_err(|e| pulsar_err!(LOG_SOURCE, "reset_fences failed: {:?}", e))
        }
    }

    fn reset_render_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .reset_command_buffer(
                    self.commands.graphics(slot),
                    vk::CommandBufferResetFlags::empty(),
                )
                .map_err(|e| pulsar_err!(LOG_SOURCE, "reset_command_buffer failed: {:?}", e))
        }
    }

    fn begin_render_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default();
            self.device
                .begin_command_buffer(self.commands.graphics(slot), &begin_info)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "begin_command_buffer failed: {:?}", e))
        }
    }

    fn end_render_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .end_command_buffer(self.commands.graphics(slot))
                .map_err(|e| pulsar_err!(LOG_SOURCE, "end_command_buffer failed: {:?}", e))
        }
    }

    fn submit_render(&mut self, slot: usize) -> Result<()> {
        unsafe {
            let wait_semaphores = [self.image_available_semaphores[slot]];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [self.commands.graphics(slot)];
            let signal_semaphores = [self.render_finished_semaphores[slot]];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(
                    self.graphics_queue,
                    &[submit_info],
                    self.in_flight_fences[slot],
                )
                .map_err(|e| pulsar_err!(LOG_SOURCE, "queue_submit failed: {:?}", e))
        }
    }

    fn acquire_image(&mut self, slot: usize) -> Result<AcquireOutcome> {
        unsafe {
            let result = self.swapchain.swapchain_loader().acquire_next_image(
                self.swapchain.swapchain(),
                u64::MAX,
                self.image_available_semaphores[slot],
                vk::Fence::null(),
            );
            match result {
                // Suboptimal still delivered a usable image
                Ok((image_index, _suboptimal)) => Ok(AcquireOutcome::Acquired(image_index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
                Err(e) => Err(pulsar_err!(LOG_SOURCE, "acquire_next_image failed: {:?}", e)),
            }
        }
    }

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome> {
        unsafe {
            let wait_semaphores = [self.render_finished_semaphores[slot]];
            let swapchains = [self.swapchain.swapchain()];
            let image_indices = [image_index];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            let result = self
                .swapchain
                .swapchain_loader()
                .queue_present(self.present_queue, &present_info);
            match result {
                Ok(false) => Ok(PresentOutcome::Presented),
                Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
                Err(e) => Err(pulsar_err!(LOG_SOURCE, "queue_present failed: {:?}", e)),
            }
        }
    }

    fn recreate_surface(&mut self, width: u32, height: u32) -> Result<()> {
        self.swapchain.recreate(width, height)
    }

    fn wait_compute_fence(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.compute_in_flight_fences[slot]], true, u64::MAX)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute fence wait failed: {:?}", e))
        }
    }

    fn reset_compute_fence(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .reset_fences(&[self.compute_in_flight_fences[slot]])
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute fence reset failed: {:?}", e))
        }
    }

    fn reset_compute_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .reset_command_buffer(
                    self.commands.compute(slot),
                    vk::CommandBufferResetFlags::empty(),
                )
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute buffer reset failed: {:?}", e))
        }
    }

    fn begin_compute_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default();
            self.device
                .begin_command_buffer(self.commands.compute(slot), &begin_info)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute buffer begin failed: {:?}", e))
        }
    }

    fn end_compute_commands(&mut self, slot: usize) -> Result<()> {
        unsafe {
            self.device
                .end_command_buffer(self.commands.compute(slot))
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute buffer end failed: {:?}", e))
        }
    }

    fn submit_compute(&mut self, slot: usize) -> Result<()> {
        unsafe {
            let command_buffers = [self.commands.compute(slot)];
            let signal_semaphores = [self.compute_finished_semaphores[slot]];

            // No wait semaphores; the compute timeline is not ordered against
            // presentation
            let submit_info = vk::SubmitInfo::default()
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(
                    self.compute_queue,
                    &[submit_info],
                    self.compute_in_flight_fences[slot],
                )
                .map_err(|e| pulsar_err!(LOG_SOURCE, "compute queue_submit failed: {:?}", e))
        }
    }
}

impl Drop for VulkanFrameBackend {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            for i in 0..MAX_FRAMES_IN_FLIGHT {
                self.device
                    .destroy_semaphore(self.image_available_semaphores[i], None);
                self.device
                    .destroy_semaphore(self.render_finished_semaphores[i], None);
                self.device.destroy_fence(self.in_flight_fences[i], None);
                self.device
                    .destroy_semaphore(self.compute_finished_semaphores[i], None);
                self.device
                    .destroy_fence(self.compute_in_flight_fences[i], None);
            }
        }
    }
}
