/// VulkanSwapchain - presentable images, depth target, render pass, framebuffers
///
/// Owns everything the presentation surface rebuilds on resize: the
/// VkSwapchainKHR, per-image color views, an allocator-backed depth image,
/// and one framebuffer per swapchain image. The render pass is created once
/// (the surface format never changes across recreation) and kept.
///
/// Synchronization primitives live in the frame backend, never here;
/// `recreate` touches only image-shaped state.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::{pulsar_bail, pulsar_debug, pulsar_err, pulsar_info};
use std::sync::{Arc, Mutex};

use crate::vulkan_device::DeviceContext;
use crate::vulkan_instance::VulkanInstance;

const LOG_SOURCE: &str = "pulsar::vulkan::Swapchain";

// ===== PURE SELECTION HELPERS =====

/// Prefer B8G8R8A8_SRGB with SRGB nonlinear color space, else the first format
pub fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    available
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .unwrap_or(available[0])
}

/// Prefer MAILBOX, falling back to the always-available FIFO
pub fn choose_present_mode(available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if available.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Window extent clamped to the surface capabilities
///
/// When the driver pins `current_extent` (anything but u32::MAX), that value
/// wins regardless of the requested size.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, capped by the maximum when one exists
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        count = capabilities.max_image_count;
    }
    count
}

// ===== SWAPCHAIN =====

/// Depth image with its view and allocation
struct DepthTarget {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

pub struct VulkanSwapchain {
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<Allocator>>,

    // Handle clones owned by VulkanInstance / DeviceContext
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
    present_family: u32,

    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    depth_format: vk::Format,
    extent: vk::Extent2D,

    depth: DepthTarget,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
}

impl VulkanSwapchain {
    /// Create the swapchain at the given window size
    ///
    /// # Arguments
    ///
    /// * `instance` - Owns the surface this swapchain presents to
    /// * `device_context` - Device, queue families and allocator
    /// * `width`, `height` - Current window size in pixels
    pub fn new(
        instance: &VulkanInstance,
        device_context: &DeviceContext,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let device = device_context.device_arc();
        let swapchain_loader =
            ash::khr::swapchain::Device::new(instance.instance(), &device);

        let depth_format = device_context.find_depth_format()?;

        let mut swapchain = Self {
            device,
            allocator: device_context.allocator(),
            surface: instance.surface(),
            surface_loader: instance.surface_loader().clone(),
            physical_device: device_context.physical_device(),
            graphics_family: device_context.graphics_family(),
            present_family: device_context.present_family(),
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::Format::UNDEFINED,
            depth_format,
            extent: vk::Extent2D::default(),
            depth: DepthTarget {
                image: vk::Image::null(),
                view: vk::ImageView::null(),
                allocation: None,
            },
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
        };

        swapchain.build(width, height)?;
        swapchain.render_pass = swapchain.create_render_pass()?;
        swapchain.framebuffers = swapchain.create_framebuffers()?;

        pulsar_info!(
            LOG_SOURCE,
            "Swapchain created: {} images, {}x{}",
            swapchain.images.len(),
            swapchain.extent.width,
            swapchain.extent.height
        );
        Ok(swapchain)
    }

    /// Rebuild the swapchain for a new window size
    ///
    /// Waits for the device to go idle, destroys image-shaped state (views,
    /// framebuffers, depth target, the old VkSwapchainKHR) and rebuilds it.
    /// The render pass survives since the surface format is unchanged.
    pub fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        pulsar_debug!(LOG_SOURCE, "Recreating swapchain at {}x{}", width, height);
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| pulsar_err!(LOG_SOURCE, "device_wait_idle failed: {:?}", e))?;
        }
        self.destroy_image_state();
        self.build(width, height)?;
        self.framebuffers = self.create_framebuffers()?;
        Ok(())
    }

    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    /// Framebuffer for a swapchain image index (as returned by acquire)
    pub fn framebuffer(&self, image_index: u32) -> Result<vk::Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                Error::PreconditionViolated(format!(
                    "image index {} out of range ({} framebuffers)",
                    image_index,
                    self.framebuffers.len()
                ))
            })
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    // ===== CONSTRUCTION PIECES =====

    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    pulsar_err!(LOG_SOURCE, "Failed to query capabilities: {:?}", e)
                })?;
            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to query formats: {:?}", e))?;
            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(self.physical_device, self.surface)
                .map_err(|e| {
                    pulsar_err!(LOG_SOURCE, "Failed to query present modes: {:?}", e)
                })?;

            if formats.is_empty() {
                pulsar_bail!(LOG_SOURCE, "Surface reports no formats");
            }

            let surface_format = choose_surface_format(&formats);
            let present_mode = choose_present_mode(&present_modes);
            let extent = choose_extent(&capabilities, width, height);
            let image_count = choose_image_count(&capabilities);

            let family_indices = [self.graphics_family, self.present_family];
            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);

            create_info = if self.graphics_family != self.present_family {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&family_indices)
            } else {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create swapchain: {:?}", e))?;

            let images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to get images: {:?}", e))?;

            let image_views = images
                .iter()
                .map(|&image| {
                    let view_info = vk::ImageViewCreateInfo::default()
                        .image(image)
                        .view_type(vk::ImageViewType::TYPE_2D)
                        .format(surface_format.format)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            base_mip_level: 0,
                            level_count: 1,
                            base_array_layer: 0,
                            layer_count: 1,
                        });
                    self.device.create_image_view(&view_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create image views: {:?}", e))?;

            self.swapchain = swapchain;
            self.images = images;
            self.image_views = image_views;
            self.format = surface_format.format;
            self.extent = extent;
            self.depth = self.create_depth_target(extent)?;
            Ok(())
        }
    }

    fn create_depth_target(&self, extent: vk::Extent2D) -> Result<DepthTarget> {
        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .format(self.depth_format)
                .tiling(vk::ImageTiling::OPTIMAL)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let image = self
                .device
                .create_image(&image_info, None)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create depth image: {:?}", e))?;

            let requirements = self.device.get_image_memory_requirements(image);
            let allocation = self
                .allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
                .allocate(&AllocationCreateDesc {
                    name: "depth_target",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Depth allocation failed: {:?}", e))?;

            self.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to bind depth memory: {:?}", e))?;

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.depth_format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = self
                .device
                .create_image_view(&view_info, None)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create depth view: {:?}", e))?;

            Ok(DepthTarget {
                image,
                view,
                allocation: Some(allocation),
            })
        }
    }

    fn create_render_pass(&self) -> Result<vk::RenderPass> {
        unsafe {
            let color_attachment = vk::AttachmentDescription::default()
                .format(self.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

            let depth_attachment = vk::AttachmentDescription::default()
                .format(self.depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let color_ref = vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
            let depth_ref = vk::AttachmentReference::default()
                .attachment(1)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(std::slice::from_ref(&color_ref))
                .depth_stencil_attachment(&depth_ref);

            let dependency = vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                );

            let attachments = [color_attachment, depth_attachment];
            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(std::slice::from_ref(&subpass))
                .dependencies(std::slice::from_ref(&dependency));

            self.device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create render pass: {:?}", e))
                })
        }
    }

    fn create_framebuffers(&self) -> Result<Vec<vk::Framebuffer>> {
        unsafe {
            self.image_views
                .iter()
                .map(|&view| {
                    let attachments = [view, self.depth.view];
                    let framebuffer_info = vk::FramebufferCreateInfo::default()
                        .render_pass(self.render_pass)
                        .attachments(&attachments)
                        .width(self.extent.width)
                        .height(self.extent.height)
                        .layers(1);
                    self.device
                        .create_framebuffer(&framebuffer_info, None)
                        .map_err(|e| {
                            pulsar_err!(LOG_SOURCE, "Failed to create framebuffer: {:?}", e)
                        })
                })
                .collect()
        }
    }

    fn destroy_image_state(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            self.framebuffers.clear();

            self.device.destroy_image_view(self.depth.view, None);
            self.device.destroy_image(self.depth.image, None);
            if let Some(allocation) = self.depth.allocation.take() {
                if let Ok(mut allocator) = self.allocator.lock() {
                    let _ = allocator.free(allocation);
                }
            }

            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.image_views.clear();

            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.swapchain = vk::SwapchainKHR::null();
        }
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.destroy_image_state();
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
