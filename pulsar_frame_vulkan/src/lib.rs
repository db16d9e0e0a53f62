/*!
# Pulsar Frame - Vulkan Backend

Vulkan implementation of the `pulsar_frame` frame protocol, built on the Ash
bindings and gpu-allocator for memory management.

`VulkanFrameBackend` implements the core `FrameBackend` trait; the remaining
types are the convenience wrappers the frame protocol records against:
instance and device bootstrap, swapchain with depth target and render pass,
shader modules, per-slot descriptors, graphics/compute pipelines and indexed
vertex buffers.

Construction order (and the reverse drop order the caller must keep):
`VulkanInstance` → `DeviceContext` → `VulkanSwapchain` → `VulkanFrameBackend`
(which takes ownership of the swapchain) → resources.
*/

mod vulkan_backend;
mod vulkan_command_buffers;
mod vulkan_compute_pipeline;
mod vulkan_descriptor;
mod vulkan_device;
mod vulkan_instance;
mod vulkan_pipeline;
mod vulkan_shader;
mod vulkan_swapchain;
mod vulkan_vertex_buffer;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_backend::VulkanFrameBackend;
pub use vulkan_command_buffers::CommandBufferSet;
pub use vulkan_compute_pipeline::ComputePipeline;
pub use vulkan_descriptor::Descriptor;
pub use vulkan_device::DeviceContext;
pub use vulkan_instance::VulkanInstance;
pub use vulkan_pipeline::{Pipeline, PipelineOptions};
pub use vulkan_shader::ShaderModule;
pub use vulkan_swapchain::{
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
    VulkanSwapchain,
};
pub use vulkan_vertex_buffer::VertexBuffer;
