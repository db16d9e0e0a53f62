/// VertexBuffer - indexed geometry with staged upload and a draw helper
///
/// Vertices and u32 indices are uploaded once through a host-visible staging
/// buffer and a one-shot copy, then live in device-local memory. `draw`
/// records the full bind + dynamic viewport/scissor + indexed draw sequence
/// into a graphics command buffer.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::pulsar_err;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use crate::vulkan_device::DeviceContext;
use crate::vulkan_pipeline::Pipeline;

const LOG_SOURCE: &str = "pulsar::vulkan::VertexBuffer";

struct GpuBuffer {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

pub struct VertexBuffer<V: Copy> {
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<gpu_allocator::vulkan::Allocator>>,
    vertex: GpuBuffer,
    index: GpuBuffer,
    index_count: u32,
    _marker: PhantomData<V>,
}

impl<V: Copy> VertexBuffer<V> {
    /// Upload vertices and indices to device-local memory
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` for empty vertex or index slices; allocation
    /// and copy failures are backend errors.
    pub fn new(device_context: &DeviceContext, vertices: &[V], indices: &[u32]) -> Result<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::PreconditionViolated(
                "vertex buffer needs at least one vertex and one index".to_string(),
            ));
        }

        let device = device_context.device_arc();
        let allocator = device_context.allocator();

        let vertex = upload_device_local(
            device_context,
            &device,
            &allocator,
            vertices.as_ptr() as *const u8,
            std::mem::size_of_val(vertices) as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "vertex_buffer",
        )?;
        let index = upload_device_local(
            device_context,
            &device,
            &allocator,
            indices.as_ptr() as *const u8,
            std::mem::size_of_val(indices) as vk::DeviceSize,
            vk::BufferUsageFlags::INDEX_BUFFER,
            "index_buffer",
        )?;

        Ok(Self {
            device,
            allocator,
            vertex,
            index,
            index_count: indices.len() as u32,
            _marker: PhantomData,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex.buffer
    }

    pub fn index_buffer(&self) -> vk::Buffer {
        self.index.buffer
    }

    /// Record a full indexed draw of this geometry
    ///
    /// Binds `pipeline`, sets the dynamic viewport/scissor to `extent`, binds
    /// the vertex/index buffers and `descriptor_sets`, and issues the draw.
    /// The command buffer must be in the recording state.
    pub fn draw(
        &self,
        command_buffer: vk::CommandBuffer,
        pipeline: &Pipeline,
        extent: vk::Extent2D,
        descriptor_sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.pipeline(),
            );

            let viewport = vk::Viewport::default()
                .width(extent.width as f32)
                .height(extent.height as f32)
                .min_depth(0.0)
                .max_depth(1.0);
            self.device
                .cmd_set_viewport(command_buffer, 0, std::slice::from_ref(&viewport));

            let scissor = vk::Rect2D::default().extent(extent);
            self.device
                .cmd_set_scissor(command_buffer, 0, std::slice::from_ref(&scissor));

            self.device.cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[self.vertex.buffer],
                &[0],
            );
            self.device.cmd_bind_index_buffer(
                command_buffer,
                self.index.buffer,
                0,
                vk::IndexType::UINT32,
            );

            if !descriptor_sets.is_empty() {
                self.device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline.layout(),
                    0,
                    descriptor_sets,
                    &[],
                );
            }

            self.device
                .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
        }
    }
}

impl<V: Copy> Drop for VertexBuffer<V> {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.vertex.buffer, None);
            self.device.destroy_buffer(self.index.buffer, None);
            if let Ok(mut allocator) = self.allocator.lock() {
                if let Some(allocation) = self.vertex.allocation.take() {
                    let _ = allocator.free(allocation);
                }
                if let Some(allocation) = self.index.allocation.take() {
                    let _ = allocator.free(allocation);
                }
            }
        }
    }
}

/// Stage `size` bytes at `data` into a new device-local buffer
fn upload_device_local(
    device_context: &DeviceContext,
    device: &Arc<ash::Device>,
    allocator: &Arc<Mutex<gpu_allocator::vulkan::Allocator>>,
    data: *const u8,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    name: &'static str,
) -> Result<GpuBuffer> {
    unsafe {
        // Staging buffer, host visible
        let staging_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let staging_buffer = device
            .create_buffer(&staging_info, None)
            .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create staging buffer: {:?}", e))?;
        let staging_requirements = device.get_buffer_memory_requirements(staging_buffer);
        let staging_allocation = allocator
            .lock()
            .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
            .allocate(&AllocationCreateDesc {
                name: "staging_buffer",
                requirements: staging_requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| pulsar_err!(LOG_SOURCE, "Staging allocation failed: {:?}", e))?;
        device
            .bind_buffer_memory(
                staging_buffer,
                staging_allocation.memory(),
                staging_allocation.offset(),
            )
            .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to bind staging memory: {:?}", e))?;

        let mapped = staging_allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Staging buffer is not host-mapped".to_string()))?;
        std::ptr::copy_nonoverlapping(data, mapped.as_ptr() as *mut u8, size as usize);

        // Device-local destination
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage | vk::BufferUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = device
            .create_buffer(&buffer_info, None)
            .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create {}: {:?}", name, e))?;
        let requirements = device.get_buffer_memory_requirements(buffer);
        let allocation = allocator
            .lock()
            .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| pulsar_err!(LOG_SOURCE, "{} allocation failed: {:?}", name, e))?;
        device
            .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to bind {} memory: {:?}", name, e))?;

        device_context.copy_buffer(staging_buffer, buffer, size)?;

        // Staging state is no longer needed
        device.destroy_buffer(staging_buffer, None);
        if let Ok(mut allocator) = allocator.lock() {
            let _ = allocator.free(staging_allocation);
        }

        Ok(GpuBuffer {
            buffer,
            allocation: Some(allocation),
        })
    }
}
