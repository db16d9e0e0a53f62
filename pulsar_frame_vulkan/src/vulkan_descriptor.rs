/// Descriptor - single-binding layout, pool and one set per frame slot
///
/// Each `Descriptor` wraps exactly one binding replicated across the frame
/// slots, so a shader resource can be updated for slot i while slot 1-i is
/// still in flight. The uniform variant owns host-visible mapped buffers
/// (one per slot); the sampler, storage-buffer and storage-image variants
/// point sets at caller-owned resources.
///
/// Sets are indexed by the synchronizer's current frame, never by the
/// swapchain image index.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use pulsar_frame::pulsar::frame::MAX_FRAMES_IN_FLIGHT;
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::pulsar_err;
use std::sync::{Arc, Mutex};

use crate::vulkan_device::DeviceContext;

const LOG_SOURCE: &str = "pulsar::vulkan::Descriptor";

/// Host-visible uniform buffer for one frame slot
struct UniformSlot {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
}

pub struct Descriptor {
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<Allocator>>,
    layout: vk::DescriptorSetLayout,
    pool: vk::DescriptorPool,
    sets: Vec<vk::DescriptorSet>,
    uniform_slots: Vec<UniformSlot>,
}

impl Descriptor {
    /// Uniform-buffer descriptor with one mapped buffer per slot
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[repr(C)]
    /// #[derive(Clone, Copy)]
    /// struct CameraUbo { mvp: [[f32; 4]; 4] }
    ///
    /// let camera = Descriptor::uniform::<CameraUbo>(&device_context, 0,
    ///     vk::ShaderStageFlags::VERTEX)?;
    /// camera.update_uniform(sync.current_frame(), &ubo_value)?;
    /// ```
    pub fn uniform<T: Copy>(
        device_context: &DeviceContext,
        binding: u32,
        stages: vk::ShaderStageFlags,
    ) -> Result<Self> {
        let size = std::mem::size_of::<T>() as vk::DeviceSize;
        let mut descriptor = Self::with_layout(
            device_context,
            binding,
            vk::DescriptorType::UNIFORM_BUFFER,
            stages,
        )?;

        for slot in 0..MAX_FRAMES_IN_FLIGHT {
            let uniform = descriptor.create_uniform_slot(size)?;
            let buffer_info = vk::DescriptorBufferInfo::default()
                .buffer(uniform.buffer)
                .offset(0)
                .range(size);
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor.sets[slot])
                .dst_binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(&buffer_info));
            unsafe {
                descriptor.device.update_descriptor_sets(&[write], &[]);
            }
            descriptor.uniform_slots.push(uniform);
        }
        Ok(descriptor)
    }

    /// Combined-image-sampler descriptor pointing every slot at one texture
    pub fn sampler(
        device_context: &DeviceContext,
        binding: u32,
        stages: vk::ShaderStageFlags,
        image_view: vk::ImageView,
        sampler: vk::Sampler,
    ) -> Result<Self> {
        let descriptor = Self::with_layout(
            device_context,
            binding,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            stages,
        )?;

        let image_info = vk::DescriptorImageInfo::default()
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_view(image_view)
            .sampler(sampler);
        for slot in 0..MAX_FRAMES_IN_FLIGHT {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor.sets[slot])
                .dst_binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(&image_info));
            unsafe {
                descriptor.device.update_descriptor_sets(&[write], &[]);
            }
        }
        Ok(descriptor)
    }

    /// Storage-buffer descriptor over caller-owned buffers
    ///
    /// `buffers` holds either one buffer shared by all slots or one buffer
    /// per slot.
    pub fn storage_buffer(
        device_context: &DeviceContext,
        binding: u32,
        stages: vk::ShaderStageFlags,
        buffers: &[vk::Buffer],
        range: vk::DeviceSize,
    ) -> Result<Self> {
        if buffers.is_empty() {
            return Err(Error::PreconditionViolated(
                "storage_buffer requires at least one buffer".to_string(),
            ));
        }
        let descriptor = Self::with_layout(
            device_context,
            binding,
            vk::DescriptorType::STORAGE_BUFFER,
            stages,
        )?;

        for slot in 0..MAX_FRAMES_IN_FLIGHT {
            let buffer_info = vk::DescriptorBufferInfo::default()
                .buffer(buffers[slot % buffers.len()])
                .offset(0)
                .range(range);
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor.sets[slot])
                .dst_binding(binding)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .buffer_info(std::slice::from_ref(&buffer_info));
            unsafe {
                descriptor.device.update_descriptor_sets(&[write], &[]);
            }
        }
        Ok(descriptor)
    }

    /// Storage-image descriptor (GENERAL layout) for compute writes
    pub fn storage_image(
        device_context: &DeviceContext,
        binding: u32,
        stages: vk::ShaderStageFlags,
        image_view: vk::ImageView,
    ) -> Result<Self> {
        let descriptor = Self::with_layout(
            device_context,
            binding,
            vk::DescriptorType::STORAGE_IMAGE,
            stages,
        )?;

        let image_info = vk::DescriptorImageInfo::default()
            .image_layout(vk::ImageLayout::GENERAL)
            .image_view(image_view);
        for slot in 0..MAX_FRAMES_IN_FLIGHT {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor.sets[slot])
                .dst_binding(binding)
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .image_info(std::slice::from_ref(&image_info));
            unsafe {
                descriptor.device.update_descriptor_sets(&[write], &[]);
            }
        }
        Ok(descriptor)
    }

    /// Write a value into the slot's mapped uniform buffer
    ///
    /// # Errors
    ///
    /// `PreconditionViolated` on a non-uniform descriptor, a bad slot index
    /// or a size mismatch with the type the descriptor was created for.
    pub fn update_uniform<T: Copy>(&self, slot: usize, value: &T) -> Result<()> {
        let uniform = self.uniform_slots.get(slot).ok_or_else(|| {
            Error::PreconditionViolated(format!(
                "update_uniform on slot {} of a descriptor with {} uniform buffers",
                slot,
                self.uniform_slots.len()
            ))
        })?;
        let size = std::mem::size_of::<T>() as vk::DeviceSize;
        if size != uniform.size {
            return Err(Error::PreconditionViolated(format!(
                "update_uniform size mismatch: {} bytes vs buffer of {}",
                size, uniform.size
            )));
        }

        let allocation = uniform.allocation.as_ref().ok_or_else(|| {
            Error::BackendError("uniform allocation already freed".to_string())
        })?;
        let mapped = allocation.mapped_ptr().ok_or_else(|| {
            Error::BackendError("uniform buffer is not host-mapped".to_string())
        })?;
        unsafe {
            std::ptr::copy_nonoverlapping(
                value as *const T as *const u8,
                mapped.as_ptr() as *mut u8,
                size as usize,
            );
        }
        Ok(())
    }

    /// Descriptor set for a frame slot
    pub fn set_for(&self, slot: usize) -> vk::DescriptorSet {
        self.sets[slot]
    }

    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    // ===== CONSTRUCTION PIECES =====

    fn with_layout(
        device_context: &DeviceContext,
        binding: u32,
        ty: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
    ) -> Result<Self> {
        let device = device_context.device_arc();
        unsafe {
            let layout_binding = vk::DescriptorSetLayoutBinding::default()
                .binding(binding)
                .descriptor_type(ty)
                .descriptor_count(1)
                .stage_flags(stages);
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default()
                .bindings(std::slice::from_ref(&layout_binding));
            let layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create layout: {:?}", e))
                })?;

            let pool_size = vk::DescriptorPoolSize::default()
                .ty(ty)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32);
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(std::slice::from_ref(&pool_size))
                .max_sets(MAX_FRAMES_IN_FLIGHT as u32);
            let pool = device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create pool: {:?}", e))
                })?;

            let layouts = vec![layout; MAX_FRAMES_IN_FLIGHT];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);
            let sets = device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to allocate sets: {:?}", e))
                })?;

            Ok(Self {
                device,
                allocator: device_context.allocator(),
                layout,
                pool,
                sets,
                uniform_slots: Vec::new(),
            })
        }
    }

    fn create_uniform_slot(&self, size: vk::DeviceSize) -> Result<UniformSlot> {
        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::UNIFORM_BUFFER)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = self
                .device
                .create_buffer(&buffer_info, None)
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to create buffer: {:?}", e))?;

            let requirements = self.device.get_buffer_memory_requirements(buffer);
            let allocation = self
                .allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))?
                .allocate(&AllocationCreateDesc {
                    name: "uniform_buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Uniform allocation failed: {:?}", e))?;

            self.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| pulsar_err!(LOG_SOURCE, "Failed to bind memory: {:?}", e))?;

            Ok(UniformSlot {
                buffer,
                allocation: Some(allocation),
                size,
            })
        }
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        unsafe {
            for slot in &mut self.uniform_slots {
                self.device.destroy_buffer(slot.buffer, None);
                if let Some(allocation) = slot.allocation.take() {
                    if let Ok(mut allocator) = self.allocator.lock() {
                        let _ = allocator.free(allocation);
                    }
                }
            }
            self.device.destroy_descriptor_pool(self.pool, None);
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
