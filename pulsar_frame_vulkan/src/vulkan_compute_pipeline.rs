/// ComputePipeline - compute stage plus a dispatch recording helper

use ash::vk;
use pulsar_frame::pulsar::{Error, Result};
use std::sync::Arc;

use crate::vulkan_shader::ShaderModule;

pub struct ComputePipeline {
    device: Arc<ash::Device>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl ComputePipeline {
    /// Build a compute pipeline from a compute-stage shader
    ///
    /// # Arguments
    ///
    /// * `shader` - Module created with `vk::ShaderStageFlags::COMPUTE`
    /// * `set_layouts` - Descriptor set layouts, in set-index order
    /// * `push_constant_size` - Optional push-constant range size in bytes
    pub fn new(
        device: Arc<ash::Device>,
        shader: &ShaderModule,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_size: Option<u32>,
    ) -> Result<Self> {
        unsafe {
            let push_constant_ranges = push_constant_size
                .map(|size| {
                    vec![vk::PushConstantRange::default()
                        .stage_flags(vk::ShaderStageFlags::COMPUTE)
                        .offset(0)
                        .size(size)]
                })
                .unwrap_or_default();

            let layout_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(set_layouts)
                .push_constant_ranges(&push_constant_ranges);
            let layout = device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create compute layout: {:?}",
                        e
                    ))
                })?;

            let pipeline_info = vk::ComputePipelineCreateInfo::default()
                .stage(shader.stage_info())
                .layout(layout);

            let pipeline = device
                .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, e)| {
                    device.destroy_pipeline_layout(layout, None);
                    Error::InitializationFailed(format!(
                        "Failed to create compute pipeline: {:?}",
                        e
                    ))
                })?[0];

            Ok(Self {
                device,
                pipeline,
                layout,
            })
        }
    }

    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Record a dispatch into a compute command buffer
    ///
    /// Binds the pipeline and `descriptor_sets`, then dispatches the given
    /// workgroup counts. The buffer must be in the recording state (between
    /// the synchronizer's compute begin/end).
    pub fn dispatch(
        &self,
        command_buffer: vk::CommandBuffer,
        descriptor_sets: &[vk::DescriptorSet],
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) {
        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::COMPUTE,
                self.pipeline,
            );
            if !descriptor_sets.is_empty() {
                self.device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::COMPUTE,
                    self.layout,
                    0,
                    descriptor_sets,
                    &[],
                );
            }
            self.device
                .cmd_dispatch(command_buffer, group_count_x, group_count_y, group_count_z);
        }
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
