/// Pipeline - graphics pipeline construction against the swapchain render pass
///
/// Viewport and scissor are dynamic state so the pipeline survives swapchain
/// recreation; only the recorded commands carry the current extent.

use ash::vk;
use pulsar_frame::pulsar::{Error, Result};
use std::sync::Arc;

use crate::vulkan_shader::ShaderModule;

/// Fixed-function options with sensible defaults
///
/// ```
/// use pulsar_frame_vulkan::PipelineOptions;
/// use ash::vk;
///
/// let options = PipelineOptions {
///     cull_mode: vk::CullModeFlags::NONE,
///     alpha_blend: true,
///     ..Default::default()
/// };
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
    pub alpha_blend: bool,
    pub depth_test: bool,
    /// Push-constant range as (stages, size in bytes)
    pub push_constants: Option<(vk::ShaderStageFlags, u32)>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            line_width: 1.0,
            alpha_blend: false,
            depth_test: true,
            push_constants: None,
        }
    }
}

pub struct Pipeline {
    device: Arc<ash::Device>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl Pipeline {
    /// Build a graphics pipeline
    ///
    /// # Arguments
    ///
    /// * `render_pass` - Pass the pipeline renders within (the swapchain's)
    /// * `vertex_shader`, `fragment_shader` - Stage modules
    /// * `bindings`, `attributes` - Vertex input description
    /// * `set_layouts` - Descriptor set layouts, in set-index order
    /// * `options` - Fixed-function configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: Arc<ash::Device>,
        render_pass: vk::RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        bindings: &[vk::VertexInputBindingDescription],
        attributes: &[vk::VertexInputAttributeDescription],
        set_layouts: &[vk::DescriptorSetLayout],
        options: PipelineOptions,
    ) -> Result<Self> {
        unsafe {
            let stages = [vertex_shader.stage_info(), fragment_shader.stage_info()];

            let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(bindings)
                .vertex_attribute_descriptions(attributes);

            let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(options.topology)
                .primitive_restart_enable(false);

            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterizer = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(options.polygon_mode)
                .line_width(options.line_width)
                .cull_mode(options.cull_mode)
                .front_face(options.front_face);

            let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(options.depth_test)
                .depth_write_enable(options.depth_test)
                .depth_compare_op(vk::CompareOp::LESS)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false);

            let blend_attachment = if options.alpha_blend {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(true)
                    .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                    .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(vk::BlendFactor::ONE)
                    .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                    .alpha_blend_op(vk::BlendOp::ADD)
            } else {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(false)
            };

            let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state =
                vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            let push_constant_ranges = options
                .push_constants
                .map(|(stage_flags, size)| {
                    vec![vk::PushConstantRange::default()
                        .stage_flags(stage_flags)
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
                        "Failed to create pipeline layout: {:?}",
                        e
                    ))
                })?;

            let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stages)
                .vertex_input_state(&vertex_input)
                .input_assembly_state(&input_assembly)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterizer)
                .multisample_state(&multisampling)
                .depth_stencil_state(&depth_stencil)
                .color_blend_state(&color_blending)
                .dynamic_state(&dynamic_state)
                .layout(layout)
                .render_pass(render_pass)
                .subpass(0);

            let pipeline = device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, e)| {
                    device.destroy_pipeline_layout(layout, None);
                    Error::InitializationFailed(format!("Failed to create pipeline: {:?}", e))
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
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
