/// ShaderModule - SPIR-V loading and VkShaderModule creation
///
/// Loads a compiled SPIR-V binary from disk, validates the 4-byte alignment
/// the format requires, and owns the resulting VkShaderModule together with
/// the stage it is meant for.

use ash::vk;
use pulsar_frame::pulsar::{Error, Result};
use pulsar_frame::pulsar_err;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const LOG_SOURCE: &str = "pulsar::vulkan::ShaderModule";

pub struct ShaderModule {
    device: Arc<ash::Device>,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
}

impl ShaderModule {
    /// Load a SPIR-V file and create the module
    ///
    /// # Arguments
    ///
    /// * `device` - Logical device the module is created on
    /// * `path` - Path to the compiled `.spv` file
    /// * `stage` - Pipeline stage this module is used at
    ///
    /// # Errors
    ///
    /// `InvalidResource` for a missing file or a byte length that is not a
    /// multiple of 4; `InitializationFailed` if the driver rejects the code.
    pub fn new(
        device: Arc<ash::Device>,
        path: impl AsRef<Path>,
        stage: vk::ShaderStageFlags,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::InvalidResource(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if bytes.len() % 4 != 0 {
            return Err(Error::InvalidResource(format!(
                "{} is not valid SPIR-V ({} bytes, not 4-byte aligned)",
                path.display(),
                bytes.len()
            )));
        }

        let code = ash::util::read_spv(&mut Cursor::new(&bytes)).map_err(|e| {
            Error::InvalidResource(format!("{} is not valid SPIR-V: {}", path.display(), e))
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            device.create_shader_module(&create_info, None).map_err(|e| {
                pulsar_err!(LOG_SOURCE, "Failed to create shader module: {:?}", e)
            })?
        };

        Ok(Self {
            device,
            module,
            stage,
        })
    }

    pub fn module(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.stage
    }

    /// Stage create info for pipeline construction (entry point "main")
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage)
            .module(self.module)
            .name(c"main")
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
