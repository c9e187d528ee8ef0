use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use crate::error::{GlError, GlResult};
use crate::gl::{GLenum, GLint};
use crate::vk::VulkanDevice;

/// A combined image sampler the fragment stage reads, and the texture unit
/// feeding it (set through glUniform1i on the sampler location).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerBinding {
    pub binding: u32,
    /// `GL_TEXTURE_2D` or `GL_TEXTURE_CUBE_MAP`
    pub target: GLenum,
    pub location: GLint,
    pub unit: u32,
}

/// Everything the shader compiler hands over for one linked program.
#[derive(Clone, Debug, Default)]
pub struct ProgramDesc {
    pub vertex_spirv: Vec<u32>,
    pub fragment_spirv: Vec<u32>,
    pub samplers: Vec<SamplerBinding>,
    /// Bytes of the push-constant block holding the program's uniforms
    pub uniform_size: u32,
}

struct ProgramObjects {
    vertex_module: vk::ShaderModule,
    fragment_module: vk::ShaderModule,
    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
}

/// A linked program. The compiler front end is a black box; this only owns
/// its SPIR-V and lazily creates the Vulkan objects a pipeline needs.
pub struct ShaderProgram {
    desc: ProgramDesc,
    uniform_data: Vec<u8>,
    objects: Option<ProgramObjects>,
    device: Option<Arc<VulkanDevice>>,
}

impl ShaderProgram {
    pub fn new(desc: ProgramDesc, device: Option<Arc<VulkanDevice>>) -> Self {
        let uniform_data = vec![0; desc.uniform_size as usize];
        Self {
            desc,
            uniform_data,
            objects: None,
            device,
        }
    }

    pub fn samplers(&self) -> &[SamplerBinding] {
        &self.desc.samplers
    }

    pub fn uniform_data(&self) -> &[u8] {
        &self.uniform_data
    }

    /// Point the sampler at `location` to texture `unit`.
    pub fn set_sampler_unit(&mut self, location: GLint, unit: u32, max_units: usize) -> GlResult<()> {
        if unit as usize >= max_units {
            return Err(GlError::InvalidValue);
        }
        let sampler = self
            .desc
            .samplers
            .iter_mut()
            .find(|sampler| sampler.location == location)
            .ok_or(GlError::InvalidOperation)?;
        sampler.unit = unit;
        Ok(())
    }

    pub fn set_uniform_data(&mut self, offset: usize, data: &[u8]) -> GlResult<()> {
        let end = offset.checked_add(data.len()).ok_or(GlError::InvalidValue)?;
        self.uniform_data
            .get_mut(offset..end)
            .ok_or(GlError::InvalidOperation)?
            .copy_from_slice(data);
        Ok(())
    }

    fn objects(&mut self) -> Result<&ProgramObjects> {
        if self.objects.is_none() {
            let device = self.device.clone().ok_or_eyre("Program has no device")?;
            self.objects = Some(create_objects(&self.desc, &device.logical)?);
            log::debug!("Created shader program with {} samplers", self.desc.samplers.len());
        }
        self.objects.as_ref().ok_or_eyre("Program objects missing")
    }

    pub fn vertex_module(&mut self) -> Result<vk::ShaderModule> {
        Ok(self.objects()?.vertex_module)
    }

    pub fn fragment_module(&mut self) -> Result<vk::ShaderModule> {
        Ok(self.objects()?.fragment_module)
    }

    pub fn set_layout(&mut self) -> Result<vk::DescriptorSetLayout> {
        Ok(self.objects()?.set_layout)
    }

    pub fn pipeline_layout(&mut self) -> Result<vk::PipelineLayout> {
        Ok(self.objects()?.pipeline_layout)
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let (Some(objects), Some(device)) = (self.objects.take(), self.device.as_ref()) {
            destroy_objects(objects, &device.logical);
        }
    }
}

fn create_shader_module(code: &[u32], device: &ash::Device) -> Result<vk::ShaderModule> {
    if code.is_empty() {
        return Err(eyre!("Empty SPIR-V module"));
    }
    let shader_module_info = vk::ShaderModuleCreateInfo::default().code(code);
    let shader_module = unsafe { device.create_shader_module(&shader_module_info, None)? };
    Ok(shader_module)
}

fn create_objects(desc: &ProgramDesc, device: &ash::Device) -> Result<ProgramObjects> {
    let vertex_module = create_shader_module(&desc.vertex_spirv, device)?;
    let fragment_module = match create_shader_module(&desc.fragment_spirv, device) {
        Ok(module) => module,
        Err(e) => {
            unsafe { device.destroy_shader_module(vertex_module, None) };
            return Err(e);
        }
    };

    let bindings: Vec<_> = desc
        .samplers
        .iter()
        .map(|sampler| {
            vk::DescriptorSetLayoutBinding::default()
                .binding(sampler.binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)
        })
        .collect();
    let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    let set_layout = match unsafe { device.create_descriptor_set_layout(&layout_info, None) } {
        Ok(layout) => layout,
        Err(e) => {
            unsafe {
                device.destroy_shader_module(fragment_module, None);
                device.destroy_shader_module(vertex_module, None);
            }
            return Err(e.into());
        }
    };

    let set_layouts = [set_layout];
    let push_constant_ranges = [vk::PushConstantRange::default()
        .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
        .offset(0)
        .size(desc.uniform_size)];
    let mut pipeline_layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
    if desc.uniform_size > 0 {
        pipeline_layout_info = pipeline_layout_info.push_constant_ranges(&push_constant_ranges);
    }
    let pipeline_layout = match unsafe { device.create_pipeline_layout(&pipeline_layout_info, None) } {
        Ok(layout) => layout,
        Err(e) => {
            unsafe {
                device.destroy_descriptor_set_layout(set_layout, None);
                device.destroy_shader_module(fragment_module, None);
                device.destroy_shader_module(vertex_module, None);
            }
            return Err(e.into());
        }
    };

    Ok(ProgramObjects {
        vertex_module,
        fragment_module,
        set_layout,
        pipeline_layout,
    })
}

fn destroy_objects(objects: ProgramObjects, device: &ash::Device) {
    unsafe {
        device.destroy_pipeline_layout(objects.pipeline_layout, None);
        device.destroy_descriptor_set_layout(objects.set_layout, None);
        device.destroy_shader_module(objects.fragment_module, None);
        device.destroy_shader_module(objects.vertex_module, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::GL_TEXTURE_2D;

    fn program() -> ShaderProgram {
        ShaderProgram::new(
            ProgramDesc {
                samplers: vec![SamplerBinding { binding: 0, target: GL_TEXTURE_2D, location: 3, unit: 0 }],
                uniform_size: 16,
                ..Default::default()
            },
            None,
        )
    }

    #[test]
    fn sampler_units_are_validated() {
        let mut program = program();
        program.set_sampler_unit(3, 2, 8).unwrap();
        assert_eq!(program.samplers()[0].unit, 2);
        assert_eq!(program.set_sampler_unit(3, 8, 8), Err(GlError::InvalidValue));
        assert_eq!(program.set_sampler_unit(4, 0, 8), Err(GlError::InvalidOperation));
    }

    #[test]
    fn uniform_writes_stay_in_block() {
        let mut program = program();
        program.set_uniform_data(12, &[1, 2, 3, 4]).unwrap();
        assert_eq!(&program.uniform_data()[12..], &[1, 2, 3, 4]);
        assert_eq!(program.set_uniform_data(14, &[0; 4]), Err(GlError::InvalidOperation));
    }

    #[test]
    fn headless_program_has_no_vulkan_objects() {
        let mut program = program();
        assert!(program.vertex_module().is_err());
    }
}
