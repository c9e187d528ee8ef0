//! Graphics pipeline builder fed by the state manager.
//!
//! Each `create_*_state` call stores one fully translated sub-state;
//! `create_info` seals them into a new description generation. The Vulkan
//! pipeline object itself is compiled lazily by `bind`. Pipelines compiled
//! for the current generation are kept per target, so alternating programs
//! or render passes reuse them.

use std::ffi::CString;
use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use smallvec::SmallVec;
use crate::vk::device::VulkanDevice;

const MAX_COMPILED_PIPELINES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputAssemblyDesc {
    pub topology: vk::PrimitiveTopology,
    pub primitive_restart_enable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizationDesc {
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct ColorBlendDesc {
    pub logic_op_enable: bool,
    pub logic_op: vk::LogicOp,
    pub attachment: vk::PipelineColorBlendAttachmentState,
    pub blend_constants: [f32; 4],
}

#[derive(Clone, Copy, Debug)]
pub struct DepthStencilDesc {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: vk::CompareOp,
    pub depth_bounds_test_enable: bool,
    pub stencil_test_enable: bool,
    pub front: vk::StencilOpState,
    pub back: vk::StencilOpState,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct ViewportDesc {
    pub viewport: vk::Viewport,
    pub scissor: vk::Rect2D,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultisampleDesc {
    pub rasterization_samples: vk::SampleCountFlags,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub sample_mask: Option<u32>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct VertexInputDesc {
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

/// Everything besides the fixed-function state that a compiled pipeline depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTarget {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub vertex_module: vk::ShaderModule,
    pub fragment_module: vk::ShaderModule,
    /// 0 for depth-only render passes
    pub color_attachment_count: u32,
}

/// Pipelines compiled from one description generation, keyed by target.
#[derive(Debug, Default)]
struct CompiledPipelines {
    generation: u64,
    entries: SmallVec<[(PipelineTarget, vk::Pipeline); 4]>,
}

impl CompiledPipelines {
    fn get(&self, generation: u64, target: &PipelineTarget) -> Option<vk::Pipeline> {
        if generation != self.generation {
            return None;
        }
        self.entries
            .iter()
            .find(|(built_for, _)| built_for == target)
            .map(|&(_, pipeline)| pipeline)
    }

    /// Store `pipeline`, returning the pipelines it displaces: everything from
    /// an older generation, and the oldest entry once the cache is full.
    fn insert(&mut self, generation: u64, target: PipelineTarget, pipeline: vk::Pipeline) -> Vec<vk::Pipeline> {
        let mut displaced = Vec::new();
        if generation != self.generation {
            displaced.extend(self.entries.drain(..).map(|(_, pipeline)| pipeline));
            self.generation = generation;
        }
        if self.entries.len() >= MAX_COMPILED_PIPELINES {
            displaced.push(self.entries.remove(0).1);
        }
        self.entries.push((target, pipeline));
        displaced
    }

    fn drain(&mut self) -> impl Iterator<Item = vk::Pipeline> + '_ {
        self.entries.drain(..).map(|(_, pipeline)| pipeline)
    }
}

pub struct Pipeline {
    input_assembly: InputAssemblyDesc,
    rasterization: RasterizationDesc,
    color_blend: ColorBlendDesc,
    depth_stencil: DepthStencilDesc,
    viewport: ViewportDesc,
    multisample: MultisampleDesc,
    dynamic_states: Vec<vk::DynamicState>,
    vertex_input: VertexInputDesc,

    // Bumped by `create_info`
    generation: u64,
    compiled: CompiledPipelines,
    retired: Vec<vk::Pipeline>,
    device: Option<Arc<VulkanDevice>>,
}

impl Pipeline {
    pub fn new(device: Option<Arc<VulkanDevice>>) -> Self {
        Self {
            input_assembly: InputAssemblyDesc {
                topology: vk::PrimitiveTopology::TRIANGLE_LIST,
                primitive_restart_enable: false,
            },
            rasterization: RasterizationDesc {
                rasterizer_discard_enable: false,
                polygon_mode: vk::PolygonMode::FILL,
                cull_mode: vk::CullModeFlags::NONE,
                front_face: vk::FrontFace::COUNTER_CLOCKWISE,
                depth_bias_enable: false,
                depth_bias_constant_factor: 0.0,
                depth_bias_clamp: 0.0,
                depth_bias_slope_factor: 0.0,
                line_width: 1.0,
            },
            color_blend: ColorBlendDesc {
                logic_op_enable: false,
                logic_op: vk::LogicOp::COPY,
                attachment: vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA),
                blend_constants: [0.0; 4],
            },
            depth_stencil: DepthStencilDesc {
                depth_test_enable: false,
                depth_write_enable: true,
                depth_compare_op: vk::CompareOp::LESS,
                depth_bounds_test_enable: false,
                stencil_test_enable: false,
                front: vk::StencilOpState::default(),
                back: vk::StencilOpState::default(),
                min_depth_bounds: 0.0,
                max_depth_bounds: 1.0,
            },
            viewport: ViewportDesc {
                viewport: vk::Viewport::default(),
                scissor: vk::Rect2D::default(),
            },
            multisample: MultisampleDesc {
                rasterization_samples: vk::SampleCountFlags::TYPE_1,
                sample_shading_enable: false,
                min_sample_shading: 1.0,
                sample_mask: None,
                alpha_to_coverage_enable: false,
                alpha_to_one_enable: false,
            },
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            vertex_input: VertexInputDesc::default(),

            generation: 0,
            compiled: CompiledPipelines::default(),
            retired: Vec::new(),
            device,
        }
    }

    pub fn create_input_assembly_state(
        &mut self,
        topology: vk::PrimitiveTopology,
        primitive_restart_enable: bool,
    ) {
        self.input_assembly = InputAssemblyDesc {
            topology,
            primitive_restart_enable,
        };
    }

    pub fn create_rasterization_state(&mut self, desc: RasterizationDesc) {
        self.rasterization = desc;
    }

    pub fn create_color_blend_state(&mut self, desc: ColorBlendDesc) {
        self.color_blend = desc;
    }

    pub fn create_depth_stencil_state(&mut self, desc: DepthStencilDesc) {
        self.depth_stencil = desc;
    }

    /// Viewport and scissor are dynamic, so this never forces a recompile.
    pub fn create_viewport_state(&mut self, viewport: vk::Viewport, scissor: vk::Rect2D) {
        self.viewport = ViewportDesc { viewport, scissor };
    }

    pub fn create_multisample_state(&mut self, desc: MultisampleDesc) {
        self.multisample = desc;
    }

    pub fn create_dynamic_state(&mut self, states: &[vk::DynamicState]) {
        self.dynamic_states = states.to_vec();
    }

    pub fn create_vertex_input_state(&mut self, desc: VertexInputDesc) {
        self.vertex_input = desc;
    }

    /// Seal the current sub-states as the description the next bind compiles.
    pub fn create_info(&mut self) {
        self.generation += 1;
        log::trace!("Pipeline description generation {}", self.generation);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn input_assembly(&self) -> &InputAssemblyDesc {
        &self.input_assembly
    }

    pub fn rasterization(&self) -> &RasterizationDesc {
        &self.rasterization
    }

    pub fn color_blend(&self) -> &ColorBlendDesc {
        &self.color_blend
    }

    pub fn depth_stencil(&self) -> &DepthStencilDesc {
        &self.depth_stencil
    }

    pub fn viewport(&self) -> &ViewportDesc {
        &self.viewport
    }

    pub fn multisample(&self) -> &MultisampleDesc {
        &self.multisample
    }

    pub fn dynamic_states(&self) -> &[vk::DynamicState] {
        &self.dynamic_states
    }

    pub fn vertex_input(&self) -> &VertexInputDesc {
        &self.vertex_input
    }

    /// Whether `bind` with `target` would have to compile a new Vulkan pipeline.
    pub fn needs_compile(&self, target: &PipelineTarget) -> bool {
        self.compiled.get(self.generation, target).is_none()
    }

    /// Bind the pipeline for `target`, compiling it first when stale, and set
    /// the dynamic viewport and scissor.
    pub fn bind(&mut self, cmd: vk::CommandBuffer, target: PipelineTarget) -> Result<()> {
        let pipeline = match self.compiled.get(self.generation, &target) {
            Some(pipeline) => pipeline,
            None => {
                let pipeline = self.compile(&target)?;
                // Displaced pipelines may still be referenced by the current frame
                let displaced = self.compiled.insert(self.generation, target, pipeline);
                self.retired.extend(displaced);
                pipeline
            }
        };

        let device = self.device.as_ref().ok_or_eyre("Pipeline has no device")?;
        unsafe {
            device.logical.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
        self.set_dynamic_viewport(cmd)
    }

    pub fn set_dynamic_viewport(&self, cmd: vk::CommandBuffer) -> Result<()> {
        let device = self.device.as_ref().ok_or_eyre("Pipeline has no device")?;
        unsafe {
            device.logical.cmd_set_viewport(cmd, 0, &[self.viewport.viewport]);
            device.logical.cmd_set_scissor(cmd, 0, &[self.viewport.scissor]);
        }
        Ok(())
    }

    /// Destroy pipelines displaced from the cache. Only call once the GPU has
    /// finished every command buffer that could reference them.
    pub fn destroy_retired(&mut self) {
        if let Some(device) = self.device.as_ref() {
            for pipeline in self.retired.drain(..) {
                unsafe { device.logical.destroy_pipeline(pipeline, None) };
            }
        }
    }

    fn compile(&self, target: &PipelineTarget) -> Result<vk::Pipeline> {
        let device = self.device.as_ref().ok_or_eyre("Pipeline has no device")?;

        let main_fn_name = CString::new("main")?;
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(target.vertex_module)
                .name(&main_fn_name),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(target.fragment_module)
                .name(&main_fn_name),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_input.bindings)
            .vertex_attribute_descriptions(&self.vertex_input.attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.input_assembly.topology)
            .primitive_restart_enable(self.input_assembly.primitive_restart_enable);

        let r = &self.rasterization;
        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(r.rasterizer_discard_enable)
            .polygon_mode(r.polygon_mode)
            .cull_mode(r.cull_mode)
            .front_face(r.front_face)
            .depth_bias_enable(r.depth_bias_enable)
            .depth_bias_constant_factor(r.depth_bias_constant_factor)
            .depth_bias_clamp(r.depth_bias_clamp)
            .depth_bias_slope_factor(r.depth_bias_slope_factor)
            .line_width(r.line_width);

        let sample_mask = self.multisample.sample_mask.map(|mask| [mask]);
        let mut multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(self.multisample.rasterization_samples)
            .sample_shading_enable(self.multisample.sample_shading_enable)
            .min_sample_shading(self.multisample.min_sample_shading)
            .alpha_to_coverage_enable(self.multisample.alpha_to_coverage_enable)
            .alpha_to_one_enable(self.multisample.alpha_to_one_enable);
        if let Some(mask) = sample_mask.as_ref() {
            multisample = multisample.sample_mask(mask);
        }

        let d = &self.depth_stencil;
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(d.depth_test_enable)
            .depth_write_enable(d.depth_write_enable)
            .depth_compare_op(d.depth_compare_op)
            .depth_bounds_test_enable(d.depth_bounds_test_enable)
            .stencil_test_enable(d.stencil_test_enable)
            .front(d.front)
            .back(d.back)
            .min_depth_bounds(d.min_depth_bounds)
            .max_depth_bounds(d.max_depth_bounds);

        let attachments = [self.color_blend.attachment];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(self.color_blend.logic_op_enable)
            .logic_op(self.color_blend.logic_op)
            .attachments(&attachments[..target.color_attachment_count.min(1) as usize])
            .blend_constants(self.color_blend.blend_constants);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_info = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&self.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .layout(target.layout)
            .render_pass(target.render_pass)
            .subpass(0)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .depth_stencil_state(&depth_stencil)
            .dynamic_state(&dynamic_info);

        let pipeline = unsafe {
            device
                .logical
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, e)| eyre!("Failed to create graphics pipeline: {e}"))?
        }[0];

        log::debug!("Compiled graphics pipeline (generation {})", self.generation);
        Ok(pipeline)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.destroy_retired();
        if let Some(device) = self.device.as_ref() {
            for pipeline in self.compiled.drain() {
                unsafe { device.logical.destroy_pipeline(pipeline, None) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(render_pass: u64) -> PipelineTarget {
        use ash::vk::Handle;
        PipelineTarget {
            render_pass: vk::RenderPass::from_raw(render_pass),
            layout: vk::PipelineLayout::from_raw(1),
            vertex_module: vk::ShaderModule::from_raw(2),
            fragment_module: vk::ShaderModule::from_raw(3),
            color_attachment_count: 1,
        }
    }

    #[test]
    fn headless_pipeline_always_needs_first_compile() {
        let pipeline = Pipeline::new(None);
        assert!(pipeline.needs_compile(&target(7)));
        assert_eq!(pipeline.generation(), 0);
    }

    #[test]
    fn create_info_bumps_generation_only() {
        let mut pipeline = Pipeline::new(None);
        pipeline.create_input_assembly_state(vk::PrimitiveTopology::LINE_STRIP, false);
        assert_eq!(pipeline.generation(), 0);
        pipeline.create_info();
        assert_eq!(pipeline.generation(), 1);
        assert_eq!(pipeline.input_assembly().topology, vk::PrimitiveTopology::LINE_STRIP);
    }

    fn raw_pipeline(raw: u64) -> vk::Pipeline {
        use ash::vk::Handle;
        vk::Pipeline::from_raw(raw)
    }

    #[test]
    fn alternating_targets_hit_the_cache() {
        let mut compiled = CompiledPipelines::default();
        assert!(compiled.insert(1, target(10), raw_pipeline(100)).is_empty());
        assert!(compiled.insert(1, target(11), raw_pipeline(101)).is_empty());
        assert_eq!(compiled.get(1, &target(10)), Some(raw_pipeline(100)));
        assert_eq!(compiled.get(1, &target(11)), Some(raw_pipeline(101)));
        assert_eq!(compiled.get(2, &target(10)), None);
    }

    #[test]
    fn new_generation_displaces_old_pipelines() {
        let mut compiled = CompiledPipelines::default();
        compiled.insert(1, target(10), raw_pipeline(100));
        compiled.insert(1, target(11), raw_pipeline(101));
        let displaced = compiled.insert(2, target(10), raw_pipeline(200));
        assert_eq!(displaced, vec![raw_pipeline(100), raw_pipeline(101)]);
        assert_eq!(compiled.get(2, &target(11)), None);
        assert_eq!(compiled.get(2, &target(10)), Some(raw_pipeline(200)));
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let mut compiled = CompiledPipelines::default();
        for i in 0..MAX_COMPILED_PIPELINES as u64 {
            assert!(compiled.insert(1, target(i), raw_pipeline(100 + i)).is_empty());
        }
        let displaced = compiled.insert(1, target(99), raw_pipeline(199));
        assert_eq!(displaced, vec![raw_pipeline(100)]);
        assert_eq!(compiled.get(1, &target(0)), None);
        assert_eq!(compiled.get(1, &target(1)), Some(raw_pipeline(101)));
        assert_eq!(compiled.drain().count(), MAX_COMPILED_PIPELINES);
    }

    #[test]
    fn viewport_and_scissor_stay_dynamic() {
        let pipeline = Pipeline::new(None);
        assert!(pipeline.dynamic_states().contains(&vk::DynamicState::VIEWPORT));
        assert!(pipeline.dynamic_states().contains(&vk::DynamicState::SCISSOR));
    }
}
