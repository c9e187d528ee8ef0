//! glClear. Attachments whose every channel is writable are cleared with
//! `vkCmdClearAttachments`; a partial color or stencil write mask is honored
//! by drawing a full-screen triangle through a pipeline carrying the masks.

use std::io::Cursor;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use glam::Vec4;
use smallvec::SmallVec;
use crate::error::GlError;
use crate::gl::*;
use crate::resources::{FramebufferHandle, ProgramDesc, ShaderProgram};
use crate::state::{vk_mappings, DrawTarget, StateManager};
use crate::util::format;
use crate::vk::pipeline::{
    ColorBlendDesc, DepthStencilDesc, MultisampleDesc, Pipeline, PipelineTarget, RasterizationDesc, VertexInputDesc,
};
use super::Context;

const CLEAR_BITS: GLbitfield = GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT | GL_STENCIL_BUFFER_BIT;
const STENCIL_BITS: u32 = 0xff;

const CLEAR_VERT_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/clear.vert.spv"));
const CLEAR_FRAG_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/clear.frag.spv"));

/// Aspects the cleared framebuffer actually has.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ClearTargets {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

/// Write masks for the full-screen clear draw. An empty color mask or a zero
/// stencil mask leaves that aspect alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MaskedClear {
    pub color_write_mask: vk::ColorComponentFlags,
    pub stencil_write_mask: u32,
    pub stencil_reference: u32,
}

/// How one glClear is carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ClearPlan {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
    pub masked: Option<MaskedClear>,
}

impl ClearPlan {
    pub fn new(mask: GLbitfield, state: &StateManager, targets: ClearTargets) -> Self {
        let ops = &state.framebuffer_operations;
        let mut plan = Self { color: false, depth: false, stencil: false, masked: None };
        let mut masked = MaskedClear {
            color_write_mask: vk::ColorComponentFlags::empty(),
            stencil_write_mask: 0,
            stencil_reference: ops.clear_stencil() as u32 & STENCIL_BITS,
        };

        if mask & GL_COLOR_BUFFER_BIT != 0 && targets.color {
            let color = ops.color_write_mask();
            if color.all() {
                plan.color = true;
            } else {
                masked.color_write_mask = vk_mappings::gl_color_mask_to_vk(color.x, color.y, color.z, color.w);
            }
        }
        plan.depth = mask & GL_DEPTH_BUFFER_BIT != 0 && targets.depth && ops.depth_write_mask();
        if mask & GL_STENCIL_BUFFER_BIT != 0 && targets.stencil {
            let write_mask = state.fragment_operations.stencil_front().write_mask & STENCIL_BITS;
            if write_mask == STENCIL_BITS {
                plan.stencil = true;
            } else {
                masked.stencil_write_mask = write_mask;
            }
        }

        if !masked.color_write_mask.is_empty() || masked.stencil_write_mask != 0 {
            plan.masked = Some(masked);
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        !self.color && !self.depth && !self.stencil && self.masked.is_none()
    }

    pub fn writes_stencil(&self) -> bool {
        self.stencil || self.masked.is_some_and(|masked| masked.stencil_write_mask != 0)
    }

    pub fn attachments(&self, color: Vec4, depth: f32, stencil: i32) -> SmallVec<[vk::ClearAttachment; 2]> {
        let mut attachments = SmallVec::new();
        if self.color {
            attachments.push(vk::ClearAttachment {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                color_attachment: 0,
                clear_value: vk::ClearValue {
                    color: vk::ClearColorValue { float32: color.to_array() },
                },
            });
        }
        let mut aspect_mask = vk::ImageAspectFlags::empty();
        if self.depth {
            aspect_mask |= vk::ImageAspectFlags::DEPTH;
        }
        if self.stencil {
            aspect_mask |= vk::ImageAspectFlags::STENCIL;
        }
        if !aspect_mask.is_empty() {
            attachments.push(vk::ClearAttachment {
                aspect_mask,
                color_attachment: 0,
                clear_value: vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: depth.clamp(0.0, 1.0),
                        stencil: stencil as u32 & STENCIL_BITS,
                    },
                },
            });
        }
        attachments
    }
}

impl MaskedClear {
    /// Seal the fixed-function state of the clear draw into `pipeline`.
    pub fn configure(&self, pipeline: &mut Pipeline) {
        let stencil = vk::StencilOpState {
            fail_op: vk::StencilOp::REPLACE,
            pass_op: vk::StencilOp::REPLACE,
            depth_fail_op: vk::StencilOp::REPLACE,
            compare_op: vk::CompareOp::ALWAYS,
            compare_mask: STENCIL_BITS,
            write_mask: self.stencil_write_mask,
            reference: self.stencil_reference,
        };

        pipeline.create_input_assembly_state(vk::PrimitiveTopology::TRIANGLE_LIST, false);
        pipeline.create_rasterization_state(RasterizationDesc {
            rasterizer_discard_enable: false,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_bias_enable: false,
            depth_bias_constant_factor: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 0.0,
            line_width: 1.0,
        });
        pipeline.create_color_blend_state(ColorBlendDesc {
            logic_op_enable: false,
            logic_op: vk::LogicOp::COPY,
            attachment: vk::PipelineColorBlendAttachmentState::default().color_write_mask(self.color_write_mask),
            blend_constants: [0.0; 4],
        });
        pipeline.create_depth_stencil_state(DepthStencilDesc {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: vk::CompareOp::ALWAYS,
            depth_bounds_test_enable: false,
            stencil_test_enable: self.stencil_write_mask != 0,
            front: stencil,
            back: stencil,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
        });
        pipeline.create_multisample_state(MultisampleDesc {
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            sample_shading_enable: false,
            min_sample_shading: 1.0,
            sample_mask: None,
            alpha_to_coverage_enable: false,
            alpha_to_one_enable: false,
        });
        pipeline.create_dynamic_state(&[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);
        pipeline.create_vertex_input_state(VertexInputDesc::default());
        pipeline.create_info();
    }
}

fn clear_program_desc() -> Result<ProgramDesc> {
    Ok(ProgramDesc {
        vertex_spirv: ash::util::read_spv(&mut Cursor::new(CLEAR_VERT_SPV))?,
        fragment_spirv: ash::util::read_spv(&mut Cursor::new(CLEAR_FRAG_SPV))?,
        samplers: Vec::new(),
        // One vec4 color
        uniform_size: 16,
    })
}

impl Context {
    /// glClear over the scissor rectangle of the current framebuffer,
    /// honoring the color, depth and stencil write masks.
    pub fn clear(&mut self, mask: GLbitfield) -> Result<()> {
        if mask & !CLEAR_BITS != 0 {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        if self.framebuffer_status() != GL_FRAMEBUFFER_COMPLETE {
            self.state.set_error(GlError::InvalidFramebufferOperation);
            return Ok(());
        }
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        let Some(framebuffer) = self.current_framebuffer() else {
            return Ok(());
        };

        let fb = self.framebuffers.get(framebuffer).ok_or_eyre("Framebuffer no longer exists")?;
        let ds_format = fb.has_depth_stencil().then(|| fb.depth_stencil_format(&self.textures));
        let targets = ClearTargets {
            color: fb.write_attachment().is_some(),
            depth: ds_format.is_some_and(format::vk_format_has_depth),
            stencil: ds_format.is_some_and(format::vk_format_has_stencil),
        };
        let plan = ClearPlan::new(mask, &self.state, targets);
        let target = self.draw_target();
        let rect = self.state.vk_scissor(target);
        if plan.is_empty() || rect.extent.width == 0 || rect.extent.height == 0 {
            return Ok(());
        }

        let depth_write = self.state.depth_write_enabled() || plan.depth;
        let stencil_write = self.state.stencil_write_enabled() || plan.writes_stencil();
        let cmd = self.ensure_render_pass(framebuffer, depth_write, stencil_write)?;

        let ops = &self.state.framebuffer_operations;
        let attachments = plan.attachments(ops.clear_color(), ops.clear_depth(), ops.clear_stencil());
        if !attachments.is_empty() {
            let clear_rect = vk::ClearRect {
                rect,
                base_array_layer: 0,
                layer_count: 1,
            };
            unsafe { device.logical.cmd_clear_attachments(cmd, &attachments, &[clear_rect]) };
        }
        if let Some(masked) = plan.masked {
            self.record_masked_clear(cmd, framebuffer, masked, target, rect)?;
        }
        Ok(())
    }

    fn record_masked_clear(
        &mut self,
        cmd: vk::CommandBuffer,
        framebuffer: FramebufferHandle,
        masked: MaskedClear,
        target: DrawTarget,
        scissor: vk::Rect2D,
    ) -> Result<()> {
        let device = self.device.clone().ok_or_eyre("Context has no device")?;
        if self.clear_masks != Some(masked) {
            masked.configure(&mut self.clear_pipeline);
            self.clear_masks = Some(masked);
        }
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: target.width as f32,
            height: target.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        self.clear_pipeline.create_viewport_state(viewport, scissor);

        let fb = self.framebuffers.get(framebuffer).ok_or_eyre("Framebuffer no longer exists")?;
        let render_pass = fb.vk_render_pass().ok_or_eyre("Framebuffer has no render pass")?;
        let color_attachment_count = u32::from(fb.write_attachment().is_some());

        if self.clear_program.is_none() {
            self.clear_program = Some(ShaderProgram::new(clear_program_desc()?, Some(device.clone())));
        }
        let program = self.clear_program.as_mut().ok_or_eyre("Clear program is missing")?;
        let layout = program.pipeline_layout()?;
        let pipeline_target = PipelineTarget {
            render_pass,
            layout,
            vertex_module: program.vertex_module()?,
            fragment_module: program.fragment_module()?,
            color_attachment_count,
        };
        self.clear_pipeline.bind(cmd, pipeline_target)?;

        let color = self.state.framebuffer_operations.clear_color().to_array();
        unsafe {
            device.logical.cmd_push_constants(
                cmd,
                layout,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::cast_slice(&color),
            );
            device.logical.cmd_draw(cmd, 3, 1, 0, 0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GloveConfig;

    const ALL: ClearTargets = ClearTargets { color: true, depth: true, stencil: true };

    fn manager() -> StateManager {
        StateManager::new(&GloveConfig::default())
    }

    #[test]
    fn full_masks_clear_attachments() {
        let state = manager();
        let plan = ClearPlan::new(CLEAR_BITS, &state, ALL);
        assert!(plan.color && plan.depth && plan.stencil);
        assert_eq!(plan.masked, None);

        let attachments = plan.attachments(Vec4::ONE, 1.0, 0);
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(attachments[1].aspect_mask, vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
    }

    #[test]
    fn partial_color_mask_draws_instead() {
        let mut state = manager();
        state.framebuffer_operations.update_color_write_mask(true, false, true, false);
        let plan = ClearPlan::new(GL_COLOR_BUFFER_BIT, &state, ALL);
        assert!(!plan.color);
        let masked = plan.masked.unwrap();
        assert_eq!(masked.color_write_mask, vk::ColorComponentFlags::R | vk::ColorComponentFlags::B);
        assert_eq!(masked.stencil_write_mask, 0);
        assert!(plan.attachments(Vec4::ONE, 1.0, 0).is_empty());
    }

    #[test]
    fn disabled_masks_skip_the_clear() {
        let mut state = manager();
        state.framebuffer_operations.update_color_write_mask(false, false, false, false);
        state.framebuffer_operations.update_depth_write_mask(false);
        state.fragment_operations.update_stencil_write_mask(GL_FRONT_AND_BACK, 0);
        assert!(ClearPlan::new(CLEAR_BITS, &state, ALL).is_empty());
    }

    #[test]
    fn partial_stencil_mask_replaces_through_the_mask() {
        let mut state = manager();
        state.fragment_operations.update_stencil_write_mask(GL_FRONT_AND_BACK, 0x0f);
        state.framebuffer_operations.update_clear_stencil(0x1a5);
        let plan = ClearPlan::new(GL_STENCIL_BUFFER_BIT | GL_DEPTH_BUFFER_BIT, &state, ALL);
        assert!(plan.depth);
        assert!(!plan.stencil);
        assert!(plan.writes_stencil());
        let masked = plan.masked.unwrap();
        assert_eq!(masked.stencil_write_mask, 0x0f);
        assert_eq!(masked.stencil_reference, 0xa5);

        let mut pipeline = Pipeline::new(None);
        masked.configure(&mut pipeline);
        assert_eq!(pipeline.generation(), 1);
        let depth_stencil = pipeline.depth_stencil();
        assert!(depth_stencil.stencil_test_enable);
        assert!(!depth_stencil.depth_write_enable);
        assert_eq!(depth_stencil.front.compare_op, vk::CompareOp::ALWAYS);
        assert_eq!(depth_stencil.front.pass_op, vk::StencilOp::REPLACE);
        assert_eq!(depth_stencil.front.write_mask, 0x0f);
        assert_eq!(depth_stencil.back.reference, 0xa5);
        assert!(pipeline.color_blend().attachment.color_write_mask.is_empty());
    }

    #[test]
    fn missing_aspects_are_not_cleared() {
        let state = manager();
        let targets = ClearTargets { color: true, depth: true, stencil: false };
        let plan = ClearPlan::new(CLEAR_BITS, &state, targets);
        assert!(plan.color && plan.depth);
        assert!(!plan.writes_stencil());
        let attachments = plan.attachments(Vec4::ZERO, 0.5, 3);
        assert_eq!(attachments[1].aspect_mask, vk::ImageAspectFlags::DEPTH);
    }
}
