//! Fixed-function state calls. Each validates its arguments, forwards to a
//! state category and marks the pipeline or viewport dirty when the category
//! reports a change.

use crate::error::GlError;
use crate::gl::*;
use crate::state::{vk_mappings, BlendFunction};
use crate::util::Rect;
use super::Context;

fn is_face(face: GLenum) -> bool {
    matches!(face, GL_FRONT | GL_BACK | GL_FRONT_AND_BACK)
}

impl Context {
    pub fn enable(&mut self, cap: GLenum) {
        self.set_capability(cap, true);
    }

    pub fn disable(&mut self, cap: GLenum) {
        self.set_capability(cap, false);
    }

    fn set_capability(&mut self, cap: GLenum, enabled: bool) {
        let state = &mut self.state;
        match cap {
            GL_BLEND => {
                let changed = state.fragment_operations.update_blending_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_CULL_FACE => {
                let changed = state.rasterization.update_culling_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_DEPTH_TEST => {
                let changed = state.fragment_operations.update_depth_test_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_STENCIL_TEST => {
                let changed = state.fragment_operations.update_stencil_test_enabled(enabled);
                self.mark_pipeline(changed);
            }
            // Tracked for queries only; Vulkan has no dithering control
            GL_DITHER => {
                state.fragment_operations.update_dither_enabled(enabled);
            }
            GL_SCISSOR_TEST => {
                let changed = state.fragment_operations.update_scissor_test_enabled(enabled);
                self.mark_viewport(changed);
            }
            GL_POLYGON_OFFSET_FILL => {
                let changed = state.rasterization.update_polygon_offset_fill_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_SAMPLE_ALPHA_TO_COVERAGE => {
                let changed = state.fragment_operations.update_sample_alpha_to_coverage_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_SAMPLE_COVERAGE => {
                let changed = state.fragment_operations.update_sample_coverage_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_PRIMITIVE_RESTART_FIXED_INDEX => {
                let changed = state.input_assembly.update_primitive_restart_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_RASTERIZER_DISCARD => {
                let changed = state.rasterization.update_rasterizer_discard_enabled(enabled);
                self.mark_pipeline(changed);
            }
            GL_COLOR_LOGIC_OP => {
                let changed = state.fragment_operations.update_logic_op_enabled(enabled);
                self.mark_pipeline(changed);
            }
            _ => self.state.set_error(GlError::InvalidEnum),
        }
    }

    pub fn is_enabled(&mut self, cap: GLenum) -> bool {
        let state = &self.state;
        match cap {
            GL_BLEND => state.fragment_operations.blending_enabled(),
            GL_CULL_FACE => state.rasterization.culling_enabled(),
            GL_DEPTH_TEST => state.fragment_operations.depth_test_enabled(),
            GL_STENCIL_TEST => state.fragment_operations.stencil_test_enabled(),
            GL_DITHER => state.fragment_operations.dither_enabled(),
            GL_SCISSOR_TEST => state.fragment_operations.scissor_test_enabled(),
            GL_POLYGON_OFFSET_FILL => state.rasterization.polygon_offset_fill_enabled(),
            GL_SAMPLE_ALPHA_TO_COVERAGE => state.fragment_operations.sample_alpha_to_coverage_enabled(),
            GL_SAMPLE_COVERAGE => state.fragment_operations.sample_coverage_enabled(),
            GL_PRIMITIVE_RESTART_FIXED_INDEX => state.input_assembly.primitive_restart_enabled(),
            GL_RASTERIZER_DISCARD => state.rasterization.rasterizer_discard_enabled(),
            GL_COLOR_LOGIC_OP => state.fragment_operations.logic_op_enabled(),
            _ => {
                self.state.set_error(GlError::InvalidEnum);
                false
            }
        }
    }

    pub fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        self.blend_func_separate(src, dst, src, dst);
    }

    pub fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        let valid = |factor: GLenum| vk_mappings::gl_blend_factor_to_vk(factor).is_some();
        let valid_dst = |factor: GLenum| valid(factor) && factor != GL_SRC_ALPHA_SATURATE;
        if !valid(src_rgb) || !valid(src_alpha) || !valid_dst(dst_rgb) || !valid_dst(dst_alpha) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_blending_function(BlendFunction {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        });
        self.mark_pipeline(changed);
    }

    pub fn blend_equation(&mut self, mode: GLenum) {
        self.blend_equation_separate(mode, mode);
    }

    pub fn blend_equation_separate(&mut self, rgb: GLenum, alpha: GLenum) {
        let valid = |mode: GLenum| vk_mappings::gl_blend_equation_to_vk(mode).is_some();
        if !valid(rgb) || !valid(alpha) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_blending_equation(rgb, alpha);
        self.mark_pipeline(changed);
    }

    pub fn blend_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        let changed = self.state.fragment_operations.update_blending_color(red, green, blue, alpha);
        self.mark_pipeline(changed);
    }

    pub fn logic_op(&mut self, op: GLenum) {
        if vk_mappings::gl_logic_op_to_vk(op).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_logic_op(op);
        self.mark_pipeline(changed);
    }

    pub fn depth_func(&mut self, func: GLenum) {
        if vk_mappings::gl_compare_func_to_vk(func).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_depth_func(func);
        self.mark_pipeline(changed);
    }

    pub fn depth_mask(&mut self, enabled: bool) {
        let changed = self.state.framebuffer_operations.update_depth_write_mask(enabled);
        self.mark_pipeline(changed);
    }

    pub fn depth_range(&mut self, near: f32, far: f32) {
        let changed = self.state.viewport_transformation.update_depth_range(near, far);
        self.mark_viewport(changed);
    }

    pub fn stencil_func(&mut self, func: GLenum, reference: GLint, mask: GLuint) {
        self.stencil_func_separate(GL_FRONT_AND_BACK, func, reference, mask);
    }

    pub fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        if !is_face(face) || vk_mappings::gl_compare_func_to_vk(func).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_stencil_func(face, func, reference, mask);
        self.mark_pipeline(changed);
    }

    pub fn stencil_op(&mut self, fail: GLenum, depth_fail: GLenum, depth_pass: GLenum) {
        self.stencil_op_separate(GL_FRONT_AND_BACK, fail, depth_fail, depth_pass);
    }

    pub fn stencil_op_separate(&mut self, face: GLenum, fail: GLenum, depth_fail: GLenum, depth_pass: GLenum) {
        let valid = |op: GLenum| vk_mappings::gl_stencil_op_to_vk(op).is_some();
        if !is_face(face) || !valid(fail) || !valid(depth_fail) || !valid(depth_pass) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_stencil_op(face, fail, depth_fail, depth_pass);
        self.mark_pipeline(changed);
    }

    pub fn stencil_mask(&mut self, mask: GLuint) {
        self.stencil_mask_separate(GL_FRONT_AND_BACK, mask);
    }

    pub fn stencil_mask_separate(&mut self, face: GLenum, mask: GLuint) {
        if !is_face(face) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.fragment_operations.update_stencil_write_mask(face, mask);
        self.mark_pipeline(changed);
    }

    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        let changed = self.state.framebuffer_operations.update_color_write_mask(red, green, blue, alpha);
        self.mark_pipeline(changed);
    }

    // Clear values are read by glClear only, never by the pipeline

    pub fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.framebuffer_operations.update_clear_color(red, green, blue, alpha);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.state.framebuffer_operations.update_clear_depth(depth);
    }

    pub fn clear_stencil(&mut self, stencil: GLint) {
        self.state.framebuffer_operations.update_clear_stencil(stencil);
    }

    pub fn cull_face(&mut self, mode: GLenum) {
        if !is_face(mode) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.rasterization.update_cull_face(mode);
        self.mark_pipeline(changed);
    }

    pub fn front_face(&mut self, mode: GLenum) {
        if vk_mappings::gl_front_face_to_vk(mode).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let changed = self.state.rasterization.update_front_face(mode);
        self.mark_pipeline(changed);
    }

    pub fn line_width(&mut self, width: f32) {
        if width <= 0.0 || width.is_nan() {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let changed = self.state.rasterization.update_line_width(width);
        self.mark_pipeline(changed);
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        let changed = self.state.rasterization.update_polygon_offset(factor, units);
        self.mark_pipeline(changed);
    }

    pub fn sample_coverage(&mut self, value: f32, invert: bool) {
        let changed = self.state.fragment_operations.update_sample_coverage(value, invert);
        self.mark_pipeline(changed);
    }

    pub fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        if width < 0 || height < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let changed = self.state.fragment_operations.update_scissor_rect(Rect::new(x, y, width, height));
        self.mark_viewport(changed);
    }

    pub fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        if width < 0 || height < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let changed = self.state.viewport_transformation.update_viewport(Rect::new(x, y, width, height));
        self.mark_viewport(changed);
    }

    pub fn pixel_store(&mut self, pname: GLenum, param: GLint) {
        let result = self.state.pixel_storage.update_pixel_store(pname, param);
        self.record(result);
    }

    pub fn hint(&mut self, target: GLenum, mode: GLenum) {
        let result = self.state.hint_aspects.update_hint(target, mode);
        self.record(result);
    }

    pub fn active_texture(&mut self, unit: GLenum) {
        let result = self.state.active_objects.update_active_texture(unit);
        self.record(result);
    }
}
