//! Per-fragment operations: scissor, stencil, depth test, blending, coverage.

use glam::Vec4;
use crate::gl::*;
use crate::util::Rect;
use super::{update, update_f32, update_vec4};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StencilFace {
    pub func: GLenum,
    pub reference: GLint,
    pub compare_mask: GLuint,
    pub write_mask: GLuint,
    pub fail: GLenum,
    pub depth_fail: GLenum,
    pub depth_pass: GLenum,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            func: GL_ALWAYS,
            reference: 0,
            compare_mask: GLuint::MAX,
            write_mask: GLuint::MAX,
            fail: GL_KEEP,
            depth_fail: GL_KEEP,
            depth_pass: GL_KEEP,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendFunction {
    pub src_rgb: GLenum,
    pub dst_rgb: GLenum,
    pub src_alpha: GLenum,
    pub dst_alpha: GLenum,
}

impl Default for BlendFunction {
    fn default() -> Self {
        Self {
            src_rgb: GL_ONE,
            dst_rgb: GL_ZERO,
            src_alpha: GL_ONE,
            dst_alpha: GL_ZERO,
        }
    }
}

/// Selects the stencil faces a separate call applies to.
fn faces(face: GLenum) -> (bool, bool) {
    match face {
        GL_FRONT => (true, false),
        GL_BACK => (false, true),
        _ => (true, true),
    }
}

pub struct StateFragmentOperations {
    scissor_test_enabled: bool,
    scissor_rect: Rect,

    stencil_test_enabled: bool,
    stencil_front: StencilFace,
    stencil_back: StencilFace,

    depth_test_enabled: bool,
    depth_func: GLenum,

    blending_enabled: bool,
    blending_color: Vec4,
    blending_equation_rgb: GLenum,
    blending_equation_alpha: GLenum,
    blending_function: BlendFunction,

    logic_op_enabled: bool,
    logic_op: GLenum,

    dither_enabled: bool,

    sample_alpha_to_coverage_enabled: bool,
    sample_coverage_enabled: bool,
    sample_coverage_value: f32,
    sample_coverage_invert: bool,
}

impl Default for StateFragmentOperations {
    fn default() -> Self {
        Self {
            scissor_test_enabled: false,
            scissor_rect: Rect::new(0, 0, 0, 0),

            stencil_test_enabled: false,
            stencil_front: StencilFace::default(),
            stencil_back: StencilFace::default(),

            depth_test_enabled: false,
            depth_func: GL_LESS,

            blending_enabled: false,
            blending_color: Vec4::ZERO,
            blending_equation_rgb: GL_FUNC_ADD,
            blending_equation_alpha: GL_FUNC_ADD,
            blending_function: BlendFunction::default(),

            logic_op_enabled: false,
            logic_op: GL_COPY,

            dither_enabled: true,

            sample_alpha_to_coverage_enabled: false,
            sample_coverage_enabled: false,
            sample_coverage_value: 1.0,
            sample_coverage_invert: false,
        }
    }
}

impl StateFragmentOperations {
    pub fn scissor_test_enabled(&self) -> bool {
        self.scissor_test_enabled
    }

    pub fn scissor_rect(&self) -> Rect {
        self.scissor_rect
    }

    pub fn stencil_test_enabled(&self) -> bool {
        self.stencil_test_enabled
    }

    pub fn stencil_front(&self) -> &StencilFace {
        &self.stencil_front
    }

    pub fn stencil_back(&self) -> &StencilFace {
        &self.stencil_back
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.depth_test_enabled
    }

    pub fn depth_func(&self) -> GLenum {
        self.depth_func
    }

    pub fn blending_enabled(&self) -> bool {
        self.blending_enabled
    }

    pub fn blending_color(&self) -> Vec4 {
        self.blending_color
    }

    pub fn blending_equation_rgb(&self) -> GLenum {
        self.blending_equation_rgb
    }

    pub fn blending_equation_alpha(&self) -> GLenum {
        self.blending_equation_alpha
    }

    pub fn blending_function(&self) -> &BlendFunction {
        &self.blending_function
    }

    pub fn logic_op_enabled(&self) -> bool {
        self.logic_op_enabled
    }

    pub fn logic_op(&self) -> GLenum {
        self.logic_op
    }

    pub fn dither_enabled(&self) -> bool {
        self.dither_enabled
    }

    pub fn sample_alpha_to_coverage_enabled(&self) -> bool {
        self.sample_alpha_to_coverage_enabled
    }

    pub fn sample_coverage_enabled(&self) -> bool {
        self.sample_coverage_enabled
    }

    pub fn sample_coverage_value(&self) -> f32 {
        self.sample_coverage_value
    }

    pub fn sample_coverage_invert(&self) -> bool {
        self.sample_coverage_invert
    }

    pub fn update_scissor_test_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.scissor_test_enabled, enabled)
    }

    pub fn update_scissor_rect(&mut self, rect: Rect) -> bool {
        update(&mut self.scissor_rect, rect)
    }

    pub fn update_stencil_test_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.stencil_test_enabled, enabled)
    }

    pub fn update_stencil_func(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) -> bool {
        let (front, back) = faces(face);
        let mut changed = false;
        for (apply, state) in [(front, &mut self.stencil_front), (back, &mut self.stencil_back)] {
            if apply {
                changed |= update(&mut state.func, func);
                changed |= update(&mut state.reference, reference);
                changed |= update(&mut state.compare_mask, mask);
            }
        }
        changed
    }

    pub fn update_stencil_op(&mut self, face: GLenum, fail: GLenum, depth_fail: GLenum, depth_pass: GLenum) -> bool {
        let (front, back) = faces(face);
        let mut changed = false;
        for (apply, state) in [(front, &mut self.stencil_front), (back, &mut self.stencil_back)] {
            if apply {
                changed |= update(&mut state.fail, fail);
                changed |= update(&mut state.depth_fail, depth_fail);
                changed |= update(&mut state.depth_pass, depth_pass);
            }
        }
        changed
    }

    pub fn update_stencil_write_mask(&mut self, face: GLenum, mask: GLuint) -> bool {
        let (front, back) = faces(face);
        let mut changed = false;
        if front {
            changed |= update(&mut self.stencil_front.write_mask, mask);
        }
        if back {
            changed |= update(&mut self.stencil_back.write_mask, mask);
        }
        changed
    }

    pub fn update_depth_test_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.depth_test_enabled, enabled)
    }

    pub fn update_depth_func(&mut self, func: GLenum) -> bool {
        update(&mut self.depth_func, func)
    }

    pub fn update_blending_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.blending_enabled, enabled)
    }

    /// Components are clamped to [0, 1] before comparing.
    pub fn update_blending_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) -> bool {
        let color = Vec4::new(red, green, blue, alpha).clamp(Vec4::ZERO, Vec4::ONE);
        update_vec4(&mut self.blending_color, color)
    }

    pub fn update_blending_equation(&mut self, rgb: GLenum, alpha: GLenum) -> bool {
        let rgb_changed = update(&mut self.blending_equation_rgb, rgb);
        update(&mut self.blending_equation_alpha, alpha) || rgb_changed
    }

    pub fn update_blending_function(&mut self, function: BlendFunction) -> bool {
        update(&mut self.blending_function, function)
    }

    pub fn update_logic_op_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.logic_op_enabled, enabled)
    }

    pub fn update_logic_op(&mut self, op: GLenum) -> bool {
        update(&mut self.logic_op, op)
    }

    pub fn update_dither_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.dither_enabled, enabled)
    }

    pub fn update_sample_alpha_to_coverage_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.sample_alpha_to_coverage_enabled, enabled)
    }

    pub fn update_sample_coverage_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.sample_coverage_enabled, enabled)
    }

    pub fn update_sample_coverage(&mut self, value: f32, invert: bool) -> bool {
        let value_changed = update_f32(&mut self.sample_coverage_value, value.clamp(0.0, 1.0));
        update(&mut self.sample_coverage_invert, invert) || value_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_update_reports_unchanged() {
        let mut state = StateFragmentOperations::default();
        assert!(state.update_blending_enabled(true));
        assert!(!state.update_blending_enabled(true));
        assert!(state.update_depth_func(GL_LEQUAL));
        assert!(!state.update_depth_func(GL_LEQUAL));
        assert!(!state.update_dither_enabled(true));
    }

    #[test]
    fn blend_color_clamps_before_compare() {
        let mut state = StateFragmentOperations::default();
        assert!(state.update_blending_color(1.5, -0.5, 0.5, 0.5));
        assert_eq!(state.blending_color(), Vec4::new(1.0, 0.0, 0.5, 0.5));
        assert!(!state.update_blending_color(1.5, -0.5, 0.5, 0.5));
        assert!(!state.update_blending_color(1.0, 0.0, 0.5, 0.5));
    }

    #[test]
    fn separate_stencil_touches_one_face() {
        let mut state = StateFragmentOperations::default();
        assert!(state.update_stencil_func(GL_BACK, GL_EQUAL, 1, 0xff));
        assert_eq!(state.stencil_front().func, GL_ALWAYS);
        assert_eq!(state.stencil_back().func, GL_EQUAL);
        assert!(state.update_stencil_op(GL_FRONT_AND_BACK, GL_ZERO, GL_KEEP, GL_INCR));
        assert_eq!(state.stencil_front().depth_pass, GL_INCR);
        assert_eq!(state.stencil_back().fail, GL_ZERO);
        assert!(!state.update_stencil_op(GL_FRONT, GL_ZERO, GL_KEEP, GL_INCR));
    }

    #[test]
    fn equation_change_in_either_channel_is_reported() {
        let mut state = StateFragmentOperations::default();
        assert!(state.update_blending_equation(GL_FUNC_ADD, GL_FUNC_SUBTRACT));
        assert!(!state.update_blending_equation(GL_FUNC_ADD, GL_FUNC_SUBTRACT));
        assert!(state.update_blending_equation(GL_FUNC_REVERSE_SUBTRACT, GL_FUNC_SUBTRACT));
    }

    #[test]
    fn sample_coverage_value_is_clamped() {
        let mut state = StateFragmentOperations::default();
        assert!(!state.update_sample_coverage(3.0, false));
        assert!(state.update_sample_coverage(0.5, true));
        assert_eq!(state.sample_coverage_value(), 0.5);
    }
}
