//! Whole-framebuffer operations: write masks and clear values.

use glam::{BVec4, Vec4};
use super::{update, update_f32, update_vec4};

pub struct StateFramebufferOperations {
    color_write_mask: BVec4,
    depth_write_mask: bool,
    clear_color: Vec4,
    clear_depth: f32,
    clear_stencil: i32,
}

impl Default for StateFramebufferOperations {
    fn default() -> Self {
        Self {
            color_write_mask: BVec4::TRUE,
            depth_write_mask: true,
            clear_color: Vec4::ZERO,
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

impl StateFramebufferOperations {
    pub fn color_write_mask(&self) -> BVec4 {
        self.color_write_mask
    }

    pub fn depth_write_mask(&self) -> bool {
        self.depth_write_mask
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    pub fn clear_stencil(&self) -> i32 {
        self.clear_stencil
    }

    pub fn update_color_write_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) -> bool {
        update(&mut self.color_write_mask, BVec4::new(red, green, blue, alpha))
    }

    pub fn update_depth_write_mask(&mut self, enabled: bool) -> bool {
        update(&mut self.depth_write_mask, enabled)
    }

    /// Components are clamped to [0, 1] before comparing.
    pub fn update_clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) -> bool {
        let color = Vec4::new(red, green, blue, alpha).clamp(Vec4::ZERO, Vec4::ONE);
        update_vec4(&mut self.clear_color, color)
    }

    pub fn update_clear_depth(&mut self, depth: f32) -> bool {
        update_f32(&mut self.clear_depth, depth.clamp(0.0, 1.0))
    }

    pub fn update_clear_stencil(&mut self, stencil: i32) -> bool {
        update(&mut self.clear_stencil, stencil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_clamps_before_compare() {
        let mut state = StateFramebufferOperations::default();
        assert!(state.update_clear_color(1.5, -0.5, 0.5, 0.5));
        assert_eq!(state.clear_color(), Vec4::new(1.0, 0.0, 0.5, 0.5));
        assert!(!state.update_clear_color(1.5, -0.5, 0.5, 0.5));
    }

    #[test]
    fn clear_depth_out_of_range_matching_stored_is_unchanged() {
        let mut state = StateFramebufferOperations::default();
        assert!(!state.update_clear_depth(2.0));
        assert!(state.update_clear_depth(-1.0));
        assert_eq!(state.clear_depth(), 0.0);
    }

    #[test]
    fn masks_compare_and_set() {
        let mut state = StateFramebufferOperations::default();
        assert!(!state.update_color_write_mask(true, true, true, true));
        assert!(state.update_color_write_mask(true, false, true, true));
        assert!(!state.update_color_write_mask(true, false, true, true));
        assert!(state.update_depth_write_mask(false));
        assert!(!state.update_depth_write_mask(false));
        assert!(state.update_clear_stencil(3));
        assert!(!state.update_clear_stencil(3));
    }
}
