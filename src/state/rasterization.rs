//! Rasterization: culling, winding, line width, polygon offset.

use crate::gl::*;
use super::{update, update_f32};

pub struct StateRasterization {
    culling_enabled: bool,
    cull_face: GLenum,
    front_face: GLenum,
    line_width: f32,
    polygon_offset_fill_enabled: bool,
    polygon_offset_factor: f32,
    polygon_offset_units: f32,
    rasterizer_discard_enabled: bool,
    // Derived from the primitive mode of the last draw
    polygon_mode: GLenum,
}

impl Default for StateRasterization {
    fn default() -> Self {
        Self {
            culling_enabled: false,
            cull_face: GL_BACK,
            front_face: GL_CCW,
            line_width: 1.0,
            polygon_offset_fill_enabled: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            rasterizer_discard_enabled: false,
            polygon_mode: GL_FILL,
        }
    }
}

impl StateRasterization {
    pub fn culling_enabled(&self) -> bool {
        self.culling_enabled
    }

    pub fn cull_face(&self) -> GLenum {
        self.cull_face
    }

    pub fn front_face(&self) -> GLenum {
        self.front_face
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn polygon_offset_fill_enabled(&self) -> bool {
        self.polygon_offset_fill_enabled
    }

    pub fn polygon_offset_factor(&self) -> f32 {
        self.polygon_offset_factor
    }

    pub fn polygon_offset_units(&self) -> f32 {
        self.polygon_offset_units
    }

    pub fn rasterizer_discard_enabled(&self) -> bool {
        self.rasterizer_discard_enabled
    }

    pub fn polygon_mode(&self) -> GLenum {
        self.polygon_mode
    }

    pub fn update_culling_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.culling_enabled, enabled)
    }

    pub fn update_cull_face(&mut self, mode: GLenum) -> bool {
        update(&mut self.cull_face, mode)
    }

    pub fn update_front_face(&mut self, mode: GLenum) -> bool {
        update(&mut self.front_face, mode)
    }

    pub fn update_line_width(&mut self, width: f32) -> bool {
        update_f32(&mut self.line_width, width)
    }

    pub fn update_polygon_offset_fill_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.polygon_offset_fill_enabled, enabled)
    }

    pub fn update_polygon_offset(&mut self, factor: f32, units: f32) -> bool {
        let factor_changed = update_f32(&mut self.polygon_offset_factor, factor);
        update_f32(&mut self.polygon_offset_units, units) || factor_changed
    }

    pub fn update_rasterizer_discard_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.rasterizer_discard_enabled, enabled)
    }

    /// Points and lines rasterize with the matching polygon mode; everything
    /// else fills.
    pub fn update_polygon_mode(&mut self, primitive_mode: GLenum) -> bool {
        let mode = match primitive_mode {
            GL_POINTS => GL_POINT,
            GL_LINES | GL_LINE_LOOP | GL_LINE_STRIP => GL_LINE,
            _ => GL_FILL,
        };
        update(&mut self.polygon_mode, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_mode_follows_primitive_class() {
        let mut state = StateRasterization::default();
        assert!(!state.update_polygon_mode(GL_TRIANGLES));
        assert!(state.update_polygon_mode(GL_LINE_LOOP));
        assert_eq!(state.polygon_mode(), GL_LINE);
        assert!(!state.update_polygon_mode(GL_LINES));
        assert!(state.update_polygon_mode(GL_POINTS));
        assert_eq!(state.polygon_mode(), GL_POINT);
    }

    #[test]
    fn polygon_offset_reports_either_change() {
        let mut state = StateRasterization::default();
        assert!(!state.update_polygon_offset(0.0, 0.0));
        assert!(state.update_polygon_offset(0.0, 2.0));
        assert!(state.update_polygon_offset(1.0, 2.0));
        assert!(!state.update_polygon_offset(1.0, 2.0));
    }

    #[test]
    fn cull_and_winding_compare_and_set() {
        let mut state = StateRasterization::default();
        assert!(!state.update_cull_face(GL_BACK));
        assert!(state.update_cull_face(GL_FRONT));
        assert!(state.update_front_face(GL_CW));
        assert!(!state.update_front_face(GL_CW));
        assert!(state.update_line_width(2.0));
    }
}
