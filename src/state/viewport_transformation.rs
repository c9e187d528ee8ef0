//! Viewport rectangle and depth range.

use crate::util::Rect;
use super::{update, update_f32};

pub struct StateViewportTransformation {
    viewport: Rect,
    min_depth: f32,
    max_depth: f32,
}

impl Default for StateViewportTransformation {
    fn default() -> Self {
        Self {
            viewport: Rect::new(0, 0, 0, 0),
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl StateViewportTransformation {
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn min_depth(&self) -> f32 {
        self.min_depth
    }

    pub fn max_depth(&self) -> f32 {
        self.max_depth
    }

    pub fn update_viewport(&mut self, rect: Rect) -> bool {
        update(&mut self.viewport, rect)
    }

    /// Both bounds are clamped to [0, 1] before comparing.
    pub fn update_depth_range(&mut self, near: f32, far: f32) -> bool {
        let near_changed = update_f32(&mut self.min_depth, near.clamp(0.0, 1.0));
        update_f32(&mut self.max_depth, far.clamp(0.0, 1.0)) || near_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_range_clamps_before_compare() {
        let mut state = StateViewportTransformation::default();
        assert!(!state.update_depth_range(-1.0, 4.0));
        assert!(state.update_depth_range(0.25, 4.0));
        assert_eq!((state.min_depth(), state.max_depth()), (0.25, 1.0));
    }

    #[test]
    fn viewport_compare_and_set() {
        let mut state = StateViewportTransformation::default();
        assert!(state.update_viewport(Rect::new(0, 0, 64, 32)));
        assert!(!state.update_viewport(Rect::new(0, 0, 64, 32)));
    }
}
