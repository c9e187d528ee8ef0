//! Objects bound to the context's binding points.

use crate::error::{GlError, GlResult};
use crate::gl::*;
use crate::resources::{BufferHandle, FramebufferHandle, ProgramHandle, TextureHandle};
use super::update;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextureUnit {
    texture_2d: Option<TextureHandle>,
    texture_cube: Option<TextureHandle>,
}

pub struct StateActiveObjects {
    active_texture_unit: usize,
    texture_units: Vec<TextureUnit>,
    array_buffer: Option<BufferHandle>,
    element_array_buffer: Option<BufferHandle>,
    // None selects the system (window surface) framebuffer
    framebuffer: Option<FramebufferHandle>,
    renderbuffer: Option<TextureHandle>,
    program: Option<ProgramHandle>,
}

impl StateActiveObjects {
    pub fn new(max_texture_units: usize) -> Self {
        Self {
            active_texture_unit: 0,
            texture_units: vec![TextureUnit::default(); max_texture_units],
            array_buffer: None,
            element_array_buffer: None,
            framebuffer: None,
            renderbuffer: None,
            program: None,
        }
    }

    pub fn active_texture_unit(&self) -> usize {
        self.active_texture_unit
    }

    pub fn texture_unit_count(&self) -> usize {
        self.texture_units.len()
    }

    pub fn bound_texture(&self, unit: usize, target: GLenum) -> Option<TextureHandle> {
        let unit = self.texture_units.get(unit)?;
        match target {
            GL_TEXTURE_CUBE_MAP => unit.texture_cube,
            _ => unit.texture_2d,
        }
    }

    pub fn active_texture(&self, target: GLenum) -> Option<TextureHandle> {
        self.bound_texture(self.active_texture_unit, target)
    }

    pub fn array_buffer(&self) -> Option<BufferHandle> {
        self.array_buffer
    }

    pub fn element_array_buffer(&self) -> Option<BufferHandle> {
        self.element_array_buffer
    }

    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    pub fn renderbuffer(&self) -> Option<TextureHandle> {
        self.renderbuffer
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// `unit` is the `GL_TEXTUREi` enum.
    pub fn update_active_texture(&mut self, unit: GLenum) -> GlResult<bool> {
        let index = unit.wrapping_sub(GL_TEXTURE0) as usize;
        if index >= self.texture_units.len() {
            return Err(GlError::InvalidEnum);
        }
        Ok(update(&mut self.active_texture_unit, index))
    }

    /// Bind to the active unit. Returns the handle previously bound there.
    pub fn update_texture(&mut self, target: GLenum, texture: Option<TextureHandle>) -> Option<TextureHandle> {
        let unit = &mut self.texture_units[self.active_texture_unit];
        let slot = match target {
            GL_TEXTURE_CUBE_MAP => &mut unit.texture_cube,
            _ => &mut unit.texture_2d,
        };
        std::mem::replace(slot, texture)
    }

    /// Unbind `texture` from every unit and the renderbuffer binding.
    /// Returns how many bindings were cleared.
    pub fn unbind_texture(&mut self, texture: TextureHandle) -> usize {
        let mut cleared = 0;
        for unit in &mut self.texture_units {
            for slot in [&mut unit.texture_2d, &mut unit.texture_cube] {
                if *slot == Some(texture) {
                    *slot = None;
                    cleared += 1;
                }
            }
        }
        if self.renderbuffer == Some(texture) {
            self.renderbuffer = None;
            cleared += 1;
        }
        cleared
    }

    pub fn update_buffer(&mut self, target: GLenum, buffer: Option<BufferHandle>) -> GlResult<Option<BufferHandle>> {
        let slot = match target {
            GL_ARRAY_BUFFER => &mut self.array_buffer,
            GL_ELEMENT_ARRAY_BUFFER => &mut self.element_array_buffer,
            _ => return Err(GlError::InvalidEnum),
        };
        Ok(std::mem::replace(slot, buffer))
    }

    pub fn unbind_buffer(&mut self, buffer: BufferHandle) -> usize {
        let mut cleared = 0;
        for slot in [&mut self.array_buffer, &mut self.element_array_buffer] {
            if *slot == Some(buffer) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn update_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> bool {
        update(&mut self.framebuffer, framebuffer)
    }

    pub fn update_renderbuffer(&mut self, renderbuffer: Option<TextureHandle>) -> Option<TextureHandle> {
        std::mem::replace(&mut self.renderbuffer, renderbuffer)
    }

    pub fn update_program(&mut self, program: Option<ProgramHandle>) -> Option<ProgramHandle> {
        std::mem::replace(&mut self.program, program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn active_texture_range_is_checked() {
        let mut state = StateActiveObjects::new(8);
        assert_eq!(state.update_active_texture(GL_TEXTURE0 + 3), Ok(true));
        assert_eq!(state.update_active_texture(GL_TEXTURE0 + 3), Ok(false));
        assert_eq!(state.update_active_texture(GL_TEXTURE0 + 8), Err(GlError::InvalidEnum));
        assert_eq!(state.update_active_texture(GL_TEXTURE_2D), Err(GlError::InvalidEnum));
        assert_eq!(state.active_texture_unit(), 3);
    }

    #[test]
    fn texture_bindings_are_per_unit_and_target() {
        let mut handles: SlotMap<TextureHandle, ()> = SlotMap::with_key();
        let (a, b) = (handles.insert(()), handles.insert(()));
        let mut state = StateActiveObjects::new(2);
        assert_eq!(state.update_texture(GL_TEXTURE_2D, Some(a)), None);
        state.update_active_texture(GL_TEXTURE0 + 1).unwrap();
        state.update_texture(GL_TEXTURE_CUBE_MAP, Some(b));
        assert_eq!(state.bound_texture(0, GL_TEXTURE_2D), Some(a));
        assert_eq!(state.bound_texture(1, GL_TEXTURE_CUBE_MAP), Some(b));
        assert_eq!(state.active_texture(GL_TEXTURE_2D), None);
        assert_eq!(state.unbind_texture(a), 1);
        assert_eq!(state.bound_texture(0, GL_TEXTURE_2D), None);
    }

    #[test]
    fn buffer_targets_are_validated() {
        let mut handles: SlotMap<BufferHandle, ()> = SlotMap::with_key();
        let buffer = handles.insert(());
        let mut state = StateActiveObjects::new(1);
        assert_eq!(state.update_buffer(GL_ARRAY_BUFFER, Some(buffer)), Ok(None));
        assert_eq!(state.update_buffer(GL_TEXTURE_2D, None), Err(GlError::InvalidEnum));
        assert_eq!(state.unbind_buffer(buffer), 1);
        assert_eq!(state.array_buffer(), None);
    }
}
