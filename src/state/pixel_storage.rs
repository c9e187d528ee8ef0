use crate::error::{GlError, GlResult};
use crate::gl::*;
use super::update;

/// Row alignments used when reading client pixel data (unpack) and writing
/// it back (pack).
pub struct StatePixelStorage {
    pack_alignment: u32,
    unpack_alignment: u32,
}

impl Default for StatePixelStorage {
    fn default() -> Self {
        Self {
            pack_alignment: 4,
            unpack_alignment: 4,
        }
    }
}

impl StatePixelStorage {
    pub fn pack_alignment(&self) -> u32 {
        self.pack_alignment
    }

    pub fn unpack_alignment(&self) -> u32 {
        self.unpack_alignment
    }

    pub fn update_pixel_store(&mut self, pname: GLenum, param: GLint) -> GlResult<bool> {
        if !is_valid_alignment(param) {
            return Err(GlError::InvalidValue);
        }
        match pname {
            GL_PACK_ALIGNMENT => Ok(update(&mut self.pack_alignment, param as u32)),
            GL_UNPACK_ALIGNMENT => Ok(update(&mut self.unpack_alignment, param as u32)),
            _ => Err(GlError::InvalidEnum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_must_be_power_of_two_up_to_eight() {
        let mut state = StatePixelStorage::default();
        assert_eq!(state.update_pixel_store(GL_UNPACK_ALIGNMENT, 1), Ok(true));
        assert_eq!(state.update_pixel_store(GL_UNPACK_ALIGNMENT, 1), Ok(false));
        assert_eq!(state.update_pixel_store(GL_PACK_ALIGNMENT, 3), Err(GlError::InvalidValue));
        assert_eq!(state.update_pixel_store(GL_BLEND, 4), Err(GlError::InvalidEnum));
        assert_eq!(state.pack_alignment(), 4);
    }
}
