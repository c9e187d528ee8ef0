use crate::error::{GlError, GlResult};
use crate::gl::*;
use super::update;

pub struct StateHintAspects {
    generate_mipmap_hint: GLenum,
}

impl Default for StateHintAspects {
    fn default() -> Self {
        Self {
            generate_mipmap_hint: GL_DONT_CARE,
        }
    }
}

impl StateHintAspects {
    pub fn generate_mipmap_hint(&self) -> GLenum {
        self.generate_mipmap_hint
    }

    pub fn update_hint(&mut self, target: GLenum, mode: GLenum) -> GlResult<bool> {
        if !matches!(mode, GL_FASTEST | GL_NICEST | GL_DONT_CARE) {
            return Err(GlError::InvalidEnum);
        }
        match target {
            GL_GENERATE_MIPMAP_HINT => Ok(update(&mut self.generate_mipmap_hint, mode)),
            _ => Err(GlError::InvalidEnum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mipmap_hint_compare_and_set() {
        let mut state = StateHintAspects::default();
        assert_eq!(state.update_hint(GL_GENERATE_MIPMAP_HINT, GL_NICEST), Ok(true));
        assert_eq!(state.update_hint(GL_GENERATE_MIPMAP_HINT, GL_NICEST), Ok(false));
        assert_eq!(state.update_hint(GL_GENERATE_MIPMAP_HINT, GL_LINEAR), Err(GlError::InvalidEnum));
        assert_eq!(state.update_hint(GL_BLEND, GL_FASTEST), Err(GlError::InvalidEnum));
    }
}
