use crate::gl::*;

/// Recoverable GL errors. The offending call leaves state untouched.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    #[error("GL_INVALID_ENUM")]
    InvalidEnum,

    #[error("GL_INVALID_VALUE")]
    InvalidValue,

    #[error("GL_INVALID_OPERATION")]
    InvalidOperation,

    #[error("GL_OUT_OF_MEMORY")]
    OutOfMemory,

    #[error("GL_INVALID_FRAMEBUFFER_OPERATION")]
    InvalidFramebufferOperation,
}

impl GlError {
    pub fn code(self) -> GLenum {
        match self {
            Self::InvalidEnum => GL_INVALID_ENUM,
            Self::InvalidValue => GL_INVALID_VALUE,
            Self::InvalidOperation => GL_INVALID_OPERATION,
            Self::OutOfMemory => GL_OUT_OF_MEMORY,
            Self::InvalidFramebufferOperation => GL_INVALID_FRAMEBUFFER_OPERATION,
        }
    }
}

pub type GlResult<T> = std::result::Result<T, GlError>;
