//! OpenGL ES state tracking on top of Vulkan.
//!
//! GL calls only record state. Vulkan objects (images, samplers, render
//! passes, pipelines, buffers) are synthesized lazily the first time a draw,
//! clear or transfer needs them, and rebuilt only when the state they were
//! built from has changed.

pub mod config;
pub mod context;
pub mod error;
pub mod gl;
pub mod logging;
pub mod resources;
pub mod state;
pub mod util;
pub mod vk;

pub use config::GloveConfig;
pub use context::{Context, EGLSurfaceInterface, SurfaceType};
pub use error::{GlError, GlResult};
pub use resources::{ProgramDesc, SamplerBinding};
