//! GL objects backed by lazily synthesized Vulkan resources.

pub mod arena;
pub mod buffer_object;
pub mod framebuffer;
pub mod program;
pub mod texture;

pub use arena::{BufferHandle, FramebufferHandle, NameTable, ProgramHandle, ResourceArena, TextureHandle};
pub use buffer_object::BufferObject;
pub use framebuffer::{Attachment, Framebuffer, TextureArena};
pub use program::{ProgramDesc, SamplerBinding, ShaderProgram};
pub use texture::Texture;
