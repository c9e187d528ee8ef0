//! Thin wrappers over the Vulkan objects the core synthesizes.

pub mod buffer;
pub mod device;
pub mod frame;
pub mod image;
pub mod instance;
pub mod pipeline;
pub mod queue;
pub mod render_pass;
pub mod sampler;
pub mod transfer_context;

pub use device::VulkanDevice;
