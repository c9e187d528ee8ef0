use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use crate::vk::device::VulkanDevice;

/// Vulkan-side sampling parameters of a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    pub min_filter: vk::Filter,
    pub mag_filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub address_mode_u: vk::SamplerAddressMode,
    pub address_mode_v: vk::SamplerAddressMode,
    pub max_lod: f32,
}

pub struct Sampler {
    pub sampler: vk::Sampler,
    pub desc: SamplerDesc,
    device: Arc<VulkanDevice>,
}

impl Sampler {
    pub fn new(desc: SamplerDesc, device: Arc<VulkanDevice>) -> Result<Self> {
        let info = vk::SamplerCreateInfo::default()
            .min_filter(desc.min_filter)
            .mag_filter(desc.mag_filter)
            .mipmap_mode(desc.mipmap_mode)
            .address_mode_u(desc.address_mode_u)
            .address_mode_v(desc.address_mode_v)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .min_lod(0.0)
            .max_lod(desc.max_lod)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK);
        let sampler = unsafe { device.logical.create_sampler(&info, None)? };
        Ok(Self {
            sampler,
            desc,
            device,
        })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.logical.destroy_sampler(self.sampler, None);
        }
    }
}
