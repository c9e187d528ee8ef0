use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use gpu_allocator::{
    vulkan::{Allocation, AllocationCreateDesc, AllocationScheme},
    MemoryLocation,
};
use crate::util::format::{vk_format_aspect, vk_format_has_depth, vk_format_has_stencil};
use crate::util::Rect;
use crate::vk::buffer::Buffer;
use crate::vk::device::VulkanDevice;

pub struct ImageCreateInfo<'a> {
    pub format: vk::Format,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub cube_compatible: bool,
    pub name: &'a str,
}

/// A Vulkan image with its view, memory and the layout it currently rests in.
///
/// The tracked layout describes every subresource at once. Operations that
/// move individual subresources (mip blits) return the whole image to one
/// layout before they finish.
pub struct Image {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub aspect: vk::ImageAspectFlags,
    pub mip_levels: u32,
    pub array_layers: u32,

    // Depth-only view used for sampling combined depth/stencil images
    sampled_view: Option<vk::ImageView>,
    layout: vk::ImageLayout,
    allocation: Option<Allocation>,
    // External (swapchain) images are owned by the windowing layer
    owns_image: bool,
    device: Arc<VulkanDevice>,
}

impl Image {
    pub fn new(
        create_info: &ImageCreateInfo,
        device: Arc<VulkanDevice>,
    ) -> Result<Self> {
        if create_info.width == 0 || create_info.height == 0 {
            return Err(eyre!("Cannot create zero-sized image '{}'", create_info.name));
        }
        if create_info.format == vk::Format::UNDEFINED {
            return Err(eyre!("Cannot create image '{}' with UNDEFINED format", create_info.name));
        }

        let aspect = vk_format_aspect(create_info.format);
        let mut usage = vk::ImageUsageFlags::TRANSFER_SRC
            | vk::ImageUsageFlags::TRANSFER_DST
            | vk::ImageUsageFlags::SAMPLED;
        usage |= if aspect == vk::ImageAspectFlags::COLOR {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        } else {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        };
        let extent = vk::Extent3D {
            width: create_info.width,
            height: create_info.height,
            depth: 1,
        };
        let flags = if create_info.cube_compatible {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let image = {
            let info = vk::ImageCreateInfo::default()
                .flags(flags)
                .format(create_info.format)
                .usage(usage)
                .extent(extent)
                .image_type(vk::ImageType::TYPE_2D)
                .mip_levels(create_info.mip_levels)
                .array_layers(create_info.array_layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .initial_layout(vk::ImageLayout::UNDEFINED);
            unsafe { device.logical.create_image(&info, None)? }
        };

        let reqs = unsafe { device.logical.get_image_memory_requirements(image) };
        let allocation = device.allocator().and_then(|mut allocator| {
            Ok(allocator.allocate(&AllocationCreateDesc {
                name: create_info.name,
                requirements: reqs,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::DedicatedImage(image),
            })?)
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.logical.destroy_image(image, None) };
                return Err(e);
            }
        };

        let release = |allocation: Allocation| {
            if let Ok(mut allocator) = device.allocator() {
                let _ = allocator.free(allocation);
            }
            unsafe { device.logical.destroy_image(image, None) };
        };

        if let Err(e) = unsafe {
            device.logical.bind_image_memory(image, allocation.memory(), allocation.offset())
        } {
            release(allocation);
            return Err(e.into());
        }

        let view_type = if create_info.cube_compatible {
            vk::ImageViewType::CUBE
        } else {
            vk::ImageViewType::TYPE_2D
        };
        let full_range = vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: create_info.mip_levels,
            base_array_layer: 0,
            layer_count: create_info.array_layers,
        };
        let view = match create_view(&device, image, create_info.format, view_type, full_range) {
            Ok(view) => view,
            Err(e) => {
                release(allocation);
                return Err(e);
            }
        };

        let sampled_view = if vk_format_has_depth(create_info.format)
            && vk_format_has_stencil(create_info.format)
        {
            let range = vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                ..full_range
            };
            match create_view(&device, image, create_info.format, view_type, range) {
                Ok(view) => Some(view),
                Err(e) => {
                    unsafe { device.logical.destroy_image_view(view, None) };
                    release(allocation);
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::trace!(
            "Created image '{}' {}x{} {:?} levels={} layers={}",
            create_info.name,
            create_info.width,
            create_info.height,
            create_info.format,
            create_info.mip_levels,
            create_info.array_layers,
        );

        Ok(Self {
            image,
            view,
            format: create_info.format,
            extent,
            aspect,
            mip_levels: create_info.mip_levels,
            array_layers: create_info.array_layers,

            sampled_view,
            layout: vk::ImageLayout::UNDEFINED,
            allocation: Some(allocation),
            owns_image: true,
            device,
        })
    }

    /// Wrap an image owned by the windowing layer. Only the view is destroyed on drop.
    pub fn from_external(
        image: vk::Image,
        format: vk::Format,
        width: u32,
        height: u32,
        device: Arc<VulkanDevice>,
    ) -> Result<Self> {
        let aspect = vk_format_aspect(format);
        let range = vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let view = create_view(&device, image, format, vk::ImageViewType::TYPE_2D, range)?;

        Ok(Self {
            image,
            view,
            format,
            extent: vk::Extent3D { width, height, depth: 1 },
            aspect,
            mip_levels: 1,
            array_layers: 1,

            sampled_view: None,
            layout: vk::ImageLayout::UNDEFINED,
            allocation: None,
            owns_image: false,
            device,
        })
    }

    pub fn is_external(&self) -> bool {
        !self.owns_image
    }

    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    /// Record that commands recorded elsewhere (a render pass) left the image in `layout`.
    pub fn set_layout(&mut self, layout: vk::ImageLayout) {
        self.layout = layout;
    }

    pub fn sampled_view(&self) -> vk::ImageView {
        self.sampled_view.unwrap_or(self.view)
    }

    /// View of a single mip level and layer, for use as a framebuffer attachment.
    /// The caller owns the returned view.
    pub fn create_attachment_view(&self, level: u32, layer: u32) -> Result<vk::ImageView> {
        let range = self.modify_image_subresource_range(level, 1, layer, 1);
        create_view(&self.device, self.image, self.format, vk::ImageViewType::TYPE_2D, range)
    }

    pub fn full_range(&self) -> vk::ImageSubresourceRange {
        self.modify_image_subresource_range(0, self.mip_levels, 0, self.array_layers)
    }

    pub fn modify_image_subresource_range(
        &self,
        base_level: u32,
        level_count: u32,
        base_layer: u32,
        layer_count: u32,
    ) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect,
            base_mip_level: base_level,
            level_count,
            base_array_layer: base_layer,
            layer_count,
        }
    }

    pub fn level_extent(&self, level: u32) -> vk::Extent2D {
        vk::Extent2D {
            width: (self.extent.width >> level).max(1),
            height: (self.extent.height >> level).max(1),
        }
    }

    /// Record a layout transition over `range`. Does not touch the tracked layout.
    pub fn modify_image_layout(
        &self,
        cmd: vk::CommandBuffer,
        range: vk::ImageSubresourceRange,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        transition_image_layout(cmd, self.image, range, old_layout, new_layout, &self.device.logical);
    }

    /// Move every subresource to `new_layout` and track it.
    pub fn transition(&mut self, cmd: vk::CommandBuffer, new_layout: vk::ImageLayout) {
        self.modify_image_layout(cmd, self.full_range(), self.layout, new_layout);
        self.layout = new_layout;
    }

    /// Layout to return to after a transfer. Contents in UNDEFINED or
    /// PREINITIALIZED become defined by the transfer, so those rest in GENERAL.
    pub fn restore_layout(&self) -> vk::ImageLayout {
        match self.layout {
            vk::ImageLayout::UNDEFINED | vk::ImageLayout::PREINITIALIZED => vk::ImageLayout::GENERAL,
            layout => layout,
        }
    }

    pub fn create_buffer_image_copy(
        &self,
        buffer_offset: u64,
        aspect: vk::ImageAspectFlags,
        level: u32,
        layer: u32,
        rect: Rect,
    ) -> vk::BufferImageCopy {
        vk::BufferImageCopy {
            buffer_offset,
            // Tightly packed rows
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect,
                mip_level: level,
                base_array_layer: layer,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: rect.x, y: rect.y, z: 0 },
            image_extent: vk::Extent3D {
                width: rect.width as u32,
                height: rect.height as u32,
                depth: 1,
            },
        }
    }

    pub fn copy_buffer_to_image(
        &self,
        cmd: vk::CommandBuffer,
        buffer: &Buffer,
        regions: &[vk::BufferImageCopy],
    ) {
        unsafe {
            self.device.logical.cmd_copy_buffer_to_image(
                cmd,
                buffer.buffer,
                self.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                regions,
            );
        }
    }

    pub fn copy_image_to_buffer(
        &self,
        cmd: vk::CommandBuffer,
        buffer: &Buffer,
        regions: &[vk::BufferImageCopy],
    ) {
        unsafe {
            self.device.logical.cmd_copy_image_to_buffer(
                cmd,
                self.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                buffer.buffer,
                regions,
            );
        }
    }

    /// Blit `src_level` into `dst_level` of the same image for all layers.
    /// Source must be in TRANSFER_SRC_OPTIMAL and destination in TRANSFER_DST_OPTIMAL.
    pub fn blit_image(
        &self,
        cmd: vk::CommandBuffer,
        src_level: u32,
        dst_level: u32,
        filter: vk::Filter,
    ) {
        let src_size = self.level_extent(src_level);
        let dst_size = self.level_extent(dst_level);
        let subresource = |level| vk::ImageSubresourceLayers {
            aspect_mask: self.aspect,
            mip_level: level,
            base_array_layer: 0,
            layer_count: self.array_layers,
        };
        let blit_region = vk::ImageBlit2::default()
            .src_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: src_size.width as i32,
                    y: src_size.height as i32,
                    z: 1,
                },
            ])
            .dst_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: dst_size.width as i32,
                    y: dst_size.height as i32,
                    z: 1,
                },
            ])
            .src_subresource(subresource(src_level))
            .dst_subresource(subresource(dst_level));

        let regions = [blit_region];
        let blit_info = vk::BlitImageInfo2::default()
            .src_image(self.image)
            .src_image_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
            .dst_image(self.image)
            .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .filter(filter)
            .regions(&regions);

        unsafe {
            self.device.logical.cmd_blit_image2(cmd, &blit_info);
        }
    }

    /// Upload tightly packed texels of `rect` into one (level, layer).
    ///
    /// Combined depth/stencil data is expected in the GL 24_8 packing (depth in
    /// the upper 24 bits) and split per aspect on the way.
    pub fn upload(&mut self, data: &[u8], level: u32, layer: u32, rect: Rect) -> Result<()> {
        let (staging_data, regions) = if self.aspect
            == vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        {
            let (depth, stencil) = split_depth_stencil(data);
            let depth_len = depth.len() as u64;
            let mut bytes = depth;
            bytes.extend_from_slice(&stencil);
            let regions = vec![
                self.create_buffer_image_copy(0, vk::ImageAspectFlags::DEPTH, level, layer, rect),
                self.create_buffer_image_copy(depth_len, vk::ImageAspectFlags::STENCIL, level, layer, rect),
            ];
            (bytes, regions)
        } else {
            let regions = vec![self.create_buffer_image_copy(0, self.aspect, level, layer, rect)];
            (data.to_vec(), regions)
        };

        let staging = Buffer::new_staging(
            &staging_data,
            vk::BufferUsageFlags::TRANSFER_SRC,
            "Image upload staging buffer",
            self.device.clone(),
        )?;

        let old_layout = self.layout;
        let restore = self.restore_layout();
        let range = self.full_range();
        self.device.immediate_submit(|cmd, _device| {
            self.modify_image_layout(cmd, range, old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
            self.copy_buffer_to_image(cmd, &staging, &regions);
            self.modify_image_layout(cmd, range, vk::ImageLayout::TRANSFER_DST_OPTIMAL, restore);
            Ok(())
        })?;
        self.layout = restore;

        Ok(())
    }

    /// Read back `rect` of one (level, layer) as tightly packed texels.
    pub fn download(&mut self, level: u32, layer: u32, rect: Rect) -> Result<Vec<u8>> {
        let texel_size = texel_size(self.format)
            .ok_or_else(|| eyre!("Cannot read back image with format {:?}", self.format))?;
        let texels = (rect.width.max(0) * rect.height.max(0)) as usize;
        let combined = self.aspect == vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL;

        let (buffer_size, regions) = if combined {
            let depth_len = (texels * 4) as u64;
            (
                depth_len + texels as u64,
                vec![
                    self.create_buffer_image_copy(0, vk::ImageAspectFlags::DEPTH, level, layer, rect),
                    self.create_buffer_image_copy(depth_len, vk::ImageAspectFlags::STENCIL, level, layer, rect),
                ],
            )
        } else {
            (
                (texels * texel_size) as u64,
                vec![self.create_buffer_image_copy(0, self.aspect, level, layer, rect)],
            )
        };

        let readback = Buffer::new(
            buffer_size,
            vk::BufferUsageFlags::TRANSFER_DST,
            "Image readback buffer",
            MemoryLocation::GpuToCpu,
            self.device.clone(),
        )?;

        let old_layout = self.layout;
        let restore = self.restore_layout();
        let range = self.full_range();
        self.device.immediate_submit(|cmd, _device| {
            self.modify_image_layout(cmd, range, old_layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
            self.copy_image_to_buffer(cmd, &readback, &regions);
            self.modify_image_layout(cmd, range, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, restore);
            Ok(())
        })?;
        self.layout = restore;

        let bytes = readback.mapped()?;
        if combined {
            let (depth, stencil) = bytes.split_at(texels * 4);
            Ok(merge_depth_stencil(depth, stencil))
        } else {
            Ok(bytes.to_vec())
        }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if let Some(view) = self.sampled_view.take() {
                self.device.logical.destroy_image_view(view, None);
            }
            self.device.logical.destroy_image_view(self.view, None);
        }
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        log::error!("Failed to free image memory: {e}");
                    }
                }
                Err(e) => log::error!("Failed to lock memory allocator: {e}"),
            }
        }
        if self.owns_image {
            unsafe {
                self.device.logical.destroy_image(self.image, None);
            }
        }
    }
}

fn create_view(
    device: &VulkanDevice,
    image: vk::Image,
    format: vk::Format,
    view_type: vk::ImageViewType,
    range: vk::ImageSubresourceRange,
) -> Result<vk::ImageView> {
    let info = vk::ImageViewCreateInfo::default()
        .view_type(view_type)
        .image(image)
        .format(format)
        .subresource_range(range);
    Ok(unsafe { device.logical.create_image_view(&info, None)? })
}

/// Bytes per texel as laid out in a buffer copy of a single-aspect image.
fn texel_size(format: vk::Format) -> Option<usize> {
    match format {
        vk::Format::R8_UNORM | vk::Format::S8_UINT => Some(1),
        vk::Format::R8G8_UNORM
        | vk::Format::R4G4B4A4_UNORM_PACK16
        | vk::Format::R5G5B5A1_UNORM_PACK16
        | vk::Format::R5G6B5_UNORM_PACK16
        | vk::Format::D16_UNORM => Some(2),
        vk::Format::R8G8B8_UNORM => Some(3),
        vk::Format::R8G8B8A8_UNORM
        | vk::Format::R8G8B8A8_SRGB
        | vk::Format::B8G8R8A8_UNORM
        | vk::Format::B8G8R8A8_SRGB
        | vk::Format::X8_D24_UNORM_PACK32
        | vk::Format::D32_SFLOAT
        | vk::Format::D24_UNORM_S8_UINT => Some(4),
        _ => None,
    }
}

/// Split GL 24_8 packed texels into the Vulkan depth (X8_D24) and stencil copies.
fn split_depth_stencil(data: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let texels = data
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]));
    let depth = texels.clone().flat_map(|v| (v >> 8).to_ne_bytes()).collect();
    let stencil = texels.map(|v| (v & 0xff) as u8).collect();
    (depth, stencil)
}

fn merge_depth_stencil(depth: &[u8], stencil: &[u8]) -> Vec<u8> {
    depth
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .zip(stencil)
        .flat_map(|(d, s)| (((d & 0x00ff_ffff) << 8) | *s as u32).to_ne_bytes())
        .collect()
}

pub fn transition_image_layout(
    cmd: vk::CommandBuffer,
    image: vk::Image,
    range: vk::ImageSubresourceRange,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    device: &ash::Device,
) {
    if old_layout == new_layout {
        return;
    }

    let image_barrier = vk::ImageMemoryBarrier2::default()
        .src_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
        .src_access_mask(vk::AccessFlags2::MEMORY_WRITE)
        .dst_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
        .dst_access_mask(vk::AccessFlags2::MEMORY_WRITE | vk::AccessFlags2::MEMORY_READ)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .subresource_range(range)
        .image(image);

    let barriers = [image_barrier];
    let dep_info = vk::DependencyInfo::default()
        .image_memory_barriers(&barriers);

    unsafe {
        device.cmd_pipeline_barrier2(cmd, &dep_info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_stencil_split_and_merge_are_inverse() {
        let packed: Vec<u32> = vec![0xabcdef12, 0x00000001, 0xffffff00];
        let bytes: &[u8] = bytemuck::cast_slice(&packed);
        let (depth, stencil) = split_depth_stencil(bytes);
        assert_eq!(stencil, vec![0x12, 0x01, 0x00]);
        let depth_words: Vec<u32> = bytemuck::pod_collect_to_vec(&depth);
        assert_eq!(depth_words, vec![0x00abcdef, 0x00000000, 0x00ffffff]);
        assert_eq!(merge_depth_stencil(&depth, &stencil), bytes);
    }
}
