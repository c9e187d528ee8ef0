//! Textures: host-side level state plus the lazily synthesized Vulkan image.

use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use crate::error::{GlError, GlResult};
use crate::gl::*;
use crate::state::vk_mappings;
use crate::util::color::convert_pixels;
use crate::util::format::{self, PixelFormat};
use crate::util::{mip_level_count, ImageRect, Rect};
use crate::vk::image::{Image, ImageCreateInfo};
use crate::vk::sampler::{Sampler, SamplerDesc};
use crate::vk::VulkanDevice;

/// Row alignment of the host copy of every level.
pub const INTERNAL_ALIGNMENT: u32 = 1;

/// Shape and host contents of one (layer, level).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelState {
    pub width: i32,
    pub height: i32,
    pub format: GLenum,
    pub ty: GLenum,
    pub internal_format: GLenum,
    pub data: Option<Vec<u8>>,
}

impl LevelState {
    pub fn is_set(&self) -> bool {
        self.format != GL_NONE
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        format::gl_format_type_to_pixel_format(self.format, self.ty)
    }

    fn layout(&self, pixel: PixelFormat) -> ImageRect {
        ImageRect::new(
            Rect::new(0, 0, self.width, self.height),
            pixel.element_count(),
            pixel.element_size(),
            INTERNAL_ALIGNMENT,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParameters {
    pub min_filter: GLenum,
    pub mag_filter: GLenum,
    pub wrap_s: GLenum,
    pub wrap_t: GLenum,
}

impl Default for TextureParameters {
    fn default() -> Self {
        Self {
            min_filter: GL_NEAREST_MIPMAP_LINEAR,
            mag_filter: GL_LINEAR,
            wrap_s: GL_REPEAT,
            wrap_t: GL_REPEAT,
        }
    }
}

pub struct Texture {
    target: GLenum,
    states: Vec<Vec<LevelState>>,
    mip_levels: u32,

    // Logical (GL-visible) and explicit (as realized on the GPU) formats
    internal_format: GLenum,
    logical_format: Option<PixelFormat>,
    explicit_format: Option<PixelFormat>,

    parameters: TextureParameters,
    sampler_dirty: bool,
    // Host state changed shape since the image was created
    realloc_needed: bool,

    image: Option<Image>,
    sampler: Option<Sampler>,
    // Replaced while a frame may still reference them; dropped after finish
    retired_images: Vec<Image>,
    retired_samplers: Vec<Sampler>,
    device: Option<Arc<VulkanDevice>>,
}

impl Texture {
    pub fn new(target: GLenum, max_levels: u32, device: Option<Arc<VulkanDevice>>) -> Self {
        let layers = if target == GL_TEXTURE_CUBE_MAP { 6 } else { 1 };
        Self {
            target,
            states: vec![vec![LevelState::default(); max_levels as usize]; layers],
            mip_levels: 1,

            internal_format: GL_NONE,
            logical_format: None,
            explicit_format: None,

            parameters: TextureParameters::default(),
            sampler_dirty: true,
            realloc_needed: false,

            image: None,
            sampler: None,
            retired_images: Vec::new(),
            retired_samplers: Vec::new(),
            device,
        }
    }

    /// Texture around an already created image: a swapchain image owned by the
    /// windowing layer, or a depth/stencil image synthesized for a framebuffer.
    pub fn from_image(image: Image, internal_format: GLenum, device: Arc<VulkanDevice>) -> Self {
        let mut texture = Self::new(GL_TEXTURE_2D, 1, Some(device));
        let pixel = PixelFormat::from_vk_format(image.format);
        let (format, ty) = format::internal_format_info(internal_format)
            .map_or((GL_NONE, GL_NONE), |f| (f.format, f.ty));
        texture.states[0][0] = LevelState {
            width: image.extent.width as i32,
            height: image.extent.height as i32,
            format,
            ty,
            internal_format,
            data: None,
        };
        texture.internal_format = internal_format;
        texture.logical_format = pixel;
        texture.explicit_format = pixel;
        texture.image = Some(image);
        texture
    }

    pub fn target(&self) -> GLenum {
        self.target
    }

    pub fn layer_count(&self) -> u32 {
        self.states.len() as u32
    }

    pub fn max_levels(&self) -> u32 {
        self.states.first().map_or(0, |levels| levels.len() as u32)
    }

    pub fn state(&self, level: u32, layer: u32) -> Option<&LevelState> {
        self.states.get(layer as usize)?.get(level as usize)
    }

    pub fn width(&self) -> i32 {
        self.states[0][0].width
    }

    pub fn height(&self) -> i32 {
        self.states[0][0].height
    }

    pub fn internal_format(&self) -> GLenum {
        self.states[0][0].internal_format
    }

    pub fn level_dimensions(&self, level: u32, layer: u32) -> (i32, i32) {
        self.state(level, layer).map_or((0, 0), |s| (s.width, s.height))
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn parameters(&self) -> &TextureParameters {
        &self.parameters
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn image_mut(&mut self) -> Option<&mut Image> {
        self.image.as_mut()
    }

    /// Record the shape of one (layer, level) and, when `pixels` is supplied,
    /// repack it from `unpack_alignment` into the internal alignment.
    #[allow(clippy::too_many_arguments)]
    pub fn set_state(
        &mut self,
        width: i32,
        height: i32,
        level: u32,
        layer: u32,
        format: GLenum,
        ty: GLenum,
        unpack_alignment: u32,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        let pixel = format::gl_format_type_to_pixel_format(format, ty)
            .ok_or_else(|| eyre!("Unsupported format/type {format:#x}/{ty:#x}"))?;
        let internal_format = format::gl_format_type_to_internal_format(format, ty);
        self.set_state_internal(width, height, level, layer, format, ty, internal_format, pixel, unpack_alignment, pixels)
    }

    /// Storage for a renderbuffer: a single level with no host contents.
    pub fn set_storage(&mut self, width: i32, height: i32, internal_format: GLenum) -> Result<()> {
        let info = format::internal_format_info(internal_format)
            .ok_or_else(|| eyre!("Unsupported renderbuffer format {internal_format:#x}"))?;
        // Sized formats such as DEPTH_COMPONENT24 share (format, type) with other entries
        self.set_state_internal(width, height, 0, 0, info.format, info.ty, internal_format, info.pixel, INTERNAL_ALIGNMENT, None)
    }

    #[allow(clippy::too_many_arguments)]
    fn set_state_internal(
        &mut self,
        width: i32,
        height: i32,
        level: u32,
        layer: u32,
        format: GLenum,
        ty: GLenum,
        internal_format: GLenum,
        pixel: PixelFormat,
        unpack_alignment: u32,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        let slot = self
            .states
            .get_mut(layer as usize)
            .and_then(|levels| levels.get_mut(level as usize))
            .ok_or_else(|| eyre!("Texture slot level {level} layer {layer} out of range"))?;

        let shape_changed = slot.width != width
            || slot.height != height
            || slot.format != format
            || slot.ty != ty
            || slot.internal_format != internal_format;

        // Replaces any previously stored bytes
        slot.data = pixels.map(|src| {
            let src_rect = ImageRect::new(
                Rect::new(0, 0, width, height),
                pixel.element_count(),
                pixel.element_size(),
                unpack_alignment,
            );
            let dst_rect = ImageRect::new(
                Rect::new(0, 0, width, height),
                pixel.element_count(),
                pixel.element_size(),
                INTERNAL_ALIGNMENT,
            );
            let mut data = vec![0u8; dst_rect.buffer_size()];
            convert_pixels(pixel, pixel, &src_rect, src, &dst_rect, &mut data);
            data
        });
        slot.width = width;
        slot.height = height;
        slot.format = format;
        slot.ty = ty;
        slot.internal_format = internal_format;

        if shape_changed || self.image.is_none() {
            self.realloc_needed = true;
        } else if let Some(data) = self.states[layer as usize][level as usize].data.clone() {
            // Same shape on a live image: upload in place
            self.copy_pixels_from_host(level, layer, Rect::new(0, 0, width, height), &data)?;
        }
        Ok(())
    }

    /// Update a region of an existing level. The host copy stays canonical and
    /// the region is uploaded when the GPU image is current.
    #[allow(clippy::too_many_arguments)]
    pub fn set_sub_state(
        &mut self,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        level: u32,
        layer: u32,
        format: GLenum,
        ty: GLenum,
        unpack_alignment: u32,
        pixels: &[u8],
    ) -> GlResult<Result<()>> {
        let slot = self.state(level, layer).ok_or(GlError::InvalidValue)?;
        if !slot.is_set() {
            return Err(GlError::InvalidOperation);
        }
        if slot.format != format || slot.ty != ty {
            return Err(GlError::InvalidOperation);
        }
        if x_offset < 0
            || y_offset < 0
            || width < 0
            || height < 0
            || x_offset + width > slot.width
            || y_offset + height > slot.height
        {
            return Err(GlError::InvalidValue);
        }
        let pixel = slot.pixel_format().ok_or(GlError::InvalidEnum)?;

        let layout = slot.layout(pixel);
        let (slot_width, slot_height) = (slot.width, slot.height);

        // Levels held only by the GPU are fetched before patching, so a later
        // reallocation uploads the whole level rather than zeros around the region
        let mut fetched = None;
        if slot.data.is_none() && self.image.is_some() && !self.realloc_needed {
            fetched = match self.level_pixels(level, layer) {
                Ok(data) => data,
                Err(e) => return Ok(Err(e)),
            };
        }
        let slot = self
            .states
            .get_mut(layer as usize)
            .and_then(|levels| levels.get_mut(level as usize))
            .ok_or(GlError::InvalidValue)?;
        if let Some(fetched) = fetched {
            slot.data = Some(fetched);
        }
        let data = slot.data.get_or_insert_with(|| vec![0u8; layout.buffer_size()]);
        let src_rect = ImageRect::new(
            Rect::new(0, 0, width, height),
            pixel.element_count(),
            pixel.element_size(),
            unpack_alignment,
        );
        let dst_rect = ImageRect::new(
            Rect::new(x_offset, y_offset, slot_width, slot_height),
            pixel.element_count(),
            pixel.element_size(),
            INTERNAL_ALIGNMENT,
        );
        convert_pixels(pixel, pixel, &src_rect, pixels, &dst_rect, data);

        if self.image.is_none() || self.realloc_needed {
            return Ok(Ok(()));
        }

        // Tightly packed copy of just the region for the upload
        let tight = ImageRect::new(Rect::new(0, 0, width, height), pixel.element_count(), pixel.element_size(), INTERNAL_ALIGNMENT);
        let mut region = vec![0u8; tight.buffer_size()];
        convert_pixels(pixel, pixel, &src_rect, pixels, &tight, &mut region);
        Ok(self.copy_pixels_from_host(level, layer, Rect::new(x_offset, y_offset, width, height), &region))
    }

    /// Check that every populated level matches level 0 in format and follows
    /// the halving chain, across every layer. Caches the mip level count.
    pub fn is_completed(&mut self) -> bool {
        let base = &self.states[0][0];
        if !base.is_set() || base.width <= 0 || base.height <= 0 {
            return false;
        }
        let (base_width, base_height) = (base.width, base.height);
        let (format, ty) = (base.format, base.ty);

        if self.states.len() > 1 && base_width != base_height {
            return false;
        }

        let levels = mip_level_count(base_width as u32, base_height as u32)
            .min(self.max_levels());
        for layer in &self.states {
            let layer_base = &layer[0];
            if layer_base.width != base_width
                || layer_base.height != base_height
                || layer_base.format != format
                || layer_base.ty != ty
            {
                return false;
            }
            for (level, state) in layer.iter().enumerate().skip(1) {
                if !state.is_set() {
                    continue;
                }
                if level as u32 >= levels {
                    return false;
                }
                let expected_width = (base_width >> level).max(1);
                let expected_height = (base_height >> level).max(1);
                if state.width != expected_width
                    || state.height != expected_height
                    || state.format != format
                    || state.ty != ty
                {
                    return false;
                }
            }
        }

        self.mip_levels = levels;
        true
    }

    /// Make sure the GPU image reflects the host state, (re)allocating if needed.
    pub fn ensure_allocated(&mut self) -> Result<()> {
        if self.image.is_none() || self.realloc_needed {
            self.allocate()?;
        }
        Ok(())
    }

    /// Create the GPU image for the current level-0 state and upload every
    /// populated (layer, level).
    pub fn allocate(&mut self) -> Result<()> {
        let device = self.device.clone().ok_or_eyre("Texture has no device")?;
        if self.image.as_ref().is_some_and(|image| image.is_external()) {
            return Ok(());
        }

        let base = &self.states[0][0];
        if base.width <= 0 || base.height <= 0 {
            return Err(eyre!("Cannot allocate zero-sized texture"));
        }
        let internal_format = if base.internal_format != GL_NONE {
            base.internal_format
        } else {
            format::gl_format_type_to_internal_format(base.format, base.ty)
        };
        // Sized formats sharing a (format, type) pair resolve through the internal format
        let logical = format::internal_format_info(internal_format)
            .map(|info| info.pixel)
            .or_else(|| base.pixel_format())
            .ok_or_else(|| eyre!("Texture level 0 has no valid format"))?;
        let vk_format = format::gl_internal_format_to_vk_format(internal_format);
        if vk_format == vk::Format::UNDEFINED {
            return Err(eyre!("No Vulkan format for internal format {internal_format:#x}"));
        }
        let (width, height) = (base.width as u32, base.height as u32);

        let mip_levels = if self.is_completed() { self.mip_levels } else { 1 };
        let image = Image::new(
            &ImageCreateInfo {
                format: vk_format,
                width,
                height,
                mip_levels,
                array_layers: self.layer_count(),
                cube_compatible: self.target == GL_TEXTURE_CUBE_MAP,
                name: "Texture",
            },
            device,
        )?;

        // The old image is only released once the new one exists
        if let Some(old) = self.image.replace(image) {
            self.retired_images.push(old);
        }
        self.sampler_dirty = true;
        self.internal_format = internal_format;
        self.logical_format = Some(logical);
        self.explicit_format = PixelFormat::from_vk_format(vk_format).or(Some(logical.explicit()));
        self.mip_levels = mip_levels;
        self.realloc_needed = false;

        for layer in 0..self.layer_count() {
            for level in 0..mip_levels {
                let state = &self.states[layer as usize][level as usize];
                if let Some(data) = state.data.clone() {
                    let rect = Rect::new(0, 0, state.width, state.height);
                    self.copy_pixels_from_host(level, layer, rect, &data)?;
                }
            }
        }

        log::debug!(
            "Allocated texture {}x{} internal={:#x} levels={} layers={}",
            width,
            height,
            internal_format,
            mip_levels,
            self.layer_count(),
        );
        Ok(())
    }

    /// Upload tightly packed logical-format texels into `rect` of one (level, layer).
    pub fn copy_pixels_from_host(&mut self, level: u32, layer: u32, rect: Rect, data: &[u8]) -> Result<()> {
        let logical = self.logical_format.ok_or_eyre("Texture is not allocated")?;
        let explicit = self.explicit_format.ok_or_eyre("Texture is not allocated")?;
        let image = self.image.as_mut().ok_or_eyre("Texture is not allocated")?;

        let src_rect = ImageRect::new(
            Rect::new(0, 0, rect.width, rect.height),
            logical.element_count(),
            logical.element_size(),
            INTERNAL_ALIGNMENT,
        );
        let dst_rect = ImageRect::new(
            Rect::new(0, 0, rect.width, rect.height),
            explicit.element_count(),
            explicit.element_size(),
            INTERNAL_ALIGNMENT,
        );
        let mut staged = vec![0u8; dst_rect.buffer_size()];
        convert_pixels(logical, explicit, &src_rect, data, &dst_rect, &mut staged);
        image.upload(&staged, level, layer, rect)
    }

    /// Read `rect` of one (level, layer) back as tightly packed logical-format texels.
    pub fn copy_pixels_to_host(&mut self, level: u32, layer: u32, rect: Rect) -> Result<Vec<u8>> {
        let logical = self.logical_format.ok_or_eyre("Texture is not allocated")?;
        let explicit = self.explicit_format.ok_or_eyre("Texture is not allocated")?;
        let image = self.image.as_mut().ok_or_eyre("Texture is not allocated")?;

        let staged = image.download(level, layer, rect)?;
        if logical == explicit {
            return Ok(staged);
        }
        let src_rect = ImageRect::new(
            Rect::new(0, 0, rect.width, rect.height),
            explicit.element_count(),
            explicit.element_size(),
            INTERNAL_ALIGNMENT,
        );
        let dst_rect = ImageRect::new(
            Rect::new(0, 0, rect.width, rect.height),
            logical.element_count(),
            logical.element_size(),
            INTERNAL_ALIGNMENT,
        );
        let mut data = vec![0u8; dst_rect.buffer_size()];
        convert_pixels(explicit, logical, &src_rect, &staged, &dst_rect, &mut data);
        Ok(data)
    }

    /// Format the GPU image holds texels in, for callers reading it directly.
    pub fn explicit_format(&self) -> Option<PixelFormat> {
        self.explicit_format
    }

    /// Host bytes of a level, reading them back from the GPU when the host
    /// copy is gone (levels above 0 after mipmap generation).
    pub fn level_pixels(&mut self, level: u32, layer: u32) -> Result<Option<Vec<u8>>> {
        let state = self
            .state(level, layer)
            .ok_or_else(|| eyre!("Texture slot level {level} layer {layer} out of range"))?;
        if let Some(data) = state.data.clone() {
            return Ok(Some(data));
        }
        if !state.is_set() || self.image.is_none() || level >= self.mip_levels {
            return Ok(None);
        }
        let rect = Rect::new(0, 0, state.width, state.height);
        self.copy_pixels_to_host(level, layer, rect).map(Some)
    }

    /// Rebuild the full mip chain from level 0.
    ///
    /// Level 0 of every layer is read back first since recreating the image
    /// discards its contents. Afterwards only level 0 keeps host bytes; higher
    /// levels record their shape and are read from the GPU on demand.
    pub fn generate_mipmaps(&mut self, hint: GLenum) -> Result<()> {
        let base = self.states[0][0].clone();
        if !base.is_set() || base.width <= 0 || base.height <= 0 {
            return Err(eyre!("Cannot generate mipmaps without level 0"));
        }
        let levels = mip_level_count(base.width as u32, base.height as u32).min(self.max_levels());

        let preserved = if self.device.is_some() {
            self.ensure_allocated()?;
            let rect = Rect::new(0, 0, base.width, base.height);
            let mut preserved = Vec::with_capacity(self.states.len());
            for layer in 0..self.layer_count() {
                preserved.push(self.copy_pixels_to_host(0, layer, rect)?);
            }
            Some(preserved)
        } else {
            None
        };

        for layer in self.states.iter_mut() {
            for (level, state) in layer.iter_mut().enumerate().skip(1) {
                if (level as u32) < levels {
                    *state = LevelState {
                        width: (base.width >> level).max(1),
                        height: (base.height >> level).max(1),
                        format: base.format,
                        ty: base.ty,
                        internal_format: base.internal_format,
                        data: None,
                    };
                } else {
                    *state = LevelState::default();
                }
            }
        }

        let Some(preserved) = preserved else {
            self.mip_levels = levels;
            return Ok(());
        };
        for (layer, data) in preserved.into_iter().enumerate() {
            self.states[layer][0].data = Some(data);
        }

        // Recreate at full chain length; allocate() restores level 0 from the host copy
        self.realloc_needed = true;
        self.allocate()?;

        let filter = vk_mappings::gl_mipmap_hint_to_vk_filter(hint).unwrap_or(vk::Filter::LINEAR);
        let image = self.image.as_ref().ok_or_eyre("Texture is not allocated")?;
        let device = self.device.clone().ok_or_eyre("Texture has no device")?;
        let current = image.layout();
        let resting = image.restore_layout();
        let layers = image.array_layers;
        let mip_levels = image.mip_levels;

        device.immediate_submit(|cmd, _device| {
            let all = image.full_range();
            image.modify_image_layout(cmd, all, current, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
            for level in 1..mip_levels {
                let src = image.modify_image_subresource_range(level - 1, 1, 0, layers);
                image.modify_image_layout(
                    cmd,
                    src,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                );
                image.blit_image(cmd, level - 1, level, filter);
            }
            // Every level but the last is now a blit source
            if mip_levels > 1 {
                let sources = image.modify_image_subresource_range(0, mip_levels - 1, 0, layers);
                image.modify_image_layout(cmd, sources, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, resting);
            }
            let last = image.modify_image_subresource_range(mip_levels - 1, 1, 0, layers);
            image.modify_image_layout(cmd, last, vk::ImageLayout::TRANSFER_DST_OPTIMAL, resting);
            Ok(())
        })?;
        if let Some(image) = self.image.as_mut() {
            image.set_layout(resting);
        }

        log::debug!("Generated {} mip levels", mip_levels);
        Ok(())
    }

    /// Apply one glTexParameter. Returns whether the value changed.
    pub fn set_parameter(&mut self, pname: GLenum, value: GLenum) -> GlResult<bool> {
        let slot = match pname {
            GL_TEXTURE_MIN_FILTER if vk_mappings::gl_min_filter_to_vk(value).is_some() => {
                &mut self.parameters.min_filter
            }
            GL_TEXTURE_MAG_FILTER if vk_mappings::gl_mag_filter_to_vk(value).is_some() => {
                &mut self.parameters.mag_filter
            }
            GL_TEXTURE_WRAP_S if vk_mappings::gl_wrap_to_vk(value).is_some() => {
                &mut self.parameters.wrap_s
            }
            GL_TEXTURE_WRAP_T if vk_mappings::gl_wrap_to_vk(value).is_some() => {
                &mut self.parameters.wrap_t
            }
            _ => return Err(GlError::InvalidEnum),
        };
        if *slot == value {
            return Ok(false);
        }
        *slot = value;
        self.sampler_dirty = true;
        Ok(true)
    }

    pub fn sampler_desc(&self) -> SamplerDesc {
        let (min_filter, mipmap_mode, mipmapped) =
            vk_mappings::gl_min_filter_to_vk(self.parameters.min_filter)
                .unwrap_or((vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST, false));
        SamplerDesc {
            min_filter,
            mag_filter: vk_mappings::gl_mag_filter_to_vk(self.parameters.mag_filter)
                .unwrap_or(vk::Filter::LINEAR),
            mipmap_mode,
            address_mode_u: vk_mappings::gl_wrap_to_vk(self.parameters.wrap_s)
                .unwrap_or(vk::SamplerAddressMode::REPEAT),
            address_mode_v: vk_mappings::gl_wrap_to_vk(self.parameters.wrap_t)
                .unwrap_or(vk::SamplerAddressMode::REPEAT),
            // Non-mipmapped filters sample level 0 only
            max_lod: if mipmapped { self.mip_levels as f32 } else { 0.25 },
        }
    }

    pub fn sampler_dirty(&self) -> bool {
        self.sampler_dirty
    }

    /// Sampler for the current parameters, rebuilt only when they changed.
    pub fn sampler(&mut self) -> Result<vk::Sampler> {
        let desc = self.sampler_desc();
        let stale = self.sampler_dirty
            || self.sampler.as_ref().is_none_or(|sampler| sampler.desc != desc);
        if stale {
            let device = self.device.clone().ok_or_eyre("Texture has no device")?;
            let sampler = Sampler::new(desc, device)?;
            if let Some(old) = self.sampler.replace(sampler) {
                self.retired_samplers.push(old);
            }
            self.sampler_dirty = false;
        }
        self.sampler
            .as_ref()
            .map(|sampler| sampler.sampler)
            .ok_or_eyre("Texture sampler missing")
    }

    /// Drop images and samplers replaced since the last completed frame.
    pub fn destroy_retired(&mut self) {
        self.retired_images.clear();
        self.retired_samplers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(texture: &mut Texture, level: u32, size: i32) {
        let data = vec![0xaau8; (size * size * 4) as usize];
        texture
            .set_state(size, size, level, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, Some(&data))
            .unwrap();
    }

    #[test]
    fn halving_chain_is_complete() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 8);
        rgba(&mut texture, 1, 4);
        assert!(texture.is_completed());
        assert_eq!(texture.mip_levels(), 4);
    }

    #[test]
    fn wrong_halving_is_incomplete() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 8);
        rgba(&mut texture, 1, 3);
        assert!(!texture.is_completed());
    }

    #[test]
    fn unset_level_zero_is_incomplete() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 1, 4);
        assert!(!texture.is_completed());
    }

    #[test]
    fn mismatched_level_format_is_incomplete() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 8);
        texture
            .set_state(4, 4, 1, 0, GL_RGB, GL_UNSIGNED_SHORT_5_6_5, 4, None)
            .unwrap();
        assert!(!texture.is_completed());
    }

    #[test]
    fn cube_map_needs_consistent_faces() {
        let mut texture = Texture::new(GL_TEXTURE_CUBE_MAP, 14, None);
        for layer in 0..6 {
            texture
                .set_state(4, 4, 0, layer, GL_RGBA, GL_UNSIGNED_BYTE, 4, None)
                .unwrap();
        }
        assert!(texture.is_completed());
        texture
            .set_state(2, 2, 0, 3, GL_RGBA, GL_UNSIGNED_BYTE, 4, None)
            .unwrap();
        assert!(!texture.is_completed());
    }

    #[test]
    fn host_copy_is_repacked_to_internal_alignment() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        // 3x2 RGB rows are 9 bytes, padded to 12 with an unpack alignment of 4
        let mut src = Vec::new();
        for row in 0..2u8 {
            src.extend((0..9u8).map(|i| row * 10 + i));
            src.extend([0xee; 3]);
        }
        texture
            .set_state(3, 2, 0, 0, GL_RGB, GL_UNSIGNED_BYTE, 4, Some(&src))
            .unwrap();
        let data = texture.state(0, 0).unwrap().data.clone().unwrap();
        assert_eq!(data.len(), 18);
        assert_eq!(&data[9..12], &[10, 11, 12]);
    }

    #[test]
    fn overwriting_a_level_drops_old_bytes() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 4);
        texture
            .set_state(4, 4, 0, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, None)
            .unwrap();
        assert_eq!(texture.state(0, 0).unwrap().data, None);
    }

    #[test]
    fn sub_state_updates_region_of_host_copy() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        texture
            .set_state(4, 4, 0, 0, GL_ALPHA, GL_UNSIGNED_BYTE, 1, Some(&[0u8; 16]))
            .unwrap();
        texture
            .set_sub_state(1, 2, 2, 1, 0, 0, GL_ALPHA, GL_UNSIGNED_BYTE, 1, &[7, 8])
            .unwrap()
            .unwrap();
        let data = texture.state(0, 0).unwrap().data.clone().unwrap();
        assert_eq!(&data[8..12], &[0, 7, 8, 0]);
    }

    #[test]
    fn sub_state_validates_bounds_and_format() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        texture
            .set_state(4, 4, 0, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, None)
            .unwrap();
        let pixels = [0u8; 64];
        assert_eq!(
            texture
                .set_sub_state(3, 0, 2, 1, 0, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, &pixels)
                .err(),
            Some(GlError::InvalidValue)
        );
        assert_eq!(
            texture
                .set_sub_state(0, 0, 1, 1, 0, 0, GL_RGB, GL_UNSIGNED_BYTE, 4, &pixels)
                .err(),
            Some(GlError::InvalidOperation)
        );
        assert_eq!(
            texture
                .set_sub_state(0, 0, 1, 1, 2, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, &pixels)
                .err(),
            Some(GlError::InvalidOperation)
        );
    }

    #[test]
    fn headless_mipmap_generation_records_level_shapes() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 8);
        texture.generate_mipmaps(GL_DONT_CARE).unwrap();
        assert_eq!(texture.mip_levels(), 4);
        assert_eq!(texture.level_dimensions(3, 0), (1, 1));
        assert!(texture.state(0, 0).unwrap().data.is_some());
        assert!(texture.state(1, 0).unwrap().data.is_none());
        assert!(texture.is_completed());
    }

    #[test]
    fn generated_levels_without_image_patch_from_zero() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        rgba(&mut texture, 0, 4);
        texture.generate_mipmaps(GL_DONT_CARE).unwrap();

        assert_eq!(texture.level_pixels(0, 0).unwrap().map(|data| data.len()), Some(64));
        assert_eq!(texture.level_pixels(1, 0).unwrap(), None);
        assert!(texture.level_pixels(0, 6).is_err());

        texture
            .set_sub_state(1, 1, 1, 1, 1, 0, GL_RGBA, GL_UNSIGNED_BYTE, 4, &[1, 2, 3, 4])
            .unwrap()
            .unwrap();
        let data = texture.state(1, 0).unwrap().data.clone().unwrap();
        assert_eq!(data.len(), 16);
        assert_eq!(&data[..12], &[0; 12]);
        assert_eq!(&data[12..], &[1, 2, 3, 4]);
    }

    #[test]
    fn parameters_report_changes_and_reject_bad_values() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 14, None);
        assert_eq!(texture.set_parameter(GL_TEXTURE_MIN_FILTER, GL_LINEAR), Ok(true));
        assert_eq!(texture.set_parameter(GL_TEXTURE_MIN_FILTER, GL_LINEAR), Ok(false));
        assert_eq!(texture.set_parameter(GL_TEXTURE_WRAP_S, GL_LINEAR), Err(GlError::InvalidEnum));
        assert_eq!(texture.sampler_desc().min_filter, vk::Filter::LINEAR);
        assert_eq!(texture.sampler_desc().max_lod, 0.25);
    }

    #[test]
    fn renderbuffer_storage_keeps_sized_format() {
        let mut texture = Texture::new(GL_TEXTURE_2D, 1, None);
        texture.set_storage(16, 8, GL_DEPTH_COMPONENT24_OES).unwrap();
        assert_eq!(texture.internal_format(), GL_DEPTH_COMPONENT24_OES);
        assert_eq!((texture.width(), texture.height()), (16, 8));
    }
}
