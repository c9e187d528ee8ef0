//! Framebuffers: attachment slots, completeness and lazy render pass synthesis.

use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use smallvec::SmallVec;
use crate::gl::*;
use crate::resources::arena::{ResourceArena, TextureHandle};
use crate::resources::texture::Texture;
use crate::util::format;
use crate::vk::image::{Image, ImageCreateInfo};
use crate::vk::render_pass::{FramebufferObject, RenderPass, RenderPassDesc, ATTACHMENT_RESTING_LAYOUT};
use crate::vk::VulkanDevice;

pub type TextureArena = ResourceArena<TextureHandle, Texture>;

/// One framebuffer slot. The texture is referenced, never owned: the arena
/// reference count keeps it alive while attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment point: `GL_NONE`, `GL_COLOR_ATTACHMENT0`, `GL_DEPTH_ATTACHMENT` or `GL_STENCIL_ATTACHMENT`
    pub ty: GLenum,
    /// `GL_TEXTURE`, `GL_RENDERBUFFER` or `GL_NONE`
    pub object_type: GLenum,
    pub name: GLuint,
    pub level: u32,
    pub layer: u32,
    pub texture: Option<TextureHandle>,
}

impl Default for Attachment {
    fn default() -> Self {
        Self::none(GL_NONE)
    }
}

impl Attachment {
    pub fn none(ty: GLenum) -> Self {
        Self {
            ty,
            object_type: GL_NONE,
            name: 0,
            level: 0,
            layer: 0,
            texture: None,
        }
    }

    pub fn texture(ty: GLenum, name: GLuint, level: u32, layer: u32, texture: TextureHandle) -> Self {
        Self {
            ty,
            object_type: GL_TEXTURE,
            name,
            level,
            layer,
            texture: Some(texture),
        }
    }

    pub fn renderbuffer(ty: GLenum, name: GLuint, texture: TextureHandle) -> Self {
        Self {
            ty,
            object_type: GL_RENDERBUFFER,
            name,
            level: 0,
            layer: 0,
            texture: Some(texture),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.texture.is_some()
    }

    fn dimensions(&self, textures: &TextureArena) -> Option<(i32, i32)> {
        let texture = textures.get(self.texture?)?;
        Some(texture.level_dimensions(self.level, self.layer))
    }

    fn internal_format(&self, textures: &TextureArena) -> GLenum {
        self.texture
            .and_then(|handle| textures.get(handle))
            .and_then(|texture| texture.state(self.level, self.layer))
            .map_or(GL_NONE, |state| state.internal_format)
    }
}

/// Render pass and `vk::Framebuffer`s built for one attachment configuration.
struct RenderTarget {
    render_pass: RenderPass,
    // One per color attachment; index 0 alone when there is no color
    framebuffers: Vec<FramebufferObject>,
    // Images the framebuffers were created from, to spot reallocated textures
    images: SmallVec<[vk::Image; 4]>,
}

pub struct Framebuffer {
    color_attachments: SmallVec<[Attachment; 3]>,
    depth: Attachment,
    stencil: Attachment,
    // Combined image standing in for separate depth and stencil attachments
    depth_stencil: Option<Texture>,

    width: i32,
    height: i32,
    write_index: usize,

    updated: bool,
    target: Option<RenderTarget>,
    retired: Vec<RenderTarget>,
    retired_textures: Vec<Texture>,
    device: Option<Arc<VulkanDevice>>,
}

impl Framebuffer {
    pub fn new(device: Option<Arc<VulkanDevice>>) -> Self {
        Self {
            color_attachments: SmallVec::new(),
            depth: Attachment::none(GL_DEPTH_ATTACHMENT),
            stencil: Attachment::none(GL_STENCIL_ATTACHMENT),
            depth_stencil: None,

            width: 0,
            height: 0,
            write_index: 0,

            updated: true,
            target: None,
            retired: Vec::new(),
            retired_textures: Vec::new(),
            device,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn color_attachment(&self, index: usize) -> Option<&Attachment> {
        self.color_attachments.get(index)
    }

    pub fn color_attachment_count(&self) -> usize {
        self.color_attachments.len()
    }

    pub fn depth_attachment(&self) -> &Attachment {
        &self.depth
    }

    pub fn stencil_attachment(&self) -> &Attachment {
        &self.stencil
    }

    /// Texture handles referenced by every slot, with repetition.
    pub fn attached_textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.color_attachments
            .iter()
            .chain([&self.depth, &self.stencil])
            .filter_map(|attachment| attachment.texture)
    }

    fn adopt_dimensions(&mut self, attachment: &Attachment, textures: &TextureArena) {
        if let Some((width, height)) = attachment.dimensions(textures) {
            self.width = width;
            self.height = height;
        }
        self.updated = true;
    }

    /// Append a color slot (one per swapchain image for system framebuffers).
    pub fn add_color_attachment(&mut self, attachment: Attachment, textures: &TextureArena) {
        self.adopt_dimensions(&attachment, textures);
        self.color_attachments.push(attachment);
    }

    /// Replace color slot 0. Returns the previous attachment so the caller
    /// can release its texture reference.
    pub fn set_color_attachment(&mut self, attachment: Attachment, textures: &TextureArena) -> Attachment {
        self.adopt_dimensions(&attachment, textures);
        if self.color_attachments.is_empty() {
            self.color_attachments.push(attachment);
            Attachment::none(GL_COLOR_ATTACHMENT0)
        } else {
            std::mem::replace(&mut self.color_attachments[0], attachment)
        }
    }

    pub fn set_depth_attachment(&mut self, attachment: Attachment, textures: &TextureArena) -> Attachment {
        self.adopt_dimensions(&attachment, textures);
        std::mem::replace(&mut self.depth, attachment)
    }

    pub fn set_stencil_attachment(&mut self, attachment: Attachment, textures: &TextureArena) -> Attachment {
        self.adopt_dimensions(&attachment, textures);
        std::mem::replace(&mut self.stencil, attachment)
    }

    /// Clear every slot referring to `texture`, returning one handle per
    /// cleared slot.
    pub fn detach(&mut self, texture: TextureHandle) -> Vec<TextureHandle> {
        let mut detached = Vec::new();
        for attachment in self
            .color_attachments
            .iter_mut()
            .chain([&mut self.depth, &mut self.stencil])
        {
            if attachment.texture == Some(texture) {
                *attachment = Attachment::none(attachment.ty);
                detached.push(texture);
            }
        }
        if !detached.is_empty() {
            self.updated = true;
        }
        detached
    }

    /// Re-read dimensions after an attached texture was respecified.
    pub fn refresh(&mut self, texture: TextureHandle, textures: &TextureArena) {
        let attachment = self
            .color_attachments
            .iter()
            .chain([&self.depth, &self.stencil])
            .find(|attachment| attachment.texture == Some(texture))
            .copied();
        if let Some(attachment) = attachment {
            self.adopt_dimensions(&attachment, textures);
        }
    }

    /// Select which color slot draws render into. Framebuffers with a single
    /// color slot ignore the index.
    pub fn set_write_buffer_index(&mut self, index: usize) {
        if self.color_attachments.len() > 1 && index < self.color_attachments.len() {
            self.write_index = index;
        }
    }

    pub fn write_buffer_index(&self) -> usize {
        self.write_index
    }

    pub fn write_attachment(&self) -> Option<&Attachment> {
        self.color_attachments
            .get(self.write_index)
            .filter(|attachment| attachment.is_attached())
    }

    /// Color, depth and stencil slots holding a texture, in that order.
    fn present_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.color_attachments
            .get(self.write_index)
            .into_iter()
            .chain([&self.depth, &self.stencil])
            .filter(|attachment| attachment.is_attached())
    }

    /// Completeness of the current attachment configuration. Returns the
    /// first applicable status: missing, incomplete attachment, dimensions,
    /// then unsupported.
    pub fn check_status(&self, textures: &TextureArena) -> GLenum {
        if self.present_attachments().next().is_none() {
            return GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }

        for attachment in self.present_attachments() {
            let Some((width, height)) = attachment.dimensions(textures) else {
                return GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            };
            if width <= 0 || height <= 0 {
                return GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            }
            let internal_format = attachment.internal_format(textures);
            let renderable = match attachment.ty {
                GL_DEPTH_ATTACHMENT => format::is_depth_renderable(internal_format),
                GL_STENCIL_ATTACHMENT => format::is_stencil_renderable(internal_format),
                _ => format::is_color_renderable(internal_format),
            };
            if !renderable {
                return GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            }
        }

        let mut dimensions = self
            .present_attachments()
            .filter_map(|attachment| attachment.dimensions(textures));
        if let Some(first) = dimensions.next() {
            if dimensions.any(|other| other != first) {
                return GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS;
            }
        }

        if self.has_separate_depth_stencil() {
            let depth = self.depth.internal_format(textures);
            let stencil = self.stencil.internal_format(textures);
            // A packed depth/stencil format must fill both slots with the same image
            let packed = depth == GL_DEPTH24_STENCIL8_OES || stencil == GL_DEPTH24_STENCIL8_OES;
            if packed || format::depth_stencil_vk_format(depth, stencil) == vk::Format::UNDEFINED {
                return GL_FRAMEBUFFER_UNSUPPORTED;
            }
        }

        GL_FRAMEBUFFER_COMPLETE
    }

    fn has_separate_depth_stencil(&self) -> bool {
        self.depth.is_attached() && self.stencil.is_attached() && self.depth.texture != self.stencil.texture
    }

    /// Vulkan format of the depth/stencil attachment the render pass uses.
    pub fn depth_stencil_format(&self, textures: &TextureArena) -> vk::Format {
        let depth = self.depth.internal_format(textures);
        let stencil = self.stencil.internal_format(textures);
        if self.depth.is_attached() && self.depth.texture == self.stencil.texture {
            // One packed texture in both slots
            return format::depth_stencil_vk_format(depth, GL_NONE);
        }
        format::depth_stencil_vk_format(depth, stencil)
    }

    /// Synthesize the combined image for separately attached depth and
    /// stencil textures. Its format comes from the pair of internal formats.
    pub fn create_depth_stencil_texture(&mut self, textures: &TextureArena) -> Result<()> {
        let device = self.device.clone().ok_or_eyre("Framebuffer has no device")?;
        let vk_format = self.depth_stencil_format(textures);
        if vk_format == vk::Format::UNDEFINED {
            return Err(eyre!(
                "No depth/stencil format for depth {:#x} and stencil {:#x}",
                self.depth.internal_format(textures),
                self.stencil.internal_format(textures),
            ));
        }
        let image = Image::new(
            &ImageCreateInfo {
                format: vk_format,
                width: self.width as u32,
                height: self.height as u32,
                mip_levels: 1,
                array_layers: 1,
                cube_compatible: false,
                name: "Framebuffer depth/stencil",
            },
            device.clone(),
        )?;
        let internal_format = format::depth_stencil_internal_format(vk_format);
        if let Some(old) = self.depth_stencil.replace(Texture::from_image(image, internal_format, device)) {
            self.retired_textures.push(old);
        }
        Ok(())
    }

    /// Image serving as the depth/stencil attachment, if any.
    fn depth_stencil_image<'a>(&'a self, textures: &'a TextureArena) -> Option<(&'a Image, u32, u32)> {
        if self.has_separate_depth_stencil() {
            return self.depth_stencil.as_ref()?.image().map(|image| (image, 0, 0));
        }
        let attachment = [&self.depth, &self.stencil]
            .into_iter()
            .find(|attachment| attachment.is_attached())?;
        let image = textures.get(attachment.texture?)?.image()?;
        Some((image, attachment.level, attachment.layer))
    }

    fn depth_stencil_image_mut<'a>(&'a mut self, textures: &'a mut TextureArena) -> Option<&'a mut Image> {
        if self.has_separate_depth_stencil() {
            return self.depth_stencil.as_mut()?.image_mut();
        }
        let attachment = [&self.depth, &self.stencil]
            .into_iter()
            .find(|attachment| attachment.is_attached())?;
        textures.get_mut(attachment.texture?)?.image_mut()
    }

    /// Make sure every attached texture has a GPU image.
    fn allocate_attachments(&mut self, textures: &mut TextureArena) -> Result<()> {
        let handles: SmallVec<[TextureHandle; 5]> = self.attached_textures().collect();
        for handle in handles {
            textures
                .get_mut(handle)
                .ok_or_eyre("Attached texture no longer exists")?
                .ensure_allocated()?;
        }
        if self.has_separate_depth_stencil() {
            let stale = self.depth_stencil.as_ref().is_none_or(|texture| {
                texture.width() != self.width || texture.height() != self.height
            });
            if stale || self.updated {
                self.create_depth_stencil_texture(textures)?;
            }
        }
        Ok(())
    }

    fn attachment_images(&self, textures: &TextureArena) -> SmallVec<[vk::Image; 4]> {
        self.color_attachments
            .iter()
            .filter_map(|attachment| textures.get(attachment.texture?)?.image())
            .chain(self.depth_stencil_image(textures).map(|(image, _, _)| image))
            .map(|image| image.image)
            .collect()
    }

    fn build_target(&self, textures: &TextureArena, depth_write: bool, stencil_write: bool) -> Result<RenderTarget> {
        let device = self.device.clone().ok_or_eyre("Framebuffer has no device")?;

        let color_images: SmallVec<[(&Image, &Attachment); 3]> = self
            .color_attachments
            .iter()
            .filter_map(|attachment| Some((textures.get(attachment.texture?)?.image()?, attachment)))
            .collect();
        let depth_stencil = self.depth_stencil_image(textures);

        let (color_format, color_final_layout) = match color_images.first() {
            Some((image, _)) if image.is_external() => (image.format, vk::ImageLayout::PRESENT_SRC_KHR),
            Some((image, _)) => (image.format, ATTACHMENT_RESTING_LAYOUT),
            None => (vk::Format::UNDEFINED, ATTACHMENT_RESTING_LAYOUT),
        };
        let desc = RenderPassDesc {
            color_format,
            color_final_layout,
            depth_stencil_format: depth_stencil.map_or(vk::Format::UNDEFINED, |(image, _, _)| image.format),
            depth_write_enable: depth_write,
            stencil_write_enable: stencil_write,
        };
        let render_pass = RenderPass::create(desc, device.clone())?;

        let framebuffer_count = color_images.len().max(1);
        let mut framebuffers = Vec::with_capacity(framebuffer_count);
        for index in 0..framebuffer_count {
            let mut views = Vec::with_capacity(2);
            if let Some((image, attachment)) = color_images.get(index) {
                views.push(image.create_attachment_view(attachment.level, attachment.layer)?);
            }
            if let Some((image, level, layer)) = depth_stencil {
                match image.create_attachment_view(level, layer) {
                    Ok(view) => views.push(view),
                    Err(e) => {
                        for view in views {
                            unsafe { device.logical.destroy_image_view(view, None) };
                        }
                        return Err(e);
                    }
                }
            }
            framebuffers.push(FramebufferObject::create(
                &render_pass,
                views,
                self.width as u32,
                self.height as u32,
                device.clone(),
            )?);
        }

        Ok(RenderTarget {
            render_pass,
            framebuffers,
            images: self.attachment_images(textures),
        })
    }

    /// Begin the render pass for the current write buffer, rebuilding the
    /// pass and framebuffers only when attachments changed or the depth and
    /// stencil write enables differ from what the pass was built with.
    pub fn begin_vk_render_pass(
        &mut self,
        cmd: vk::CommandBuffer,
        textures: &mut TextureArena,
        depth_write: bool,
        stencil_write: bool,
    ) -> Result<()> {
        self.allocate_attachments(textures)?;

        let stale = match &self.target {
            None => true,
            Some(target) => {
                self.updated
                    || target.render_pass.desc.depth_write_enable != depth_write
                    || target.render_pass.desc.stencil_write_enable != stencil_write
                    || target.images != self.attachment_images(textures)
            }
        };
        if stale {
            let target = self.build_target(textures, depth_write, stencil_write)?;
            if let Some(old) = self.target.replace(target) {
                self.retired.push(old);
            }
            self.updated = false;
            log::debug!("Rebuilt render pass for {}x{} framebuffer", self.width, self.height);
        }

        // Render passes expect every attachment in the resting layout
        if let Some(handle) = self.write_attachment().and_then(|attachment| attachment.texture) {
            if let Some(image) = textures.get_mut(handle).and_then(|texture| texture.image_mut()) {
                if image.layout() != ATTACHMENT_RESTING_LAYOUT {
                    image.transition(cmd, ATTACHMENT_RESTING_LAYOUT);
                }
            }
        }
        if let Some(image) = self.depth_stencil_image_mut(textures) {
            if image.layout() != ATTACHMENT_RESTING_LAYOUT {
                image.transition(cmd, ATTACHMENT_RESTING_LAYOUT);
            }
        }

        let target = self.target.as_ref().ok_or_eyre("Render target missing")?;
        let index = self.write_index.min(target.framebuffers.len() - 1);
        target
            .render_pass
            .begin(cmd, &target.framebuffers[index], self.width as u32, self.height as u32);
        Ok(())
    }

    /// End the render pass and record the layout it left the write buffer in.
    pub fn end_vk_render_pass(&mut self, cmd: vk::CommandBuffer, textures: &mut TextureArena) -> Result<()> {
        let target = self.target.as_ref().ok_or_eyre("No render pass to end")?;
        target.render_pass.end(cmd);
        let final_layout = target.render_pass.desc.color_final_layout;

        if let Some(handle) = self.write_attachment().and_then(|attachment| attachment.texture) {
            if let Some(image) = textures.get_mut(handle).and_then(|texture| texture.image_mut()) {
                image.set_layout(final_layout);
            }
        }
        if let Some(image) = self.depth_stencil_image_mut(textures) {
            image.set_layout(ATTACHMENT_RESTING_LAYOUT);
        }
        Ok(())
    }

    /// Render pass of the current target, for pipeline compilation.
    pub fn vk_render_pass(&self) -> Option<vk::RenderPass> {
        self.target.as_ref().map(|target| target.render_pass.render_pass)
    }

    pub fn has_depth_stencil(&self) -> bool {
        self.depth.is_attached() || self.stencil.is_attached()
    }

    /// Drop render passes and images replaced since the last completed frame.
    pub fn destroy_retired(&mut self) {
        self.retired.clear();
        self.retired_textures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(textures: &mut TextureArena, width: i32, height: i32, internal_format: GLenum) -> TextureHandle {
        let mut texture = Texture::new(GL_TEXTURE_2D, 1, None);
        texture.set_storage(width, height, internal_format).unwrap();
        textures.insert(texture)
    }

    fn color(handle: TextureHandle) -> Attachment {
        Attachment::renderbuffer(GL_COLOR_ATTACHMENT0, 1, handle)
    }

    fn depth(handle: TextureHandle) -> Attachment {
        Attachment::renderbuffer(GL_DEPTH_ATTACHMENT, 2, handle)
    }

    fn stencil(handle: TextureHandle) -> Attachment {
        Attachment::renderbuffer(GL_STENCIL_ATTACHMENT, 3, handle)
    }

    #[test]
    fn no_attachments_is_missing() {
        let textures = TextureArena::new();
        let framebuffer = Framebuffer::new(None);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT);
    }

    #[test]
    fn mismatched_sizes_are_incomplete_dimensions() {
        let mut textures = TextureArena::new();
        let c = texture(&mut textures, 4, 4, GL_RGBA4);
        let d = texture(&mut textures, 8, 8, GL_DEPTH_COMPONENT16);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_color_attachment(color(c), &textures);
        framebuffer.set_depth_attachment(depth(d), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS);
    }

    #[test]
    fn matching_color_and_depth_is_complete() {
        let mut textures = TextureArena::new();
        let c = texture(&mut textures, 4, 4, GL_RGBA4);
        let d = texture(&mut textures, 4, 4, GL_DEPTH_COMPONENT16);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_color_attachment(color(c), &textures);
        framebuffer.set_depth_attachment(depth(d), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_COMPLETE);
        assert_eq!((framebuffer.width(), framebuffer.height()), (4, 4));
    }

    #[test]
    fn wrong_format_category_is_incomplete_attachment() {
        let mut textures = TextureArena::new();
        let d = texture(&mut textures, 4, 4, GL_DEPTH_COMPONENT16);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_color_attachment(color(d), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT);

        let mut framebuffer = Framebuffer::new(None);
        let c = texture(&mut textures, 4, 4, GL_RGB565);
        framebuffer.set_stencil_attachment(stencil(c), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT);
    }

    #[test]
    fn unsized_attachment_is_incomplete_attachment() {
        let mut textures = TextureArena::new();
        let handle = textures.insert(Texture::new(GL_TEXTURE_2D, 1, None));
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_color_attachment(color(handle), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT);
    }

    #[test]
    fn separate_depth_and_stencil_pair_through_table() {
        let mut textures = TextureArena::new();
        let d = texture(&mut textures, 4, 4, GL_DEPTH_COMPONENT16);
        let s = texture(&mut textures, 4, 4, GL_STENCIL_INDEX8);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(d), &textures);
        framebuffer.set_stencil_attachment(stencil(s), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_COMPLETE);
        assert_eq!(framebuffer.depth_stencil_format(&textures), vk::Format::D16_UNORM_S8_UINT);
    }

    #[test]
    fn packed_depth_stencil_in_both_slots() {
        let mut textures = TextureArena::new();
        let ds = texture(&mut textures, 4, 4, GL_DEPTH24_STENCIL8_OES);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(ds), &textures);
        framebuffer.set_stencil_attachment(stencil(ds), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_COMPLETE);
        assert_eq!(framebuffer.depth_stencil_format(&textures), vk::Format::D24_UNORM_S8_UINT);
    }

    #[test]
    fn separate_packed_depth_stencil_pair_is_unsupported() {
        let mut textures = TextureArena::new();
        let d = texture(&mut textures, 4, 4, GL_DEPTH24_STENCIL8_OES);
        let s = texture(&mut textures, 4, 4, GL_DEPTH24_STENCIL8_OES);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(d), &textures);
        framebuffer.set_stencil_attachment(stencil(s), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_UNSUPPORTED);

        let d = texture(&mut textures, 4, 4, GL_DEPTH_COMPONENT24_OES);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(d), &textures);
        framebuffer.set_stencil_attachment(stencil(s), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_UNSUPPORTED);

        // Stencil-only formats cannot sit in the depth slot
        let d = texture(&mut textures, 4, 4, GL_STENCIL_INDEX8);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(d), &textures);
        framebuffer.set_stencil_attachment(stencil(s), &textures);
        assert_eq!(framebuffer.check_status(&textures), GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT);
    }

    #[test]
    fn attaching_marks_updated_and_returns_previous() {
        let mut textures = TextureArena::new();
        let a = texture(&mut textures, 4, 4, GL_RGBA4);
        let b = texture(&mut textures, 2, 2, GL_RGBA4);
        let mut framebuffer = Framebuffer::new(None);
        assert_eq!(framebuffer.set_color_attachment(color(a), &textures).texture, None);
        assert_eq!(framebuffer.set_color_attachment(color(b), &textures).texture, Some(a));
        assert!(framebuffer.is_updated());
        assert_eq!((framebuffer.width(), framebuffer.height()), (2, 2));
    }

    #[test]
    fn write_index_ignored_with_single_color_slot() {
        let mut textures = TextureArena::new();
        let a = texture(&mut textures, 4, 4, GL_RGBA8_OES);
        let b = texture(&mut textures, 4, 4, GL_RGBA8_OES);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.add_color_attachment(color(a), &textures);
        framebuffer.set_write_buffer_index(1);
        assert_eq!(framebuffer.write_buffer_index(), 0);

        framebuffer.add_color_attachment(color(b), &textures);
        framebuffer.set_write_buffer_index(1);
        assert_eq!(framebuffer.write_buffer_index(), 1);
        assert_eq!(framebuffer.write_attachment().unwrap().texture, Some(b));
    }

    #[test]
    fn detach_clears_every_slot_using_texture() {
        let mut textures = TextureArena::new();
        let ds = texture(&mut textures, 4, 4, GL_DEPTH24_STENCIL8_OES);
        let mut framebuffer = Framebuffer::new(None);
        framebuffer.set_depth_attachment(depth(ds), &textures);
        framebuffer.set_stencil_attachment(stencil(ds), &textures);
        assert_eq!(framebuffer.detach(ds).len(), 2);
        assert!(!framebuffer.has_depth_stencil());
    }
}
