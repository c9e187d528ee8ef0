//! The EGL-facing surface description and the system framebuffer built from it.

use ash::vk;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crate::gl::*;
use crate::resources::{Attachment, Framebuffer, Texture, TextureHandle};
use crate::util::format::{self, PixelFormat, FORMAT_TABLE};
use crate::vk::image::Image;
use super::Context;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceType {
    #[default]
    Window,
    Pbuffer,
    Pixmap,
}

/// What the windowing layer hands the core for the surface draws go to
/// while framebuffer 0 is bound.
#[derive(Clone, Debug, Default)]
pub struct EGLSurfaceInterface {
    pub surface_type: SurfaceType,
    pub width: u32,
    pub height: u32,
    /// Requested depth bits; 0 for none
    pub depth_size: u32,
    /// Requested stencil bits; 0 for none
    pub stencil_size: u32,
    /// Presentable images owned by the windowing layer. Empty for surfaces
    /// whose color buffer the core allocates itself.
    pub images: Vec<vk::Image>,
    pub surface_color_format: vk::Format,
    pub next_image_index: u32,
}

impl EGLSurfaceInterface {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

fn color_internal_format(vk_format: vk::Format) -> Result<GLenum> {
    let pixel = PixelFormat::from_vk_format(vk_format)
        .ok_or_else(|| eyre!("Unsupported surface color format {vk_format:?}"))?;
    FORMAT_TABLE
        .iter()
        .find(|info| info.pixel == pixel && info.color_renderable)
        .map(|info| info.internal_format)
        .ok_or_else(|| eyre!("Surface color format {vk_format:?} is not renderable"))
}

impl Context {
    /// Build the system framebuffer for `surface`, replacing any earlier one.
    pub fn set_write_surface(&mut self, surface: &EGLSurfaceInterface) -> Result<()> {
        self.flush()?;
        if let Some(previous) = self.system_framebuffer.take() {
            self.release_framebuffer(previous);
        }

        let (width, height) = (surface.width as i32, surface.height as i32);
        let color_format = color_internal_format(surface.surface_color_format)?;
        let mut framebuffer = Framebuffer::new(self.device.clone());

        let mut color_textures: Vec<TextureHandle> = Vec::new();
        match &self.device {
            Some(device) if !surface.images.is_empty() => {
                for &image in &surface.images {
                    let image = Image::from_external(
                        image,
                        surface.surface_color_format,
                        surface.width,
                        surface.height,
                        device.clone(),
                    )?;
                    color_textures.push(self.textures.insert(Texture::from_image(image, color_format, device.clone())));
                }
            }
            _ => {
                let mut texture = Texture::new(GL_TEXTURE_2D, 1, self.device.clone());
                texture.set_storage(width, height, color_format)?;
                color_textures.push(self.textures.insert(texture));
            }
        }
        // The framebuffer takes over the reference from insertion
        for (index, handle) in color_textures.into_iter().enumerate() {
            let attachment = Attachment::texture(GL_COLOR_ATTACHMENT0 + index as GLenum, 0, 0, 0, handle);
            framebuffer.add_color_attachment(attachment, &self.textures);
        }

        let ds_format = format::depth_stencil_vk_format_from_bits(surface.depth_size, surface.stencil_size);
        if ds_format != vk::Format::UNDEFINED {
            let internal_format = format::depth_stencil_internal_format(ds_format);
            let mut texture = Texture::new(GL_TEXTURE_2D, 1, self.device.clone());
            texture.set_storage(width, height, internal_format)?;
            let handle = self.textures.insert(texture);
            if format::vk_format_has_depth(ds_format) {
                self.textures.retain(handle);
                framebuffer.set_depth_attachment(Attachment::renderbuffer(GL_DEPTH_ATTACHMENT, 0, handle), &self.textures);
            }
            if format::vk_format_has_stencil(ds_format) {
                self.textures.retain(handle);
                framebuffer.set_stencil_attachment(Attachment::renderbuffer(GL_STENCIL_ATTACHMENT, 0, handle), &self.textures);
            }
            self.release_texture(handle);
        }

        framebuffer.set_write_buffer_index(surface.next_image_index as usize);
        self.system_framebuffer = Some(self.framebuffers.insert(framebuffer));
        self.mark_viewport(true);
        log::info!(
            "Surface {:?} {}x{} with {} color buffers, depth/stencil {:?}",
            surface.surface_type,
            width,
            height,
            surface.image_count().max(1),
            ds_format,
        );
        Ok(())
    }
}
