//! Framebuffer objects, attachment calls and pixel readback.

use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use crate::error::GlError;
use crate::gl::*;
use crate::resources::{Attachment, Framebuffer, TextureHandle};
use crate::util::color::{can_convert, convert_pixels, invert_image_y_axis};
use crate::util::format::{self, PixelFormat};
use crate::util::{ImageRect, Rect};
use super::Context;

fn is_attachment_point(attachment: GLenum) -> bool {
    matches!(attachment, GL_COLOR_ATTACHMENT0 | GL_DEPTH_ATTACHMENT | GL_STENCIL_ATTACHMENT)
}

impl Context {
    pub fn gen_framebuffers(&mut self, count: GLsizei) -> Vec<GLuint> {
        if count < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Vec::new();
        }
        self.framebuffer_names.generate(count as usize)
    }

    pub fn is_framebuffer(&self, name: GLuint) -> bool {
        self.framebuffer_names.get(name).is_some()
    }

    /// glBindFramebuffer. Name 0 selects the surface framebuffer.
    pub fn bind_framebuffer(&mut self, target: GLenum, name: GLuint) {
        if target != GL_FRAMEBUFFER {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let handle = if name == 0 {
            None
        } else {
            Some(match self.framebuffer_names.get(name) {
                Some(handle) => handle,
                None => {
                    let handle = self.framebuffers.insert(Framebuffer::new(self.device.clone()));
                    self.framebuffer_names.bind(name, handle);
                    handle
                }
            })
        };

        let previous = self.state.active_objects.framebuffer();
        if !self.state.active_objects.update_framebuffer(handle) {
            return;
        }
        if let Some(handle) = handle {
            self.framebuffers.retain(handle);
        }
        if let Some(previous) = previous {
            self.release_framebuffer(previous);
        }
        self.mark_viewport(true);
    }

    pub fn delete_framebuffers(&mut self, names: &[GLuint]) -> Result<()> {
        for &name in names {
            let Some(handle) = self.framebuffer_names.remove(name) else {
                continue;
            };
            if self.active_pass.is_some_and(|pass| pass.framebuffer == handle) {
                self.end_render_pass()?;
            }
            if self.state.active_objects.framebuffer() == Some(handle) {
                self.state.active_objects.update_framebuffer(None);
                self.release_framebuffer(handle);
                self.mark_viewport(true);
            }
            self.release_framebuffer(handle);
        }
        Ok(())
    }

    /// Put `attachment` into the slot `point` of the bound framebuffer,
    /// releasing whatever the slot held.
    fn attach(&mut self, point: GLenum, attachment: Attachment) {
        let Some(handle) = self.state.active_objects.framebuffer() else {
            self.state.set_error(GlError::InvalidOperation);
            return;
        };
        let Some(framebuffer) = self.framebuffers.get_mut(handle) else {
            return;
        };
        if let Some(texture) = attachment.texture {
            self.textures.retain(texture);
        }
        let previous = match point {
            GL_DEPTH_ATTACHMENT => framebuffer.set_depth_attachment(attachment, &self.textures),
            GL_STENCIL_ATTACHMENT => framebuffer.set_stencil_attachment(attachment, &self.textures),
            _ => framebuffer.set_color_attachment(attachment, &self.textures),
        };
        if let Some(texture) = previous.texture {
            self.release_texture(texture);
        }
        self.mark_viewport(true);
    }

    pub fn framebuffer_texture_2d(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        name: GLuint,
        level: GLint,
    ) {
        if target != GL_FRAMEBUFFER || !is_attachment_point(attachment) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        if self.state.active_objects.framebuffer().is_none() {
            self.state.set_error(GlError::InvalidOperation);
            return;
        }
        if name == 0 {
            self.attach(attachment, Attachment::none(attachment));
            return;
        }
        let (Some(binding), Some(layer)) = (image_target_binding(texture_target), image_target_layer(texture_target))
        else {
            self.state.set_error(GlError::InvalidEnum);
            return;
        };
        let Some(handle) = self.texture_names.get(name) else {
            self.state.set_error(GlError::InvalidOperation);
            return;
        };
        if self.textures.get(handle).is_none_or(|texture| texture.target() != binding) {
            self.state.set_error(GlError::InvalidOperation);
            return;
        }
        // Rendering into mip levels is an extension this context lacks
        if level != 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        self.attach(attachment, Attachment::texture(attachment, name, 0, layer, handle));
    }

    pub fn framebuffer_renderbuffer(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        name: GLuint,
    ) {
        if target != GL_FRAMEBUFFER || !is_attachment_point(attachment) || renderbuffer_target != GL_RENDERBUFFER {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        if self.state.active_objects.framebuffer().is_none() {
            self.state.set_error(GlError::InvalidOperation);
            return;
        }
        if name == 0 {
            self.attach(attachment, Attachment::none(attachment));
            return;
        }
        let Some(handle) = self.renderbuffer_names.get(name) else {
            self.state.set_error(GlError::InvalidOperation);
            return;
        };
        self.attach(attachment, Attachment::renderbuffer(attachment, name, handle));
    }

    /// glCheckFramebufferStatus. The surface framebuffer is always complete.
    pub fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        if target != GL_FRAMEBUFFER {
            self.state.set_error(GlError::InvalidEnum);
            return 0;
        }
        self.framebuffer_status()
    }

    pub(super) fn framebuffer_status(&self) -> GLenum {
        self.state
            .active_objects
            .framebuffer()
            .and_then(|handle| self.framebuffers.get(handle))
            .map_or(GL_FRAMEBUFFER_COMPLETE, |framebuffer| framebuffer.check_status(&self.textures))
    }

    /// glReadPixels from the write buffer of the current framebuffer. GL rows
    /// run bottom-up; the result follows GL order and the pack alignment.
    /// Pixels outside the framebuffer read as zero.
    pub fn read_pixels(
        &mut self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
    ) -> Result<Vec<u8>> {
        if width < 0 || height < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Ok(Vec::new());
        }
        let Some(dst_format) = format::gl_format_type_to_pixel_format(format, ty) else {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(Vec::new());
        };
        if !dst_format.is_color() {
            self.state.set_error(GlError::InvalidOperation);
            return Ok(Vec::new());
        }
        if self.framebuffer_status() != GL_FRAMEBUFFER_COMPLETE {
            self.state.set_error(GlError::InvalidFramebufferOperation);
            return Ok(Vec::new());
        }
        if self.is_headless() {
            return Err(eyre!("glReadPixels needs a device"));
        }

        let handle = self.current_framebuffer().ok_or_eyre("No framebuffer to read from")?;
        let framebuffer = self.framebuffers.get(handle).ok_or_eyre("Framebuffer no longer exists")?;
        let attachment = *framebuffer.write_attachment().ok_or_eyre("Framebuffer has no color buffer")?;
        let texture_handle: TextureHandle = attachment.texture.ok_or_eyre("Color attachment has no texture")?;
        let target = self.draw_target();
        let (fb_width, fb_height) = (target.width, target.height);

        let src_format = self
            .textures
            .get(texture_handle)
            .and_then(|texture| format::internal_format_info(texture.internal_format()))
            .map(|info| info.pixel)
            .ok_or_eyre("Color attachment has no pixel format")?;
        let via = if can_convert(src_format, dst_format) {
            None
        } else if can_convert(src_format, PixelFormat::Rgba8) && can_convert(PixelFormat::Rgba8, dst_format) {
            Some(PixelFormat::Rgba8)
        } else {
            self.state.set_error(GlError::InvalidOperation);
            return Ok(Vec::new());
        };

        let alignment = self.state.pixel_storage.pack_alignment();
        let out_layout = ImageRect::new(
            Rect::new(0, 0, width, height),
            dst_format.element_count(),
            dst_format.element_size(),
            alignment,
        );
        let mut out = vec![0u8; out_layout.buffer_size()];

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(fb_width);
        let y1 = (y + height).min(fb_height);
        if x1 <= x0 || y1 <= y0 {
            return Ok(out);
        }
        let (clip_width, clip_height) = (x1 - x0, y1 - y0);

        self.flush()?;
        let texture = self.textures.get_mut(texture_handle).ok_or_eyre("Color attachment no longer exists")?;
        let image_rect = Rect::new(x0, target.image_row(y0, clip_height), clip_width, clip_height);
        let mut data = texture.copy_pixels_to_host(attachment.level, attachment.layer, image_rect)?;
        if target.flip_y {
            let row_stride = src_format.bytes_per_pixel() * clip_width as usize;
            invert_image_y_axis(&mut data, clip_height as usize, row_stride);
        }

        let mut src_format = src_format;
        if let Some(intermediate) = via {
            let src_rect = ImageRect::new(
                Rect::new(0, 0, clip_width, clip_height),
                src_format.element_count(),
                src_format.element_size(),
                1,
            );
            let mid_rect = ImageRect::new(
                Rect::new(0, 0, clip_width, clip_height),
                intermediate.element_count(),
                intermediate.element_size(),
                1,
            );
            let mut converted = vec![0u8; mid_rect.buffer_size()];
            convert_pixels(src_format, intermediate, &src_rect, &data, &mid_rect, &mut converted);
            data = converted;
            src_format = intermediate;
        }

        let src_rect = ImageRect::new(
            Rect::new(0, 0, clip_width, clip_height),
            src_format.element_count(),
            src_format.element_size(),
            1,
        );
        let dst_rect = ImageRect::new(
            Rect::new(x0 - x, y0 - y, width, height),
            dst_format.element_count(),
            dst_format.element_size(),
            alignment,
        );
        convert_pixels(src_format, dst_format, &src_rect, &data, &dst_rect, &mut out);
        Ok(out)
    }
}
