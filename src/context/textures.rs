//! Texture and renderbuffer objects: names, bindings, image specification.

use color_eyre::Result;
use crate::error::GlError;
use crate::gl::*;
use crate::resources::{Texture, TextureHandle};
use crate::util::format;
use crate::util::{ImageRect, Rect};
use super::Context;

/// Bytes glTexImage2D reads for a `width` x `height` upload. The last row is
/// not padded to the unpack alignment.
fn required_upload_size(width: i32, height: i32, format: GLenum, ty: GLenum, alignment: u32) -> Option<usize> {
    let pixel = format::gl_format_type_to_pixel_format(format, ty)?;
    if width == 0 || height == 0 {
        return Some(0);
    }
    let layout = ImageRect::new(
        Rect::new(0, 0, width, height),
        pixel.element_count(),
        pixel.element_size(),
        alignment,
    );
    Some(layout.row_stride() * (height as usize - 1) + layout.pixel_size() * width as usize)
}

impl Context {
    pub fn gen_textures(&mut self, count: GLsizei) -> Vec<GLuint> {
        if count < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Vec::new();
        }
        self.texture_names.generate(count as usize)
    }

    pub fn is_texture(&self, name: GLuint) -> bool {
        self.texture_names.get(name).is_some()
    }

    /// glBindTexture. The object behind a name is created on its first bind
    /// and keeps that target for life.
    pub fn bind_texture(&mut self, target: GLenum, name: GLuint) {
        if !matches!(target, GL_TEXTURE_2D | GL_TEXTURE_CUBE_MAP) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }

        let handle = if name == 0 {
            None
        } else {
            let handle = match self.texture_names.get(name) {
                Some(handle) => handle,
                None => {
                    let texture = Texture::new(target, self.config.max_mip_levels, self.device.clone());
                    let handle = self.textures.insert(texture);
                    self.texture_names.bind(name, handle);
                    handle
                }
            };
            if self.textures.get(handle).is_some_and(|texture| texture.target() != target) {
                self.state.set_error(GlError::InvalidOperation);
                return;
            }
            self.textures.retain(handle);
            Some(handle)
        };

        if let Some(previous) = self.state.active_objects.update_texture(target, handle) {
            self.release_texture(previous);
        }
    }

    pub fn delete_textures(&mut self, names: &[GLuint]) {
        for &name in names {
            let Some(handle) = self.texture_names.remove(name) else {
                continue;
            };
            self.forget_texture(handle);
        }
    }

    /// Drop every binding and attachment of a deleted texture or renderbuffer,
    /// then the reference its name held.
    fn forget_texture(&mut self, handle: TextureHandle) {
        for _ in 0..self.state.active_objects.unbind_texture(handle) {
            self.release_texture(handle);
        }
        let detached: Vec<TextureHandle> = self
            .framebuffers
            .iter_mut()
            .flat_map(|(_, framebuffer)| framebuffer.detach(handle))
            .collect();
        if !detached.is_empty() {
            self.mark_viewport(true);
        }
        for texture in detached {
            self.release_texture(texture);
        }
        self.release_texture(handle);
    }

    /// Re-read framebuffer dimensions after `texture` was respecified.
    fn refresh_framebuffers(&mut self, texture: TextureHandle) {
        let current = self.current_framebuffer();
        for (handle, framebuffer) in self.framebuffers.iter_mut() {
            if framebuffer.attached_textures().any(|attached| attached == texture) {
                framebuffer.refresh(texture, &self.textures);
                self.viewport_needs_update |= Some(handle) == current;
            }
        }
    }

    /// Texture bound to the active unit for the binding owning `target`.
    fn target_texture(&mut self, binding: GLenum) -> Option<TextureHandle> {
        let handle = self.state.active_objects.active_texture(binding);
        if handle.is_none() {
            self.state.set_error(GlError::InvalidOperation);
        }
        handle
    }

    /// glTexImage2D. `pixels` of `None` specifies the level without contents.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        let (Some(binding), Some(layer)) = (image_target_binding(target), image_target_layer(target)) else {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        };
        if format::format_info(format, ty).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        if level < 0 || level as u32 >= self.config.max_mip_levels {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        let max_size = self.max_texture_size() >> level;
        if width < 0 || height < 0 || width > max_size || height > max_size || border != 0 {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        if binding == GL_TEXTURE_CUBE_MAP && width != height {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        if internal_format as GLenum != format {
            self.state.set_error(GlError::InvalidOperation);
            return Ok(());
        }
        let alignment = self.state.pixel_storage.unpack_alignment();
        if let Some(pixels) = pixels {
            let required = required_upload_size(width, height, format, ty, alignment).unwrap_or(usize::MAX);
            if pixels.len() < required {
                self.state.set_error(GlError::InvalidValue);
                return Ok(());
            }
        }
        let Some(handle) = self.target_texture(binding) else {
            return Ok(());
        };

        // The image may be in use by recorded commands
        self.flush()?;
        if let Some(texture) = self.textures.get_mut(handle) {
            texture.set_state(width, height, level as u32, layer, format, ty, alignment, pixels)?;
        }
        self.refresh_framebuffers(handle);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &[u8],
    ) -> Result<()> {
        let (Some(binding), Some(layer)) = (image_target_binding(target), image_target_layer(target)) else {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        };
        if format::format_info(format, ty).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        if level < 0 || level as u32 >= self.config.max_mip_levels {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        let alignment = self.state.pixel_storage.unpack_alignment();
        let required = required_upload_size(width.max(0), height.max(0), format, ty, alignment).unwrap_or(usize::MAX);
        if pixels.len() < required {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        let Some(handle) = self.target_texture(binding) else {
            return Ok(());
        };

        self.flush()?;
        let Some(texture) = self.textures.get_mut(handle) else {
            return Ok(());
        };
        let result = texture.set_sub_state(
            x_offset,
            y_offset,
            width,
            height,
            level as u32,
            layer,
            format,
            ty,
            alignment,
            pixels,
        );
        match result {
            Ok(upload) => upload,
            Err(error) => {
                self.state.set_error(error);
                Ok(())
            }
        }
    }

    pub fn tex_parameter(&mut self, target: GLenum, pname: GLenum, param: GLenum) {
        if !matches!(target, GL_TEXTURE_2D | GL_TEXTURE_CUBE_MAP) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let Some(handle) = self.target_texture(target) else {
            return;
        };
        if let Some(texture) = self.textures.get_mut(handle) {
            let result = texture.set_parameter(pname, param);
            self.record(result);
        }
    }

    /// glGenerateMipmap: level 0 must be specified with power-of-two sides,
    /// and every cube face must match.
    pub fn generate_mipmap(&mut self, target: GLenum) -> Result<()> {
        if !matches!(target, GL_TEXTURE_2D | GL_TEXTURE_CUBE_MAP) {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        let Some(handle) = self.target_texture(target) else {
            return Ok(());
        };
        let Some(texture) = self.textures.get_mut(handle) else {
            return Ok(());
        };

        let (width, height) = (texture.width(), texture.height());
        let base_set = texture.state(0, 0).is_some_and(|state| state.is_set());
        let power_of_two = width > 0 && height > 0 && (width as u32).is_power_of_two() && (height as u32).is_power_of_two();
        let cube_complete = target != GL_TEXTURE_CUBE_MAP || texture.is_completed();
        if !base_set || !power_of_two || !cube_complete {
            self.state.set_error(GlError::InvalidOperation);
            return Ok(());
        }

        self.flush()?;
        let hint = self.state.hint_aspects.generate_mipmap_hint();
        if let Some(texture) = self.textures.get_mut(handle) {
            texture.generate_mipmaps(hint)?;
        }
        Ok(())
    }

    pub fn gen_renderbuffers(&mut self, count: GLsizei) -> Vec<GLuint> {
        if count < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Vec::new();
        }
        self.renderbuffer_names.generate(count as usize)
    }

    pub fn is_renderbuffer(&self, name: GLuint) -> bool {
        self.renderbuffer_names.get(name).is_some()
    }

    /// glBindRenderbuffer. Renderbuffers are single-level 2D textures.
    pub fn bind_renderbuffer(&mut self, target: GLenum, name: GLuint) {
        if target != GL_RENDERBUFFER {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let handle = if name == 0 {
            None
        } else {
            let handle = match self.renderbuffer_names.get(name) {
                Some(handle) => handle,
                None => {
                    let handle = self.textures.insert(Texture::new(GL_TEXTURE_2D, 1, self.device.clone()));
                    self.renderbuffer_names.bind(name, handle);
                    handle
                }
            };
            self.textures.retain(handle);
            Some(handle)
        };
        if let Some(previous) = self.state.active_objects.update_renderbuffer(handle) {
            self.release_texture(previous);
        }
    }

    pub fn delete_renderbuffers(&mut self, names: &[GLuint]) {
        for &name in names {
            let Some(handle) = self.renderbuffer_names.remove(name) else {
                continue;
            };
            self.forget_texture(handle);
        }
    }

    pub fn renderbuffer_storage(
        &mut self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<()> {
        if target != GL_RENDERBUFFER {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        let renderable = format::is_color_renderable(internal_format)
            || format::is_depth_renderable(internal_format)
            || format::is_stencil_renderable(internal_format);
        if !renderable {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        let max_size = self.max_texture_size();
        if width < 0 || height < 0 || width > max_size || height > max_size {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        let Some(handle) = self.state.active_objects.renderbuffer() else {
            self.state.set_error(GlError::InvalidOperation);
            return Ok(());
        };

        self.flush()?;
        if let Some(texture) = self.textures.get_mut(handle) {
            texture.set_storage(width, height, internal_format)?;
        }
        self.refresh_framebuffers(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_row_is_not_padded() {
        // 3 RGB pixels per row at alignment 4: 9 bytes padded to 12
        assert_eq!(required_upload_size(3, 2, GL_RGB, GL_UNSIGNED_BYTE, 4), Some(12 + 9));
        assert_eq!(required_upload_size(3, 2, GL_RGB, GL_UNSIGNED_BYTE, 1), Some(18));
        assert_eq!(required_upload_size(0, 5, GL_RGBA, GL_UNSIGNED_BYTE, 4), Some(0));
        assert_eq!(required_upload_size(1, 1, GL_RGBA, GL_FLOAT, 4), None);
    }
}
