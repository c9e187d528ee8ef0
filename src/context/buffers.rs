//! Buffer objects and vertex attribute arrays.

use crate::error::GlError;
use crate::gl::*;
use crate::resources::BufferObject;
use crate::state::VertexAttribute;
use super::Context;

impl Context {
    pub fn gen_buffers(&mut self, count: GLsizei) -> Vec<GLuint> {
        if count < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Vec::new();
        }
        self.buffer_names.generate(count as usize)
    }

    pub fn is_buffer(&self, name: GLuint) -> bool {
        self.buffer_names.get(name).is_some()
    }

    pub fn bind_buffer(&mut self, target: GLenum, name: GLuint) {
        if !matches!(target, GL_ARRAY_BUFFER | GL_ELEMENT_ARRAY_BUFFER) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let handle = if name == 0 {
            None
        } else {
            let handle = match self.buffer_names.get(name) {
                Some(handle) => handle,
                None => {
                    let handle = self.buffers.insert(BufferObject::new(target, self.device.clone()));
                    self.buffer_names.bind(name, handle);
                    handle
                }
            };
            self.buffers.retain(handle);
            Some(handle)
        };

        match self.state.active_objects.update_buffer(target, handle) {
            Ok(Some(previous)) => self.release_buffer(previous),
            Ok(None) => {}
            Err(error) => {
                if let Some(handle) = handle {
                    self.release_buffer(handle);
                }
                self.state.set_error(error);
            }
        }
    }

    /// glDeleteBuffers. Attributes sourcing a deleted buffer lose it, which
    /// changes the vertex input layout.
    pub fn delete_buffers(&mut self, names: &[GLuint]) {
        for &name in names {
            let Some(handle) = self.buffer_names.remove(name) else {
                continue;
            };
            for _ in 0..self.state.active_objects.unbind_buffer(handle) {
                self.release_buffer(handle);
            }
            let changed = self.state.input_assembly.detach_buffer(handle);
            self.mark_pipeline(changed);
            self.release_buffer(handle);
        }
    }

    fn bound_buffer(&mut self, target: GLenum) -> Option<&mut BufferObject> {
        let handle = match target {
            GL_ARRAY_BUFFER => self.state.active_objects.array_buffer(),
            GL_ELEMENT_ARRAY_BUFFER => self.state.active_objects.element_array_buffer(),
            _ => {
                self.state.set_error(GlError::InvalidEnum);
                return None;
            }
        };
        let Some(handle) = handle else {
            self.state.set_error(GlError::InvalidOperation);
            return None;
        };
        self.buffers.get_mut(handle)
    }

    /// glBufferData. `data` of `None` allocates `size` zeroed bytes.
    pub fn buffer_data(&mut self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>, usage: GLenum) {
        if size < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let Some(buffer) = self.bound_buffer(target) else {
            return;
        };
        let result = buffer.buffer_data(size as usize, data, usage);
        self.record(result);
    }

    pub fn buffer_sub_data(&mut self, target: GLenum, offset: GLintptr, data: &[u8]) {
        if offset < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let Some(buffer) = self.bound_buffer(target) else {
            return;
        };
        let result = buffer.buffer_sub_data(offset as usize, data);
        self.record(result);
    }

    /// glVertexAttribPointer. The attribute reads from the buffer bound to
    /// `GL_ARRAY_BUFFER` at the time of the call.
    pub fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        if index as usize >= self.config.max_vertex_attribs || !(1..=4).contains(&size) || stride < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        if !matches!(ty, GL_BYTE | GL_UNSIGNED_BYTE | GL_SHORT | GL_UNSIGNED_SHORT | GL_FLOAT | GL_HALF_FLOAT_OES) {
            self.state.set_error(GlError::InvalidEnum);
            return;
        }
        let pointer = VertexAttribute {
            enabled: false,
            size,
            ty,
            normalized,
            stride,
            offset,
            buffer: self.state.active_objects.array_buffer(),
        };
        let changed = self.state.input_assembly.update_attribute_pointer(index as usize, pointer);
        self.mark_pipeline(changed);
    }

    pub fn enable_vertex_attrib_array(&mut self, index: GLuint) {
        self.set_vertex_attrib_array(index, true);
    }

    pub fn disable_vertex_attrib_array(&mut self, index: GLuint) {
        self.set_vertex_attrib_array(index, false);
    }

    fn set_vertex_attrib_array(&mut self, index: GLuint, enabled: bool) {
        if index as usize >= self.config.max_vertex_attribs {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let changed = self.state.input_assembly.update_attribute_enabled(index as usize, enabled);
        self.mark_pipeline(changed);
    }
}
