//! Primitive assembly and vertex attribute arrays.

use crate::gl::*;
use crate::resources::BufferHandle;
use super::update;

/// One glVertexAttribPointer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub enabled: bool,
    pub size: GLint,
    pub ty: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: usize,
    pub buffer: Option<BufferHandle>,
}

impl Default for VertexAttribute {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 4,
            ty: GL_FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
            buffer: None,
        }
    }
}

impl VertexAttribute {
    pub fn element_size(&self) -> u32 {
        let component = match self.ty {
            GL_BYTE | GL_UNSIGNED_BYTE => 1,
            GL_SHORT | GL_UNSIGNED_SHORT | GL_HALF_FLOAT_OES => 2,
            _ => 4,
        };
        component * self.size.max(0) as u32
    }

    /// Distance between consecutive vertices; 0 means tightly packed.
    pub fn effective_stride(&self) -> u32 {
        if self.stride > 0 {
            self.stride as u32
        } else {
            self.element_size()
        }
    }
}

pub struct StateInputAssembly {
    primitive_mode: GLenum,
    primitive_restart_enabled: bool,
    attributes: Vec<VertexAttribute>,
}

impl StateInputAssembly {
    pub fn new(max_vertex_attribs: usize) -> Self {
        Self {
            primitive_mode: GL_TRIANGLES,
            primitive_restart_enabled: false,
            attributes: vec![VertexAttribute::default(); max_vertex_attribs],
        }
    }

    pub fn primitive_mode(&self) -> GLenum {
        self.primitive_mode
    }

    pub fn primitive_restart_enabled(&self) -> bool {
        self.primitive_restart_enabled
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: usize) -> Option<&VertexAttribute> {
        self.attributes.get(index)
    }

    pub fn update_primitive_mode(&mut self, mode: GLenum) -> bool {
        update(&mut self.primitive_mode, mode)
    }

    pub fn update_primitive_restart_enabled(&mut self, enabled: bool) -> bool {
        update(&mut self.primitive_restart_enabled, enabled)
    }

    /// Replace the pointer part of an attribute, keeping its enable flag.
    /// Out-of-range indices are rejected by the caller.
    pub fn update_attribute_pointer(&mut self, index: usize, pointer: VertexAttribute) -> bool {
        match self.attributes.get_mut(index) {
            Some(attribute) => {
                let value = VertexAttribute { enabled: attribute.enabled, ..pointer };
                update(attribute, value)
            }
            None => false,
        }
    }

    pub fn update_attribute_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.attributes.get_mut(index) {
            Some(attribute) => update(&mut attribute.enabled, enabled),
            None => false,
        }
    }

    /// Drop references to a deleted buffer.
    pub fn detach_buffer(&mut self, buffer: BufferHandle) -> bool {
        let mut changed = false;
        for attribute in self.attributes.iter_mut().filter(|a| a.buffer == Some(buffer)) {
            attribute.buffer = None;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_update_keeps_enable_flag() {
        let mut state = StateInputAssembly::new(4);
        assert!(state.update_attribute_enabled(1, true));
        let pointer = VertexAttribute { size: 3, stride: 12, ..Default::default() };
        assert!(state.update_attribute_pointer(1, pointer));
        assert!(state.attribute(1).unwrap().enabled);
        assert!(!state.update_attribute_pointer(1, pointer));
        assert!(!state.update_attribute_enabled(9, true));
    }

    #[test]
    fn zero_stride_means_packed() {
        let attribute = VertexAttribute { size: 3, ty: GL_UNSIGNED_SHORT, ..Default::default() };
        assert_eq!(attribute.effective_stride(), 6);
        let attribute = VertexAttribute { stride: 32, ..attribute };
        assert_eq!(attribute.effective_stride(), 32);
    }

    #[test]
    fn primitive_mode_compare_and_set() {
        let mut state = StateInputAssembly::new(1);
        assert!(!state.update_primitive_mode(GL_TRIANGLES));
        assert!(state.update_primitive_mode(GL_LINE_STRIP));
    }
}
