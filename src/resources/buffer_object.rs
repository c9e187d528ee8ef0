use std::borrow::Cow;
use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use gpu_allocator::MemoryLocation;
use crate::error::{GlError, GlResult};
use crate::gl::*;
use crate::vk::buffer::Buffer;
use crate::vk::VulkanDevice;

/// A GL buffer object. The host copy is canonical; the GPU buffer is
/// recreated from it on first use after any change.
pub struct BufferObject {
    target: GLenum,
    usage: GLenum,
    data: Vec<u8>,
    dirty: bool,

    buffer: Option<Buffer>,
    // Earlier draws of the frame still read these
    retired: Vec<Buffer>,
    device: Option<Arc<VulkanDevice>>,
}

impl BufferObject {
    pub fn new(target: GLenum, device: Option<Arc<VulkanDevice>>) -> Self {
        Self {
            target,
            usage: GL_STATIC_DRAW,
            data: Vec::new(),
            dirty: false,

            buffer: None,
            retired: Vec::new(),
            device,
        }
    }

    pub fn target(&self) -> GLenum {
        self.target
    }

    pub fn usage(&self) -> GLenum {
        self.usage
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the whole store. `None` allocates `size` zeroed bytes.
    pub fn buffer_data(&mut self, size: usize, data: Option<&[u8]>, usage: GLenum) -> GlResult<()> {
        if !matches!(usage, GL_STREAM_DRAW | GL_STATIC_DRAW | GL_DYNAMIC_DRAW) {
            return Err(GlError::InvalidEnum);
        }
        self.data = match data {
            Some(data) => data[..size.min(data.len())].to_vec(),
            None => vec![0; size],
        };
        self.data.resize(size, 0);
        self.usage = usage;
        self.dirty = true;
        Ok(())
    }

    pub fn buffer_sub_data(&mut self, offset: usize, data: &[u8]) -> GlResult<()> {
        let end = offset.checked_add(data.len()).ok_or(GlError::InvalidValue)?;
        if end > self.data.len() {
            return Err(GlError::InvalidValue);
        }
        self.data[offset..end].copy_from_slice(data);
        self.dirty = true;
        Ok(())
    }

    fn vk_usage(&self) -> vk::BufferUsageFlags {
        match self.target {
            GL_ELEMENT_ARRAY_BUFFER => vk::BufferUsageFlags::INDEX_BUFFER,
            _ => vk::BufferUsageFlags::VERTEX_BUFFER,
        }
    }

    /// Bytes the GPU buffer is created from. Vulkan buffers cannot be empty,
    /// so a zero-sized store becomes a few zero bytes.
    fn gpu_contents(&self) -> Cow<'_, [u8]> {
        if self.data.is_empty() {
            Cow::Owned(vec![0; 4])
        } else {
            Cow::Borrowed(&self.data)
        }
    }

    /// GPU buffer holding the current host contents.
    pub fn vk_buffer(&mut self) -> Result<vk::Buffer> {
        if self.dirty || self.buffer.is_none() {
            let device = self.device.clone().ok_or_eyre("Buffer object has no device")?;
            let contents = self.gpu_contents();
            let buffer = Buffer::new_staging(&contents, self.vk_usage(), "GL buffer object", device)?;
            if let Some(old) = self.buffer.replace(buffer) {
                self.retired.push(old);
            }
            self.dirty = false;
        }
        self.buffer
            .as_ref()
            .map(|buffer| buffer.buffer)
            .ok_or_eyre("Buffer object has no GPU buffer")
    }

    pub fn destroy_retired(&mut self) {
        self.retired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_data_copies_and_pads() {
        let mut buffer = BufferObject::new(GL_ARRAY_BUFFER, None);
        buffer.buffer_data(6, Some(&[1, 2, 3, 4]), GL_STATIC_DRAW).unwrap();
        assert_eq!(buffer.data(), &[1, 2, 3, 4, 0, 0]);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn empty_store_still_backs_a_gpu_buffer() {
        let mut buffer = BufferObject::new(GL_ARRAY_BUFFER, None);
        buffer.buffer_data(0, None, GL_STATIC_DRAW).unwrap();
        assert!(buffer.data().is_empty());
        assert_eq!(buffer.gpu_contents().len(), 4);
        buffer.buffer_data(2, Some(&[5, 6]), GL_STATIC_DRAW).unwrap();
        assert_eq!(&*buffer.gpu_contents(), &[5, 6]);
    }

    #[test]
    fn sub_data_must_fit() {
        let mut buffer = BufferObject::new(GL_ARRAY_BUFFER, None);
        buffer.buffer_data(4, None, GL_DYNAMIC_DRAW).unwrap();
        buffer.buffer_sub_data(2, &[9, 9]).unwrap();
        assert_eq!(buffer.data(), &[0, 0, 9, 9]);
        assert_eq!(buffer.buffer_sub_data(3, &[1, 1]), Err(GlError::InvalidValue));
        assert_eq!(buffer.buffer_sub_data(usize::MAX, &[1]), Err(GlError::InvalidValue));
    }

    #[test]
    fn unknown_usage_is_rejected() {
        let mut buffer = BufferObject::new(GL_ARRAY_BUFFER, None);
        assert_eq!(buffer.buffer_data(4, None, GL_FLOAT), Err(GlError::InvalidEnum));
        assert_eq!(buffer.size(), 0);
    }
}
