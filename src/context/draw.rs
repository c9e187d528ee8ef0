//! Draw and clear calls: dirty-flag resolution, render pass management and
//! command recording.

use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use smallvec::SmallVec;
use crate::error::GlError;
use crate::gl::*;
use crate::resources::{FramebufferHandle, ProgramHandle};
use crate::state::vk_mappings;
use crate::vk::buffer::Buffer;
use crate::vk::pipeline::PipelineTarget;
use super::{ActivePass, Context};

#[derive(Clone, Copy, Debug)]
enum DrawCall {
    Arrays { first: u32, count: u32 },
    Elements { count: u32, ty: GLenum, offset: usize },
}

/// Index data a draw reads: a range of a GL buffer object, or indices
/// synthesized for this draw alone.
enum IndexSource {
    None,
    Object { buffer: vk::Buffer, offset: u64, index_type: vk::IndexType, count: u32 },
    Transient { buffer: Buffer, index_type: vk::IndexType, count: u32 },
}

/// Indices closing a line loop over `count` vertices starting at `first`.
fn line_loop_indices(first: u32, count: u32) -> Vec<u32> {
    (first..first + count).chain((count > 0).then_some(first)).collect()
}

/// Decode `count` indices of type `ty` from the start of `bytes`.
fn read_indices(bytes: &[u8], ty: GLenum, count: usize) -> Option<Vec<u32>> {
    let size = index_size(ty)?;
    let bytes = bytes.get(..count.checked_mul(size)?)?;
    let indices = match ty {
        GL_UNSIGNED_BYTE => bytes.iter().map(|&index| u32::from(index)).collect(),
        GL_UNSIGNED_SHORT => bytes
            .chunks_exact(2)
            .map(|chunk| u32::from(u16::from_ne_bytes([chunk[0], chunk[1]])))
            .collect(),
        _ => bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    };
    Some(indices)
}

fn index_size(ty: GLenum) -> Option<usize> {
    match ty {
        GL_UNSIGNED_BYTE => Some(1),
        GL_UNSIGNED_SHORT => Some(2),
        GL_UNSIGNED_INT => Some(4),
        _ => None,
    }
}

/// Vulkan has no 8-bit indices: widen them, keeping the restart index a
/// restart index.
fn widen_u8_indices(indices: &[u32], restart: bool) -> Vec<u16> {
    indices
        .iter()
        .map(|&index| if restart && index == 0xff { u16::MAX } else { index as u16 })
        .collect()
}

impl Context {
    /// Translate pending state changes into the pipeline builder. A full
    /// rebuild covers the viewport; a viewport-only change skips the rest.
    /// Moving between flipped and unflipped targets swaps the front face, so
    /// it rebuilds too.
    fn resolve_pipeline_state(&mut self) -> Result<()> {
        let target = self.draw_target();
        if self.pipeline_needs_update || self.translated_flip != Some(target.flip_y) {
            self.state.init_vk_pipeline_states(&mut self.pipeline, target)?;
            self.translated_flip = Some(target.flip_y);
            self.pipeline_needs_update = false;
            self.viewport_needs_update = false;
        } else if self.viewport_needs_update {
            self.state.update_vk_viewport_state(&mut self.pipeline, target);
            self.viewport_needs_update = false;
        }
        Ok(())
    }

    /// Record the draw's primitive mode. Points and lines also select the
    /// polygon mode.
    fn set_primitive_mode(&mut self, mode: GLenum) {
        let changed = self.state.input_assembly.update_primitive_mode(mode);
        let polygon_changed = self.state.rasterization.update_polygon_mode(mode);
        self.mark_pipeline(changed || polygon_changed);
    }

    /// Common draw validation. Returns false after recording an error.
    fn validate_draw(&mut self, mode: GLenum, count: GLsizei) -> bool {
        if vk_mappings::gl_primitive_topology_to_vk(mode).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return false;
        }
        if count < 0 {
            self.state.set_error(GlError::InvalidValue);
            return false;
        }
        if self.framebuffer_status() != GL_FRAMEBUFFER_COMPLETE {
            self.state.set_error(GlError::InvalidFramebufferOperation);
            return false;
        }
        true
    }

    pub fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) -> Result<()> {
        if first < 0 {
            self.state.set_error(GlError::InvalidValue);
            return Ok(());
        }
        if !self.validate_draw(mode, count) {
            return Ok(());
        }
        self.set_primitive_mode(mode);
        self.resolve_pipeline_state()?;
        self.record_draw(mode, DrawCall::Arrays { first: first as u32, count: count as u32 })
    }

    /// glDrawElements with indices in the bound element array buffer at `offset`.
    pub fn draw_elements(&mut self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) -> Result<()> {
        if !self.validate_draw(mode, count) {
            return Ok(());
        }
        if index_size(ty).is_none() {
            self.state.set_error(GlError::InvalidEnum);
            return Ok(());
        }
        self.set_primitive_mode(mode);
        self.resolve_pipeline_state()?;
        self.record_draw(mode, DrawCall::Elements { count: count as u32, ty, offset })
    }

    /// Begin the render pass for `framebuffer` unless the open one already
    /// matches it and the attachments are unchanged.
    pub(super) fn ensure_render_pass(
        &mut self,
        framebuffer: FramebufferHandle,
        depth_write: bool,
        stencil_write: bool,
    ) -> Result<vk::CommandBuffer> {
        let wanted = ActivePass { framebuffer, depth_write, stencil_write };
        let updated = self.framebuffers.get(framebuffer).is_some_and(|fb| fb.is_updated());
        if self.active_pass == Some(wanted) && !updated {
            return self.frame()?.command_buffer();
        }

        self.end_render_pass()?;
        let cmd = self.frame()?.command_buffer()?;
        let fb = self
            .framebuffers
            .get_mut(framebuffer)
            .ok_or_eyre("Framebuffer no longer exists")?;
        fb.begin_vk_render_pass(cmd, &mut self.textures, depth_write, stencil_write)?;
        self.active_pass = Some(wanted);
        Ok(cmd)
    }

    /// Sampled images and samplers for the program's sampler bindings, with
    /// every image moved to the layout shaders read it in. `None` when a
    /// sampler has no usable texture.
    fn prepare_textures(&mut self, program: ProgramHandle) -> Result<Option<Vec<(u32, vk::DescriptorImageInfo)>>> {
        let samplers = self
            .programs
            .get(program)
            .map(|program| program.samplers().to_vec())
            .unwrap_or_default();

        let mut infos = Vec::with_capacity(samplers.len());
        for binding in samplers {
            let Some(handle) = self.state.active_objects.bound_texture(binding.unit as usize, binding.target) else {
                log::warn!("Skipping draw: no texture bound to unit {} for sampler {}", binding.unit, binding.location);
                return Ok(None);
            };
            let texture = self.textures.get_mut(handle).ok_or_eyre("Bound texture no longer exists")?;
            if !texture.is_completed() {
                log::warn!("Skipping draw: texture on unit {} is incomplete", binding.unit);
                return Ok(None);
            }
            texture.ensure_allocated()?;
            let sampler = texture.sampler()?;

            let needs_transition = texture
                .image()
                .is_some_and(|image| image.layout() != vk::ImageLayout::GENERAL);
            if needs_transition {
                // Layout transitions are illegal inside a render pass
                self.end_render_pass()?;
                let cmd = self.frame()?.command_buffer()?;
                if let Some(image) = self.textures.get_mut(handle).and_then(|texture| texture.image_mut()) {
                    image.transition(cmd, vk::ImageLayout::GENERAL);
                }
            }

            let view = self
                .textures
                .get(handle)
                .and_then(|texture| texture.image())
                .map(|image| image.sampled_view())
                .ok_or_eyre("Texture has no image")?;
            infos.push((
                binding.binding,
                vk::DescriptorImageInfo::default()
                    .sampler(sampler)
                    .image_view(view)
                    .image_layout(vk::ImageLayout::GENERAL),
            ));
        }
        Ok(Some(infos))
    }

    /// Vertex buffer and offset for every enabled attribute location. `None`
    /// when an enabled attribute sources no buffer object.
    fn prepare_vertex_buffers(&mut self) -> Result<Option<SmallVec<[(u32, vk::Buffer, u64); 8]>>> {
        let attributes: SmallVec<[_; 8]> = self
            .state
            .input_assembly
            .attributes()
            .iter()
            .enumerate()
            .filter(|(_, attribute)| attribute.enabled)
            .map(|(location, attribute)| (location as u32, attribute.buffer, attribute.offset as u64))
            .collect();

        let mut bindings = SmallVec::new();
        for (location, buffer, offset) in attributes {
            let Some(buffer) = buffer.and_then(|handle| self.buffers.get_mut(handle)) else {
                log::warn!("Skipping draw: attribute {location} has no buffer object");
                return Ok(None);
            };
            bindings.push((location, buffer.vk_buffer()?, offset));
        }
        Ok(Some(bindings))
    }

    fn prepare_indices(&mut self, mode: GLenum, call: DrawCall) -> Result<Option<IndexSource>> {
        let device = self.device.clone().ok_or_eyre("Context has no device")?;
        let transient = |indices: &[u8], index_type, count| -> Result<IndexSource> {
            let buffer = Buffer::new_staging(indices, vk::BufferUsageFlags::INDEX_BUFFER, "Transient indices", device.clone())?;
            Ok(IndexSource::Transient { buffer, index_type, count })
        };

        match call {
            DrawCall::Arrays { first, count } if mode == GL_LINE_LOOP => {
                let indices = line_loop_indices(first, count);
                let count = indices.len() as u32;
                Ok(Some(transient(bytemuck::cast_slice(&indices), vk::IndexType::UINT32, count)?))
            }
            DrawCall::Arrays { .. } => Ok(Some(IndexSource::None)),
            DrawCall::Elements { count, ty, offset } => {
                let Some(handle) = self.state.active_objects.element_array_buffer() else {
                    log::warn!("Skipping draw: client-side index arrays are not supported");
                    return Ok(None);
                };
                let restart = self.state.input_assembly.primitive_restart_enabled();
                let buffer = self.buffers.get_mut(handle).ok_or_eyre("Index buffer no longer exists")?;

                if ty == GL_UNSIGNED_BYTE || mode == GL_LINE_LOOP {
                    let Some(mut indices) = buffer.data().get(offset..).and_then(|bytes| read_indices(bytes, ty, count as usize))
                    else {
                        log::warn!("Skipping draw: {count} indices at offset {offset} exceed the index buffer");
                        return Ok(None);
                    };
                    if mode == GL_LINE_LOOP {
                        if let Some(&first) = indices.first() {
                            indices.push(first);
                        }
                    }
                    let count = indices.len() as u32;
                    return Ok(Some(match ty {
                        GL_UNSIGNED_INT => transient(bytemuck::cast_slice(&indices), vk::IndexType::UINT32, count)?,
                        _ => {
                            let widened = widen_u8_indices(&indices, restart && ty == GL_UNSIGNED_BYTE);
                            transient(bytemuck::cast_slice(&widened), vk::IndexType::UINT16, count)?
                        }
                    }));
                }

                let index_type = if ty == GL_UNSIGNED_INT { vk::IndexType::UINT32 } else { vk::IndexType::UINT16 };
                Ok(Some(IndexSource::Object {
                    buffer: buffer.vk_buffer()?,
                    offset: offset as u64,
                    index_type,
                    count,
                }))
            }
        }
    }

    /// Record one draw into the current frame. Headless contexts stop after
    /// state resolution.
    fn record_draw(&mut self, mode: GLenum, call: DrawCall) -> Result<()> {
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        let Some(program) = self.state.active_objects.program() else {
            log::debug!("Skipping draw without a program");
            return Ok(());
        };
        let Some(framebuffer) = self.current_framebuffer() else {
            log::warn!("Skipping draw without a framebuffer");
            return Ok(());
        };
        let count = match call {
            DrawCall::Arrays { count, .. } | DrawCall::Elements { count, .. } => count,
        };
        if count == 0 {
            return Ok(());
        }

        let Some(images) = self.prepare_textures(program)? else {
            return Ok(());
        };
        let Some(vertex_buffers) = self.prepare_vertex_buffers()? else {
            return Ok(());
        };
        let Some(indices) = self.prepare_indices(mode, call)? else {
            return Ok(());
        };

        let depth_write = self.state.depth_write_enabled();
        let stencil_write = self.state.stencil_write_enabled();
        let cmd = self.ensure_render_pass(framebuffer, depth_write, stencil_write)?;

        let fb = self.framebuffers.get(framebuffer).ok_or_eyre("Framebuffer no longer exists")?;
        let render_pass = fb.vk_render_pass().ok_or_eyre("Framebuffer has no render pass")?;
        let color_attachment_count = u32::from(fb.write_attachment().is_some());

        let shader = self.programs.get_mut(program).ok_or_eyre("Program no longer exists")?;
        let layout = shader.pipeline_layout()?;
        let set_layout = shader.set_layout()?;
        let target = PipelineTarget {
            render_pass,
            layout,
            vertex_module: shader.vertex_module()?,
            fragment_module: shader.fragment_module()?,
            color_attachment_count,
        };
        let uniforms = shader.uniform_data().to_vec();

        self.pipeline.bind(cmd, target)?;

        if !images.is_empty() {
            let set = self.frame()?.allocate_descriptor_set(set_layout)?;
            let image_infos: Vec<[vk::DescriptorImageInfo; 1]> = images.iter().map(|(_, info)| [*info]).collect();
            let writes: Vec<vk::WriteDescriptorSet> = images
                .iter()
                .zip(&image_infos)
                .map(|((binding, _), info)| {
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(*binding)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(info)
                })
                .collect();
            unsafe {
                device.logical.update_descriptor_sets(&writes, &[]);
                device.logical.cmd_bind_descriptor_sets(
                    cmd,
                    vk::PipelineBindPoint::GRAPHICS,
                    layout,
                    0,
                    &[set],
                    &[],
                );
            }
        }

        unsafe {
            if !uniforms.is_empty() {
                device.logical.cmd_push_constants(
                    cmd,
                    layout,
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    &uniforms,
                );
            }
            for (location, buffer, offset) in &vertex_buffers {
                device.logical.cmd_bind_vertex_buffers(cmd, *location, &[*buffer], &[*offset]);
            }
        }

        match indices {
            IndexSource::None => {
                let DrawCall::Arrays { first, count } = call else {
                    return Ok(());
                };
                unsafe { device.logical.cmd_draw(cmd, count, 1, first, 0) };
            }
            IndexSource::Object { buffer, offset, index_type, count } => unsafe {
                device.logical.cmd_bind_index_buffer(cmd, buffer, offset, index_type);
                device.logical.cmd_draw_indexed(cmd, count, 1, 0, 0, 0);
            },
            IndexSource::Transient { buffer, index_type, count } => {
                unsafe {
                    device.logical.cmd_bind_index_buffer(cmd, buffer.buffer, 0, index_type);
                    device.logical.cmd_draw_indexed(cmd, count, 1, 0, 0, 0);
                }
                self.transient_buffers.push(buffer);
            }
        }
        Ok(())
    }

    /// Complete the frame and make `next_image_index` the surface image
    /// subsequent draws render into.
    pub fn swap_buffers(&mut self, next_image_index: u32) -> Result<()> {
        self.flush()?;
        if let Some(fb) = self.system_framebuffer.and_then(|handle| self.framebuffers.get_mut(handle)) {
            fb.set_write_buffer_index(next_image_index as usize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_loop_closes_on_first_vertex() {
        assert_eq!(line_loop_indices(2, 3), vec![2, 3, 4, 2]);
        assert!(line_loop_indices(0, 0).is_empty());
    }

    #[test]
    fn indices_decode_by_type() {
        let shorts: Vec<u8> = [7u16, 300].iter().flat_map(|i| i.to_ne_bytes()).collect();
        assert_eq!(read_indices(&shorts, GL_UNSIGNED_SHORT, 2), Some(vec![7, 300]));
        assert_eq!(read_indices(&[1, 2, 3], GL_UNSIGNED_BYTE, 3), Some(vec![1, 2, 3]));
        assert_eq!(read_indices(&[1, 2], GL_UNSIGNED_BYTE, 3), None);
        assert_eq!(read_indices(&[0; 8], GL_FLOAT, 2), None);
    }

    #[test]
    fn widened_restart_index_stays_restart() {
        assert_eq!(widen_u8_indices(&[0, 0xff, 4], true), vec![0, u16::MAX, 4]);
        assert_eq!(widen_u8_indices(&[0xff], false), vec![0xff]);
    }
}
