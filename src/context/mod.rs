//! The rendering context: GL call semantics on top of the state manager,
//! the resource arenas and the frame recorder.
//!
//! Calls that only change state never touch Vulkan. They mark the pipeline
//! (or just the viewport) dirty when a state category reports a change, and
//! the next draw resolves those flags once. Calls that move pixels between
//! host and GPU first flush the recorded frame so transfers observe every
//! earlier command in GL order.

mod buffers;
mod clear;
mod draw;
mod framebuffers;
mod programs;
mod state_calls;
mod surface;
mod textures;

pub use surface::{EGLSurfaceInterface, SurfaceType};

use std::sync::Arc;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use crate::config::GloveConfig;
use crate::error::GlResult;
use crate::gl::*;
use crate::resources::{
    BufferHandle, BufferObject, Framebuffer, FramebufferHandle, NameTable, ProgramHandle, ResourceArena,
    ShaderProgram, Texture, TextureArena, TextureHandle,
};
use crate::state::{DrawTarget, StateManager};
use crate::vk::buffer::Buffer;
use crate::vk::frame::FrameRecorder;
use crate::vk::pipeline::Pipeline;
use crate::vk::VulkanDevice;

/// Render pass currently open on the frame command buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActivePass {
    framebuffer: FramebufferHandle,
    depth_write: bool,
    stencil_write: bool,
}

/// Objects whose last reference went away while the frame could still use them.
#[derive(Default)]
struct Graveyard {
    textures: Vec<Texture>,
    framebuffers: Vec<Framebuffer>,
    buffers: Vec<BufferObject>,
    programs: Vec<ShaderProgram>,
}

impl Graveyard {
    fn clear(&mut self) {
        self.textures.clear();
        self.framebuffers.clear();
        self.buffers.clear();
        self.programs.clear();
    }
}

pub struct Context {
    config: GloveConfig,
    state: StateManager,
    pipeline: Pipeline,
    pipeline_needs_update: bool,
    viewport_needs_update: bool,
    // Row order the pipeline state was last translated for
    translated_flip: Option<bool>,
    // Full-screen draw for clears under a partial write mask
    clear_pipeline: Pipeline,
    clear_program: Option<ShaderProgram>,
    clear_masks: Option<clear::MaskedClear>,

    textures: TextureArena,
    framebuffers: ResourceArena<FramebufferHandle, Framebuffer>,
    buffers: ResourceArena<BufferHandle, BufferObject>,
    programs: ResourceArena<ProgramHandle, ShaderProgram>,
    texture_names: NameTable<TextureHandle>,
    renderbuffer_names: NameTable<TextureHandle>,
    framebuffer_names: NameTable<FramebufferHandle>,
    buffer_names: NameTable<BufferHandle>,
    program_names: NameTable<ProgramHandle>,

    // Built from the window surface; selected while framebuffer 0 is bound
    system_framebuffer: Option<FramebufferHandle>,
    frame: Option<FrameRecorder>,
    active_pass: Option<ActivePass>,
    // Index data synthesized for a draw, alive until the frame completes
    transient_buffers: Vec<Buffer>,
    graveyard: Graveyard,
    device: Option<Arc<VulkanDevice>>,
}

impl Context {
    /// Context backed by a Vulkan device.
    pub fn new(config: GloveConfig) -> Result<Self> {
        crate::logging::init();
        let device = VulkanDevice::new(&config)?;
        let frame = FrameRecorder::new(device.clone())?;
        log::info!("Created context for {}", config.application_name);
        Ok(Self::build(config, Some(device), Some(frame)))
    }

    /// Context without a device. It tracks every piece of state and resolves
    /// dirty flags at draw time, but records no GPU work.
    pub fn headless(config: GloveConfig) -> Self {
        crate::logging::init();
        log::info!("Created headless context for {}", config.application_name);
        Self::build(config, None, None)
    }

    fn build(config: GloveConfig, device: Option<Arc<VulkanDevice>>, frame: Option<FrameRecorder>) -> Self {
        Self {
            state: StateManager::new(&config),
            pipeline: Pipeline::new(device.clone()),
            // Nothing has been translated yet
            pipeline_needs_update: true,
            viewport_needs_update: true,
            translated_flip: None,
            clear_pipeline: Pipeline::new(device.clone()),
            clear_program: None,
            clear_masks: None,

            textures: ResourceArena::new(),
            framebuffers: ResourceArena::new(),
            buffers: ResourceArena::new(),
            programs: ResourceArena::new(),
            texture_names: NameTable::new(),
            renderbuffer_names: NameTable::new(),
            framebuffer_names: NameTable::new(),
            buffer_names: NameTable::new(),
            program_names: NameTable::new(),

            system_framebuffer: None,
            frame,
            active_pass: None,
            transient_buffers: Vec::new(),
            graveyard: Graveyard::default(),
            device,
            config,
        }
    }

    pub fn is_headless(&self) -> bool {
        self.device.is_none()
    }

    pub fn config(&self) -> &GloveConfig {
        &self.config
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn pipeline_needs_update(&self) -> bool {
        self.pipeline_needs_update
    }

    pub fn viewport_needs_update(&self) -> bool {
        self.viewport_needs_update
    }

    /// Number of times pipeline state has been regenerated.
    pub fn pipeline_generation(&self) -> u64 {
        self.pipeline.generation()
    }

    /// glGetError: the first error since the last query, then `GL_NO_ERROR`.
    pub fn get_error(&mut self) -> GLenum {
        self.state.get_error()
    }

    /// Record a GL error, yielding the value on success.
    fn record<T>(&mut self, result: GlResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.state.set_error(error);
                None
            }
        }
    }

    fn mark_pipeline(&mut self, changed: bool) {
        self.pipeline_needs_update |= changed;
    }

    fn mark_viewport(&mut self, changed: bool) {
        self.viewport_needs_update |= changed;
    }

    /// Framebuffer draws go to: the bound one, else the surface's.
    fn current_framebuffer(&self) -> Option<FramebufferHandle> {
        self.state.active_objects.framebuffer().or(self.system_framebuffer)
    }

    /// Only the surface framebuffer is drawn flipped.
    fn draw_target(&self) -> DrawTarget {
        let (width, height) = self
            .current_framebuffer()
            .and_then(|handle| self.framebuffers.get(handle))
            .map_or((0, 0), |framebuffer| (framebuffer.width(), framebuffer.height()));
        DrawTarget { width, height, flip_y: self.state.active_objects.framebuffer().is_none() }
    }

    fn max_texture_size(&self) -> i32 {
        1 << (self.config.max_mip_levels.max(1) - 1)
    }

    fn frame(&mut self) -> Result<&mut FrameRecorder> {
        self.frame.as_mut().ok_or_eyre("Context has no frame recorder")
    }

    /// End the open render pass, if any, recording the layouts it left behind.
    fn end_render_pass(&mut self) -> Result<()> {
        let Some(pass) = self.active_pass.take() else {
            return Ok(());
        };
        let cmd = self.frame()?.command_buffer()?;
        let framebuffer = self
            .framebuffers
            .get_mut(pass.framebuffer)
            .ok_or_eyre("Render pass framebuffer no longer exists")?;
        framebuffer.end_vk_render_pass(cmd, &mut self.textures)
    }

    /// Submit everything recorded so far and wait for it. Objects retired
    /// during the frame are destroyed afterwards.
    fn flush(&mut self) -> Result<()> {
        if self.frame.is_none() {
            return Ok(());
        }
        self.end_render_pass()?;
        self.frame()?.submit_and_wait()?;
        self.destroy_retired();
        Ok(())
    }

    fn destroy_retired(&mut self) {
        self.pipeline.destroy_retired();
        self.clear_pipeline.destroy_retired();
        for (_, texture) in self.textures.iter_mut() {
            texture.destroy_retired();
        }
        for (_, framebuffer) in self.framebuffers.iter_mut() {
            framebuffer.destroy_retired();
        }
        for (_, buffer) in self.buffers.iter_mut() {
            buffer.destroy_retired();
        }
        self.transient_buffers.clear();
        self.graveyard.clear();
    }

    /// glFinish: block until every recorded command has executed.
    pub fn finish(&mut self) -> Result<()> {
        self.flush()
    }

    /// glFlush. Submission is synchronous, so this is a finish.
    pub fn flush_commands(&mut self) -> Result<()> {
        self.flush()
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.release(handle) {
            self.graveyard.textures.push(texture);
        }
    }

    fn release_framebuffer(&mut self, handle: FramebufferHandle) {
        if let Some(framebuffer) = self.framebuffers.release(handle) {
            let attached: Vec<_> = framebuffer.attached_textures().collect();
            for texture in attached {
                self.release_texture(texture);
            }
            self.graveyard.framebuffers.push(framebuffer);
        }
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        if let Some(buffer) = self.buffers.release(handle) {
            self.graveyard.buffers.push(buffer);
        }
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        if let Some(program) = self.programs.release(handle) {
            self.graveyard.programs.push(program);
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to complete the last frame: {e}");
        }
        if let Some(device) = self.device.as_ref() {
            if let Err(e) = device.wait_idle() {
                log::error!("Failed to wait for device idle: {e}");
            }
        }
    }
}
