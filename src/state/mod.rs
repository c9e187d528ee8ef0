//! GL state categories and their translation into pipeline state.
//!
//! Every category mutates through `update_*` methods that compare the new
//! value with the stored one and return whether anything changed. That
//! boolean is what the context uses to decide whether pipeline state has to
//! be regenerated before the next draw.

pub mod active_objects;
pub mod fragment_operations;
pub mod framebuffer_operations;
pub mod hint_aspects;
pub mod input_assembly;
pub mod pixel_storage;
pub mod rasterization;
pub mod viewport_transformation;
pub mod vk_mappings;

use ash::vk;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crate::config::GloveConfig;
use crate::error::GlError;
use crate::gl::*;
use crate::util::Rect;
use crate::vk::pipeline::{
    ColorBlendDesc, DepthStencilDesc, MultisampleDesc, Pipeline, RasterizationDesc, VertexInputDesc,
};

pub use active_objects::StateActiveObjects;
pub use fragment_operations::{BlendFunction, StateFragmentOperations, StencilFace};
pub use framebuffer_operations::StateFramebufferOperations;
pub use hint_aspects::StateHintAspects;
pub use input_assembly::{StateInputAssembly, VertexAttribute};
pub use pixel_storage::StatePixelStorage;
pub use rasterization::StateRasterization;
pub use viewport_transformation::StateViewportTransformation;

/// Compare-and-set shared by every category.
pub(crate) fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Float compare-and-set by bit pattern, so a NaN written twice is unchanged.
pub(crate) fn update_f32(slot: &mut f32, value: f32) -> bool {
    if slot.to_bits() == value.to_bits() {
        return false;
    }
    *slot = value;
    true
}

pub(crate) fn update_vec4(slot: &mut glam::Vec4, value: glam::Vec4) -> bool {
    if slot.to_array().map(f32::to_bits) == value.to_array().map(f32::to_bits) {
        return false;
    }
    *slot = value;
    true
}

/// Size and row order of the framebuffer draws land in.
///
/// Surface images are presented top-down, so draws into them are flipped to
/// keep GL's bottom-left origin. Framebuffer objects store GL row 0 at image
/// row 0, the same order texture uploads use, and are drawn unflipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawTarget {
    pub width: i32,
    pub height: i32,
    pub flip_y: bool,
}

impl DrawTarget {
    /// Image row holding the first of `rows` GL rows starting at `y`.
    pub fn image_row(&self, y: i32, rows: i32) -> i32 {
        if self.flip_y { self.height - y - rows } else { y }
    }
}

/// Unwrap a table lookup, logging the value that has no Vulkan equivalent.
fn mapped<T>(value: Option<T>, what: &str, gl_value: GLenum) -> Result<T> {
    value.ok_or_else(|| {
        log::error!("No Vulkan {} for GL value {:#x}", what, gl_value);
        eyre!("No Vulkan {what} for GL value {gl_value:#x}")
    })
}

pub struct StateManager {
    pub fragment_operations: StateFragmentOperations,
    pub framebuffer_operations: StateFramebufferOperations,
    pub rasterization: StateRasterization,
    pub viewport_transformation: StateViewportTransformation,
    pub input_assembly: StateInputAssembly,
    pub pixel_storage: StatePixelStorage,
    pub hint_aspects: StateHintAspects,
    pub active_objects: StateActiveObjects,
    error: Option<GlError>,
}

impl StateManager {
    pub fn new(config: &GloveConfig) -> Self {
        Self {
            fragment_operations: StateFragmentOperations::default(),
            framebuffer_operations: StateFramebufferOperations::default(),
            rasterization: StateRasterization::default(),
            viewport_transformation: StateViewportTransformation::default(),
            input_assembly: StateInputAssembly::new(config.max_vertex_attribs),
            pixel_storage: StatePixelStorage::default(),
            hint_aspects: StateHintAspects::default(),
            active_objects: StateActiveObjects::new(config.max_texture_units),
            error: None,
        }
    }

    /// Record `error` unless an earlier one is still pending.
    pub fn set_error(&mut self, error: GlError) {
        log::debug!("GL error {error}");
        self.error.get_or_insert(error);
    }

    /// Return and clear the pending error.
    pub fn get_error(&mut self) -> GLenum {
        self.error.take().map_or(GL_NO_ERROR, GlError::code)
    }

    /// Depth writes happen only with the depth test on and the mask set.
    pub fn depth_write_enabled(&self) -> bool {
        self.fragment_operations.depth_test_enabled() && self.framebuffer_operations.depth_write_mask()
    }

    pub fn stencil_write_enabled(&self) -> bool {
        let fragment = &self.fragment_operations;
        fragment.stencil_test_enabled()
            && (fragment.stencil_front().write_mask != 0 || fragment.stencil_back().write_mask != 0)
    }

    /// GL puts the window origin bottom-left. On flipped targets a
    /// negative-height viewport maps it onto Vulkan's top-left image space.
    pub fn vk_viewport(&self, target: DrawTarget) -> vk::Viewport {
        let viewport = self.viewport_transformation.viewport();
        let (y, height) = if target.flip_y {
            ((target.height - viewport.y) as f32, -(viewport.height as f32))
        } else {
            (viewport.y as f32, viewport.height as f32)
        };
        vk::Viewport {
            x: viewport.x as f32,
            y,
            width: viewport.width as f32,
            height,
            min_depth: self.viewport_transformation.min_depth(),
            max_depth: self.viewport_transformation.max_depth(),
        }
    }

    pub fn vk_scissor(&self, target: DrawTarget) -> vk::Rect2D {
        let fragment = &self.fragment_operations;
        if !fragment.scissor_test_enabled() {
            return Rect::new(0, 0, target.width, target.height).to_vk_rect();
        }
        let scissor = fragment.scissor_rect();
        Rect::new(scissor.x, target.image_row(scissor.y, scissor.height), scissor.width, scissor.height)
            .to_vk_rect()
    }

    fn vk_stencil_op_state(face: &StencilFace) -> Result<vk::StencilOpState> {
        Ok(vk::StencilOpState {
            fail_op: mapped(vk_mappings::gl_stencil_op_to_vk(face.fail), "stencil op", face.fail)?,
            pass_op: mapped(vk_mappings::gl_stencil_op_to_vk(face.depth_pass), "stencil op", face.depth_pass)?,
            depth_fail_op: mapped(vk_mappings::gl_stencil_op_to_vk(face.depth_fail), "stencil op", face.depth_fail)?,
            compare_op: mapped(vk_mappings::gl_compare_func_to_vk(face.func), "compare op", face.func)?,
            compare_mask: face.compare_mask,
            write_mask: face.write_mask,
            reference: face.reference as u32,
        })
    }

    /// Winding is judged in image space, so an unflipped target sees every
    /// triangle mirrored and the front face swaps.
    fn rasterization_desc(&self, flip_y: bool) -> Result<RasterizationDesc> {
        let r = &self.rasterization;
        let polygon_offset = r.polygon_offset_fill_enabled();
        let mut front_face = mapped(vk_mappings::gl_front_face_to_vk(r.front_face()), "front face", r.front_face())?;
        if !flip_y {
            front_face = match front_face {
                vk::FrontFace::CLOCKWISE => vk::FrontFace::COUNTER_CLOCKWISE,
                _ => vk::FrontFace::CLOCKWISE,
            };
        }
        Ok(RasterizationDesc {
            rasterizer_discard_enable: r.rasterizer_discard_enabled(),
            polygon_mode: mapped(vk_mappings::gl_polygon_mode_to_vk(r.polygon_mode()), "polygon mode", r.polygon_mode())?,
            cull_mode: vk_mappings::gl_cull_mode_to_vk(r.culling_enabled(), r.cull_face()),
            front_face,
            depth_bias_enable: polygon_offset,
            depth_bias_constant_factor: if polygon_offset { r.polygon_offset_units() } else { 0.0 },
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: if polygon_offset { r.polygon_offset_factor() } else { 0.0 },
            line_width: r.line_width(),
        })
    }

    fn color_blend_desc(&self) -> Result<ColorBlendDesc> {
        let f = &self.fragment_operations;
        let function = f.blending_function();
        let factor = |factor: GLenum| mapped(vk_mappings::gl_blend_factor_to_vk(factor), "blend factor", factor);
        let equation = |equation: GLenum| mapped(vk_mappings::gl_blend_equation_to_vk(equation), "blend op", equation);
        let mask = self.framebuffer_operations.color_write_mask();

        let attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(f.blending_enabled())
            .src_color_blend_factor(factor(function.src_rgb)?)
            .dst_color_blend_factor(factor(function.dst_rgb)?)
            .color_blend_op(equation(f.blending_equation_rgb())?)
            .src_alpha_blend_factor(factor(function.src_alpha)?)
            .dst_alpha_blend_factor(factor(function.dst_alpha)?)
            .alpha_blend_op(equation(f.blending_equation_alpha())?)
            .color_write_mask(vk_mappings::gl_color_mask_to_vk(mask.x, mask.y, mask.z, mask.w));

        Ok(ColorBlendDesc {
            logic_op_enable: f.logic_op_enabled(),
            logic_op: mapped(vk_mappings::gl_logic_op_to_vk(f.logic_op()), "logic op", f.logic_op())?,
            attachment,
            blend_constants: f.blending_color().to_array(),
        })
    }

    fn depth_stencil_desc(&self) -> Result<DepthStencilDesc> {
        let f = &self.fragment_operations;
        Ok(DepthStencilDesc {
            depth_test_enable: f.depth_test_enabled(),
            depth_write_enable: self.depth_write_enabled(),
            depth_compare_op: mapped(vk_mappings::gl_compare_func_to_vk(f.depth_func()), "compare op", f.depth_func())?,
            depth_bounds_test_enable: false,
            stencil_test_enable: f.stencil_test_enabled(),
            front: Self::vk_stencil_op_state(f.stencil_front())?,
            back: Self::vk_stencil_op_state(f.stencil_back())?,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
        })
    }

    fn multisample_desc(&self) -> Result<MultisampleDesc> {
        let f = &self.fragment_operations;
        // Single-sampled targets: coverage either keeps or drops the one sample
        let sample_mask = f.sample_coverage_enabled().then(|| {
            let covered = u32::from(f.sample_coverage_value().round() >= 1.0);
            if f.sample_coverage_invert() { covered ^ 1 } else { covered }
        });
        Ok(MultisampleDesc {
            rasterization_samples: mapped(vk_mappings::gl_sample_count_to_vk(1), "sample count", 1)?,
            sample_shading_enable: false,
            min_sample_shading: 1.0,
            sample_mask,
            alpha_to_coverage_enable: f.sample_alpha_to_coverage_enabled(),
            alpha_to_one_enable: false,
        })
    }

    /// Vertex bindings for every enabled attribute array, one binding per
    /// attribute location.
    pub fn vertex_input_desc(&self) -> Result<VertexInputDesc> {
        let mut desc = VertexInputDesc::default();
        for (location, attribute) in self.input_assembly.attributes().iter().enumerate() {
            if !attribute.enabled {
                continue;
            }
            // The normalized flag means nothing for float types
            let normalized = attribute.normalized && !matches!(attribute.ty, GL_FLOAT | GL_HALF_FLOAT_OES);
            let format = vk_mappings::gl_vertex_format_to_vk(attribute.ty, attribute.size, normalized)
                .ok_or_else(|| {
                    log::error!(
                        "No Vulkan vertex format for type {:#x} size {} normalized {}",
                        attribute.ty,
                        attribute.size,
                        attribute.normalized,
                    );
                    eyre!("No Vulkan vertex format for attribute {location}")
                })?;
            desc.bindings.push(
                vk::VertexInputBindingDescription::default()
                    .binding(location as u32)
                    .stride(attribute.effective_stride())
                    .input_rate(vk::VertexInputRate::VERTEX),
            );
            desc.attributes.push(
                vk::VertexInputAttributeDescription::default()
                    .location(location as u32)
                    .binding(location as u32)
                    .format(format)
                    .offset(0),
            );
        }
        Ok(desc)
    }

    /// Translate the whole state snapshot into the pipeline builder and seal it.
    pub fn init_vk_pipeline_states(&self, pipeline: &mut Pipeline, target: DrawTarget) -> Result<()> {
        let mode = self.input_assembly.primitive_mode();
        let topology = mapped(vk_mappings::gl_primitive_topology_to_vk(mode), "primitive topology", mode)?;
        // Vulkan only restarts strips and fans
        let restart = self.input_assembly.primitive_restart_enabled()
            && matches!(
                topology,
                vk::PrimitiveTopology::LINE_STRIP
                    | vk::PrimitiveTopology::TRIANGLE_STRIP
                    | vk::PrimitiveTopology::TRIANGLE_FAN
            );

        pipeline.create_input_assembly_state(topology, restart);
        pipeline.create_rasterization_state(self.rasterization_desc(target.flip_y)?);
        pipeline.create_color_blend_state(self.color_blend_desc()?);
        pipeline.create_depth_stencil_state(self.depth_stencil_desc()?);
        self.update_vk_viewport_state(pipeline, target);
        pipeline.create_multisample_state(self.multisample_desc()?);
        pipeline.create_dynamic_state(&[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);
        pipeline.create_vertex_input_state(self.vertex_input_desc()?);
        pipeline.create_info();
        Ok(())
    }

    /// Viewport and scissor only. They are dynamic, so no recompile follows.
    pub fn update_vk_viewport_state(&self, pipeline: &mut Pipeline, target: DrawTarget) {
        pipeline.create_viewport_state(self.vk_viewport(target), self.vk_scissor(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> StateManager {
        StateManager::new(&GloveConfig::default())
    }

    fn surface(width: i32, height: i32) -> DrawTarget {
        DrawTarget { width, height, flip_y: true }
    }

    fn offscreen(width: i32, height: i32) -> DrawTarget {
        DrawTarget { width, height, flip_y: false }
    }

    #[test]
    fn first_error_sticks_until_queried() {
        let mut state = manager();
        state.set_error(GlError::InvalidValue);
        state.set_error(GlError::InvalidEnum);
        assert_eq!(state.get_error(), GL_INVALID_VALUE);
        assert_eq!(state.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn translation_feeds_every_sub_state() {
        let mut state = manager();
        state.fragment_operations.update_blending_enabled(true);
        state.fragment_operations.update_blending_function(BlendFunction {
            src_rgb: GL_SRC_ALPHA,
            dst_rgb: GL_ONE_MINUS_SRC_ALPHA,
            src_alpha: GL_ONE,
            dst_alpha: GL_ZERO,
        });
        state.fragment_operations.update_depth_test_enabled(true);
        state.fragment_operations.update_depth_func(GL_LEQUAL);
        state.rasterization.update_culling_enabled(true);
        state.rasterization.update_front_face(GL_CW);
        state.input_assembly.update_primitive_mode(GL_TRIANGLE_STRIP);
        state.framebuffer_operations.update_color_write_mask(true, true, true, false);

        let mut pipeline = Pipeline::new(None);
        state.init_vk_pipeline_states(&mut pipeline, surface(64, 64)).unwrap();

        assert_eq!(pipeline.generation(), 1);
        assert_eq!(pipeline.input_assembly().topology, vk::PrimitiveTopology::TRIANGLE_STRIP);
        assert_eq!(pipeline.rasterization().cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(pipeline.rasterization().front_face, vk::FrontFace::CLOCKWISE);
        let blend = pipeline.color_blend().attachment;
        assert_eq!(blend.blend_enable, vk::TRUE);
        assert_eq!(blend.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(blend.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
        assert_eq!(
            blend.color_write_mask,
            vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B
        );
        assert!(pipeline.depth_stencil().depth_test_enable);
        assert!(pipeline.depth_stencil().depth_write_enable);
        assert_eq!(pipeline.depth_stencil().depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);
    }

    #[test]
    fn depth_writes_need_depth_test() {
        let mut state = manager();
        assert!(!state.depth_write_enabled());
        state.fragment_operations.update_depth_test_enabled(true);
        assert!(state.depth_write_enabled());
        state.framebuffer_operations.update_depth_write_mask(false);
        assert!(!state.depth_write_enabled());
    }

    #[test]
    fn bad_enum_in_state_fails_translation() {
        let mut state = manager();
        state.fragment_operations.update_depth_func(GL_FUNC_ADD);
        let mut pipeline = Pipeline::new(None);
        assert!(state.init_vk_pipeline_states(&mut pipeline, surface(4, 4)).is_err());
        assert_eq!(pipeline.generation(), 0);
    }

    #[test]
    fn viewport_is_flipped_to_bottom_left_origin() {
        let mut state = manager();
        state.viewport_transformation.update_viewport(Rect::new(10, 20, 100, 50));
        let viewport = state.vk_viewport(surface(300, 200));
        assert_eq!((viewport.x, viewport.y), (10.0, 180.0));
        assert_eq!((viewport.width, viewport.height), (100.0, -50.0));
    }

    #[test]
    fn offscreen_viewport_keeps_gl_rows() {
        let mut state = manager();
        state.viewport_transformation.update_viewport(Rect::new(10, 20, 100, 50));
        let viewport = state.vk_viewport(offscreen(300, 200));
        assert_eq!((viewport.x, viewport.y), (10.0, 20.0));
        assert_eq!((viewport.width, viewport.height), (100.0, 50.0));
    }

    #[test]
    fn offscreen_targets_swap_front_face() {
        let mut state = manager();
        state.rasterization.update_front_face(GL_CCW);
        let mut pipeline = Pipeline::new(None);
        state.init_vk_pipeline_states(&mut pipeline, surface(8, 8)).unwrap();
        assert_eq!(pipeline.rasterization().front_face, vk::FrontFace::COUNTER_CLOCKWISE);
        state.init_vk_pipeline_states(&mut pipeline, offscreen(8, 8)).unwrap();
        assert_eq!(pipeline.rasterization().front_face, vk::FrontFace::CLOCKWISE);
    }

    #[test]
    fn uploaded_rows_read_back_in_gl_order() {
        // Two rows uploaded bottom first: A lands in image row 0, B in row 1
        let uploaded = [b'A', b'B'];
        let target = offscreen(1, 2);
        let row = target.image_row(0, 2) as usize;
        assert_eq!(&uploaded[row..row + 2], b"AB");
        assert_eq!(target.image_row(1, 1), 1);
        // A draw into the surface at GL row 0 hits the last image row
        assert_eq!(surface(1, 2).image_row(0, 1), 1);
    }

    #[test]
    fn nan_state_settles_after_first_write() {
        let mut state = manager();
        assert!(state.framebuffer_operations.update_clear_depth(f32::NAN));
        assert!(!state.framebuffer_operations.update_clear_depth(f32::NAN));
        assert!(state.rasterization.update_polygon_offset(f32::NAN, 1.0));
        assert!(!state.rasterization.update_polygon_offset(f32::NAN, 1.0));
        assert!(state.viewport_transformation.update_depth_range(0.0, f32::NAN));
        assert!(!state.viewport_transformation.update_depth_range(0.0, f32::NAN));
    }

    #[test]
    fn scissor_covers_framebuffer_unless_enabled() {
        let mut state = manager();
        state.fragment_operations.update_scissor_rect(Rect::new(0, 0, 10, 10));
        assert_eq!(state.vk_scissor(surface(64, 32)).extent, vk::Extent2D { width: 64, height: 32 });
        state.fragment_operations.update_scissor_test_enabled(true);
        let scissor = state.vk_scissor(surface(64, 32));
        assert_eq!(scissor.offset, vk::Offset2D { x: 0, y: 22 });
        assert_eq!(scissor.extent, vk::Extent2D { width: 10, height: 10 });
        let scissor = state.vk_scissor(offscreen(64, 32));
        assert_eq!(scissor.offset, vk::Offset2D { x: 0, y: 0 });
    }

    #[test]
    fn enabled_attributes_become_vertex_bindings() {
        let mut state = manager();
        state.input_assembly.update_attribute_enabled(2, true);
        state.input_assembly.update_attribute_pointer(
            2,
            VertexAttribute { size: 2, ty: GL_FLOAT, ..Default::default() },
        );
        let desc = state.vertex_input_desc().unwrap();
        assert_eq!(desc.bindings.len(), 1);
        assert_eq!(desc.bindings[0].stride, 8);
        assert_eq!(desc.attributes[0].location, 2);
        assert_eq!(desc.attributes[0].format, vk::Format::R32G32_SFLOAT);
    }

    #[test]
    fn sample_coverage_builds_mask() {
        let mut state = manager();
        state.fragment_operations.update_sample_coverage_enabled(true);
        state.fragment_operations.update_sample_coverage(0.2, true);
        assert_eq!(state.multisample_desc().unwrap().sample_mask, Some(1));
    }
}
