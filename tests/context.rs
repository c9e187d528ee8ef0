use ash::vk;
use glove::gl::*;
use glove::{Context, EGLSurfaceInterface, GloveConfig, ProgramDesc, SamplerBinding};

fn context() -> Context {
    Context::headless(GloveConfig::default())
}

fn draw(ctx: &mut Context) {
    ctx.draw_arrays(GL_TRIANGLES, 0, 3).unwrap();
}

fn renderbuffer(ctx: &mut Context, internal_format: GLenum, width: i32, height: i32) -> GLuint {
    let name = ctx.gen_renderbuffers(1)[0];
    ctx.bind_renderbuffer(GL_RENDERBUFFER, name);
    ctx.renderbuffer_storage(GL_RENDERBUFFER, internal_format, width, height).unwrap();
    name
}

fn bound_framebuffer(ctx: &mut Context) -> GLuint {
    let name = ctx.gen_framebuffers(1)[0];
    ctx.bind_framebuffer(GL_FRAMEBUFFER, name);
    name
}

#[test]
fn first_draw_translates_state_once() {
    let mut ctx = context();
    assert!(ctx.pipeline_needs_update());
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 1);
    assert!(!ctx.pipeline_needs_update());
    assert!(!ctx.viewport_needs_update());
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 1);
}

#[test]
fn redundant_state_calls_do_not_rebuild() {
    let mut ctx = context();
    draw(&mut ctx);

    ctx.enable(GL_BLEND);
    ctx.enable(GL_BLEND);
    ctx.blend_func(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA);
    assert!(ctx.pipeline_needs_update());
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 2);

    // Same values again: nothing to do
    ctx.enable(GL_BLEND);
    ctx.blend_func(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA);
    ctx.depth_func(GL_LESS);
    assert!(!ctx.pipeline_needs_update());
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 2);
}

#[test]
fn viewport_changes_skip_pipeline_rebuild() {
    let mut ctx = context();
    draw(&mut ctx);

    ctx.viewport(0, 0, 32, 32);
    ctx.enable(GL_SCISSOR_TEST);
    ctx.scissor(4, 4, 8, 8);
    assert!(ctx.viewport_needs_update());
    assert!(!ctx.pipeline_needs_update());

    draw(&mut ctx);
    assert!(!ctx.viewport_needs_update());
    assert_eq!(ctx.pipeline_generation(), 1);
}

#[test]
fn primitive_mode_change_rebuilds() {
    let mut ctx = context();
    draw(&mut ctx);
    ctx.draw_arrays(GL_LINES, 0, 2).unwrap();
    assert_eq!(ctx.pipeline_generation(), 2);
    ctx.draw_arrays(GL_LINES, 0, 2).unwrap();
    assert_eq!(ctx.pipeline_generation(), 2);
}

#[test]
fn first_error_is_kept_until_queried() {
    let mut ctx = context();
    ctx.enable(0x1234);
    ctx.line_width(-1.0);
    ctx.viewport(0, 0, -1, 4);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn rejected_calls_leave_state_untouched() {
    let mut ctx = context();
    draw(&mut ctx);

    ctx.blend_func(GL_ONE, GL_SRC_ALPHA_SATURATE);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.cull_face(GL_CW);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.stencil_func_separate(GL_FRONT, 0x0104, 0, 0xff);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    assert!(!ctx.pipeline_needs_update());
}

#[test]
fn is_enabled_reports_capabilities() {
    let mut ctx = context();
    assert!(ctx.is_enabled(GL_DITHER));
    assert!(!ctx.is_enabled(GL_DEPTH_TEST));
    ctx.enable(GL_DEPTH_TEST);
    ctx.disable(GL_DITHER);
    assert!(ctx.is_enabled(GL_DEPTH_TEST));
    assert!(!ctx.is_enabled(GL_DITHER));
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn invalid_draws_record_errors_without_translation() {
    let mut ctx = context();
    ctx.draw_arrays(0x0042, 0, 3).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.draw_arrays(GL_TRIANGLES, 0, -1).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.draw_elements(GL_TRIANGLES, 3, GL_FLOAT, 0).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.clear(0x1).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    assert_eq!(ctx.pipeline_generation(), 0);
}

#[test]
fn framebuffer_completeness() {
    let mut ctx = context();
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    bound_framebuffer(&mut ctx);
    assert_eq!(
        ctx.check_framebuffer_status(GL_FRAMEBUFFER),
        GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
    );

    let color = renderbuffer(&mut ctx, GL_RGBA4, 16, 16);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, color);
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    let depth = renderbuffer(&mut ctx, GL_DEPTH_COMPONENT16, 8, 8);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, GL_RENDERBUFFER, depth);
    assert_eq!(
        ctx.check_framebuffer_status(GL_FRAMEBUFFER),
        GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS
    );
    draw(&mut ctx);
    assert_eq!(ctx.get_error(), GL_INVALID_FRAMEBUFFER_OPERATION);

    // Respecifying the depth buffer to match fixes it
    ctx.bind_renderbuffer(GL_RENDERBUFFER, depth);
    ctx.renderbuffer_storage(GL_RENDERBUFFER, GL_DEPTH_COMPONENT16, 16, 16).unwrap();
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn separate_depth_and_stencil_need_a_combined_format() {
    let mut ctx = context();
    bound_framebuffer(&mut ctx);
    let color = renderbuffer(&mut ctx, GL_RGBA8_OES, 4, 4);
    let depth = renderbuffer(&mut ctx, GL_DEPTH_COMPONENT16, 4, 4);
    let stencil = renderbuffer(&mut ctx, GL_STENCIL_INDEX8, 4, 4);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, color);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, GL_RENDERBUFFER, depth);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_STENCIL_ATTACHMENT, GL_RENDERBUFFER, stencil);
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    let packed = renderbuffer(&mut ctx, GL_DEPTH24_STENCIL8_OES, 4, 4);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, GL_RENDERBUFFER, packed);
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_UNSUPPORTED);

    // The packed image in both slots is a single attachment
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_STENCIL_ATTACHMENT, GL_RENDERBUFFER, packed);
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);
}

#[test]
fn attachments_need_a_bound_framebuffer() {
    let mut ctx = context();
    let color = renderbuffer(&mut ctx, GL_RGBA4, 4, 4);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, color);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    bound_framebuffer(&mut ctx);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, 77);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, 0x1234, GL_RENDERBUFFER, color);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
}

#[test]
fn deleting_an_attached_texture_detaches_it() {
    let mut ctx = context();
    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 8, 8, 0, GL_RGBA, GL_UNSIGNED_BYTE, None)
        .unwrap();

    bound_framebuffer(&mut ctx);
    ctx.framebuffer_texture_2d(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_TEXTURE_2D, texture, 0);
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    ctx.delete_textures(&[texture]);
    assert!(!ctx.is_texture(texture));
    assert_eq!(
        ctx.check_framebuffer_status(GL_FRAMEBUFFER),
        GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
    );
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn texture_level_attachments_are_limited_to_level_zero() {
    let mut ctx = context();
    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    bound_framebuffer(&mut ctx);
    ctx.framebuffer_texture_2d(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_TEXTURE_2D, texture, 1);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.framebuffer_texture_2d(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_TEXTURE_CUBE_MAP_POSITIVE_X, texture, 0);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);
}

#[test]
fn tex_image_validation() {
    let mut ctx = context();
    let pixels = vec![0u8; 4 * 4 * 4];

    // Nothing bound
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 4, 4, 0, GL_RGBA, GL_UNSIGNED_BYTE, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGB as GLint, 4, 4, 0, GL_RGBA, GL_UNSIGNED_BYTE, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 4, 4, 1, GL_RGBA, GL_UNSIGNED_BYTE, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 8, 8, 0, GL_RGBA, GL_UNSIGNED_BYTE, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 4, 4, 0, GL_RGBA, GL_FLOAT, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 4, 4, 0, GL_RGBA, GL_UNSIGNED_BYTE, Some(&pixels))
        .unwrap();
    assert_eq!(ctx.get_error(), GL_NO_ERROR);

    ctx.tex_sub_image_2d(GL_TEXTURE_2D, 0, 2, 2, 4, 4, GL_RGBA, GL_UNSIGNED_BYTE, &pixels).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.tex_sub_image_2d(GL_TEXTURE_2D, 0, 2, 2, 2, 2, GL_RGBA, GL_UNSIGNED_BYTE, &pixels).unwrap();
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn texture_target_is_fixed_by_first_bind() {
    let mut ctx = context();
    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_CUBE_MAP, texture);
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    // Cube faces must be square
    ctx.tex_image_2d(GL_TEXTURE_CUBE_MAP_NEGATIVE_Y, 0, GL_RGBA as GLint, 4, 2, 0, GL_RGBA, GL_UNSIGNED_BYTE, None)
        .unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
}

#[test]
fn mipmap_generation_requirements() {
    let mut ctx = context();
    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    ctx.generate_mipmap(GL_TEXTURE_2D).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 6, 4, 0, GL_RGBA, GL_UNSIGNED_BYTE, None)
        .unwrap();
    ctx.generate_mipmap(GL_TEXTURE_2D).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    ctx.tex_image_2d(GL_TEXTURE_2D, 0, GL_RGBA as GLint, 8, 4, 0, GL_RGBA, GL_UNSIGNED_BYTE, None)
        .unwrap();
    ctx.hint(GL_GENERATE_MIPMAP_HINT, GL_NICEST);
    ctx.generate_mipmap(GL_TEXTURE_2D).unwrap();
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn texture_parameters_are_validated() {
    let mut ctx = context();
    ctx.tex_parameter(GL_TEXTURE_2D, GL_TEXTURE_MIN_FILTER, GL_LINEAR);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    let texture = ctx.gen_textures(1)[0];
    ctx.bind_texture(GL_TEXTURE_2D, texture);
    ctx.tex_parameter(GL_TEXTURE_2D, GL_TEXTURE_MIN_FILTER, GL_LINEAR);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
    ctx.tex_parameter(GL_TEXTURE_2D, GL_TEXTURE_MAG_FILTER, GL_LINEAR_MIPMAP_LINEAR);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.tex_parameter(GL_TEXTURE_2D, GL_TEXTURE_WRAP_S, GL_MIRRORED_REPEAT);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn vertex_attributes_feed_the_pipeline() {
    let mut ctx = context();
    draw(&mut ctx);

    let buffer = ctx.gen_buffers(1)[0];
    ctx.bind_buffer(GL_ARRAY_BUFFER, buffer);
    ctx.buffer_data(GL_ARRAY_BUFFER, 48, Some(&[0u8; 48]), GL_STATIC_DRAW);
    ctx.vertex_attrib_pointer(0, 3, GL_FLOAT, false, 0, 0);
    ctx.enable_vertex_attrib_array(0);
    assert!(ctx.pipeline_needs_update());
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 2);

    ctx.vertex_attrib_pointer(0, 5, GL_FLOAT, false, 0, 0);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.vertex_attrib_pointer(0, 2, GL_FIXED, false, 0, 0);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.enable_vertex_attrib_array(16);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    assert!(!ctx.pipeline_needs_update());
}

#[test]
fn buffer_calls_need_a_binding() {
    let mut ctx = context();
    ctx.buffer_data(GL_ARRAY_BUFFER, 4, None, GL_STATIC_DRAW);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    let buffer = ctx.gen_buffers(1)[0];
    ctx.bind_buffer(GL_ELEMENT_ARRAY_BUFFER, buffer);
    ctx.buffer_data(GL_ELEMENT_ARRAY_BUFFER, 4, None, 0x1234);
    assert_eq!(ctx.get_error(), GL_INVALID_ENUM);
    ctx.buffer_data(GL_ELEMENT_ARRAY_BUFFER, 4, None, GL_DYNAMIC_DRAW);
    ctx.buffer_sub_data(GL_ELEMENT_ARRAY_BUFFER, 2, &[1, 2, 3]);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);

    ctx.delete_buffers(&[buffer]);
    assert!(!ctx.is_buffer(buffer));
    ctx.buffer_sub_data(GL_ELEMENT_ARRAY_BUFFER, 0, &[1]);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);
}

#[test]
fn program_uniforms() {
    let mut ctx = context();
    ctx.use_program(42);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);

    let program = ctx.create_program(ProgramDesc {
        samplers: vec![SamplerBinding { binding: 0, target: GL_TEXTURE_2D, location: 1, unit: 0 }],
        uniform_size: 16,
        ..Default::default()
    });
    ctx.uniform_sampler(1, 2);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    ctx.use_program(program);
    ctx.uniform_sampler(1, 2);
    ctx.uniform_data(0, &[0; 16]);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
    ctx.uniform_sampler(1, 8);
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    ctx.uniform_data(8, &[0; 16]);
    assert_eq!(ctx.get_error(), GL_INVALID_OPERATION);

    // Deleted while in use: stays usable until replaced
    ctx.delete_program(program);
    assert!(!ctx.is_program(program));
    ctx.uniform_data(0, &[1; 4]);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn surface_framebuffer_is_the_default_target() {
    let mut ctx = context();
    ctx.set_write_surface(&EGLSurfaceInterface {
        width: 64,
        height: 32,
        depth_size: 24,
        stencil_size: 8,
        surface_color_format: vk::Format::B8G8R8A8_UNORM,
        ..Default::default()
    })
    .unwrap();
    assert!(ctx.viewport_needs_update());
    assert_eq!(ctx.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    draw(&mut ctx);
    ctx.clear(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT).unwrap();
    assert_eq!(ctx.get_error(), GL_NO_ERROR);

    // Switching to a user framebuffer and back changes the render area
    bound_framebuffer(&mut ctx);
    assert!(ctx.viewport_needs_update());
    ctx.bind_framebuffer(GL_FRAMEBUFFER, 0);
    draw(&mut ctx);
    assert!(!ctx.viewport_needs_update());
    assert_eq!(ctx.pipeline_generation(), 1);
}

#[test]
fn moving_between_surface_and_framebuffer_object_rebuilds() {
    let mut ctx = context();
    ctx.set_write_surface(&EGLSurfaceInterface {
        width: 64,
        height: 32,
        surface_color_format: vk::Format::B8G8R8A8_UNORM,
        ..Default::default()
    })
    .unwrap();
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 1);

    // Framebuffer objects are drawn unflipped, which swaps the front face
    bound_framebuffer(&mut ctx);
    let color = renderbuffer(&mut ctx, GL_RGBA4, 16, 16);
    ctx.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_RENDERBUFFER, color);
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 2);
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 2);

    ctx.bind_framebuffer(GL_FRAMEBUFFER, 0);
    draw(&mut ctx);
    assert_eq!(ctx.pipeline_generation(), 3);
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
}

#[test]
fn masked_clears_are_accepted() {
    let mut ctx = context();
    ctx.color_mask(true, false, true, false);
    ctx.stencil_mask(0x0f);
    ctx.clear(GL_COLOR_BUFFER_BIT | GL_STENCIL_BUFFER_BIT).unwrap();
    assert_eq!(ctx.get_error(), GL_NO_ERROR);
    ctx.clear(0x1).unwrap();
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
}

#[test]
fn headless_readback_is_an_error() {
    let mut ctx = context();
    assert_eq!(ctx.read_pixels(0, 0, -1, 1, GL_RGBA, GL_UNSIGNED_BYTE).unwrap(), Vec::<u8>::new());
    assert_eq!(ctx.get_error(), GL_INVALID_VALUE);
    assert!(ctx.read_pixels(0, 0, 1, 1, GL_RGBA, GL_UNSIGNED_BYTE).is_err());
}
