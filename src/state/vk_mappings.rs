//! One-to-one GL → Vulkan enum tables.
//!
//! Lookups return `None` for values outside the table; callers treat that as
//! a programming error since GL-level validation rejects bad enums before
//! they reach the state categories.

use ash::vk;
use crate::gl::*;

pub const PRIMITIVE_TOPOLOGIES: &[(GLenum, vk::PrimitiveTopology)] = &[
    (GL_POINTS, vk::PrimitiveTopology::POINT_LIST),
    (GL_LINES, vk::PrimitiveTopology::LINE_LIST),
    // Closed by the draw call appending the first vertex
    (GL_LINE_LOOP, vk::PrimitiveTopology::LINE_STRIP),
    (GL_LINE_STRIP, vk::PrimitiveTopology::LINE_STRIP),
    (GL_TRIANGLES, vk::PrimitiveTopology::TRIANGLE_LIST),
    (GL_TRIANGLE_STRIP, vk::PrimitiveTopology::TRIANGLE_STRIP),
    (GL_TRIANGLE_FAN, vk::PrimitiveTopology::TRIANGLE_FAN),
];

pub const POLYGON_MODES: &[(GLenum, vk::PolygonMode)] = &[
    (GL_POINT, vk::PolygonMode::POINT),
    (GL_LINE, vk::PolygonMode::LINE),
    (GL_FILL, vk::PolygonMode::FILL),
];

pub const CULL_MODES: &[(GLenum, vk::CullModeFlags)] = &[
    (GL_FRONT, vk::CullModeFlags::FRONT),
    (GL_BACK, vk::CullModeFlags::BACK),
    (GL_FRONT_AND_BACK, vk::CullModeFlags::FRONT_AND_BACK),
];

pub const FRONT_FACES: &[(GLenum, vk::FrontFace)] = &[
    (GL_CW, vk::FrontFace::CLOCKWISE),
    (GL_CCW, vk::FrontFace::COUNTER_CLOCKWISE),
];

pub const COMPARE_OPS: &[(GLenum, vk::CompareOp)] = &[
    (GL_NEVER, vk::CompareOp::NEVER),
    (GL_LESS, vk::CompareOp::LESS),
    (GL_EQUAL, vk::CompareOp::EQUAL),
    (GL_LEQUAL, vk::CompareOp::LESS_OR_EQUAL),
    (GL_GREATER, vk::CompareOp::GREATER),
    (GL_NOTEQUAL, vk::CompareOp::NOT_EQUAL),
    (GL_GEQUAL, vk::CompareOp::GREATER_OR_EQUAL),
    (GL_ALWAYS, vk::CompareOp::ALWAYS),
];

pub const STENCIL_OPS: &[(GLenum, vk::StencilOp)] = &[
    (GL_ZERO, vk::StencilOp::ZERO),
    (GL_KEEP, vk::StencilOp::KEEP),
    (GL_REPLACE, vk::StencilOp::REPLACE),
    (GL_INCR, vk::StencilOp::INCREMENT_AND_CLAMP),
    (GL_DECR, vk::StencilOp::DECREMENT_AND_CLAMP),
    (GL_INVERT, vk::StencilOp::INVERT),
    (GL_INCR_WRAP, vk::StencilOp::INCREMENT_AND_WRAP),
    (GL_DECR_WRAP, vk::StencilOp::DECREMENT_AND_WRAP),
];

pub const BLEND_FACTORS: &[(GLenum, vk::BlendFactor)] = &[
    (GL_ZERO, vk::BlendFactor::ZERO),
    (GL_ONE, vk::BlendFactor::ONE),
    (GL_SRC_COLOR, vk::BlendFactor::SRC_COLOR),
    (GL_ONE_MINUS_SRC_COLOR, vk::BlendFactor::ONE_MINUS_SRC_COLOR),
    (GL_DST_COLOR, vk::BlendFactor::DST_COLOR),
    (GL_ONE_MINUS_DST_COLOR, vk::BlendFactor::ONE_MINUS_DST_COLOR),
    (GL_SRC_ALPHA, vk::BlendFactor::SRC_ALPHA),
    (GL_ONE_MINUS_SRC_ALPHA, vk::BlendFactor::ONE_MINUS_SRC_ALPHA),
    (GL_DST_ALPHA, vk::BlendFactor::DST_ALPHA),
    (GL_ONE_MINUS_DST_ALPHA, vk::BlendFactor::ONE_MINUS_DST_ALPHA),
    (GL_CONSTANT_COLOR, vk::BlendFactor::CONSTANT_COLOR),
    (GL_ONE_MINUS_CONSTANT_COLOR, vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR),
    (GL_CONSTANT_ALPHA, vk::BlendFactor::CONSTANT_ALPHA),
    (GL_ONE_MINUS_CONSTANT_ALPHA, vk::BlendFactor::ONE_MINUS_CONSTANT_ALPHA),
    (GL_SRC_ALPHA_SATURATE, vk::BlendFactor::SRC_ALPHA_SATURATE),
];

pub const BLEND_OPS: &[(GLenum, vk::BlendOp)] = &[
    (GL_FUNC_ADD, vk::BlendOp::ADD),
    (GL_FUNC_SUBTRACT, vk::BlendOp::SUBTRACT),
    (GL_FUNC_REVERSE_SUBTRACT, vk::BlendOp::REVERSE_SUBTRACT),
    (GL_MIN, vk::BlendOp::MIN),
    (GL_MAX, vk::BlendOp::MAX),
];

pub const LOGIC_OPS: &[(GLenum, vk::LogicOp)] = &[
    (GL_CLEAR, vk::LogicOp::CLEAR),
    (GL_AND, vk::LogicOp::AND),
    (GL_AND_REVERSE, vk::LogicOp::AND_REVERSE),
    (GL_COPY, vk::LogicOp::COPY),
    (GL_AND_INVERTED, vk::LogicOp::AND_INVERTED),
    (GL_NOOP, vk::LogicOp::NO_OP),
    (GL_XOR, vk::LogicOp::XOR),
    (GL_OR, vk::LogicOp::OR),
    (GL_NOR, vk::LogicOp::NOR),
    (GL_EQUIV, vk::LogicOp::EQUIVALENT),
    (GL_INVERT, vk::LogicOp::INVERT),
    (GL_OR_REVERSE, vk::LogicOp::OR_REVERSE),
    (GL_COPY_INVERTED, vk::LogicOp::COPY_INVERTED),
    (GL_OR_INVERTED, vk::LogicOp::OR_INVERTED),
    (GL_NAND, vk::LogicOp::NAND),
    (GL_SET, vk::LogicOp::SET),
];

pub const SAMPLE_COUNTS: &[(GLint, vk::SampleCountFlags)] = &[
    (1, vk::SampleCountFlags::TYPE_1),
    (2, vk::SampleCountFlags::TYPE_2),
    (4, vk::SampleCountFlags::TYPE_4),
    (8, vk::SampleCountFlags::TYPE_8),
    (16, vk::SampleCountFlags::TYPE_16),
];

pub const MAG_FILTERS: &[(GLenum, vk::Filter)] = &[
    (GL_NEAREST, vk::Filter::NEAREST),
    (GL_LINEAR, vk::Filter::LINEAR),
];

/// Minification filter → (filter, mipmap mode, samples mip levels).
pub const MIN_FILTERS: &[(GLenum, (vk::Filter, vk::SamplerMipmapMode, bool))] = &[
    (GL_NEAREST, (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST, false)),
    (GL_LINEAR, (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST, false)),
    (GL_NEAREST_MIPMAP_NEAREST, (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST, true)),
    (GL_LINEAR_MIPMAP_NEAREST, (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST, true)),
    (GL_NEAREST_MIPMAP_LINEAR, (vk::Filter::NEAREST, vk::SamplerMipmapMode::LINEAR, true)),
    (GL_LINEAR_MIPMAP_LINEAR, (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR, true)),
];

pub const ADDRESS_MODES: &[(GLenum, vk::SamplerAddressMode)] = &[
    (GL_REPEAT, vk::SamplerAddressMode::REPEAT),
    (GL_CLAMP_TO_EDGE, vk::SamplerAddressMode::CLAMP_TO_EDGE),
    (GL_MIRRORED_REPEAT, vk::SamplerAddressMode::MIRRORED_REPEAT),
];

/// Mip blit filter for a GL_GENERATE_MIPMAP_HINT value.
pub const MIPMAP_HINT_FILTERS: &[(GLenum, vk::Filter)] = &[
    (GL_FASTEST, vk::Filter::NEAREST),
    (GL_NICEST, vk::Filter::LINEAR),
    (GL_DONT_CARE, vk::Filter::LINEAR),
];

/// (type, component count, normalized) → vertex attribute format.
/// Non-normalized integers reach the shader as floats, hence SCALED.
pub const VERTEX_FORMATS: &[((GLenum, GLint, bool), vk::Format)] = &[
    ((GL_FLOAT, 1, false), vk::Format::R32_SFLOAT),
    ((GL_FLOAT, 2, false), vk::Format::R32G32_SFLOAT),
    ((GL_FLOAT, 3, false), vk::Format::R32G32B32_SFLOAT),
    ((GL_FLOAT, 4, false), vk::Format::R32G32B32A32_SFLOAT),
    ((GL_FLOAT, 1, true), vk::Format::R32_SFLOAT),
    ((GL_FLOAT, 2, true), vk::Format::R32G32_SFLOAT),
    ((GL_FLOAT, 3, true), vk::Format::R32G32B32_SFLOAT),
    ((GL_FLOAT, 4, true), vk::Format::R32G32B32A32_SFLOAT),
    ((GL_HALF_FLOAT_OES, 1, false), vk::Format::R16_SFLOAT),
    ((GL_HALF_FLOAT_OES, 2, false), vk::Format::R16G16_SFLOAT),
    ((GL_HALF_FLOAT_OES, 3, false), vk::Format::R16G16B16_SFLOAT),
    ((GL_HALF_FLOAT_OES, 4, false), vk::Format::R16G16B16A16_SFLOAT),
    ((GL_UNSIGNED_BYTE, 1, true), vk::Format::R8_UNORM),
    ((GL_UNSIGNED_BYTE, 2, true), vk::Format::R8G8_UNORM),
    ((GL_UNSIGNED_BYTE, 3, true), vk::Format::R8G8B8_UNORM),
    ((GL_UNSIGNED_BYTE, 4, true), vk::Format::R8G8B8A8_UNORM),
    ((GL_UNSIGNED_BYTE, 1, false), vk::Format::R8_USCALED),
    ((GL_UNSIGNED_BYTE, 2, false), vk::Format::R8G8_USCALED),
    ((GL_UNSIGNED_BYTE, 3, false), vk::Format::R8G8B8_USCALED),
    ((GL_UNSIGNED_BYTE, 4, false), vk::Format::R8G8B8A8_USCALED),
    ((GL_BYTE, 1, true), vk::Format::R8_SNORM),
    ((GL_BYTE, 2, true), vk::Format::R8G8_SNORM),
    ((GL_BYTE, 3, true), vk::Format::R8G8B8_SNORM),
    ((GL_BYTE, 4, true), vk::Format::R8G8B8A8_SNORM),
    ((GL_BYTE, 1, false), vk::Format::R8_SSCALED),
    ((GL_BYTE, 2, false), vk::Format::R8G8_SSCALED),
    ((GL_BYTE, 3, false), vk::Format::R8G8B8_SSCALED),
    ((GL_BYTE, 4, false), vk::Format::R8G8B8A8_SSCALED),
    ((GL_UNSIGNED_SHORT, 1, true), vk::Format::R16_UNORM),
    ((GL_UNSIGNED_SHORT, 2, true), vk::Format::R16G16_UNORM),
    ((GL_UNSIGNED_SHORT, 3, true), vk::Format::R16G16B16_UNORM),
    ((GL_UNSIGNED_SHORT, 4, true), vk::Format::R16G16B16A16_UNORM),
    ((GL_UNSIGNED_SHORT, 1, false), vk::Format::R16_USCALED),
    ((GL_UNSIGNED_SHORT, 2, false), vk::Format::R16G16_USCALED),
    ((GL_UNSIGNED_SHORT, 3, false), vk::Format::R16G16B16_USCALED),
    ((GL_UNSIGNED_SHORT, 4, false), vk::Format::R16G16B16A16_USCALED),
    ((GL_SHORT, 1, true), vk::Format::R16_SNORM),
    ((GL_SHORT, 2, true), vk::Format::R16G16_SNORM),
    ((GL_SHORT, 3, true), vk::Format::R16G16B16_SNORM),
    ((GL_SHORT, 4, true), vk::Format::R16G16B16A16_SNORM),
    ((GL_SHORT, 1, false), vk::Format::R16_SSCALED),
    ((GL_SHORT, 2, false), vk::Format::R16G16_SSCALED),
    ((GL_SHORT, 3, false), vk::Format::R16G16B16_SSCALED),
    ((GL_SHORT, 4, false), vk::Format::R16G16B16A16_SSCALED),
];

fn lookup<K: PartialEq + Copy, V: Copy>(table: &[(K, V)], key: K) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn gl_primitive_topology_to_vk(mode: GLenum) -> Option<vk::PrimitiveTopology> {
    lookup(PRIMITIVE_TOPOLOGIES, mode)
}

pub fn gl_polygon_mode_to_vk(mode: GLenum) -> Option<vk::PolygonMode> {
    lookup(POLYGON_MODES, mode)
}

/// Culling is the one mapping with a GL default: anything unrecognized culls nothing.
pub fn gl_cull_mode_to_vk(enabled: bool, mode: GLenum) -> vk::CullModeFlags {
    if !enabled {
        return vk::CullModeFlags::NONE;
    }
    lookup(CULL_MODES, mode).unwrap_or(vk::CullModeFlags::NONE)
}

pub fn gl_front_face_to_vk(mode: GLenum) -> Option<vk::FrontFace> {
    lookup(FRONT_FACES, mode)
}

pub fn gl_compare_func_to_vk(func: GLenum) -> Option<vk::CompareOp> {
    lookup(COMPARE_OPS, func)
}

pub fn gl_stencil_op_to_vk(op: GLenum) -> Option<vk::StencilOp> {
    lookup(STENCIL_OPS, op)
}

pub fn gl_blend_factor_to_vk(factor: GLenum) -> Option<vk::BlendFactor> {
    lookup(BLEND_FACTORS, factor)
}

pub fn gl_blend_equation_to_vk(equation: GLenum) -> Option<vk::BlendOp> {
    lookup(BLEND_OPS, equation)
}

pub fn gl_logic_op_to_vk(op: GLenum) -> Option<vk::LogicOp> {
    lookup(LOGIC_OPS, op)
}

pub fn gl_sample_count_to_vk(samples: GLint) -> Option<vk::SampleCountFlags> {
    lookup(SAMPLE_COUNTS, samples)
}

pub fn gl_mag_filter_to_vk(filter: GLenum) -> Option<vk::Filter> {
    lookup(MAG_FILTERS, filter)
}

pub fn gl_min_filter_to_vk(filter: GLenum) -> Option<(vk::Filter, vk::SamplerMipmapMode, bool)> {
    lookup(MIN_FILTERS, filter)
}

pub fn gl_wrap_to_vk(wrap: GLenum) -> Option<vk::SamplerAddressMode> {
    lookup(ADDRESS_MODES, wrap)
}

pub fn gl_mipmap_hint_to_vk_filter(hint: GLenum) -> Option<vk::Filter> {
    lookup(MIPMAP_HINT_FILTERS, hint)
}

pub fn gl_vertex_format_to_vk(ty: GLenum, size: GLint, normalized: bool) -> Option<vk::Format> {
    lookup(VERTEX_FORMATS, (ty, size, normalized))
}

pub fn gl_color_mask_to_vk(red: bool, green: bool, blue: bool, alpha: bool) -> vk::ColorComponentFlags {
    let mut mask = vk::ColorComponentFlags::empty();
    if red {
        mask |= vk::ColorComponentFlags::R;
    }
    if green {
        mask |= vk::ColorComponentFlags::G;
    }
    if blue {
        mask |= vk::ColorComponentFlags::B;
    }
    if alpha {
        mask |= vk::ColorComponentFlags::A;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_keys<K: PartialEq + std::fmt::Debug, V>(table: &[(K, V)]) {
        for (i, (a, _)) in table.iter().enumerate() {
            for (b, _) in &table[i + 1..] {
                assert_ne!(a, b, "duplicate key");
            }
        }
    }

    #[test]
    fn tables_have_unique_keys() {
        assert_unique_keys(PRIMITIVE_TOPOLOGIES);
        assert_unique_keys(POLYGON_MODES);
        assert_unique_keys(CULL_MODES);
        assert_unique_keys(FRONT_FACES);
        assert_unique_keys(COMPARE_OPS);
        assert_unique_keys(STENCIL_OPS);
        assert_unique_keys(BLEND_FACTORS);
        assert_unique_keys(BLEND_OPS);
        assert_unique_keys(LOGIC_OPS);
        assert_unique_keys(SAMPLE_COUNTS);
        assert_unique_keys(MIN_FILTERS);
        assert_unique_keys(ADDRESS_MODES);
        assert_unique_keys(VERTEX_FORMATS);
    }

    #[test]
    fn every_gl_compare_function_maps() {
        for func in GL_NEVER..=GL_ALWAYS {
            assert!(gl_compare_func_to_vk(func).is_some(), "{func:#x}");
        }
    }

    #[test]
    fn every_vertex_type_and_size_maps() {
        for ty in [GL_BYTE, GL_UNSIGNED_BYTE, GL_SHORT, GL_UNSIGNED_SHORT, GL_FLOAT] {
            for size in 1..=4 {
                for normalized in [false, true] {
                    assert!(gl_vertex_format_to_vk(ty, size, normalized).is_some(), "{ty:#x} x{size}");
                }
            }
        }
    }

    #[test]
    fn unknown_enums_are_not_defaulted() {
        assert_eq!(gl_blend_factor_to_vk(0xdead), None);
        assert_eq!(gl_stencil_op_to_vk(GL_AND), None);
        assert_eq!(gl_primitive_topology_to_vk(0x7), None);
    }

    #[test]
    fn unknown_cull_mode_culls_nothing() {
        assert_eq!(gl_cull_mode_to_vk(true, 0xdead), vk::CullModeFlags::NONE);
        assert_eq!(gl_cull_mode_to_vk(false, GL_BACK), vk::CullModeFlags::NONE);
        assert_eq!(gl_cull_mode_to_vk(true, GL_BACK), vk::CullModeFlags::BACK);
    }
}
