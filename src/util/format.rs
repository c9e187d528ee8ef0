//! Pixel format classification and the GL ↔ Vulkan format tables.

use ash::vk;
use crate::gl::*;

/// Memory layout of one pixel, independent of where it lives.
///
/// Logical formats are what the application hands to GL; the explicit format
/// is how the same texels are realized in the backing Vulkan image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    Bgra8,
    Alpha8,
    Luminance8,
    LuminanceAlpha8,
    Rgba4444,
    Rgba5551,
    Rgb565,
    Depth16,
    Depth24,
    /// 32-bit normalized unsigned integer depth, as uploaded through GL
    Depth32,
    Depth32F,
    Depth24Stencil8,
    Stencil8,
}

impl PixelFormat {
    pub const ALL: &'static [PixelFormat] = &[
        Self::Rgba8,
        Self::Rgb8,
        Self::Bgra8,
        Self::Alpha8,
        Self::Luminance8,
        Self::LuminanceAlpha8,
        Self::Rgba4444,
        Self::Rgba5551,
        Self::Rgb565,
        Self::Depth16,
        Self::Depth24,
        Self::Depth32,
        Self::Depth32F,
        Self::Depth24Stencil8,
        Self::Stencil8,
    ];

    /// Components per element group, as used by [`crate::util::ImageRect`].
    pub fn element_count(self) -> u32 {
        match self {
            Self::Rgba8 | Self::Bgra8 => 4,
            Self::Rgb8 => 3,
            Self::LuminanceAlpha8 => 2,
            _ => 1,
        }
    }

    /// Bytes per element.
    pub fn element_size(self) -> u32 {
        match self {
            Self::Rgba8
            | Self::Rgb8
            | Self::Bgra8
            | Self::Alpha8
            | Self::Luminance8
            | Self::LuminanceAlpha8
            | Self::Stencil8 => 1,
            Self::Rgba4444 | Self::Rgba5551 | Self::Rgb565 | Self::Depth16 => 2,
            Self::Depth24 | Self::Depth32 | Self::Depth32F | Self::Depth24Stencil8 => 4,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        (self.element_count() * self.element_size()) as usize
    }

    pub fn vk_format(self) -> vk::Format {
        match self {
            Self::Rgba8 => vk::Format::R8G8B8A8_UNORM,
            Self::Rgb8 => vk::Format::R8G8B8_UNORM,
            Self::Bgra8 => vk::Format::B8G8R8A8_UNORM,
            Self::Alpha8 | Self::Luminance8 => vk::Format::R8_UNORM,
            Self::LuminanceAlpha8 => vk::Format::R8G8_UNORM,
            Self::Rgba4444 => vk::Format::R4G4B4A4_UNORM_PACK16,
            Self::Rgba5551 => vk::Format::R5G5B5A1_UNORM_PACK16,
            Self::Rgb565 => vk::Format::R5G6B5_UNORM_PACK16,
            Self::Depth16 => vk::Format::D16_UNORM,
            Self::Depth24 => vk::Format::X8_D24_UNORM_PACK32,
            Self::Depth32 | Self::Depth32F => vk::Format::D32_SFLOAT,
            Self::Depth24Stencil8 => vk::Format::D24_UNORM_S8_UINT,
            Self::Stencil8 => vk::Format::S8_UINT,
        }
    }

    /// Format the backing image is created with. Formats Vulkan implementations
    /// commonly cannot sample or render are widened to RGBA8.
    pub fn explicit(self) -> PixelFormat {
        match self {
            Self::Rgb8
            | Self::Alpha8
            | Self::Luminance8
            | Self::LuminanceAlpha8
            | Self::Rgba4444
            | Self::Rgba5551 => Self::Rgba8,
            Self::Depth32 => Self::Depth32F,
            other => other,
        }
    }

    pub fn from_vk_format(format: vk::Format) -> Option<PixelFormat> {
        match format {
            vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB => Some(Self::Rgba8),
            vk::Format::B8G8R8A8_UNORM | vk::Format::B8G8R8A8_SRGB => Some(Self::Bgra8),
            vk::Format::R8G8B8_UNORM => Some(Self::Rgb8),
            vk::Format::R5G6B5_UNORM_PACK16 => Some(Self::Rgb565),
            vk::Format::D16_UNORM => Some(Self::Depth16),
            vk::Format::X8_D24_UNORM_PACK32 => Some(Self::Depth24),
            vk::Format::D32_SFLOAT => Some(Self::Depth32F),
            vk::Format::D24_UNORM_S8_UINT => Some(Self::Depth24Stencil8),
            vk::Format::S8_UINT => Some(Self::Stencil8),
            _ => None,
        }
    }

    pub fn has_depth(self) -> bool {
        matches!(
            self,
            Self::Depth16 | Self::Depth24 | Self::Depth32 | Self::Depth32F | Self::Depth24Stencil8
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::Stencil8)
    }

    pub fn is_color(self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }

    pub fn aspect_mask(self) -> vk::ImageAspectFlags {
        let mut aspect = vk::ImageAspectFlags::empty();
        if self.has_depth() {
            aspect |= vk::ImageAspectFlags::DEPTH;
        }
        if self.has_stencil() {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }
        if aspect.is_empty() {
            aspect = vk::ImageAspectFlags::COLOR;
        }
        aspect
    }
}

/// One legal (format, type, internal format) combination.
#[derive(Clone, Copy, Debug)]
pub struct FormatInfo {
    pub format: GLenum,
    pub ty: GLenum,
    pub internal_format: GLenum,
    pub pixel: PixelFormat,
    pub color_renderable: bool,
}

const fn info(
    format: GLenum,
    ty: GLenum,
    internal_format: GLenum,
    pixel: PixelFormat,
    color_renderable: bool,
) -> FormatInfo {
    FormatInfo { format, ty, internal_format, pixel, color_renderable }
}

/// Every format the driver accepts. Lookups by (format, type) take the first
/// match, so unsized entries precede renderbuffer-only sized ones.
pub const FORMAT_TABLE: &[FormatInfo] = &[
    info(GL_RGBA, GL_UNSIGNED_BYTE, GL_RGBA8_OES, PixelFormat::Rgba8, true),
    info(GL_RGB, GL_UNSIGNED_BYTE, GL_RGB8_OES, PixelFormat::Rgb8, true),
    info(GL_BGRA_EXT, GL_UNSIGNED_BYTE, GL_BGRA_EXT, PixelFormat::Bgra8, true),
    info(GL_ALPHA, GL_UNSIGNED_BYTE, GL_ALPHA, PixelFormat::Alpha8, false),
    info(GL_LUMINANCE, GL_UNSIGNED_BYTE, GL_LUMINANCE, PixelFormat::Luminance8, false),
    info(GL_LUMINANCE_ALPHA, GL_UNSIGNED_BYTE, GL_LUMINANCE_ALPHA, PixelFormat::LuminanceAlpha8, false),
    info(GL_RGBA, GL_UNSIGNED_SHORT_4_4_4_4, GL_RGBA4, PixelFormat::Rgba4444, true),
    info(GL_RGBA, GL_UNSIGNED_SHORT_5_5_5_1, GL_RGB5_A1, PixelFormat::Rgba5551, true),
    info(GL_RGB, GL_UNSIGNED_SHORT_5_6_5, GL_RGB565, PixelFormat::Rgb565, true),
    info(GL_DEPTH_COMPONENT, GL_UNSIGNED_SHORT, GL_DEPTH_COMPONENT16, PixelFormat::Depth16, false),
    info(GL_DEPTH_COMPONENT, GL_UNSIGNED_INT, GL_DEPTH_COMPONENT32_OES, PixelFormat::Depth32, false),
    info(GL_DEPTH_STENCIL_OES, GL_UNSIGNED_INT_24_8_OES, GL_DEPTH24_STENCIL8_OES, PixelFormat::Depth24Stencil8, false),
    info(GL_DEPTH_COMPONENT, GL_UNSIGNED_INT, GL_DEPTH_COMPONENT24_OES, PixelFormat::Depth24, false),
    info(GL_STENCIL_INDEX_OES, GL_UNSIGNED_BYTE, GL_STENCIL_INDEX8, PixelFormat::Stencil8, false),
    info(GL_STENCIL_INDEX_OES, GL_UNSIGNED_BYTE, GL_STENCIL_INDEX4_OES, PixelFormat::Stencil8, false),
    info(GL_STENCIL_INDEX_OES, GL_UNSIGNED_BYTE, GL_STENCIL_INDEX1_OES, PixelFormat::Stencil8, false),
];

pub fn format_info(format: GLenum, ty: GLenum) -> Option<&'static FormatInfo> {
    FORMAT_TABLE.iter().find(|f| f.format == format && f.ty == ty)
}

pub fn internal_format_info(internal_format: GLenum) -> Option<&'static FormatInfo> {
    FORMAT_TABLE
        .iter()
        .find(|f| f.internal_format == internal_format)
        // Unsized internal formats (GL_RGBA, GL_RGB, ...) resolve through the base format
        .or_else(|| FORMAT_TABLE.iter().find(|f| f.format == internal_format))
}

pub fn gl_format_type_to_internal_format(format: GLenum, ty: GLenum) -> GLenum {
    format_info(format, ty).map_or(GL_NONE, |f| f.internal_format)
}

pub fn gl_format_type_to_pixel_format(format: GLenum, ty: GLenum) -> Option<PixelFormat> {
    format_info(format, ty).map(|f| f.pixel)
}

/// Vulkan format a GL internal format is realized with; `UNDEFINED` when there is none.
pub fn gl_internal_format_to_vk_format(internal_format: GLenum) -> vk::Format {
    internal_format_info(internal_format)
        .map_or(vk::Format::UNDEFINED, |f| f.pixel.explicit().vk_format())
}

pub fn is_color_renderable(internal_format: GLenum) -> bool {
    internal_format_info(internal_format).is_some_and(|f| f.color_renderable)
}

pub fn is_depth_renderable(internal_format: GLenum) -> bool {
    internal_format_info(internal_format).is_some_and(|f| f.pixel.has_depth())
}

pub fn is_stencil_renderable(internal_format: GLenum) -> bool {
    internal_format_info(internal_format).is_some_and(|f| f.pixel.has_stencil())
}

/// Vulkan format for a (depth, stencil) internal-format pair. `GL_NONE` marks
/// an absent attachment.
pub const DEPTH_STENCIL_FORMATS: &[(GLenum, GLenum, vk::Format)] = &[
    (GL_DEPTH_COMPONENT16, GL_NONE, vk::Format::D16_UNORM),
    (GL_DEPTH_COMPONENT24_OES, GL_NONE, vk::Format::X8_D24_UNORM_PACK32),
    (GL_DEPTH_COMPONENT32_OES, GL_NONE, vk::Format::D32_SFLOAT),
    (GL_DEPTH24_STENCIL8_OES, GL_NONE, vk::Format::D24_UNORM_S8_UINT),
    (GL_NONE, GL_STENCIL_INDEX1_OES, vk::Format::S8_UINT),
    (GL_NONE, GL_STENCIL_INDEX4_OES, vk::Format::S8_UINT),
    (GL_NONE, GL_STENCIL_INDEX8, vk::Format::S8_UINT),
    (GL_NONE, GL_DEPTH24_STENCIL8_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT16, GL_STENCIL_INDEX1_OES, vk::Format::D16_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT16, GL_STENCIL_INDEX4_OES, vk::Format::D16_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT16, GL_STENCIL_INDEX8, vk::Format::D16_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT16, GL_DEPTH24_STENCIL8_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT24_OES, GL_STENCIL_INDEX1_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT24_OES, GL_STENCIL_INDEX4_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT24_OES, GL_STENCIL_INDEX8, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT24_OES, GL_DEPTH24_STENCIL8_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH_COMPONENT32_OES, GL_STENCIL_INDEX1_OES, vk::Format::D32_SFLOAT_S8_UINT),
    (GL_DEPTH_COMPONENT32_OES, GL_STENCIL_INDEX4_OES, vk::Format::D32_SFLOAT_S8_UINT),
    (GL_DEPTH_COMPONENT32_OES, GL_STENCIL_INDEX8, vk::Format::D32_SFLOAT_S8_UINT),
    (GL_DEPTH_COMPONENT32_OES, GL_DEPTH24_STENCIL8_OES, vk::Format::D32_SFLOAT_S8_UINT),
    (GL_DEPTH24_STENCIL8_OES, GL_STENCIL_INDEX1_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH24_STENCIL8_OES, GL_STENCIL_INDEX4_OES, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH24_STENCIL8_OES, GL_STENCIL_INDEX8, vk::Format::D24_UNORM_S8_UINT),
    (GL_DEPTH24_STENCIL8_OES, GL_DEPTH24_STENCIL8_OES, vk::Format::D24_UNORM_S8_UINT),
];

pub fn depth_stencil_vk_format(depth_internal: GLenum, stencil_internal: GLenum) -> vk::Format {
    DEPTH_STENCIL_FORMATS
        .iter()
        .find(|(d, s, _)| *d == depth_internal && *s == stencil_internal)
        .map_or(vk::Format::UNDEFINED, |(_, _, format)| *format)
}

pub fn depth_internal_format_from_bits(depth_bits: u32) -> GLenum {
    match depth_bits {
        0 => GL_NONE,
        1..=16 => GL_DEPTH_COMPONENT16,
        17..=24 => GL_DEPTH_COMPONENT24_OES,
        _ => GL_DEPTH_COMPONENT32_OES,
    }
}

pub fn stencil_internal_format_from_bits(stencil_bits: u32) -> GLenum {
    match stencil_bits {
        0 => GL_NONE,
        1 => GL_STENCIL_INDEX1_OES,
        2..=4 => GL_STENCIL_INDEX4_OES,
        _ => GL_STENCIL_INDEX8,
    }
}

/// Depth/stencil format for a surface configuration (EGL depth and stencil sizes).
pub fn depth_stencil_vk_format_from_bits(depth_bits: u32, stencil_bits: u32) -> vk::Format {
    depth_stencil_vk_format(
        depth_internal_format_from_bits(depth_bits),
        stencil_internal_format_from_bits(stencil_bits),
    )
}

/// Internal format of a single image that can hold the given Vulkan depth/stencil format.
pub fn depth_stencil_internal_format(format: vk::Format) -> GLenum {
    match format {
        vk::Format::D16_UNORM => GL_DEPTH_COMPONENT16,
        vk::Format::X8_D24_UNORM_PACK32 => GL_DEPTH_COMPONENT24_OES,
        vk::Format::D32_SFLOAT => GL_DEPTH_COMPONENT32_OES,
        vk::Format::S8_UINT => GL_STENCIL_INDEX8,
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => GL_DEPTH24_STENCIL8_OES,
        _ => GL_NONE,
    }
}

pub fn vk_format_has_depth(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D16_UNORM
            | vk::Format::X8_D24_UNORM_PACK32
            | vk::Format::D32_SFLOAT
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

pub fn vk_format_has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::S8_UINT
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

pub fn vk_format_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    let mut aspect = vk::ImageAspectFlags::empty();
    if vk_format_has_depth(format) {
        aspect |= vk::ImageAspectFlags::DEPTH;
    }
    if vk_format_has_stencil(format) {
        aspect |= vk::ImageAspectFlags::STENCIL;
    }
    if aspect.is_empty() {
        aspect = vk::ImageAspectFlags::COLOR;
    }
    aspect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_stencil_format_from_surface_bits() {
        assert_eq!(depth_stencil_vk_format_from_bits(24, 8), vk::Format::D24_UNORM_S8_UINT);
        assert_eq!(depth_stencil_vk_format_from_bits(16, 0), vk::Format::D16_UNORM);
        assert_eq!(depth_stencil_vk_format_from_bits(0, 8), vk::Format::S8_UINT);
        assert_eq!(depth_stencil_vk_format_from_bits(16, 8), vk::Format::D16_UNORM_S8_UINT);
        assert_eq!(depth_stencil_vk_format_from_bits(0, 0), vk::Format::UNDEFINED);
    }

    #[test]
    fn every_legal_depth_stencil_pair_has_a_format() {
        let depths = [
            GL_NONE,
            GL_DEPTH_COMPONENT16,
            GL_DEPTH_COMPONENT24_OES,
            GL_DEPTH_COMPONENT32_OES,
            GL_DEPTH24_STENCIL8_OES,
        ];
        let stencils = [
            GL_NONE,
            GL_STENCIL_INDEX1_OES,
            GL_STENCIL_INDEX4_OES,
            GL_STENCIL_INDEX8,
            GL_DEPTH24_STENCIL8_OES,
        ];
        for depth in depths {
            for stencil in stencils {
                if depth == GL_NONE && stencil == GL_NONE {
                    continue;
                }
                let format = depth_stencil_vk_format(depth, stencil);
                assert_ne!(format, vk::Format::UNDEFINED, "{depth:#x} + {stencil:#x}");
                assert_eq!(vk_format_has_depth(format), depth != GL_NONE, "{depth:#x} + {stencil:#x}");
                assert_eq!(vk_format_has_stencil(format), stencil != GL_NONE, "{depth:#x} + {stencil:#x}");
            }
        }
    }

    #[test]
    fn unsized_internal_formats_resolve_through_base_format() {
        assert_eq!(gl_internal_format_to_vk_format(GL_RGBA), vk::Format::R8G8B8A8_UNORM);
        assert_eq!(gl_internal_format_to_vk_format(GL_RGB), vk::Format::R8G8B8A8_UNORM);
        assert_eq!(gl_internal_format_to_vk_format(GL_RGB565), vk::Format::R5G6B5_UNORM_PACK16);
        assert_eq!(gl_internal_format_to_vk_format(GL_DEPTH_COMPONENT16), vk::Format::D16_UNORM);
        assert_eq!(gl_internal_format_to_vk_format(0xdead), vk::Format::UNDEFINED);
    }

    #[test]
    fn renderability_follows_category() {
        assert!(is_color_renderable(GL_RGBA4));
        assert!(is_color_renderable(GL_RGBA8_OES));
        assert!(!is_color_renderable(GL_LUMINANCE));
        assert!(!is_color_renderable(GL_DEPTH_COMPONENT16));
        assert!(is_depth_renderable(GL_DEPTH24_STENCIL8_OES));
        assert!(is_stencil_renderable(GL_DEPTH24_STENCIL8_OES));
        assert!(!is_stencil_renderable(GL_DEPTH_COMPONENT16));
    }

    #[test]
    fn element_layout_matches_vk_format_size() {
        for format in PixelFormat::ALL {
            let bytes = format.bytes_per_pixel();
            assert!(bytes > 0);
            if format.is_color() {
                assert_eq!(format.aspect_mask(), vk::ImageAspectFlags::COLOR);
            }
        }
        assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Rgb565.bytes_per_pixel(), 2);
    }
}
