//! Pixel copy, format conversion and row-order utilities.

use crate::util::format::PixelFormat;
use crate::util::rect::ImageRect;

type PixelConverter = fn(&[u8], &mut [u8]);

/// Every (source, destination) pair the driver can reach. Identity pairs take
/// the byte-copy path and are not listed.
const CONVERSIONS: &[(PixelFormat, PixelFormat, PixelConverter)] = &[
    (PixelFormat::Rgb8, PixelFormat::Rgba8, rgb8_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Rgb8, rgba8_to_rgb8),
    (PixelFormat::Bgra8, PixelFormat::Rgba8, swap_red_blue),
    (PixelFormat::Rgba8, PixelFormat::Bgra8, swap_red_blue),
    (PixelFormat::Alpha8, PixelFormat::Rgba8, alpha8_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Alpha8, rgba8_to_alpha8),
    (PixelFormat::Luminance8, PixelFormat::Rgba8, luminance8_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Luminance8, rgba8_to_luminance8),
    (PixelFormat::LuminanceAlpha8, PixelFormat::Rgba8, luminance_alpha8_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::LuminanceAlpha8, rgba8_to_luminance_alpha8),
    (PixelFormat::Rgba4444, PixelFormat::Rgba8, rgba4444_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Rgba4444, rgba8_to_rgba4444),
    (PixelFormat::Rgba5551, PixelFormat::Rgba8, rgba5551_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Rgba5551, rgba8_to_rgba5551),
    (PixelFormat::Rgb565, PixelFormat::Rgba8, rgb565_to_rgba8),
    (PixelFormat::Rgba8, PixelFormat::Rgb565, rgba8_to_rgb565),
    (PixelFormat::Bgra8, PixelFormat::Rgb8, bgra8_to_rgb8),
    (PixelFormat::Depth32, PixelFormat::Depth32F, depth32_to_depth32f),
    (PixelFormat::Depth32F, PixelFormat::Depth32, depth32f_to_depth32),
];

pub fn find_converter(src: PixelFormat, dst: PixelFormat) -> Option<PixelConverter> {
    CONVERSIONS
        .iter()
        .find(|(s, d, _)| *s == src && *d == dst)
        .map(|(_, _, f)| *f)
}

pub fn can_convert(src: PixelFormat, dst: PixelFormat) -> bool {
    src == dst || find_converter(src, dst).is_some()
}

/// Extent of the region shared by both rects, in pixels.
fn common_extent(src_rect: &ImageRect, dst_rect: &ImageRect) -> (usize, usize) {
    let width = (src_rect.width - src_rect.x).min(dst_rect.width - dst_rect.x).max(0);
    let height = (src_rect.height - src_rect.y).min(dst_rect.height - dst_rect.y).max(0);
    (width as usize, height as usize)
}

/// Copy the region starting at each rect's origin from `src` into `dst`,
/// converting from `src_format` to `dst_format` on the way.
///
/// # Panics
/// When the format pair has no converter. That is a gap in the conversion
/// table, not a runtime input error.
pub fn convert_pixels(
    src_format: PixelFormat,
    dst_format: PixelFormat,
    src_rect: &ImageRect,
    src: &[u8],
    dst_rect: &ImageRect,
    dst: &mut [u8],
) {
    if src_format == dst_format {
        copy_pixels_no_conversion(src_rect, src, dst_rect, dst);
        return;
    }

    let Some(convert) = find_converter(src_format, dst_format) else {
        panic!("no pixel conversion from {src_format:?} to {dst_format:?}");
    };

    let (width, height) = common_extent(src_rect, dst_rect);
    let src_pixel = src_rect.pixel_size();
    let dst_pixel = dst_rect.pixel_size();
    let src_stride = src_rect.row_stride();
    let dst_stride = dst_rect.row_stride();
    let mut src_row = src_rect.byte_offset();
    let mut dst_row = dst_rect.byte_offset();

    for _ in 0..height {
        for x in 0..width {
            let s = src_row + x * src_pixel;
            let d = dst_row + x * dst_pixel;
            convert(&src[s..s + src_pixel], &mut dst[d..d + dst_pixel]);
        }
        src_row += src_stride;
        dst_row += dst_stride;
    }
}

/// Row-by-row byte copy; each side keeps its own stride and alignment.
pub fn copy_pixels_no_conversion(
    src_rect: &ImageRect,
    src: &[u8],
    dst_rect: &ImageRect,
    dst: &mut [u8],
) {
    debug_assert_eq!(src_rect.pixel_size(), dst_rect.pixel_size());
    let (width, height) = common_extent(src_rect, dst_rect);
    let row_bytes = width * src_rect.pixel_size();
    let src_stride = src_rect.row_stride();
    let dst_stride = dst_rect.row_stride();
    let mut src_row = src_rect.byte_offset();
    let mut dst_row = dst_rect.byte_offset();

    for _ in 0..height {
        dst[dst_row..dst_row + row_bytes].copy_from_slice(&src[src_row..src_row + row_bytes]);
        src_row += src_stride;
        dst_row += dst_stride;
    }
}

/// Reverse the row order of `height` rows of `row_stride` bytes in place.
pub fn invert_image_y_axis(data: &mut [u8], height: usize, row_stride: usize) {
    if height < 2 || row_stride == 0 {
        return;
    }
    let (mut top, mut bottom) = (0, height - 1);
    while top < bottom {
        let (upper, lower) = data.split_at_mut(bottom * row_stride);
        upper[top * row_stride..(top + 1) * row_stride].swap_with_slice(&mut lower[..row_stride]);
        top += 1;
        bottom -= 1;
    }
}

fn expand4(v: u16) -> u8 {
    (v as u8 & 0xf) * 17
}

fn expand5(v: u16) -> u8 {
    let v = v as u8 & 0x1f;
    (v << 3) | (v >> 2)
}

fn expand6(v: u16) -> u8 {
    let v = v as u8 & 0x3f;
    (v << 2) | (v >> 4)
}

fn rgb8_to_rgba8(src: &[u8], dst: &mut [u8]) {
    dst[..3].copy_from_slice(&src[..3]);
    dst[3] = 0xff;
}

fn rgba8_to_rgb8(src: &[u8], dst: &mut [u8]) {
    dst[..3].copy_from_slice(&src[..3]);
}

fn swap_red_blue(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[2];
    dst[1] = src[1];
    dst[2] = src[0];
    dst[3] = src[3];
}

fn bgra8_to_rgb8(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[2];
    dst[1] = src[1];
    dst[2] = src[0];
}

fn alpha8_to_rgba8(src: &[u8], dst: &mut [u8]) {
    dst.copy_from_slice(&[0, 0, 0, src[0]]);
}

fn rgba8_to_alpha8(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[3];
}

fn luminance8_to_rgba8(src: &[u8], dst: &mut [u8]) {
    dst.copy_from_slice(&[src[0], src[0], src[0], 0xff]);
}

fn rgba8_to_luminance8(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[0];
}

fn luminance_alpha8_to_rgba8(src: &[u8], dst: &mut [u8]) {
    dst.copy_from_slice(&[src[0], src[0], src[0], src[1]]);
}

fn rgba8_to_luminance_alpha8(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[0];
    dst[1] = src[3];
}

fn rgba4444_to_rgba8(src: &[u8], dst: &mut [u8]) {
    let v = u16::from_ne_bytes([src[0], src[1]]);
    dst.copy_from_slice(&[expand4(v >> 12), expand4(v >> 8), expand4(v >> 4), expand4(v)]);
}

fn rgba8_to_rgba4444(src: &[u8], dst: &mut [u8]) {
    let v = (src[0] as u16 >> 4) << 12
        | (src[1] as u16 >> 4) << 8
        | (src[2] as u16 >> 4) << 4
        | src[3] as u16 >> 4;
    dst.copy_from_slice(&v.to_ne_bytes());
}

fn rgba5551_to_rgba8(src: &[u8], dst: &mut [u8]) {
    let v = u16::from_ne_bytes([src[0], src[1]]);
    let alpha = if v & 1 == 1 { 0xff } else { 0 };
    dst.copy_from_slice(&[expand5(v >> 11), expand5(v >> 6), expand5(v >> 1), alpha]);
}

fn rgba8_to_rgba5551(src: &[u8], dst: &mut [u8]) {
    let v = (src[0] as u16 >> 3) << 11
        | (src[1] as u16 >> 3) << 6
        | (src[2] as u16 >> 3) << 1
        | src[3] as u16 >> 7;
    dst.copy_from_slice(&v.to_ne_bytes());
}

fn rgb565_to_rgba8(src: &[u8], dst: &mut [u8]) {
    let v = u16::from_ne_bytes([src[0], src[1]]);
    dst.copy_from_slice(&[expand5(v >> 11), expand6(v >> 5), expand5(v), 0xff]);
}

fn rgba8_to_rgb565(src: &[u8], dst: &mut [u8]) {
    let v = (src[0] as u16 >> 3) << 11 | (src[1] as u16 >> 2) << 5 | src[2] as u16 >> 3;
    dst.copy_from_slice(&v.to_ne_bytes());
}

fn depth32_to_depth32f(src: &[u8], dst: &mut [u8]) {
    let v = u32::from_ne_bytes([src[0], src[1], src[2], src[3]]);
    let depth = (v as f64 / u32::MAX as f64) as f32;
    dst.copy_from_slice(&depth.to_ne_bytes());
}

fn depth32f_to_depth32(src: &[u8], dst: &mut [u8]) {
    let depth = f32::from_ne_bytes([src[0], src[1], src[2], src[3]]).clamp(0.0, 1.0);
    let v = (depth as f64 * u32::MAX as f64).round() as u32;
    dst.copy_from_slice(&v.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::format::FORMAT_TABLE;
    use crate::util::rect::Rect;

    fn layout(format: PixelFormat, width: i32, height: i32, alignment: u32) -> ImageRect {
        ImageRect::new(
            Rect::new(0, 0, width, height),
            format.element_count(),
            format.element_size(),
            alignment,
        )
    }

    #[test]
    fn every_reachable_pair_has_a_converter() {
        // Uploads convert the logical format into the realized one and back for reads
        for entry in FORMAT_TABLE {
            let logical = entry.pixel;
            let explicit = logical.explicit();
            assert!(can_convert(logical, explicit), "{logical:?} -> {explicit:?}");
            assert!(can_convert(explicit, logical), "{explicit:?} -> {logical:?}");
        }
        // glReadPixels from colour targets, including BGRA swapchain images
        for src in [PixelFormat::Rgba8, PixelFormat::Bgra8] {
            for dst in [PixelFormat::Rgba8, PixelFormat::Rgb8] {
                assert!(can_convert(src, dst), "{src:?} -> {dst:?}");
            }
        }
        assert!(can_convert(PixelFormat::Rgba8, PixelFormat::Rgb565));
    }

    #[test]
    #[should_panic(expected = "no pixel conversion")]
    fn missing_pair_fails_loudly() {
        let rect = layout(PixelFormat::Depth16, 1, 1, 1);
        let src = [0u8; 2];
        let mut dst = [0u8; 4];
        let dst_rect = layout(PixelFormat::Rgba8, 1, 1, 1);
        convert_pixels(PixelFormat::Depth16, PixelFormat::Rgba8, &rect, &src, &dst_rect, &mut dst);
    }

    #[test]
    fn identity_conversion_matches_strided_memcpy() {
        for entry in FORMAT_TABLE {
            let format = entry.pixel;
            let (width, height) = (3, 4);
            let src_rect = layout(format, width, height, 4);
            let dst_rect = layout(format, width, height, 8);
            let src: Vec<u8> = (0..src_rect.buffer_size()).map(|i| (i * 7 + 3) as u8).collect();
            let mut dst = vec![0u8; dst_rect.buffer_size()];
            convert_pixels(format, format, &src_rect, &src, &dst_rect, &mut dst);

            let mut expected = vec![0u8; dst_rect.buffer_size()];
            let row = width as usize * format.bytes_per_pixel();
            for y in 0..height as usize {
                let s = y * src_rect.row_stride();
                let d = y * dst_rect.row_stride();
                expected[d..d + row].copy_from_slice(&src[s..s + row]);
            }
            assert_eq!(dst, expected, "{format:?}");
        }
    }

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let src_rect = layout(PixelFormat::Rgb8, 2, 1, 4);
        let dst_rect = layout(PixelFormat::Rgba8, 2, 1, 1);
        let src = [10, 20, 30, 40, 50, 60, 0, 0];
        let mut dst = [0u8; 8];
        convert_pixels(PixelFormat::Rgb8, PixelFormat::Rgba8, &src_rect, &src, &dst_rect, &mut dst);
        assert_eq!(dst, [10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn packed_formats_expand_to_full_range() {
        let mut dst = [0u8; 4];
        rgba4444_to_rgba8(&0xf0a5u16.to_ne_bytes(), &mut dst);
        assert_eq!(dst, [0xff, 0x00, 0xaa, 0x55]);

        rgb565_to_rgba8(&0xffffu16.to_ne_bytes(), &mut dst);
        assert_eq!(dst, [0xff, 0xff, 0xff, 0xff]);

        rgba5551_to_rgba8(&0x0001u16.to_ne_bytes(), &mut dst);
        assert_eq!(dst, [0, 0, 0, 0xff]);

        let mut packed = [0u8; 2];
        rgba8_to_rgb565(&[0xff, 0x00, 0xff, 0xff], &mut packed);
        assert_eq!(u16::from_ne_bytes(packed), 0xf81f);
    }

    #[test]
    fn sub_region_copy_lands_at_destination_origin() {
        let src_rect = layout(PixelFormat::Alpha8, 2, 2, 1);
        let dst_rect = ImageRect::new(Rect::new(1, 1, 4, 4), 1, 1, 1);
        let src = [1, 2, 3, 4];
        let mut dst = [0u8; 16];
        convert_pixels(PixelFormat::Alpha8, PixelFormat::Alpha8, &src_rect, &src, &dst_rect, &mut dst);
        assert_eq!(&dst[4..8], &[0, 1, 2, 0]);
        assert_eq!(&dst[8..12], &[0, 3, 4, 0]);
    }

    #[test]
    fn invert_y_is_self_inverse() {
        // Odd width with a 4-byte row alignment leaves padding at the end of each row
        let rect = layout(PixelFormat::Rgb8, 3, 0, 4);
        for height in 0..=3usize {
            let size = rect.row_stride() * height;
            let original: Vec<u8> = (0..size).map(|i| i as u8).collect();
            let mut data = original.clone();
            invert_image_y_axis(&mut data, height, rect.row_stride());
            if height >= 2 {
                assert_eq!(&data[..rect.row_stride()], &original[size - rect.row_stride()..]);
            }
            invert_image_y_axis(&mut data, height, rect.row_stride());
            assert_eq!(data, original, "height {height}");
        }
    }

    #[test]
    fn depth_round_trips_through_float() {
        let mut float = [0u8; 4];
        let mut back = [0u8; 4];
        depth32_to_depth32f(&u32::MAX.to_ne_bytes(), &mut float);
        assert_eq!(f32::from_ne_bytes(float), 1.0);
        depth32f_to_depth32(&float, &mut back);
        assert_eq!(u32::from_ne_bytes(back), u32::MAX);
    }
}
