use ash::vk;

/// Axis-aligned integer rectangle used for scissor, viewport and framebuffer sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width.max(0) as u32,
            height: self.height.max(0) as u32,
        }
    }

    /// Vulkan rejects negative scissor offsets, so they are clipped against the origin.
    pub fn to_vk_rect(&self) -> vk::Rect2D {
        let x = self.x.max(0);
        let y = self.y.max(0);
        vk::Rect2D {
            offset: vk::Offset2D { x, y },
            extent: vk::Extent2D {
                width: (self.width - (x - self.x)).max(0) as u32,
                height: (self.height - (y - self.y)).max(0) as u32,
            },
        }
    }
}

/// A [`Rect`] positioned inside a pixel buffer, plus the memory layout of that buffer.
///
/// `width` is the row width of the buffer in pixels, and `x`/`y` locate the
/// region origin inside it. Rows are padded to `alignment` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub element_count: u32,
    pub element_size: u32,
    pub alignment: u32,
}

impl ImageRect {
    pub fn new(
        rect: Rect,
        element_count: u32,
        element_size: u32,
        alignment: u32,
    ) -> Self {
        debug_assert!(alignment.is_power_of_two(), "invalid alignment {alignment}");
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            element_count,
            element_size,
            alignment,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn pixel_size(&self) -> usize {
        (self.element_count * self.element_size) as usize
    }

    pub fn row_stride(&self) -> usize {
        let alignment = self.alignment as usize;
        let unaligned = self.pixel_size() * self.width.max(0) as usize;
        alignment * unaligned.div_ceil(alignment)
    }

    /// Offset of the region origin from the start of the buffer.
    pub fn byte_offset(&self) -> usize {
        self.y.max(0) as usize * self.row_stride() + self.x.max(0) as usize * self.pixel_size()
    }

    /// Size of a buffer holding `height` rows of this layout.
    pub fn buffer_size(&self) -> usize {
        self.row_stride() * self.height.max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_stride_rounds_up_to_alignment() {
        let rect = ImageRect::new(Rect::new(0, 0, 3, 2), 3, 1, 4);
        assert_eq!(rect.pixel_size(), 3);
        assert_eq!(rect.row_stride(), 12);
        assert_eq!(rect.buffer_size(), 24);

        let tight = ImageRect::new(Rect::new(0, 0, 3, 2), 3, 1, 1);
        assert_eq!(tight.row_stride(), 9);

        let eight = ImageRect::new(Rect::new(0, 0, 5, 1), 2, 1, 8);
        assert_eq!(eight.row_stride(), 16);
    }

    #[test]
    fn byte_offset_accounts_for_origin() {
        let rect = ImageRect::new(Rect::new(2, 3, 10, 10), 4, 1, 4);
        assert_eq!(rect.byte_offset(), 3 * 40 + 2 * 4);
    }

    #[test]
    fn negative_scissor_is_clipped() {
        let rect = Rect::new(-4, 2, 10, 6).to_vk_rect();
        assert_eq!(rect.offset.x, 0);
        assert_eq!(rect.offset.y, 2);
        assert_eq!(rect.extent.width, 6);
        assert_eq!(rect.extent.height, 6);
    }
}
