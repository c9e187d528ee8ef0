pub mod color;
pub mod format;
pub mod rect;

pub use format::PixelFormat;
pub use rect::{ImageRect, Rect};

/// Number of levels in a full mip chain for the given base dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let max = width.max(height).max(1);
    u32::BITS - max.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_chain_counts_down_to_one_pixel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(8, 8), 4);
        assert_eq!(mip_level_count(8, 3), 4);
        assert_eq!(mip_level_count(5, 1), 3);
        assert_eq!(mip_level_count(0, 0), 1);
    }
}
