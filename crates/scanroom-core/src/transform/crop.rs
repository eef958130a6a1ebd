//! Pixel-rectangle cropping.

use crate::decode::SourceRaster;
use crate::geometry::PixelRect;

/// Copy the pixels under `rect` into a new raster.
///
/// `rect` is clamped to the raster first, so the output is never empty and
/// never reaches outside the source. A rectangle covering the whole raster
/// returns a copy.
pub fn crop_pixels(raster: &SourceRaster, rect: PixelRect) -> SourceRaster {
    let rect = rect.clamp_to(raster.width(), raster.height());
    if rect == PixelRect::full(raster.width(), raster.height()) {
        return raster.clone();
    }

    let src_stride = raster.width() as usize * 3;
    let row_len = rect.width as usize * 3;
    let src = raster.pixels();
    let mut output = Vec::with_capacity(row_len * rect.height as usize);

    // Copy pixel data row by row
    for y in rect.top..rect.top + rect.height {
        let row_start = y as usize * src_stride + rect.left as usize * 3;
        output.extend_from_slice(&src[row_start..row_start + row_len]);
    }

    match SourceRaster::new(rect.width, rect.height, output, raster.encoding()) {
        Ok(cropped) => cropped,
        // Unreachable: every row contributes exactly `row_len` bytes
        Err(_) => raster.clone(),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::Encoding;
    use proptest::prelude::*;

    fn create_test_raster(width: u32, height: u32) -> SourceRaster {
        let pixels = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, (i / 256 % 256) as u8, 7])
            .collect();
        SourceRaster::new(width, height, pixels, Encoding::Jpeg).unwrap()
    }

    proptest! {
        /// Property: output stays within the source and is never empty.
        #[test]
        fn prop_output_bounded_by_input(
            (width, height) in (1u32..=64, 1u32..=64),
            rect in (0u32..100, 0u32..100, 0u32..100, 0u32..100),
        ) {
            let raster = create_test_raster(width, height);
            let result = crop_pixels(&raster, PixelRect::new(rect.0, rect.1, rect.2, rect.3));
            prop_assert!(result.width() >= 1 && result.width() <= width);
            prop_assert!(result.height() >= 1 && result.height() <= height);
        }

        /// Property: every output pixel is the source pixel at the offset position.
        #[test]
        fn prop_pixels_come_from_offset(
            (width, height) in (2u32..=40, 2u32..=40),
            (left, top) in (0u32..40, 0u32..40),
            (w, h) in (1u32..40, 1u32..40),
        ) {
            let raster = create_test_raster(width, height);
            let rect = PixelRect::new(left, top, w, h).clamp_to(width, height);
            let result = crop_pixels(&raster, rect);
            for y in 0..result.height() {
                for x in 0..result.width() {
                    prop_assert_eq!(result.rgb_at(x, y), raster.rgb_at(rect.left + x, rect.top + y));
                }
            }
        }
    }
}
