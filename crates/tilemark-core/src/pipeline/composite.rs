//! Masked paste of one RGBA image onto another.

use image::{GrayImage, RgbaImage};

/// Paste `src` onto `dst` at (`x`, `y`), weighting every channel by `mask`.
///
/// Each channel, alpha included, becomes `dst + (src - dst) * m / 255`.
/// `mask` must have the same dimensions as `src`. The paste is clipped to `dst`.
/// Returns false when nothing overlaps.
pub fn paste_masked(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    mask: &GrayImage,
    x: u32,
    y: u32,
) -> bool {
    debug_assert_eq!(src.dimensions(), mask.dimensions());

    if x >= dst.width() || y >= dst.height() {
        return false;
    }
    let w = src.width().min(dst.width() - x);
    let h = src.height().min(dst.height() - y);

    for sy in 0..h {
        for sx in 0..w {
            let m = mask.get_pixel(sx, sy)[0];
            if m == 0 {
                continue;
            }
            let s = src.get_pixel(sx, sy);
            let d = dst.get_pixel_mut(x + sx, y + sy);
            if m == u8::MAX {
                *d = *s;
                continue;
            }
            for c in 0..4 {
                d[c] = blend(d[c], s[c], m);
            }
        }
    }
    true
}

fn blend(dst: u8, src: u8, m: u8) -> u8 {
    let (dst, src, m) = (i32::from(dst), i32::from(src), i32::from(m));
    let delta = (src - dst) * m;
    // Round half away from zero
    let step = if delta >= 0 {
        (delta + 127) / 255
    } else {
        (delta - 127) / 255
    };
    (dst + step).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn blend_mask_0_is_noop() {
        assert_eq!(blend(40, 200, 0), 40);
    }

    #[test]
    fn blend_mask_255_replaces() {
        assert_eq!(blend(40, 200, 255), 200);
        assert_eq!(blend(200, 40, 255), 40);
    }

    #[test]
    fn blend_half_mask_is_midpoint() {
        assert_eq!(blend(0, 255, 128), 128);
        assert_eq!(blend(255, 0, 128), 127);
    }

    #[test]
    fn paste_blends_inside_and_clips_outside() {
        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let mask = GrayImage::from_pixel(3, 3, Luma([255]));

        assert!(paste_masked(&mut dst, &src, &mask, 2, 2));
        assert_eq!(*dst.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn paste_outside_bounds_is_skipped() {
        let mut dst = RgbaImage::new(4, 4);
        let src = RgbaImage::new(2, 2);
        let mask = GrayImage::from_pixel(2, 2, Luma([255]));
        assert!(!paste_masked(&mut dst, &src, &mask, 4, 0));
    }

    #[test]
    fn paste_blends_alpha_channel_too() {
        let mut dst = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 0, 100, 0]));
        let mask = GrayImage::from_pixel(1, 1, Luma([51]));

        paste_masked(&mut dst, &src, &mask, 0, 0);
        // 100 + 100 * 51 / 255 = 120; 100 - 100 * 51 / 255 = 80; 255 - 255 * 51 / 255 = 204
        assert_eq!(*dst.get_pixel(0, 0), Rgba([120, 80, 100, 204]));
    }
}
