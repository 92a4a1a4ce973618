//! Provides the silhouette outline pass.
//!
//! The alpha channel is dilated with a square max filter; the ring between
//! the dilated and the original coverage becomes the outline. The image is
//! then laid over a flat layer of the outline color and its alpha replaced
//! by `max(alpha, ring)`.
//!
//! # Examples
//! ```
//! use image::{Rgba, RgbaImage};
//! use isosprite::outline::{add_outline, OutlineStyle};
//!
//! let mut img = RgbaImage::new(9, 9);
//! img.put_pixel(4, 4, Rgba([255, 0, 0, 255]));
//! let out = add_outline(&img, &OutlineStyle::default());
//! assert_eq!(out.get_pixel(4, 4).0, [255, 0, 0, 255]);
//! assert_eq!(out.get_pixel(2, 2).0, [20, 20, 30, 255]);
//! assert_eq!(out.get_pixel(1, 1).0[3], 0);
//! ```

use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Color and radius of the outline ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineStyle {
    /// Flat outline color.
    pub color: Rgba<u8>,
    /// Ring radius in pixels; the max filter window is `2 * thickness + 1`.
    pub thickness: u32,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            color: Rgba([20, 20, 30, 255]),
            thickness: 2,
        }
    }
}

/// Returns the alpha channel as a grayscale image.
pub fn alpha_channel(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| Luma([img.get_pixel(x, y).0[3]]))
}

/// Square max filter with window `2 * radius + 1`, clamped at the borders.
///
/// Runs as two 1D passes (rows, then columns), which is equivalent for a
/// square window.
///
/// # Examples
/// ```
/// use image::{GrayImage, Luma};
/// use isosprite::outline::dilate;
///
/// let mut mask = GrayImage::new(5, 5);
/// mask.put_pixel(2, 2, Luma([200]));
/// let grown = dilate(&mask, 1);
/// assert_eq!(grown.get_pixel(1, 3).0[0], 200);
/// assert_eq!(grown.get_pixel(0, 0).0[0], 0);
/// ```
pub fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let (w, h) = mask.dimensions();
    let r = radius as i64;

    let window_max = |len: u32, pos: u32, sample: &dyn Fn(u32) -> u8| -> u8 {
        let lo = (pos as i64 - r).max(0) as u32;
        let hi = (pos as i64 + r).min(len as i64 - 1) as u32;
        (lo..=hi).map(sample).max().unwrap_or(0)
    };

    let rows = GrayImage::from_fn(w, h, |x, y| {
        Luma([window_max(w, x, &|sx: u32| mask.get_pixel(sx, y).0[0])])
    });
    GrayImage::from_fn(w, h, |x, y| {
        Luma([window_max(h, y, &|sy: u32| rows.get_pixel(x, sy).0[0])])
    })
}

/// Draws an outline of `style.color` around the non-transparent pixels of `img`.
///
/// The output has the same size as the input. Applying it twice is safe;
/// the second pass simply grows the ring further.
pub fn add_outline(img: &RgbaImage, style: &OutlineStyle) -> RgbaImage {
    let alpha = alpha_channel(img);
    let expanded = dilate(&alpha, style.thickness);
    let outline = style.color.0;

    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let src = img.get_pixel(x, y).0;
        let a = src[3];
        let ring = expanded.get_pixel(x, y).0[0].saturating_sub(a);

        let composite = over(src, outline);
        Rgba([composite[0], composite[1], composite[2], a.max(ring)])
    })
}

/// Porter-Duff "source over" of `top` onto `bottom`, straight alpha, RGB only.
fn over(top: [u8; 4], bottom: [u8; 4]) -> [u8; 3] {
    let ta = top[3] as f32 / 255.0;
    let ba = bottom[3] as f32 / 255.0;
    let out_a = ta + ba * (1.0 - ta);
    if out_a <= 0.0 {
        return [0, 0, 0];
    }

    let mut rgb = [0u8; 3];
    for c in 0..3 {
        let blended = (top[c] as f32 * ta + bottom[c] as f32 * ba * (1.0 - ta)) / out_a;
        rgb[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    rgb
}
