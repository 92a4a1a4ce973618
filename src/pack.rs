//! Provides cropping of a render to its silhouette and packing onto the
//! final sprite canvas.
//!
//! Sprites are centered horizontally but anchored `padding` pixels above the
//! bottom edge, so every asset appears to stand on the same ground line.
//!
//! # Examples
//! ```
//! use image::{Rgba, RgbaImage};
//! use isosprite::pack::{alpha_bbox, crop_and_pack};
//!
//! let mut img = RgbaImage::new(40, 40);
//! for y in 10..30 {
//!     for x in 15..25 {
//!         img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
//!     }
//! }
//! let sprite = crop_and_pack(&img, 32, 4);
//! assert_eq!(sprite.dimensions(), (32, 32));
//! let bbox = alpha_bbox(&sprite).unwrap();
//! assert_eq!(bbox.bottom(), 32 - 4);
//! ```

use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};

/// Share of the sprite size reserved as padding when none is given.
pub const DEFAULT_PADDING_RATIO: f64 = 0.12;

/// Returns the padding used for a sprite of `size` pixels: 12%, rounded down.
///
/// # Examples
/// ```
/// use isosprite::pack::default_padding;
///
/// assert_eq!(default_padding(256), 30);
/// assert_eq!(default_padding(64), 7);
/// ```
pub fn default_padding(size: u32) -> u32 {
    (size as f64 * DEFAULT_PADDING_RATIO).floor() as u32
}

/// An axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bbox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bbox {
    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Finds the smallest rectangle containing every pixel with non-zero alpha.
///
/// Returns `None` when the image is fully transparent.
pub fn alpha_bbox(img: &RgbaImage) -> Option<Bbox> {
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0u32, 0u32);
    let mut found = false;

    for (x, y, px) in img.enumerate_pixels() {
        if px.0[3] == 0 {
            continue;
        }
        found = true;
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }

    found.then(|| Bbox {
        x: min.0,
        y: min.1,
        width: max.0 - min.0 + 1,
        height: max.1 - min.1 + 1,
    })
}

/// Crops `img` to its silhouette, scales it uniformly to fit inside
/// `size - 2 * padding`, and places it on a transparent `size × size` canvas.
///
/// A fully transparent input gives a fully transparent canvas.
pub fn crop_and_pack(img: &RgbaImage, size: u32, padding: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(size, size);
    let Some(bbox) = alpha_bbox(img) else {
        log::debug!("render has no visible pixels; emitting blank sprite");
        return canvas;
    };

    let cropped = imageops::crop_imm(img, bbox.x, bbox.y, bbox.width, bbox.height).to_image();

    let available = size.saturating_sub(padding.saturating_mul(2)).max(1) as f64;
    let scale = (available / bbox.width as f64).min(available / bbox.height as f64);
    let new_width = scaled_len(bbox.width, scale);
    let new_height = scaled_len(bbox.height, scale);

    let resized = resize_premultiplied(&cropped, new_width, new_height);

    let x = (size as i64 - new_width as i64) / 2;
    let y = size as i64 - new_height as i64 - padding as i64;
    imageops::replace(&mut canvas, &resized, x, y);
    canvas
}

fn scaled_len(len: u32, scale: f64) -> u32 {
    // The epsilon keeps an exact fit like 60 * (50 / 60) from flooring to 49.
    ((len as f64 * scale + 1e-9).floor() as u32).max(1)
}

/// Lanczos3 resize carried out on premultiplied alpha so that the color of
/// fully transparent pixels never bleeds into the silhouette edge.
fn resize_premultiplied(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }

    let premultiplied = Rgba32FImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });

    let resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let a = a.clamp(0.0, 1.0);
        if a < 0.5 / 255.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([to_u8(r / a), to_u8(g / a), to_u8(b / a), to_u8(a)])
    })
}
