//! Provides the single-asset pipeline: normalize, rotate to the isometric
//! view, render supersampled, outline, then crop and pack.
//!
//! # Examples
//! ```
//! use isosprite::formats::Mesh;
//! use isosprite::palette::Tint;
//! use isosprite::sprite::{render_sprite, SpriteOptions};
//!
//! let tri = Mesh::new(
//!     vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 0.0, 2.0]],
//!     vec![[0, 1, 2]],
//! );
//! let sprite = render_sprite(&tri, Tint::DEFAULT, &SpriteOptions::new(32)).unwrap();
//! assert_eq!(sprite.dimensions(), (32, 32));
//! ```

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

use crate::formats::{self, LoadError, Mesh};
use crate::geometry;
use crate::outline::{self, OutlineStyle};
use crate::pack;
use crate::palette::Tint;
use crate::renderer::{self, RenderError};

/// Render at this multiple of the final size unless told otherwise.
pub const DEFAULT_SUPERSAMPLE: u32 = 4;

/// Errors from producing one sprite.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write sprite: {0}")]
    Image(#[from] image::ImageError),
}

/// Size and post-processing settings shared by every sprite in a batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteOptions {
    /// Final square size in pixels.
    pub size: u32,
    /// Margin kept on the sides and below the sprite.
    pub padding: u32,
    /// Render resolution multiplier.
    pub supersample: u32,
    pub outline: OutlineStyle,
}

impl SpriteOptions {
    /// Returns the standard settings for a `size × size` sprite.
    ///
    /// # Examples
    /// ```
    /// use isosprite::sprite::SpriteOptions;
    ///
    /// let opts = SpriteOptions::new(256);
    /// assert_eq!(opts.padding, 30);
    /// assert_eq!(opts.render_resolution(), 1024);
    /// ```
    pub fn new(size: u32) -> Self {
        Self {
            size,
            padding: pack::default_padding(size),
            supersample: DEFAULT_SUPERSAMPLE,
            outline: OutlineStyle::default(),
        }
    }

    /// Side length of the supersampled render.
    pub fn render_resolution(&self) -> u32 {
        self.size.saturating_mul(self.supersample)
    }
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Runs the full pipeline on an in-memory mesh.
///
/// # Errors
/// Returns an error when the mesh cannot be rasterized.
pub fn render_sprite(
    mesh: &Mesh,
    tint: Tint,
    options: &SpriteOptions,
) -> Result<RgbaImage, RenderError> {
    let normalized = geometry::normalize(mesh);
    let iso = geometry::to_isometric(&normalized);

    let resolution = options.render_resolution();
    let raw = renderer::render(&iso, tint, resolution)?;
    log::debug!(
        "rendered {} triangles at {}x{}",
        iso.face_count(),
        resolution,
        resolution
    );

    let outlined = outline::add_outline(&raw, &options.outline);
    Ok(pack::crop_and_pack(&outlined, options.size, options.padding))
}

/// Loads a mesh file, merges its parts and runs the full pipeline.
///
/// # Errors
/// Returns an error if the file cannot be loaded or rendered.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use isosprite::palette::Tint;
/// use isosprite::sprite::{render_sprite_from_path, SpriteOptions};
///
/// let result = render_sprite_from_path(
///     Path::new("does_not_exist.obj"),
///     Tint::DEFAULT,
///     &SpriteOptions::new(64),
/// );
/// assert!(result.is_err());
/// ```
pub fn render_sprite_from_path(
    path: &Path,
    tint: Tint,
    options: &SpriteOptions,
) -> Result<RgbaImage, SpriteError> {
    let mesh = formats::load_mesh_from_path(path)?;
    Ok(render_sprite(&mesh, tint, options)?)
}
