//! Provides isosprite, a batch converter from 3D meshes to isometric sprites.
//!
//! Every mesh in an input directory is centered and scaled to unit size,
//! rotated to the classic isometric angle, rasterized on the CPU with flat
//! shading and a per-asset tint, outlined, and packed onto a fixed-size
//! transparent canvas so all sprites share one ground line.
//!
//! The stages live in their own modules and can be used on their own:
//!
//! - [`formats`]: mesh loading (Wavefront OBJ) and multi-part merging
//! - [`geometry`]: normalization and the isometric rotation
//! - [`renderer`]: the software rasterizer
//! - [`outline`]: silhouette outlining
//! - [`pack`]: crop, rescale and bottom-anchored placement
//! - [`palette`]: per-asset tints
//! - [`sprite`]: the single-asset pipeline
//! - [`batch`]: the directory driver behind the `isosprite` binary
//!
//! # Build
//! ```text
//! cargo build --release
//! ```
//!
//! # Examples
//! ```
//! use isosprite::formats::Mesh;
//! use isosprite::palette::Palette;
//! use isosprite::sprite::{render_sprite, SpriteOptions};
//!
//! let tri = Mesh::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 1.0]],
//!     vec![[0, 1, 2]],
//! );
//! let tint = Palette::builtin().lookup("House");
//! let sprite = render_sprite(&tri, tint, &SpriteOptions::new(64)).unwrap();
//! assert_eq!(sprite.dimensions(), (64, 64));
//! ```

pub mod batch;
pub mod formats;
pub mod geometry;
pub mod outline;
pub mod pack;
pub mod palette;
pub mod renderer;
pub mod sprite;
