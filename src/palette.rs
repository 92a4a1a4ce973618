//! Provides per-asset tint colors.
//!
//! Assets are tinted by looking up their file stem in a small built-in
//! table. A palette file can layer extra or replacement entries on top; it
//! is JSON5, so comments and trailing commas are fine:
//!
//! ```text
//! {
//!     // roads are drawn a bit darker
//!     "Road": [90, 90, 100, 255],
//!     "House": [157, 183, 255, 255],
//! }
//! ```
//!
//! # Examples
//! ```
//! use isosprite::palette::{Palette, Tint};
//!
//! let palette = Palette::builtin();
//! assert_eq!(palette.lookup("House"), Tint::new(157, 183, 255, 255));
//! assert_eq!(palette.lookup("Widget"), Tint::DEFAULT);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// An 8-bit RGBA color applied uniformly to every face of a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Tint(pub [u8; 4]);

impl Tint {
    /// Neutral gray used for assets missing from the palette.
    pub const DEFAULT: Tint = Tint([220, 220, 220, 255]);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Tint([r, g, b, a])
    }

    /// Returns the channels scaled to `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use isosprite::palette::Tint;
    ///
    /// assert_eq!(Tint::new(255, 0, 255, 0).to_unit(), [1.0, 0.0, 1.0, 0.0]);
    /// ```
    pub fn to_unit(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

const BUILTIN: &[(&str, Tint)] = &[
    ("House", Tint::new(157, 183, 255, 255)),
    ("University", Tint::new(213, 178, 255, 255)),
    ("Office", Tint::new(139, 255, 210, 255)),
    ("Factory", Tint::new(255, 154, 170, 255)),
    ("Hospital", Tint::new(159, 238, 255, 255)),
    ("Mall", Tint::new(255, 210, 122, 255)),
    ("Tree1", Tint::new(120, 200, 120, 255)),
    ("Tree2", Tint::new(120, 200, 120, 255)),
    ("Tree3", Tint::new(120, 200, 120, 255)),
    ("Tree4", Tint::new(120, 200, 120, 255)),
];

/// Errors from reading a palette file.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("failed to read palette {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse palette {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
}

/// Maps exact asset base names (case-sensitive) to tints.
#[derive(Clone, Debug)]
pub struct Palette {
    entries: HashMap<String, Tint>,
    fallback: Tint,
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Palette {
    /// Returns the built-in table with the gray fallback.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(name, tint)| (name.to_string(), *tint))
                .collect(),
            fallback: Tint::DEFAULT,
        }
    }

    /// Returns the tint for `name`, or the fallback when it is not listed.
    pub fn lookup(&self, name: &str) -> Tint {
        self.entries.get(name).copied().unwrap_or(self.fallback)
    }

    /// Number of named entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds or replaces entries from JSON5 text holding a
    /// `name -> [r, g, b, a]` object.
    ///
    /// # Errors
    /// Returns the parser error when the text is not such an object.
    ///
    /// # Examples
    /// ```
    /// use isosprite::palette::{Palette, Tint};
    ///
    /// let mut palette = Palette::builtin();
    /// palette.merge_json5("{ Road: [1, 2, 3, 255], /* ok */ }").unwrap();
    /// assert_eq!(palette.lookup("Road"), Tint::new(1, 2, 3, 255));
    /// assert!(palette.merge_json5("[1, 2]").is_err());
    /// ```
    pub fn merge_json5(&mut self, text: &str) -> Result<(), json5::Error> {
        let extra: HashMap<String, Tint> = json5::from_str(text)?;
        self.entries.extend(extra);
        Ok(())
    }

    /// Loads the built-in table and layers the file at `path` over it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn with_overrides(path: &Path) -> Result<Self, PaletteError> {
        let text = std::fs::read_to_string(path).map_err(|source| PaletteError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut palette = Self::builtin();
        palette
            .merge_json5(&text)
            .map_err(|source| PaletteError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("palette {} loaded, {} entries", path.display(), palette.len());
        Ok(palette)
    }
}
