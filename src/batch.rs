//! Provides the batch driver: find every mesh in a directory and write one
//! sprite per mesh.
//!
//! Files are processed one at a time, sorted by name, so repeated runs
//! produce identical output in identical order.
//!
//! # Examples
//! ```no_run
//! use isosprite::batch::{self, BatchConfig};
//!
//! let config = BatchConfig::new("assets/assets-OBJ", "assets/obj-sprites");
//! let report = batch::run(&config).unwrap();
//! println!("{} sprites written", report.rendered.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::formats;
use crate::palette::{Palette, Tint};
use crate::sprite::{self, SpriteError, SpriteOptions};

/// Everything one batch run needs.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Directory scanned (non-recursively) for mesh files.
    pub input: PathBuf,
    /// Directory receiving `<stem>.png` files; created if missing.
    pub output: PathBuf,
    pub options: SpriteOptions,
    pub palette: Palette,
    /// Log and skip assets that fail instead of stopping the batch.
    pub keep_going: bool,
}

impl BatchConfig {
    /// Creates a config with 256px sprites, the built-in palette, and
    /// fail-fast behavior.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            options: SpriteOptions::default(),
            palette: Palette::builtin(),
            keep_going: false,
        }
    }
}

/// An asset that could not be turned into a sprite.
#[derive(Debug)]
pub struct FailedAsset {
    pub path: PathBuf,
    pub error: SpriteError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Sprites written, in processing order.
    pub rendered: Vec<PathBuf>,
    /// Assets skipped under `keep_going`.
    pub failed: Vec<FailedAsset>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Errors that stop a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No .obj files found in {}", dir.display())]
    NoMeshes { dir: PathBuf },
    #[error("failed to read input directory {}: {source}", dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory {}: {source}", dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: SpriteError,
    },
}

/// Lists mesh files directly inside `dir`, sorted by file name.
///
/// Extensions are matched case-insensitively against the registered loaders.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn discover_meshes(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let read_err = |source| BatchError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };
    let extensions = formats::mesh_extensions();

    let mut meshes = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            meshes.push(path);
        }
    }

    meshes.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(meshes)
}

/// Returns the base name used for palette lookup and output naming.
fn asset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns `<output_dir>/<mesh stem>.png`.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use isosprite::batch::sprite_path;
///
/// let out = sprite_path(Path::new("sprites"), Path::new("in/Tree1.obj"));
/// assert_eq!(out, Path::new("sprites/Tree1.png"));
/// ```
pub fn sprite_path(output_dir: &Path, mesh_path: &Path) -> PathBuf {
    output_dir.join(format!("{}.png", asset_name(mesh_path)))
}

/// Looks up the tint for a mesh file by its base name.
pub fn tint_for(mesh_path: &Path, palette: &Palette) -> Tint {
    palette.lookup(&asset_name(mesh_path))
}

/// Renders one mesh file and writes the PNG.
///
/// # Errors
/// Returns an error if loading, rendering or writing fails.
pub fn render_file(
    mesh_path: &Path,
    out_path: &Path,
    tint: Tint,
    options: &SpriteOptions,
) -> Result<(), SpriteError> {
    let sprite = sprite::render_sprite_from_path(mesh_path, tint, options)?;
    sprite.save_with_format(out_path, ImageFormat::Png)?;
    Ok(())
}

/// Runs a batch, reporting each file through the `log` facade.
///
/// # Errors
/// See [`run_with_progress`].
pub fn run(config: &BatchConfig) -> Result<BatchReport, BatchError> {
    run_with_progress(config, |input, output| {
        log::info!("Rendering {} -> {}", input.display(), output.display());
    })
}

/// Runs a batch, calling `progress(input, output)` before each file.
///
/// # Errors
/// Returns [`BatchError::NoMeshes`] before writing anything when the input
/// directory holds no mesh files. Without `keep_going`, the first failing
/// asset stops the run with [`BatchError::Asset`].
pub fn run_with_progress(
    config: &BatchConfig,
    mut progress: impl FnMut(&Path, &Path),
) -> Result<BatchReport, BatchError> {
    let meshes = discover_meshes(&config.input)?;
    if meshes.is_empty() {
        return Err(BatchError::NoMeshes {
            dir: config.input.clone(),
        });
    }

    fs::create_dir_all(&config.output).map_err(|source| BatchError::CreateDir {
        dir: config.output.clone(),
        source,
    })?;

    let mut report = BatchReport::default();
    for mesh_path in meshes {
        let out_path = sprite_path(&config.output, &mesh_path);
        let tint = tint_for(&mesh_path, &config.palette);
        progress(&mesh_path, &out_path);

        match render_file(&mesh_path, &out_path, tint, &config.options) {
            Ok(()) => report.rendered.push(out_path),
            Err(error) if config.keep_going => {
                log::warn!("skipping {}: {}", mesh_path.display(), error);
                report.failed.push(FailedAsset {
                    path: mesh_path,
                    error,
                });
            }
            Err(source) => {
                return Err(BatchError::Asset {
                    path: mesh_path,
                    source,
                })
            }
        }
    }

    log::info!(
        "{} sprites written to {}, {} failed",
        report.rendered.len(),
        config.output.display(),
        report.failed.len()
    );
    Ok(report)
}
