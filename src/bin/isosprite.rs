//! Provides the `isosprite` tool for turning a folder of OBJ meshes into
//! isometric PNG sprites.
//!
//! Writes one `<name>.png` per `<name>.obj`, tinted from the built-in
//! palette (or a palette file) and padded onto a square canvas.
//!
//! # Examples
//! ```text
//! isosprite --input assets/assets-OBJ --output assets/obj-sprites --size 256
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};

use isosprite::batch::{self, BatchConfig};
use isosprite::outline::OutlineStyle;
use isosprite::pack;
use isosprite::palette::Palette;
use isosprite::sprite::{SpriteOptions, DEFAULT_SUPERSAMPLE};

/// Render OBJ files to isometric PNG sprites.
#[derive(Debug, Parser)]
#[command(name = "isosprite", version, about)]
struct Cli {
    /// Input folder with OBJ files
    #[arg(long, default_value = "assets/assets-OBJ")]
    input: PathBuf,

    /// Output folder for PNG sprites
    #[arg(long, default_value = "assets/obj-sprites")]
    output: PathBuf,

    /// Output image size (square) in pixels
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..=8192))]
    size: u32,

    /// Margin below and beside each sprite, in pixels [default: 12% of size]
    #[arg(long)]
    padding: Option<u32>,

    /// Render at this multiple of the output size before downscaling
    #[arg(long, default_value_t = DEFAULT_SUPERSAMPLE, value_parser = clap::value_parser!(u32).range(1..=16))]
    supersample: u32,

    /// Outline radius in supersampled pixels (0 disables the outline)
    #[arg(long, default_value_t = 2)]
    outline_thickness: u32,

    /// JSON5 file mapping asset names to [r, g, b, a], layered over the built-in palette
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Log failing assets and continue with the rest
    #[arg(long)]
    keep_going: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<BatchConfig> {
        let palette = match &self.palette {
            Some(path) => Palette::with_overrides(path)?,
            None => Palette::builtin(),
        };

        let options = SpriteOptions {
            size: self.size,
            padding: self.padding.unwrap_or_else(|| pack::default_padding(self.size)),
            supersample: self.supersample,
            outline: OutlineStyle {
                thickness: self.outline_thickness,
                ..OutlineStyle::default()
            },
        };

        Ok(BatchConfig {
            input: self.input,
            output: self.output,
            options,
            palette,
            keep_going: self.keep_going,
        })
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Builder::from_env(Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config().context("invalid configuration")?;

    let report = batch::run_with_progress(&config, |input, output| {
        let name = input.file_name().unwrap_or(input.as_os_str());
        println!("Rendering {} -> {}", name.to_string_lossy(), output.display());
    })?;

    if !report.is_success() {
        for failed in &report.failed {
            eprintln!("Error: {}: {}", failed.path.display(), failed.error);
        }
        bail!(
            "{} of {} assets failed",
            report.failed.len(),
            report.failed.len() + report.rendered.len()
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
