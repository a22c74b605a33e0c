use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{
    parse_accel, parse_alpha, parse_color_key, parse_log_level, parse_pixel_format, parse_point,
    parse_rect, parse_size, Options, PIXEL_FORMAT_NAMES,
};
use crate::video::image_io::{load_surface, save_png};
use crate::video::rect::Rect;
use crate::video::surface::Surface;
use crate::video::{blit_surface, kernel_cache, soft_stretch};

/// Software blitter: stretch and alpha-blit PNG images
#[derive(Parser, Debug)]
#[command(name = "sdlite-blit")]
#[command(version)]
#[command(about = "Stretch and composite images with the sdlite software blitters", long_about = None)]
pub struct Cli {
    /// CPU acceleration (detect, none, neon, armsimd)
    #[arg(long, value_name = "ACCEL", global = true)]
    pub accel: Option<String>,

    /// Log level (nothing, user, error, warning, info, debug, all)
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Nearest-neighbour stretch of an image to a new size
    Stretch(StretchArgs),
    /// Blit one image onto another, optionally blending or colorkeying
    Blit(BlitArgs),
    /// List the named pixel formats
    Formats,
}

#[derive(Args, Debug)]
pub struct StretchArgs {
    /// Image to read
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// PNG to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output size: WxH, Wx or xH to keep the aspect, or N% of the source
    #[arg(short, long, value_name = "SIZE")]
    pub size: String,

    /// Source rectangle (default: whole image)
    #[arg(long = "src-rect", value_name = "X,Y,W,H")]
    pub src_rect: Option<String>,

    /// Destination rectangle (default: whole output)
    #[arg(long = "dst-rect", value_name = "X,Y,W,H")]
    pub dst_rect: Option<String>,

    /// Working pixel format
    #[arg(short, long, value_name = "FORMAT", default_value = "xrgb8888")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct BlitArgs {
    /// Image to blit from
    #[arg(long, value_name = "FILE")]
    pub src: PathBuf,

    /// Image to blit onto
    #[arg(long, value_name = "FILE")]
    pub dst: PathBuf,

    /// PNG to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Destination position
    #[arg(long, value_name = "X,Y")]
    pub at: Option<String>,

    /// Source rectangle (default: whole image)
    #[arg(long = "src-rect", value_name = "X,Y,W,H")]
    pub src_rect: Option<String>,

    /// Per-surface alpha (0-255)
    #[arg(short, long, value_name = "ALPHA")]
    pub alpha: Option<String>,

    /// Source colorkey (RRGGBB)
    #[arg(short, long, value_name = "RRGGBB")]
    pub colorkey: Option<String>,

    /// Source pixel format
    #[arg(short, long, value_name = "FORMAT", default_value = "argb8888")]
    pub format: String,

    /// Destination pixel format
    #[arg(long = "dst-format", value_name = "FORMAT", default_value = "xrgb8888")]
    pub dst_format: String,

    /// Destination clip rectangle
    #[arg(long, value_name = "X,Y,W,H")]
    pub clip: Option<String>,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref accel) = self.accel {
            opts.accel = parse_accel(accel).context("Invalid --accel")?;
        }
        if let Some(ref level) = self.log_level {
            opts.log_level = parse_log_level(level).context("Invalid --log-level")?;
        }
        Ok(opts)
    }

    /// Execute the selected subcommand
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Command::Stretch(args) => run_stretch(args),
            Command::Blit(args) => run_blit(args),
            Command::Formats => {
                for name in PIXEL_FORMAT_NAMES {
                    let format = parse_pixel_format(name)?;
                    println!("{:<10} {}", name, format);
                }
                Ok(())
            }
        }
    }
}

fn optional_rect(s: &Option<String>, what: &str) -> Result<Option<Rect>> {
    s.as_deref()
        .map(parse_rect)
        .transpose()
        .with_context(|| format!("Invalid {}", what))
}

fn run_stretch(args: &StretchArgs) -> Result<()> {
    let format = parse_pixel_format(&args.format)?;
    let src_rect = optional_rect(&args.src_rect, "source rectangle")?;
    let dst_rect = optional_rect(&args.dst_rect, "destination rectangle")?;

    let mut src = load_surface(&args.input, &format)?;
    let base = src_rect.unwrap_or_else(|| src.bounds());
    let (width, height) = parse_size(&args.size, (base.w, base.h)).context("Invalid output size")?;
    let mut dst = Surface::new(width, height, format)?;
    soft_stretch(&mut src, src_rect, &mut dst, dst_rect).context("Stretch failed")?;

    save_png(&dst, &args.output)?;
    log::info!(
        "stretched {} ({}x{}) to {} ({}x{})",
        args.input.display(),
        src.width(),
        src.height(),
        args.output.display(),
        width,
        height
    );
    Ok(())
}

fn run_blit(args: &BlitArgs) -> Result<()> {
    let src_format = parse_pixel_format(&args.format)?;
    let dst_format = parse_pixel_format(&args.dst_format)?;
    let src_rect = optional_rect(&args.src_rect, "source rectangle")?;
    let at = args
        .at
        .as_deref()
        .map(parse_point)
        .transpose()
        .context("Invalid --at position")?
        .map(|(x, y)| Rect::new(x, y, 0, 0));

    let mut src = load_surface(&args.src, &src_format)?;
    let mut dst = load_surface(&args.dst, &dst_format)?;

    if let Some(ref key) = args.colorkey {
        let (r, g, b) = parse_color_key(key)?;
        let pixel = src.format().map_rgb(r, g, b);
        src.set_color_key(Some(pixel));
    }
    if let Some(ref alpha) = args.alpha {
        src.set_alpha(Some(parse_alpha(alpha)?));
    }
    if let Some(clip) = optional_rect(&args.clip, "clip rectangle")? {
        if !dst.set_clip_rect(Some(clip)) {
            log::warn!("clip rectangle {:?} misses the destination", clip);
        }
    }

    let drawn = blit_surface(&mut src, src_rect, &mut dst, at).context("Blit failed")?;
    save_png(&dst, &args.output)?;

    let (hits, misses, entries) = kernel_cache().stats();
    log::info!(
        "blitted {} onto {}: drew {:?}, kernel cache {} hits / {} misses / {} entries",
        args.src.display(),
        args.dst.display(),
        drawn,
        hits,
        misses,
        entries
    );
    Ok(())
}
