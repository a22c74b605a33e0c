//! Moving pixels between surfaces and `image` buffers.

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::video::pixels::PixelFormat;
use crate::video::surface::Surface;

/// Snapshot a surface as 8-bit RGBA.
pub fn surface_to_image(surface: &Surface) -> RgbaImage {
    let format = surface.format();
    RgbaImage::from_fn(surface.width(), surface.height(), |x, y| {
        let c = surface
            .get_pixel(x, y)
            .map(|p| format.get_rgba(p))
            .unwrap_or_default();
        Rgba([c.r, c.g, c.b, c.a])
    })
}

/// Build a surface in `format` from an RGBA buffer. Indexed formats pick
/// the nearest palette entry.
pub fn surface_from_image(image: &RgbaImage, format: &PixelFormat) -> Result<Surface> {
    let mut surface = Surface::new(image.width(), image.height(), format.clone())
        .with_context(|| format!("Failed to allocate {}x{} surface", image.width(), image.height()))?;
    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let value = format.map_rgba(r, g, b, a);
        surface.put_pixel(x, y, value);
    }
    Ok(surface)
}

/// Load an image file into a surface of `format`.
pub fn load_surface(path: &Path, format: &PixelFormat) -> Result<Surface> {
    let image = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgba8();
    log::debug!(
        "loaded {} ({}x{}) as {}",
        path.display(),
        image.width(),
        image.height(),
        format
    );
    surface_from_image(&image, format)
}

/// Write a surface out as PNG.
pub fn save_png(surface: &Surface, path: &Path) -> Result<()> {
    surface_to_image(surface)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}
