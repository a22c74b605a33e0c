//! Kernel selection for blending blits.

use crate::cpuinfo::CpuFeatures;
use crate::video::alpha_kernels;
use crate::video::blit::BlitInfo;
use crate::video::pixels::PixelFormat;
use crate::video::surface::SurfaceFlags;

/// The blending kernels the dispatcher can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaKernel {
    Nto1SurfaceAlpha,
    Nto1SurfaceAlphaKey,
    Nto1PixelAlpha,
    NtoNSurfaceAlpha,
    NtoNSurfaceAlphaKey,
    NtoNPixelAlpha,
    Rgb565SurfaceAlphaKey,
    Rgb565SurfaceAlpha,
    Rgb555SurfaceAlpha,
    RgbToRgbSurfaceAlpha,
    ArgbTo565PixelAlpha,
    ArgbTo555PixelAlpha,
    RgbToRgbPixelAlpha,
    RgbToRgbPixelAlphaWide,
}

impl AlphaKernel {
    pub fn name(&self) -> &'static str {
        match self {
            AlphaKernel::Nto1SurfaceAlpha => "nto1-surface-alpha",
            AlphaKernel::Nto1SurfaceAlphaKey => "nto1-surface-alpha-key",
            AlphaKernel::Nto1PixelAlpha => "nto1-pixel-alpha",
            AlphaKernel::NtoNSurfaceAlpha => "nton-surface-alpha",
            AlphaKernel::NtoNSurfaceAlphaKey => "nton-surface-alpha-key",
            AlphaKernel::NtoNPixelAlpha => "nton-pixel-alpha",
            AlphaKernel::Rgb565SurfaceAlphaKey => "rgb565-surface-alpha-key",
            AlphaKernel::Rgb565SurfaceAlpha => "rgb565-surface-alpha",
            AlphaKernel::Rgb555SurfaceAlpha => "rgb555-surface-alpha",
            AlphaKernel::RgbToRgbSurfaceAlpha => "rgb-to-rgb-surface-alpha",
            AlphaKernel::ArgbTo565PixelAlpha => "argb-to-565-pixel-alpha",
            AlphaKernel::ArgbTo555PixelAlpha => "argb-to-555-pixel-alpha",
            AlphaKernel::RgbToRgbPixelAlpha => "rgb-to-rgb-pixel-alpha",
            AlphaKernel::RgbToRgbPixelAlphaWide => "rgb-to-rgb-pixel-alpha-wide",
        }
    }

    /// True for the kernels written against one fixed layout.
    pub fn is_fast_path(&self) -> bool {
        !matches!(
            self,
            AlphaKernel::Nto1SurfaceAlpha
                | AlphaKernel::Nto1SurfaceAlphaKey
                | AlphaKernel::Nto1PixelAlpha
                | AlphaKernel::NtoNSurfaceAlpha
                | AlphaKernel::NtoNSurfaceAlphaKey
                | AlphaKernel::NtoNPixelAlpha
        )
    }

    pub fn run(&self, info: &mut BlitInfo<'_>) {
        match self {
            AlphaKernel::Nto1SurfaceAlpha => alpha_kernels::nto1_surface_alpha(info),
            AlphaKernel::Nto1SurfaceAlphaKey => alpha_kernels::nto1_surface_alpha_key(info),
            AlphaKernel::Nto1PixelAlpha => alpha_kernels::nto1_pixel_alpha(info),
            AlphaKernel::NtoNSurfaceAlpha => alpha_kernels::nton_surface_alpha(info),
            AlphaKernel::NtoNSurfaceAlphaKey => alpha_kernels::nton_surface_alpha_key(info),
            AlphaKernel::NtoNPixelAlpha => alpha_kernels::nton_pixel_alpha(info),
            AlphaKernel::Rgb565SurfaceAlphaKey => alpha_kernels::rgb565_surface_alpha_key(info),
            AlphaKernel::Rgb565SurfaceAlpha => alpha_kernels::rgb565_surface_alpha(info),
            AlphaKernel::Rgb555SurfaceAlpha => alpha_kernels::rgb555_surface_alpha(info),
            AlphaKernel::RgbToRgbSurfaceAlpha => alpha_kernels::rgb_to_rgb_surface_alpha(info),
            AlphaKernel::ArgbTo565PixelAlpha => alpha_kernels::argb_to_565_pixel_alpha(info),
            AlphaKernel::ArgbTo555PixelAlpha => alpha_kernels::argb_to_555_pixel_alpha(info),
            AlphaKernel::RgbToRgbPixelAlpha => alpha_kernels::rgb_to_rgb_pixel_alpha(info),
            AlphaKernel::RgbToRgbPixelAlphaWide => {
                alpha_kernels::rgb_to_rgb_pixel_alpha_wide(info)
            }
        }
    }
}

/// Choose the blending kernel for `src` onto `dst`.
///
/// Sources without an alpha channel blend with their per-surface alpha
/// (colorkeyed if `flags` has `SRCCOLORKEY`); sources with one blend per
/// pixel and ignore the colorkey. Every combination has a generic kernel,
/// so this never fails.
pub fn calculate_alpha_blit(
    src: &PixelFormat,
    dst: &PixelFormat,
    flags: SurfaceFlags,
    caps: &dyn CpuFeatures,
) -> AlphaKernel {
    let rgb_masks_match =
        src.rmask() == dst.rmask() && src.gmask() == dst.gmask() && src.bmask() == dst.bmask();

    if !src.has_alpha_channel() {
        if flags.contains(SurfaceFlags::SRCCOLORKEY) {
            return match dst.bytes_per_pixel() {
                1 => AlphaKernel::Nto1SurfaceAlphaKey,
                2 if src.bytes_per_pixel() == 2
                    && src.gmask() == 0x07e0
                    && dst.gmask() == 0x07e0 =>
                {
                    AlphaKernel::Rgb565SurfaceAlphaKey
                }
                _ => AlphaKernel::NtoNSurfaceAlphaKey,
            };
        }
        return match dst.bytes_per_pixel() {
            1 => AlphaKernel::Nto1SurfaceAlpha,
            2 if src.same_layout(dst) && dst.gmask() == 0x07e0 => AlphaKernel::Rgb565SurfaceAlpha,
            2 if src.same_layout(dst) && dst.gmask() == 0x03e0 => AlphaKernel::Rgb555SurfaceAlpha,
            4 if rgb_masks_match
                && src.bytes_per_pixel() == 4
                && (src.rmask() | src.gmask() | src.bmask()) == 0x00ff_ffff =>
            {
                AlphaKernel::RgbToRgbSurfaceAlpha
            }
            _ => AlphaKernel::NtoNSurfaceAlpha,
        };
    }

    match dst.bytes_per_pixel() {
        1 => AlphaKernel::Nto1PixelAlpha,
        2 if src.bytes_per_pixel() == 4
            && src.amask() == 0xff00_0000
            && src.gmask() == 0xff00
            && ((src.rmask() == 0xff && dst.rmask() == 0x1f)
                || (src.bmask() == 0xff && dst.bmask() == 0x1f)) =>
        {
            match dst.gmask() {
                0x07e0 => AlphaKernel::ArgbTo565PixelAlpha,
                0x03e0 => AlphaKernel::ArgbTo555PixelAlpha,
                _ => AlphaKernel::NtoNPixelAlpha,
            }
        }
        4 if rgb_masks_match && src.bytes_per_pixel() == 4 && src.amask() == 0xff00_0000 => {
            if caps.has_wide_lanes() {
                AlphaKernel::RgbToRgbPixelAlphaWide
            } else {
                AlphaKernel::RgbToRgbPixelAlpha
            }
        }
        _ => AlphaKernel::NtoNPixelAlpha,
    }
}
