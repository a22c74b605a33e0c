//! Nearest-neighbour stretch between surfaces of the same format.
//!
//! Rows and columns are stepped independently in 16.16 fixed point: the
//! position starts at `0x10000` and grows by `(src << 16) / dst` per
//! destination step; each time it reaches `0x10000` the source advances
//! by one.

use crate::error::{BlitError, SurfaceRole};
use crate::video::rect::Rect;
use crate::video::surface::Surface;

const ONE: u64 = 0x10000;

fn step(src: u32, dst: u32) -> u64 {
    ((src as u64) << 16) / dst as u64
}

/// Stretch one row of `src_w` pixels over `dst_w` pixels.
fn copy_row<const BPP: usize>(src: &[u8], src_w: u32, dst: &mut [u8], dst_w: u32) {
    let inc = step(src_w, dst_w);
    let mut pos = ONE;
    let mut next = 0usize;
    let mut pixel = [0u8; BPP];
    for out in dst[..dst_w as usize * BPP].chunks_exact_mut(BPP) {
        while pos >= ONE {
            pixel.copy_from_slice(&src[next..next + BPP]);
            next += BPP;
            pos -= ONE;
        }
        out.copy_from_slice(&pixel);
        pos += inc;
    }
}

fn checked_rect(
    rect: Option<Rect>,
    surface: &Surface,
    role: SurfaceRole,
) -> Result<Rect, BlitError> {
    let rect = rect.unwrap_or_else(|| surface.bounds());
    if !rect.fits_within(surface.width(), surface.height()) {
        log::warn!("soft_stretch: {} rect {:?} outside surface {}", role, rect, surface.id());
        return Err(BlitError::InvalidRectangle(role).report());
    }
    Ok(rect)
}

/// Stretch `src_rect` of `src` onto `dst_rect` of `dst` (whole surfaces
/// when `None`).
///
/// Both surfaces must share a pixel layout and both rectangles must lie
/// inside their surfaces. Nothing is written unless both surfaces lock.
/// An empty rectangle on either side is a successful no-op.
pub fn soft_stretch(
    src: &mut Surface,
    src_rect: Option<Rect>,
    dst: &mut Surface,
    dst_rect: Option<Rect>,
) -> Result<(), BlitError> {
    if !src.format().same_layout(dst.format()) {
        return Err(BlitError::FormatMismatch.report());
    }
    let src_rect = checked_rect(src_rect, src, SurfaceRole::Source)?;
    let dst_rect = checked_rect(dst_rect, dst, SurfaceRole::Destination)?;
    if src_rect.is_empty() || dst_rect.is_empty() {
        return Ok(());
    }

    let mut dst = dst.lock_scoped(SurfaceRole::Destination)?;
    let src = src.lock_scoped(SurfaceRole::Source)?;

    let bpp = dst.format().bytes_per_pixel();
    let src_pitch = src.pitch();
    let dst_pitch = dst.pitch();
    let src_pixels = src.pixels();
    let dst_pixels = dst.pixels_mut();

    let inc = step(src_rect.h, dst_rect.h);
    let mut pos = ONE;
    let mut src_row = src_rect.y as usize;
    let mut src_start = 0usize;
    for dst_row in dst_rect.y as usize..dst_rect.bottom() as usize {
        while pos >= ONE {
            src_start = src_row * src_pitch + src_rect.x as usize * bpp;
            src_row += 1;
            pos -= ONE;
        }
        let dst_start = dst_row * dst_pitch + dst_rect.x as usize * bpp;
        let from = &src_pixels[src_start..];
        let to = &mut dst_pixels[dst_start..];
        match bpp {
            1 => copy_row::<1>(from, src_rect.w, to, dst_rect.w),
            2 => copy_row::<2>(from, src_rect.w, to, dst_rect.w),
            3 => copy_row::<3>(from, src_rect.w, to, dst_rect.w),
            _ => copy_row::<4>(from, src_rect.w, to, dst_rect.w),
        }
        pos += inc;
    }
    log::trace!(
        "soft_stretch: {:?} of surface {} -> {:?} of surface {}",
        src_rect,
        src.id(),
        dst_rect,
        dst.id()
    );
    Ok(())
}
