//! Alpha compositing kernels.
//!
//! Every kernel blends `info.width * info.height` pixels with
//! `d' = d + ((s - d) * A >> 8)` per channel, where the shift floors. The
//! fast kernels run the same formula on several channels packed into one
//! machine word; the generic kernels unpack each channel through the
//! format's mask/shift/loss and must produce the same bits.
//!
//! Kernels do not validate their input. The dispatcher only hands them
//! formats they were written for.

use crate::video::blit::BlitInfo;
use crate::video::pixels::{dispatch_widths, pack_332, Bpp1, Bpp2, Bpp3, Bpp4, PixelWord};

/// `d + floor((s - d) * alpha / 256)` on one 8-bit channel.
#[inline]
pub fn blend_channel(s: u32, d: u32, alpha: u32) -> u32 {
    let d = d as i32;
    (d + (((s as i32 - d) * alpha as i32) >> 8)) as u32
}

/// Alpha as handed to [`blend_channel`]: 255 becomes 256 so an opaque
/// source replaces the destination exactly.
#[inline]
pub fn effective_alpha(alpha: u32) -> u32 {
    if alpha == 255 {
        256
    } else {
        alpha
    }
}

// ==============================================================================
// Generic kernels
// ==============================================================================

/// Any source onto an 8-bit indexed destination with per-surface alpha.
pub fn nto1_surface_alpha(info: &mut BlitInfo<'_>) {
    let alpha = info.src_format.alpha() as u32;
    nto1_dispatch(info, Some(alpha), None);
}

/// Like [`nto1_surface_alpha`], skipping colorkeyed source pixels.
pub fn nto1_surface_alpha_key(info: &mut BlitInfo<'_>) {
    let alpha = info.src_format.alpha() as u32;
    let key = info.src_format.colorkey();
    nto1_dispatch(info, Some(alpha), key);
}

/// Any source with an alpha channel onto an 8-bit indexed destination.
pub fn nto1_pixel_alpha(info: &mut BlitInfo<'_>) {
    nto1_dispatch(info, None, None);
}

fn nto1_dispatch(info: &mut BlitInfo<'_>, alpha: Option<u32>, key: Option<u32>) {
    match info.src_format.bytes_per_pixel() {
        1 => nto1_blend::<Bpp1>(info, alpha, key),
        2 => nto1_blend::<Bpp2>(info, alpha, key),
        3 => nto1_blend::<Bpp3>(info, alpha, key),
        _ => nto1_blend::<Bpp4>(info, alpha, key),
    }
}

/// The destination colour comes from its palette; the blend result is
/// packed as 3-3-2 and sent through the translation table, if any.
fn nto1_blend<S: PixelWord>(info: &mut BlitInfo<'_>, alpha: Option<u32>, key: Option<u32>) {
    let sf = info.src_format;
    let palette = info.dst_format.palette_or_dither();
    let table = info.table;
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(S::BYTES).zip(dst.iter_mut()) {
            let pixel = S::load(s);
            if key == Some(pixel) {
                continue;
            }
            let (sr, sg, sb, sa) = sf.rgba_of(pixel);
            let a = effective_alpha(alpha.unwrap_or(sa));
            let c = palette.get(*d as usize);
            let r = blend_channel(sr, c.r as u32, a) & 0xff;
            let g = blend_channel(sg, c.g as u32, a) & 0xff;
            let b = blend_channel(sb, c.b as u32, a) & 0xff;
            let index = pack_332(r, g, b);
            *d = table.map_or(index, |t| t[index as usize]);
        }
    }
}

/// Any layout onto any layout with per-surface alpha.
pub fn nton_surface_alpha(info: &mut BlitInfo<'_>) {
    let sbpp = info.src_format.bytes_per_pixel();
    let dbpp = info.dst_format.bytes_per_pixel();
    dispatch_widths!(sbpp, dbpp, nton_surface_blend(info, None));
}

/// Like [`nton_surface_alpha`], skipping source pixels equal to the
/// colorkey (compared raw, before unpacking).
pub fn nton_surface_alpha_key(info: &mut BlitInfo<'_>) {
    let sbpp = info.src_format.bytes_per_pixel();
    let dbpp = info.dst_format.bytes_per_pixel();
    let key = info.src_format.colorkey();
    dispatch_widths!(sbpp, dbpp, nton_surface_blend(info, key));
}

/// A transparent surface writes nothing. Destination alpha becomes opaque
/// if the destination has an alpha channel.
fn nton_surface_blend<S: PixelWord, D: PixelWord>(info: &mut BlitInfo<'_>, key: Option<u32>) {
    let sf = info.src_format;
    let df = info.dst_format;
    let alpha = effective_alpha(sf.alpha() as u32);
    if alpha == 0 {
        return;
    }
    let da = if df.has_alpha_channel() { 255 } else { 0 };
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(S::BYTES).zip(dst.chunks_exact_mut(D::BYTES)) {
            let pixel = S::load(s);
            if key == Some(pixel) {
                continue;
            }
            let (sr, sg, sb) = sf.rgb_of(pixel);
            let (dr, dg, db) = df.rgb_of(D::load(d));
            let out = df.pack_rgba(
                blend_channel(sr, dr, alpha),
                blend_channel(sg, dg, alpha),
                blend_channel(sb, db, alpha),
                da,
            );
            D::store(d, out);
        }
    }
}

/// Any layout with an alpha channel onto any layout. Transparent source
/// pixels are skipped and the destination keeps its own alpha.
pub fn nton_pixel_alpha(info: &mut BlitInfo<'_>) {
    let sbpp = info.src_format.bytes_per_pixel();
    let dbpp = info.dst_format.bytes_per_pixel();
    dispatch_widths!(sbpp, dbpp, nton_pixel_blend(info));
}

fn nton_pixel_blend<S: PixelWord, D: PixelWord>(info: &mut BlitInfo<'_>) {
    let sf = info.src_format;
    let df = info.dst_format;
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(S::BYTES).zip(dst.chunks_exact_mut(D::BYTES)) {
            let (sr, sg, sb, sa) = sf.rgba_of(S::load(s));
            if sa == 0 {
                continue;
            }
            let alpha = effective_alpha(sa);
            let (dr, dg, db, da) = df.rgba_of(D::load(d));
            let out = df.pack_rgba(
                blend_channel(sr, dr, alpha),
                blend_channel(sg, dg, alpha),
                blend_channel(sb, db, alpha),
                da,
            );
            D::store(d, out);
        }
    }
}

// ==============================================================================
// 32-bit fast kernels
// ==============================================================================

/// Blend R and B (`0xff00ff`) in one multiply, then G on its own.
#[inline]
fn blend_rgb_lanes(s: u32, d: u32, alpha: u32) -> u32 {
    let s1 = s & 0x00ff00ff;
    let d1 = d & 0x00ff00ff;
    let rb = d1.wrapping_add(s1.wrapping_sub(d1).wrapping_mul(alpha) >> 8) & 0x00ff00ff;
    let s = s & 0xff00;
    let d = d & 0xff00;
    let g = d.wrapping_add(s.wrapping_sub(d).wrapping_mul(alpha) >> 8) & 0xff00;
    rb | g
}

/// 24-bit RGB in the low bits of two 32-bit words at 50%; forces opaque.
pub fn rgb_to_rgb_surface_alpha_128(info: &mut BlitInfo<'_>) {
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let sp = Bpp4::load(s);
            let dp = Bpp4::load(d);
            let out = ((((sp & 0x00fefefe) + (dp & 0x00fefefe)) >> 1) + (sp & dp & 0x00010101))
                | 0xff000000;
            Bpp4::store(d, out);
        }
    }
}

/// RGB888 onto (A)RGB888 with per-surface alpha; the result is opaque.
///
/// Pixels are handled in pairs so the two green channels share one
/// multiply.
pub fn rgb_to_rgb_surface_alpha(info: &mut BlitInfo<'_>) {
    let alpha = info.src_format.alpha() as u32;
    if alpha == 128 {
        rgb_to_rgb_surface_alpha_128(info);
        return;
    }
    for (src, dst) in info.rows() {
        let mut src_pairs = src.chunks_exact(8);
        let mut dst_pairs = dst.chunks_exact_mut(8);
        for (s, d) in (&mut src_pairs).zip(&mut dst_pairs) {
            let (s0, s1) = (Bpp4::load(s), Bpp4::load(&s[4..]));
            let (d0, d1) = (Bpp4::load(d), Bpp4::load(&d[4..]));

            let rb0 = blend_rgb_lanes(s0 & 0x00ff00ff, d0 & 0x00ff00ff, alpha);
            let rb1 = blend_rgb_lanes(s1 & 0x00ff00ff, d1 & 0x00ff00ff, alpha);

            let sg = ((s0 & 0xff00) >> 8) | ((s1 & 0xff00) << 8);
            let dg = ((d0 & 0xff00) >> 8) | ((d1 & 0xff00) << 8);
            let g = dg.wrapping_add(sg.wrapping_sub(dg).wrapping_mul(alpha) >> 8) & 0x00ff00ff;

            Bpp4::store(d, rb0 | ((g << 8) & 0xff00) | 0xff000000);
            Bpp4::store(&mut d[4..], rb1 | ((g >> 8) & 0xff00) | 0xff000000);
        }
        let tail = src_pairs.remainder().chunks_exact(4);
        for (s, d) in tail.zip(dst_pairs.into_remainder().chunks_exact_mut(4)) {
            let out = blend_rgb_lanes(Bpp4::load(s), Bpp4::load(d), alpha) | 0xff000000;
            Bpp4::store(d, out);
        }
    }
}

/// ARGB8888 onto (A)RGB8888 with per-pixel alpha. The destination keeps
/// its alpha byte.
pub fn rgb_to_rgb_pixel_alpha(info: &mut BlitInfo<'_>) {
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let sp = Bpp4::load(s);
            let alpha = sp >> 24;
            if alpha == 0 {
                continue;
            }
            let dp = Bpp4::load(d);
            let out = if alpha == 255 {
                (sp & 0x00ffffff) | (dp & 0xff000000)
            } else {
                blend_rgb_lanes(sp, dp, alpha) | (dp & 0xff000000)
            };
            Bpp4::store(d, out);
        }
    }
}

/// Spread the three low bytes of `p` into 16-bit lanes of a `u64`.
#[inline]
fn widen(p: u32) -> u64 {
    let p = p as u64;
    (p & 0xff) | (p & 0xff00) << 8 | (p & 0xff0000) << 16
}

#[inline]
fn narrow(w: u64) -> u32 {
    ((w & 0xff) | (w >> 8) & 0xff00 | (w >> 16) & 0xff0000) as u32
}

/// [`rgb_to_rgb_pixel_alpha`] with all three channels in one 64-bit
/// multiply. Used where the CPU has wide lanes; output is identical.
pub fn rgb_to_rgb_pixel_alpha_wide(info: &mut BlitInfo<'_>) {
    const LANES: u64 = 0x0000_00ff_00ff_00ff;
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let sp = Bpp4::load(s);
            let alpha = sp >> 24;
            if alpha == 0 {
                continue;
            }
            let dp = Bpp4::load(d);
            let rgb = if alpha == 255 {
                sp & 0x00ffffff
            } else {
                let sw = widen(sp);
                let dw = widen(dp);
                narrow(dw.wrapping_add(sw.wrapping_sub(dw).wrapping_mul(alpha as u64) >> 8) & LANES)
            };
            Bpp4::store(d, rgb | (dp & 0xff000000));
        }
    }
}

// ==============================================================================
// 16-bit fast kernels
// ==============================================================================

const MASK_565_50: u32 = 0xf7de;
const MASK_555_50: u32 = 0xfbde;
const SPREAD_565: u32 = 0x07e0f81f;
const SPREAD_555: u32 = 0x03e07c1f;

/// One 16-bit pixel at 50%. `mask` clears the low bit of every channel
/// so the halves cannot carry into a neighbour.
#[inline]
fn blend16_50(d: u32, s: u32, mask: u32) -> u32 {
    (((s & mask) + (d & mask)) >> 1) + (s & d & (!mask & 0xffff))
}

/// Two 16-bit pixels packed in one word at 50%.
#[inline]
fn blend2x16_50(d: u32, s: u32, mask: u32) -> u32 {
    let mask = mask | mask << 16;
    ((s & mask) >> 1) + ((d & mask) >> 1) + (s & d & !mask)
}

fn blit16_surface_alpha_128(info: &mut BlitInfo<'_>, mask: u32) {
    for (src, dst) in info.rows() {
        let mut src_pairs = src.chunks_exact(4);
        let mut dst_pairs = dst.chunks_exact_mut(4);
        for (s, d) in (&mut src_pairs).zip(&mut dst_pairs) {
            let sw = Bpp2::load(s) | Bpp2::load(&s[2..]) << 16;
            let dw = Bpp2::load(d) | Bpp2::load(&d[2..]) << 16;
            let out = blend2x16_50(dw, sw, mask);
            Bpp2::store(d, out);
            Bpp2::store(&mut d[2..], out >> 16);
        }
        let s = src_pairs.remainder();
        let d = dst_pairs.into_remainder();
        if s.len() >= 2 && d.len() >= 2 {
            let out = blend16_50(Bpp2::load(d), Bpp2::load(s), mask);
            Bpp2::store(d, out);
        }
    }
}

/// Blend a pixel already spread as `-G-R-B` (green in the high half).
#[inline]
fn blend_spread(s: u32, d: u32, alpha5: u32, spread: u32) -> u32 {
    let d = d.wrapping_add(s.wrapping_sub(d).wrapping_mul(alpha5) >> 5) & spread;
    d | d >> 16
}

#[inline]
fn spread16(p: u32, spread: u32) -> u32 {
    (p | p << 16) & spread
}

fn blit16_surface_alpha(info: &mut BlitInfo<'_>, spread: u32) {
    let alpha5 = info.src_format.alpha() as u32 >> 3;
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            let sp = spread16(Bpp2::load(s), spread);
            let dp = spread16(Bpp2::load(d), spread);
            Bpp2::store(d, blend_spread(sp, dp, alpha5, spread));
        }
    }
}

/// RGB565 onto RGB565 with per-surface alpha (5-bit precision).
pub fn rgb565_surface_alpha(info: &mut BlitInfo<'_>) {
    if info.src_format.alpha() == 128 {
        blit16_surface_alpha_128(info, MASK_565_50);
    } else {
        blit16_surface_alpha(info, SPREAD_565);
    }
}

/// RGB555 onto RGB555 with per-surface alpha (5-bit precision).
pub fn rgb555_surface_alpha(info: &mut BlitInfo<'_>) {
    if info.src_format.alpha() == 128 {
        blit16_surface_alpha_128(info, MASK_555_50);
    } else {
        blit16_surface_alpha(info, SPREAD_555);
    }
}

/// Colorkeyed 16-bit blit between layouts with a 6-bit green at bit 5.
/// An alpha below 8 draws nothing.
pub fn rgb565_surface_alpha_key(info: &mut BlitInfo<'_>) {
    let alpha5 = info.src_format.alpha() as u32 >> 3;
    let key = info.src_format.colorkey();
    if alpha5 == 0 {
        return;
    }
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            let raw = Bpp2::load(s);
            if key == Some(raw) {
                continue;
            }
            let sp = spread16(raw, SPREAD_565);
            let dp = spread16(Bpp2::load(d), SPREAD_565);
            Bpp2::store(d, blend_spread(sp, dp, alpha5, SPREAD_565));
        }
    }
}

/// ARGB8888 onto RGB565 with per-pixel alpha (5-bit precision).
pub fn argb_to_565_pixel_alpha(info: &mut BlitInfo<'_>) {
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(2)) {
            let sp = Bpp4::load(s);
            let alpha5 = sp >> 27;
            if alpha5 == 0 {
                continue;
            }
            let out = if alpha5 == 31 {
                (sp >> 8 & 0xf800) + (sp >> 5 & 0x7e0) + (sp >> 3 & 0x1f)
            } else {
                let s = ((sp & 0xfc00) << 11) + (sp >> 8 & 0xf800) + (sp >> 3 & 0x1f);
                let d = spread16(Bpp2::load(d), SPREAD_565);
                blend_spread(s, d, alpha5, SPREAD_565)
            };
            Bpp2::store(d, out);
        }
    }
}

/// ARGB8888 onto RGB555 with per-pixel alpha (5-bit precision).
pub fn argb_to_555_pixel_alpha(info: &mut BlitInfo<'_>) {
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(2)) {
            let sp = Bpp4::load(s);
            let alpha5 = sp >> 27;
            if alpha5 == 0 {
                continue;
            }
            let out = if alpha5 == 31 {
                (sp >> 9 & 0x7c00) + (sp >> 6 & 0x3e0) + (sp >> 3 & 0x1f)
            } else {
                let s = ((sp & 0xf800) << 10) + (sp >> 9 & 0x7c00) + (sp >> 3 & 0x1f);
                let d = spread16(Bpp2::load(d), SPREAD_555);
                blend_spread(s, d, alpha5, SPREAD_555)
            };
            Bpp2::store(d, out);
        }
    }
}
