//! Surface-to-surface blitting: clipping, blit maps and kernel selection.
//!
//! A blit resolves its kernel once per source/destination pairing. The
//! result is cached on the source surface as a [`BlitMap`] and, across
//! surfaces, in the process-wide [`KernelCache`].

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use lru::LruCache;
use parking_lot::Mutex;

use crate::cpuinfo::{self, Capabilities};
use crate::error::{BlitError, SurfaceRole};
use crate::video::blit_alpha::{calculate_alpha_blit, AlphaKernel};
use crate::video::pixels::{
    dispatch_widths, map_1to1, map_nto1, pack_332, PixelFormat, PixelLayout, PixelWord,
};
use crate::video::rect::Rect;
use crate::video::surface::{Surface, SurfaceFlags, SurfaceId};

/// Default number of pairings remembered by the kernel cache.
pub const DEFAULT_KERNEL_CACHE_CAPACITY: usize = 64;

// ==============================================================================
// Blit context
// ==============================================================================

/// Everything a kernel needs for one blit.
///
/// `src` and `dst` start at the first pixel of the blit region; rows are
/// `src_pitch`/`dst_pitch` bytes apart.
pub struct BlitInfo<'a> {
    pub src: &'a [u8],
    pub src_pitch: usize,
    pub dst: &'a mut [u8],
    pub dst_pitch: usize,
    pub width: usize,
    pub height: usize,
    pub src_format: &'a PixelFormat,
    pub dst_format: &'a PixelFormat,
    /// Palette translation for indexed destinations.
    pub table: Option<&'a [u8]>,
}

impl<'a> BlitInfo<'a> {
    /// Source and destination rows of the region, trimmed to `width` pixels.
    pub fn rows(&mut self) -> impl Iterator<Item = (&[u8], &mut [u8])> + '_ {
        let src_len = self.width * self.src_format.bytes_per_pixel();
        let dst_len = self.width * self.dst_format.bytes_per_pixel();
        self.src
            .chunks(self.src_pitch.max(1))
            .zip(self.dst.chunks_mut(self.dst_pitch.max(1)))
            .take(self.height)
            .map(move |(s, d)| (&s[..src_len], &mut d[..dst_len]))
    }
}

// ==============================================================================
// Copy kernels
// ==============================================================================

/// Kernels for blits that do not blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyKernel {
    /// Identical pixels on both sides: plain row copies.
    Memcpy,
    /// Per-pixel format conversion.
    Convert,
    /// Conversion that skips colorkeyed source pixels.
    ConvertKey,
}

impl CopyKernel {
    pub fn name(&self) -> &'static str {
        match self {
            CopyKernel::Memcpy => "memcpy",
            CopyKernel::Convert => "convert",
            CopyKernel::ConvertKey => "convert-key",
        }
    }

    pub fn run(&self, info: &mut BlitInfo<'_>) {
        let sbpp = info.src_format.bytes_per_pixel();
        let dbpp = info.dst_format.bytes_per_pixel();
        match self {
            CopyKernel::Memcpy => {
                for (s, d) in info.rows() {
                    d.copy_from_slice(s);
                }
            }
            CopyKernel::Convert => dispatch_widths!(sbpp, dbpp, convert_rows(info, None)),
            CopyKernel::ConvertKey => {
                let key = info.src_format.colorkey();
                dispatch_widths!(sbpp, dbpp, convert_rows(info, key))
            }
        }
    }
}

fn convert_rows<S: PixelWord, D: PixelWord>(info: &mut BlitInfo<'_>, key: Option<u32>) {
    let sf = info.src_format;
    let df = info.dst_format;
    let table = info.table;
    let surface_alpha = sf.alpha() as u32;
    for (src, dst) in info.rows() {
        for (s, d) in src.chunks_exact(S::BYTES).zip(dst.chunks_exact_mut(D::BYTES)) {
            let pixel = S::load(s);
            if key == Some(pixel) {
                continue;
            }
            let value = if df.is_indexed() {
                let index = if sf.is_indexed() {
                    pixel as u8
                } else {
                    let (r, g, b) = sf.rgb_of(pixel);
                    pack_332(r, g, b)
                };
                table.map_or(index, |t| t[index as usize]) as u32
            } else {
                let (r, g, b, a) = sf.rgba_of(pixel);
                let a = if sf.has_alpha_channel() { a } else { surface_alpha };
                df.pack_rgba(r, g, b, a)
            };
            D::store(d, value);
        }
    }
}

// ==============================================================================
// Kernel selection
// ==============================================================================

/// A resolved blit kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Copy(CopyKernel),
    Alpha(AlphaKernel),
}

impl Kernel {
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Copy(k) => k.name(),
            Kernel::Alpha(k) => k.name(),
        }
    }

    pub fn run(&self, info: &mut BlitInfo<'_>) {
        match self {
            Kernel::Copy(k) => k.run(info),
            Kernel::Alpha(k) => k.run(info),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything kernel selection depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub src: PixelLayout,
    pub dst: PixelLayout,
    /// Source colorkey is enabled.
    pub colorkey: bool,
    /// Source blends (per-surface alpha below 255, or an alpha channel).
    pub blend: bool,
    /// Pixels can be copied verbatim (same layout and palette).
    pub identical: bool,
    pub caps: Capabilities,
}

impl MappingKey {
    pub fn new(
        src: &PixelFormat,
        flags: SurfaceFlags,
        dst: &PixelFormat,
        caps: Capabilities,
    ) -> Self {
        let colorkey = flags.contains(SurfaceFlags::SRCCOLORKEY) && src.colorkey().is_some();
        let blend = flags.contains(SurfaceFlags::SRCALPHA)
            && (src.alpha() != 255 || src.has_alpha_channel());
        Self {
            src: src.layout(),
            dst: dst.layout(),
            colorkey,
            blend,
            identical: src.same_pixels(dst),
            caps,
        }
    }

    /// Surface flags implied by this key, as the alpha dispatcher sees them.
    fn flags(&self) -> SurfaceFlags {
        let mut flags = SurfaceFlags::empty();
        flags.set(SurfaceFlags::SRCCOLORKEY, self.colorkey);
        flags.set(SurfaceFlags::SRCALPHA, self.blend);
        flags
    }
}

/// Pick the kernel for a pairing. Pure function of its inputs.
pub fn select_kernel(key: &MappingKey, src: &PixelFormat, dst: &PixelFormat) -> Kernel {
    if key.blend {
        return Kernel::Alpha(calculate_alpha_blit(src, dst, key.flags(), &key.caps));
    }
    let copy = if key.colorkey {
        CopyKernel::ConvertKey
    } else if key.identical {
        CopyKernel::Memcpy
    } else {
        CopyKernel::Convert
    };
    Kernel::Copy(copy)
}

/// Palette translation table for blits into an indexed destination.
///
/// Blending kernels always produce 3-3-2 values; copies from an indexed
/// source translate palette indices directly.
pub(crate) fn palette_table(src: &PixelFormat, dst: &PixelFormat, blend: bool) -> Option<Vec<u8>> {
    if !dst.is_indexed() {
        return None;
    }
    if src.is_indexed() && !blend {
        map_1to1(src.palette_or_dither(), dst.palette_or_dither())
    } else {
        map_nto1(dst.palette_or_dither())
    }
}

// ==============================================================================
// Kernel cache
// ==============================================================================

/// LRU memo of kernel selections, shared by all surfaces.
pub struct KernelCache {
    entries: Mutex<LruCache<MappingKey, Kernel>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl KernelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(non_zero(capacity))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached kernel for `key`, running `select` on a miss.
    pub fn get_or_select(&self, key: &MappingKey, select: impl FnOnce() -> Kernel) -> Kernel {
        let mut entries = self.entries.lock();
        if let Some(kernel) = entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *kernel;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let kernel = select();
        entries.put(*key, kernel);
        kernel
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Change the capacity, evicting least recently used entries.
    pub fn set_capacity(&self, capacity: usize) {
        self.entries.lock().resize(non_zero(capacity));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// `(hits, misses, entries)`.
    pub fn stats(&self) -> (u64, u64, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.entries.lock().len(),
        )
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new(DEFAULT_KERNEL_CACHE_CAPACITY)
    }
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

/// The process-wide kernel cache.
pub fn kernel_cache() -> &'static KernelCache {
    static CACHE: OnceLock<KernelCache> = OnceLock::new();
    CACHE.get_or_init(KernelCache::default)
}

// ==============================================================================
// Blit maps
// ==============================================================================

/// Kernel and palette table resolved for one source/destination pairing.
#[derive(Debug, Clone)]
pub struct BlitMap {
    key: MappingKey,
    dst_id: SurfaceId,
    dst_version: u64,
    kernel: Kernel,
    table: Option<Vec<u8>>,
}

impl BlitMap {
    fn build(key: MappingKey, src: &PixelFormat, dst: &Surface) -> Self {
        let kernel = kernel_cache().get_or_select(&key, || select_kernel(&key, src, dst.format()));
        let table = palette_table(src, dst.format(), key.blend);
        log::debug!(
            "blit map to surface {}: {} -> {} uses {}",
            dst.id(),
            src,
            dst.format(),
            kernel
        );
        Self {
            key,
            dst_id: dst.id(),
            dst_version: dst.format_version(),
            kernel,
            table,
        }
    }

    fn is_valid_for(&self, key: &MappingKey, dst: &Surface) -> bool {
        self.key == *key && self.dst_id == dst.id() && self.dst_version == dst.format_version()
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn table(&self) -> Option<&[u8]> {
        self.table.as_deref()
    }
}

/// Make sure `src` carries a blit map valid for `dst` and return its kernel.
pub fn map_surface(src: &mut Surface, dst: &Surface) -> Kernel {
    let key = MappingKey::new(src.format(), src.flags(), dst.format(), cpuinfo::current());
    if let Some(map) = src.map.as_ref().filter(|m| m.is_valid_for(&key, dst)) {
        return map.kernel();
    }
    let map = BlitMap::build(key, src.format(), dst);
    let kernel = map.kernel();
    src.map = Some(map);
    kernel
}

// ==============================================================================
// Blitting
// ==============================================================================

/// Blit `src_rect` of `src` (whole surface if `None`) to `dst_pos` of
/// `dst` (origin if `None`; only `x`/`y` are used).
///
/// The source rectangle is clipped to the source surface and the result to
/// the destination clip rectangle. Returns the destination rectangle that
/// was actually drawn, which is empty when nothing was.
pub fn blit_surface(
    src: &mut Surface,
    src_rect: Option<Rect>,
    dst: &mut Surface,
    dst_pos: Option<Rect>,
) -> Result<Rect, BlitError> {
    let (mut dx, mut dy) = dst_pos.map_or((0i64, 0i64), |r| (r.x as i64, r.y as i64));

    let (mut sx, mut sy, mut w, mut h) = match src_rect {
        None => (0i64, 0i64, src.width() as i64, src.height() as i64),
        Some(r) => {
            let (mut sx, mut sy, mut w, mut h) = (r.x as i64, r.y as i64, r.w as i64, r.h as i64);
            if sx < 0 {
                w += sx;
                dx -= sx;
                sx = 0;
            }
            w = w.min(src.width() as i64 - sx);
            if sy < 0 {
                h += sy;
                dy -= sy;
                sy = 0;
            }
            h = h.min(src.height() as i64 - sy);
            (sx, sy, w, h)
        }
    };

    let clip = dst.clip_rect();
    let over = clip.x as i64 - dx;
    if over > 0 {
        w -= over;
        dx += over;
        sx += over;
    }
    let over = dx + w - clip.right();
    if over > 0 {
        w -= over;
    }
    let over = clip.y as i64 - dy;
    if over > 0 {
        h -= over;
        dy += over;
        sy += over;
    }
    let over = dy + h - clip.bottom();
    if over > 0 {
        h -= over;
    }

    if w <= 0 || h <= 0 {
        return Ok(Rect::new(saturate(dx), saturate(dy), 0, 0));
    }
    let src_area = Rect::new(saturate(sx), saturate(sy), w as u32, h as u32);
    let dst_area = Rect::new(saturate(dx), saturate(dy), w as u32, h as u32);
    lower_blit(src, src_area, dst, dst_area)?;
    Ok(dst_area)
}

/// Offsets of a fully clipped blit can leave the `i32` range.
fn saturate(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

/// Blit without clipping. Both rectangles must lie inside their surfaces;
/// the smaller of the two sizes is used.
pub fn lower_blit(
    src: &mut Surface,
    src_rect: Rect,
    dst: &mut Surface,
    dst_rect: Rect,
) -> Result<(), BlitError> {
    if !src_rect.fits_within(src.width(), src.height()) {
        log::warn!("lower_blit: source rect {:?} outside surface {}", src_rect, src.id());
        return Err(BlitError::InvalidRectangle(SurfaceRole::Source).report());
    }
    if !dst_rect.fits_within(dst.width(), dst.height()) {
        log::warn!("lower_blit: destination rect {:?} outside surface {}", dst_rect, dst.id());
        return Err(BlitError::InvalidRectangle(SurfaceRole::Destination).report());
    }
    let width = src_rect.w.min(dst_rect.w);
    let height = src_rect.h.min(dst_rect.h);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let kernel = map_surface(src, dst);

    let mut dst = dst.lock_scoped(SurfaceRole::Destination)?;
    let src = src.lock_scoped(SurfaceRole::Source)?;

    let src_start = src.offset(src_rect.x as u32, src_rect.y as u32);
    let dst_start = dst.offset(dst_rect.x as u32, dst_rect.y as u32);
    let dst_pitch = dst.pitch();
    let table = src.map.as_ref().and_then(BlitMap::table);
    let (dst_pixels, dst_format) = dst.split_mut();
    let mut info = BlitInfo {
        src: &src.pixels()[src_start..],
        src_pitch: src.pitch(),
        dst: &mut dst_pixels[dst_start..],
        dst_pitch,
        width: width as usize,
        height: height as usize,
        src_format: src.format(),
        dst_format,
        table,
    };
    kernel.run(&mut info);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::pixels::{Color, Palette};
    use serial_test::serial;

    fn filled(w: u32, h: u32, format: PixelFormat, value: u32) -> Surface {
        let mut s = Surface::new(w, h, format).unwrap();
        s.fill_rect(None, value).unwrap();
        s
    }

    #[test]
    fn test_copy_same_format() {
        let mut src = filled(2, 2, PixelFormat::rgb565(), 0xf800);
        let mut dst = Surface::new(4, 4, PixelFormat::rgb565()).unwrap();
        let drawn = blit_surface(&mut src, None, &mut dst, Some(Rect::new(1, 1, 0, 0))).unwrap();
        assert_eq!(drawn, Rect::new(1, 1, 2, 2));
        assert_eq!(dst.get_pixel(0, 0), Some(0));
        assert_eq!(dst.get_pixel(1, 1), Some(0xf800));
        assert_eq!(dst.get_pixel(2, 2), Some(0xf800));
        assert_eq!(dst.get_pixel(3, 3), Some(0));
        assert_eq!(src.map.as_ref().map(BlitMap::kernel), Some(Kernel::Copy(CopyKernel::Memcpy)));
    }

    #[test]
    fn test_convert_565_to_xrgb() {
        let mut src = filled(1, 1, PixelFormat::rgb565(), 0x07e0);
        let mut dst = Surface::new(1, 1, PixelFormat::xrgb8888()).unwrap();
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0x0000fc00));
    }

    #[test]
    fn test_convert_writes_surface_alpha_into_alpha_channel() {
        let mut src = filled(1, 1, PixelFormat::xrgb8888(), 0x00102030);
        let mut dst = Surface::new(1, 1, PixelFormat::argb8888()).unwrap();
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0xff102030));
    }

    #[test]
    fn test_colorkey_copy_skips_key() {
        let mut src = Surface::new(2, 1, PixelFormat::rgb565()).unwrap();
        src.put_pixel(0, 0, 0xf81f);
        src.put_pixel(1, 0, 0x001f);
        src.set_color_key(Some(0xf81f));
        let mut dst = filled(2, 1, PixelFormat::rgb565(), 0x1234);
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0x1234));
        assert_eq!(dst.get_pixel(1, 0), Some(0x001f));
    }

    #[test]
    fn test_negative_source_origin_shifts_destination() {
        let mut src = filled(4, 4, PixelFormat::rgb565(), 0xffff);
        let mut dst = Surface::new(8, 8, PixelFormat::rgb565()).unwrap();
        let drawn = blit_surface(
            &mut src,
            Some(Rect::new(-2, -1, 4, 4)),
            &mut dst,
            Some(Rect::new(0, 0, 0, 0)),
        )
        .unwrap();
        assert_eq!(drawn, Rect::new(2, 1, 2, 3));
        assert_eq!(dst.get_pixel(1, 1), Some(0));
        assert_eq!(dst.get_pixel(2, 1), Some(0xffff));
        assert_eq!(dst.get_pixel(3, 3), Some(0xffff));
        assert_eq!(dst.get_pixel(4, 1), Some(0));
    }

    #[test]
    fn test_destination_clip() {
        let mut src = filled(4, 4, PixelFormat::rgb565(), 0xffff);
        let mut dst = Surface::new(8, 8, PixelFormat::rgb565()).unwrap();
        dst.set_clip_rect(Some(Rect::new(2, 2, 3, 3)));
        let drawn = blit_surface(&mut src, None, &mut dst, Some(Rect::new(0, 0, 0, 0))).unwrap();
        assert_eq!(drawn, Rect::new(2, 2, 2, 2));
        assert_eq!(dst.get_pixel(1, 1), Some(0));
        assert_eq!(dst.get_pixel(3, 3), Some(0xffff));
        assert_eq!(dst.get_pixel(4, 4), Some(0));
    }

    #[test]
    fn test_empty_clip_draws_nothing() {
        let mut src = filled(4, 4, PixelFormat::rgb565(), 0xffff);
        let mut dst = Surface::new(8, 8, PixelFormat::rgb565()).unwrap();
        dst.set_clip_rect(Some(Rect::new(100, 100, 1, 1)));
        let drawn = blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert!(drawn.is_empty());
        assert!(dst.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_extreme_offsets_saturate() {
        let mut src = filled(4, 4, PixelFormat::rgb565(), 0xffff);
        let mut dst = Surface::new(4, 4, PixelFormat::rgb565()).unwrap();
        let drawn = blit_surface(
            &mut src,
            Some(Rect::new(i32::MIN, 0, 4, 4)),
            &mut dst,
            Some(Rect::new(i32::MAX, 0, 0, 0)),
        )
        .unwrap();
        // dx ends up at 2^32 - 1 before it is narrowed
        assert_eq!(drawn, Rect::new(i32::MAX, 0, 0, 0));
        assert!(dst.pixels().iter().all(|&b| b == 0));
        assert_eq!(saturate(-(1i64 << 40)), i32::MIN);
        assert_eq!(saturate(-7), -7);
    }

    #[test]
    #[serial]
    fn test_lower_blit_rejects_bad_rect() {
        let mut src = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
        let mut dst = Surface::new(2, 2, PixelFormat::rgb565()).unwrap();
        let err = lower_blit(&mut src, Rect::new(1, 1, 2, 2), &mut dst, Rect::sized(2, 2)).unwrap_err();
        assert_eq!(err, BlitError::InvalidRectangle(SurfaceRole::Source));
        assert_eq!(crate::error::get_error(), "Invalid source blit rectangle");
    }

    #[test]
    fn test_map_rebuilt_when_flags_change() {
        let mut src = filled(1, 1, PixelFormat::rgb565(), 0xffff);
        let mut dst = Surface::new(1, 1, PixelFormat::rgb565()).unwrap();
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(src.map.as_ref().map(BlitMap::kernel), Some(Kernel::Copy(CopyKernel::Memcpy)));

        src.set_alpha(Some(128));
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(
            src.map.as_ref().map(BlitMap::kernel),
            Some(Kernel::Alpha(AlphaKernel::Rgb565SurfaceAlpha))
        );
    }

    #[test]
    fn test_opaque_surface_alpha_copies() {
        let mut src = filled(1, 1, PixelFormat::rgb565(), 0xffff);
        src.set_alpha(Some(255));
        let mut dst = Surface::new(1, 1, PixelFormat::rgb565()).unwrap();
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(src.map.as_ref().map(BlitMap::kernel), Some(Kernel::Copy(CopyKernel::Memcpy)));
        assert_eq!(dst.get_pixel(0, 0), Some(0xffff));
    }

    #[test]
    fn test_indexed_to_indexed_translates_palette() {
        let reds = Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 0, 0)]).unwrap();
        let mut src = Surface::new(1, 1, PixelFormat::indexed8_with(reds)).unwrap();
        src.put_pixel(0, 0, 1);
        let mut dst = Surface::new(1, 1, PixelFormat::indexed8()).unwrap();
        blit_surface(&mut src, None, &mut dst, None).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0xe0));
    }

    #[test]
    fn test_kernel_cache_counts_hits() {
        let cache = KernelCache::new(2);
        let key = MappingKey::new(
            &PixelFormat::rgb565(),
            SurfaceFlags::empty(),
            &PixelFormat::rgb565(),
            Capabilities::none(),
        );
        let first = cache.get_or_select(&key, || Kernel::Copy(CopyKernel::Memcpy));
        let second = cache.get_or_select(&key, || unreachable!("should be cached"));
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1, 1));

        cache.set_capacity(0);
        assert_eq!(cache.capacity(), 1);
        cache.clear();
        assert_eq!(cache.stats().2, 0);
    }

    #[test]
    fn test_select_kernel_copy_variants() {
        let a = PixelFormat::rgb565();
        let b = PixelFormat::xrgb8888();
        let key = MappingKey::new(&a, SurfaceFlags::empty(), &b, Capabilities::none());
        assert_eq!(select_kernel(&key, &a, &b), Kernel::Copy(CopyKernel::Convert));

        let keyed = a.with_color_key(Some(0));
        let key = MappingKey::new(&keyed, SurfaceFlags::SRCCOLORKEY, &a, Capabilities::none());
        assert_eq!(select_kernel(&key, &keyed, &a), Kernel::Copy(CopyKernel::ConvertKey));
    }
}
