//! Pixel surfaces: storage, clipping, blit flags and locking.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::{BlitError, LockError, SurfaceRole};
use crate::video::blit::{self, BlitInfo, BlitMap, CopyKernel};
use crate::video::pixels::{load_pixel, store_pixel, Palette, PixelFormat};
use crate::video::rect::Rect;

bitflags! {
    /// Blit-related surface flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// Backing memory lives somewhere that needs preparing before access.
        const HWSURFACE = 0x0000_0001;
        /// Pixels equal to the format's colorkey are skipped.
        const SRCCOLORKEY = 0x0000_1000;
        /// Surface is marked for run-length acceleration; forces locking.
        const RLEACCEL = 0x0000_4000;
        /// Blend with the per-surface alpha or the alpha channel.
        const SRCALPHA = 0x0001_0000;
    }
}

/// Unique, never reused surface identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hook for surfaces whose memory must be prepared before direct access.
///
/// `lock` is called on the outermost lock only and may refuse; `unlock` is
/// called when the last nested lock is released.
pub trait LockHandler: Send + Sync {
    fn lock(&self, surface: SurfaceId) -> bool;
    fn unlock(&self, surface: SurfaceId);
}

/// A rectangular pixel buffer in a given [`PixelFormat`].
pub struct Surface {
    id: SurfaceId,
    width: u32,
    height: u32,
    pitch: usize,
    pixels: Vec<u8>,
    format: PixelFormat,
    format_version: u64,
    clip: Rect,
    flags: SurfaceFlags,
    locked: u32,
    lock_handler: Option<Arc<dyn LockHandler>>,
    pub(crate) map: Option<BlitMap>,
}

impl Surface {
    /// Allocate a zero-filled surface. Rows are padded to 4 bytes.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, BlitError> {
        let bpp = format.bytes_per_pixel();
        let pitch = checked_row_bytes(width, height, bpp)
            .map(|row| (row + 3) & !3)
            .ok_or_else(|| BlitError::InvalidDimensions { width, height }.report())?;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or_else(|| BlitError::InvalidDimensions { width, height }.report())?;
        Ok(Self::assemble(width, height, pitch, vec![0u8; len], format))
    }

    /// Wrap existing pixel data laid out with `pitch` bytes per row.
    pub fn from_pixels(
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, BlitError> {
        let bpp = format.bytes_per_pixel();
        let row = checked_row_bytes(width, height, bpp)
            .ok_or_else(|| BlitError::InvalidDimensions { width, height }.report())?;
        let needed = match height {
            0 => Some(0),
            h => pitch
                .checked_mul(h as usize - 1)
                .and_then(|n| n.checked_add(row)),
        };
        if pitch < row || needed.map_or(true, |n| pixels.len() < n) {
            return Err(BlitError::InvalidPitch {
                pitch,
                width,
                bytes_per_pixel: bpp,
                len: pixels.len(),
            }
            .report());
        }
        Ok(Self::assemble(width, height, pitch, pixels, format))
    }

    fn assemble(width: u32, height: u32, pitch: usize, pixels: Vec<u8>, format: PixelFormat) -> Self {
        let mut flags = SurfaceFlags::empty();
        if format.has_alpha_channel() {
            flags |= SurfaceFlags::SRCALPHA;
        }
        if format.colorkey().is_some() {
            flags |= SurfaceFlags::SRCCOLORKEY;
        }
        Self {
            id: SurfaceId::next(),
            width,
            height,
            pitch,
            pixels,
            format,
            format_version: 0,
            clip: Rect::sized(width, height),
            flags,
            locked: 0,
            lock_handler: None,
            map: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, including padding.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// Bumped whenever the format is replaced.
    pub fn format_version(&self) -> u64 {
        self.format_version
    }

    pub fn flags(&self) -> SurfaceFlags {
        self.flags
    }

    pub fn bounds(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Pixel storage and format borrowed together.
    pub(crate) fn split_mut(&mut self) -> (&mut [u8], &PixelFormat) {
        (&mut self.pixels, &self.format)
    }

    /// Byte offset of pixel `(x, y)`.
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch + x as usize * self.format.bytes_per_pixel()
    }

    /// The `width * bytes_per_pixel` bytes of row `y`, or `None` past the
    /// last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let range = self.row_range(y)?;
        self.pixels.get(range)
    }

    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        let range = self.row_range(y)?;
        self.pixels.get_mut(range)
    }

    fn row_range(&self, y: u32) -> Option<std::ops::Range<usize>> {
        if y >= self.height {
            return None;
        }
        let start = self.offset(0, y);
        Some(start..start + self.width as usize * self.format.bytes_per_pixel())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        Some(load_pixel(&self.pixels[self.offset(x, y)..], bpp))
    }

    /// Store a raw pixel value. Returns `false` if out of bounds.
    pub fn put_pixel(&mut self, x: u32, y: u32, value: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = self.offset(x, y);
        store_pixel(&mut self.pixels[offset..], bpp, value);
        true
    }

    // ==========================================================================
    // Clipping
    // ==========================================================================

    /// Restrict blits onto this surface to `rect` (or the whole surface).
    ///
    /// Returns `false` and installs an empty clip when `rect` misses the
    /// surface entirely.
    pub fn set_clip_rect(&mut self, rect: Option<Rect>) -> bool {
        let bounds = self.bounds();
        match rect {
            None => {
                self.clip = bounds;
                true
            }
            Some(r) => match r.intersection(&bounds) {
                Some(clip) => {
                    self.clip = clip;
                    true
                }
                None => {
                    self.clip = Rect::default();
                    false
                }
            },
        }
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    // ==========================================================================
    // Blit parameters
    // ==========================================================================

    fn replace_format(&mut self, format: PixelFormat) {
        self.format = format;
        self.format_version += 1;
        self.map = None;
    }

    /// Enable (`Some`) or disable (`None`) colorkey transparency.
    pub fn set_color_key(&mut self, key: Option<u32>) {
        self.flags.set(SurfaceFlags::SRCCOLORKEY, key.is_some());
        let format = self.format.with_color_key(key);
        self.replace_format(format);
    }

    /// Enable blending with per-surface `alpha`, or disable blending.
    ///
    /// For formats with an alpha channel, enabling turns on per-pixel
    /// blending and the value is only recorded.
    pub fn set_alpha(&mut self, alpha: Option<u8>) {
        self.flags.set(SurfaceFlags::SRCALPHA, alpha.is_some());
        let format = self.format.with_alpha(alpha.unwrap_or(255));
        self.replace_format(format);
    }

    /// Install a palette on an indexed surface. Returns `false` otherwise.
    pub fn set_palette(&mut self, palette: Palette) -> bool {
        if !self.format.is_indexed() {
            return false;
        }
        let format = self.format.with_palette(palette);
        self.replace_format(format);
        true
    }

    /// Mark the surface as run-length accelerated. Pixels stay unencoded;
    /// the flag only makes [`must_lock`](Self::must_lock) true.
    pub fn set_rle(&mut self, enabled: bool) {
        self.flags.set(SurfaceFlags::RLEACCEL, enabled);
    }

    // ==========================================================================
    // Locking
    // ==========================================================================

    /// Attach (or detach) the external lock hook.
    pub fn set_lock_handler(&mut self, handler: Option<Arc<dyn LockHandler>>) {
        self.flags.set(SurfaceFlags::HWSURFACE, handler.is_some());
        self.lock_handler = handler;
    }

    /// True if pixel access must be bracketed by lock/unlock.
    pub fn must_lock(&self) -> bool {
        self.lock_handler.is_some() || self.flags.contains(SurfaceFlags::RLEACCEL)
    }

    pub fn is_locked(&self) -> bool {
        self.locked > 0
    }

    /// Take a (nestable) lock for direct pixel access.
    pub fn lock(&mut self) -> Result<(), LockError> {
        if self.locked == 0 {
            if let Some(handler) = &self.lock_handler {
                if !handler.lock(self.id) {
                    log::warn!("surface {}: lock refused", self.id);
                    return Err(LockError {
                        surface: self.id.as_u64(),
                    });
                }
            }
        }
        self.locked += 1;
        Ok(())
    }

    /// Release one level of locking. Extra unlocks are ignored.
    pub fn unlock(&mut self) {
        if self.locked == 0 {
            return;
        }
        self.locked -= 1;
        if self.locked == 0 {
            if let Some(handler) = &self.lock_handler {
                handler.unlock(self.id);
            }
        }
    }

    /// Lock for the lifetime of the returned guard. `role` names the
    /// surface in the error if the lock is refused.
    pub fn lock_scoped(&mut self, role: SurfaceRole) -> Result<LockedSurface<'_>, BlitError> {
        self.lock()
            .map_err(|source| BlitError::LockFailure { role, source }.report())?;
        Ok(LockedSurface { surface: self })
    }

    // ==========================================================================
    // Drawing
    // ==========================================================================

    /// Fill `rect` (or the clip rectangle) with a raw pixel value.
    pub fn fill_rect(&mut self, rect: Option<Rect>, color: u32) -> Result<(), BlitError> {
        let area = match rect {
            None => Some(self.clip),
            Some(r) => r.intersection(&self.clip),
        };
        let Some(area) = area.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let mut locked = self.lock_scoped(SurfaceRole::Destination)?;
        let bpp = locked.format.bytes_per_pixel();
        let pitch = locked.pitch;
        let start = locked.offset(area.x as u32, area.y as u32);
        let row_len = area.w as usize * bpp;
        for row in locked.pixels[start..]
            .chunks_mut(pitch)
            .take(area.h as usize)
        {
            for px in row[..row_len].chunks_exact_mut(bpp) {
                store_pixel(px, bpp, color);
            }
        }
        Ok(())
    }

    /// Copy this surface into a new one with `format`.
    ///
    /// Pixels are converted opaquely; the colorkey is re-mapped through its
    /// RGB value and per-surface alpha is carried over.
    pub fn convert(&mut self, format: &PixelFormat) -> Result<Surface, BlitError> {
        let target = format.with_color_key(None).with_alpha(255);
        let mut out = Surface::new(self.width, self.height, target)?;

        {
            let locked = self.lock_scoped(SurfaceRole::Source)?;
            let src_format = locked.format.with_color_key(None).with_alpha(255);
            let table = blit::palette_table(&src_format, &out.format, false);
            let kernel = if src_format.same_pixels(&out.format) {
                CopyKernel::Memcpy
            } else {
                CopyKernel::Convert
            };
            let dst_pitch = out.pitch;
            let (dst_pixels, dst_format) = out.split_mut();
            let mut info = BlitInfo {
                src: &locked.pixels,
                src_pitch: locked.pitch,
                dst: dst_pixels,
                dst_pitch,
                width: locked.width as usize,
                height: locked.height as usize,
                src_format: &src_format,
                dst_format: &*dst_format,
                table: table.as_deref(),
            };
            if info.width > 0 && info.height > 0 {
                kernel.run(&mut info);
            }
        }

        if let Some(key) = self.format.colorkey() {
            let c = self.format.get_rgb(key);
            let mapped = out.format.map_rgb(c.r, c.g, c.b);
            out.set_color_key(Some(mapped));
        }
        if self.flags.contains(SurfaceFlags::SRCALPHA) {
            out.set_alpha(Some(self.format.alpha()));
        }
        log::debug!(
            "surface {}: converted to {} as surface {}",
            self.id,
            format,
            out.id
        );
        Ok(out)
    }
}

fn checked_row_bytes(width: u32, height: u32, bpp: usize) -> Option<usize> {
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return None;
    }
    (width as usize).checked_mul(bpp)
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pitch", &self.pitch)
            .field("format", &self.format)
            .field("clip", &self.clip)
            .field("flags", &self.flags)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

/// A surface held locked; unlocks on drop.
#[derive(Debug)]
pub struct LockedSurface<'a> {
    surface: &'a mut Surface,
}

impl Deref for LockedSurface<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for LockedSurface<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for LockedSurface<'_> {
    fn drop(&mut self) {
        self.surface.unlock();
    }
}
