//! Pixel format descriptors, palettes and channel packing.
//!
//! A [`PixelFormat`] describes how R, G, B and A are packed into a pixel
//! word through a `(mask, shift, loss)` triple per channel. Extraction is
//! `((P & mask) >> shift) << loss` and packing is the reverse; packing
//! truncates, it never rounds.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::BlitError;

// ==============================================================================
// Colors and palettes
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Indexed colour table for 1- and 8-bit formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Pixel values are 8-bit indices, so at most 256 colours.
    pub fn new(colors: Vec<Color>) -> Result<Self, BlitError> {
        if colors.len() > 256 {
            return Err(BlitError::PaletteTooLarge(colors.len()).report());
        }
        Ok(Self { colors })
    }

    /// The 3-3-2 palette with every bit field stretched over `[0, 255]`, so
    /// index 0 is black and index 255 is white.
    pub fn dither_332() -> Self {
        let colors = (0..256u32)
            .map(|i| {
                let mut r = i & 0xe0;
                r |= r >> 3 | r >> 6;
                let mut g = (i << 3) & 0xe0;
                g |= g >> 3 | g >> 6;
                let mut b = i & 0x3;
                b |= b << 2;
                b |= b << 4;
                Color::new(r as u8, g as u8, b as u8)
            })
            .collect();
        Self { colors }
    }

    /// Two entries: white, then black.
    pub fn mono() -> Self {
        Self {
            colors: vec![Color::new(255, 255, 255), Color::new(0, 0, 0)],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Colour at `index`; out-of-range indices read as black.
    pub fn get(&self, index: usize) -> Color {
        self.colors.get(index).copied().unwrap_or_default()
    }

    /// Index of the entry closest to `(r, g, b)` by squared distance.
    /// Ties go to the lowest index.
    pub fn find_color(&self, r: u8, g: u8, b: u8) -> u8 {
        let mut best = 0usize;
        let mut smallest = u32::MAX;
        for (i, c) in self.colors.iter().enumerate() {
            let rd = c.r as i32 - r as i32;
            let gd = c.g as i32 - g as i32;
            let bd = c.b as i32 - b as i32;
            let distance = (rd * rd + gd * gd + bd * bd) as u32;
            if distance < smallest {
                best = i;
                if distance == 0 {
                    break;
                }
                smallest = distance;
            }
        }
        best as u8
    }
}

fn shared_dither_palette() -> &'static Arc<Palette> {
    static DITHER: OnceLock<Arc<Palette>> = OnceLock::new();
    DITHER.get_or_init(|| Arc::new(Palette::dither_332()))
}

/// Pack an 8-bit colour into a 3-3-2 index.
#[inline]
pub fn pack_332(r: u32, g: u32, b: u32) -> u8 {
    (((r >> 5) << 5) | ((g >> 5) << 2) | (b >> 6)) as u8
}

/// Table taking a 3-3-2 index to the closest entry of `dst`.
/// `None` when `dst` already is the 3-3-2 palette.
pub fn map_nto1(dst: &Palette) -> Option<Vec<u8>> {
    let dither = shared_dither_palette();
    if dst == dither.as_ref() {
        return None;
    }
    Some(
        dither
            .colors()
            .iter()
            .map(|c| dst.find_color(c.r, c.g, c.b))
            .collect(),
    )
}

/// Table taking each `src` index to the closest entry of `dst`.
/// `None` when both palettes are identical.
pub fn map_1to1(src: &Palette, dst: &Palette) -> Option<Vec<u8>> {
    if src == dst {
        return None;
    }
    let mut table: Vec<u8> = src
        .colors()
        .iter()
        .map(|c| dst.find_color(c.r, c.g, c.b))
        .collect();
    table.resize(256, 0);
    Some(table)
}

// ==============================================================================
// Channels
// ==============================================================================

/// Placement of one colour channel inside a pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    pub mask: u32,
    pub shift: u8,
    pub loss: u8,
}

impl Channel {
    /// Channel that is not present in the format.
    pub const ABSENT: Channel = Channel {
        mask: 0,
        shift: 0,
        loss: 8,
    };

    pub fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self::ABSENT;
        }
        let shift = mask.trailing_zeros();
        let width = (mask >> shift).trailing_ones();
        Self {
            mask,
            shift: shift as u8,
            loss: 8u32.saturating_sub(width) as u8,
        }
    }

    pub fn is_present(&self) -> bool {
        self.mask != 0
    }

    /// Number of bits the channel occupies.
    pub fn width(&self) -> u32 {
        self.mask.count_ones()
    }

    /// Pull the channel out of `pixel` as an 8-bit value.
    #[inline]
    pub fn expand(&self, pixel: u32) -> u32 {
        ((pixel & self.mask) >> self.shift) << self.loss
    }

    /// Place an 8-bit `value` into the channel's bits.
    #[inline]
    pub fn pack(&self, value: u32) -> u32 {
        ((value >> self.loss) << self.shift) & self.mask
    }
}

// ==============================================================================
// Pixel format
// ==============================================================================

/// The layout half of a format: everything that decides which kernel can
/// run, nothing that varies per surface (colorkey, alpha, palette).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelLayout {
    pub bits_per_pixel: u8,
    pub bytes_per_pixel: u8,
    pub rmask: u32,
    pub gmask: u32,
    pub bmask: u32,
    pub amask: u32,
}

/// Full description of a pixel layout plus per-surface blit parameters.
///
/// Formats are values: the `with_*` methods build a new format rather than
/// editing one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    bits_per_pixel: u8,
    bytes_per_pixel: u8,
    r: Channel,
    g: Channel,
    b: Channel,
    a: Channel,
    colorkey: Option<u32>,
    alpha: u8,
    palette: Option<Arc<Palette>>,
}

impl PixelFormat {
    /// Build a format from a depth and channel masks.
    ///
    /// Depths above 8 with all masks zero get default RGB masks; depths of
    /// 8 or less without masks are indexed and get a default palette.
    pub fn new(
        bits_per_pixel: u8,
        rmask: u32,
        gmask: u32,
        bmask: u32,
        amask: u32,
    ) -> Result<Self, BlitError> {
        if !matches!(bits_per_pixel, 1 | 8 | 15 | 16 | 24 | 32) {
            return Err(BlitError::InvalidFormat(format!(
                "unsupported depth {} bits",
                bits_per_pixel
            )));
        }
        let bytes_per_pixel = (bits_per_pixel as u32).div_ceil(8) as u8;
        let all_masks = rmask | gmask | bmask | amask;

        let (rmask, gmask, bmask, palette) = if all_masks == 0 && bits_per_pixel > 8 {
            let (r, g, b) = default_masks(bits_per_pixel);
            (r, g, b, None)
        } else if all_masks == 0 {
            let palette = if bits_per_pixel == 1 {
                Arc::new(Palette::mono())
            } else {
                Arc::clone(shared_dither_palette())
            };
            (0, 0, 0, Some(palette))
        } else {
            (rmask, gmask, bmask, None)
        };

        let masks = [rmask, gmask, bmask, amask];
        for (i, m) in masks.iter().enumerate() {
            for other in &masks[i + 1..] {
                if m & other != 0 {
                    return Err(BlitError::InvalidFormat(format!(
                        "channel masks {:#x} and {:#x} overlap",
                        m, other
                    )));
                }
            }
            if *m != 0 && (m >> m.trailing_zeros()).count_ones() != (m >> m.trailing_zeros()).trailing_ones() {
                return Err(BlitError::InvalidFormat(format!(
                    "channel mask {:#x} is not contiguous",
                    m
                )));
            }
        }
        if bits_per_pixel < 32 && (rmask | gmask | bmask | amask) >> bits_per_pixel != 0 {
            return Err(BlitError::InvalidFormat(format!(
                "masks exceed {} bits per pixel",
                bits_per_pixel
            )));
        }

        Ok(Self {
            bits_per_pixel,
            bytes_per_pixel,
            r: Channel::from_mask(rmask),
            g: Channel::from_mask(gmask),
            b: Channel::from_mask(bmask),
            a: Channel::from_mask(amask),
            colorkey: None,
            alpha: 255,
            palette,
        })
    }

    fn named(bits: u8, r: u32, g: u32, b: u32, a: u32) -> Self {
        match Self::new(bits, r, g, b, a) {
            Ok(format) => format,
            Err(e) => unreachable!("built-in format rejected: {}", e),
        }
    }

    pub fn rgb565() -> Self {
        Self::named(16, 0xf800, 0x07e0, 0x001f, 0)
    }

    pub fn rgb555() -> Self {
        Self::named(15, 0x7c00, 0x03e0, 0x001f, 0)
    }

    /// Packed 24-bit RGB.
    pub fn rgb888() -> Self {
        Self::named(24, 0xff0000, 0x00ff00, 0x0000ff, 0)
    }

    /// 32-bit RGB with an unused top byte.
    pub fn xrgb8888() -> Self {
        Self::named(32, 0x00ff0000, 0x0000ff00, 0x000000ff, 0)
    }

    pub fn argb8888() -> Self {
        Self::named(32, 0x00ff0000, 0x0000ff00, 0x000000ff, 0xff000000)
    }

    pub fn abgr8888() -> Self {
        Self::named(32, 0x000000ff, 0x0000ff00, 0x00ff0000, 0xff000000)
    }

    pub fn rgba8888() -> Self {
        Self::named(32, 0xff000000, 0x00ff0000, 0x0000ff00, 0x000000ff)
    }

    /// 8-bit indexed with the 3-3-2 palette.
    pub fn indexed8() -> Self {
        Self::named(8, 0, 0, 0, 0)
    }

    /// 8-bit indexed with the given palette.
    pub fn indexed8_with(palette: Palette) -> Self {
        Self::indexed8().with_palette(palette)
    }

    pub fn with_color_key(&self, colorkey: Option<u32>) -> Self {
        Self {
            colorkey,
            ..self.clone()
        }
    }

    pub fn with_alpha(&self, alpha: u8) -> Self {
        Self {
            alpha,
            ..self.clone()
        }
    }

    /// Replace the palette; ignored for formats that are not indexed.
    pub fn with_palette(&self, palette: Palette) -> Self {
        if !self.is_indexed() {
            return self.clone();
        }
        Self {
            palette: Some(Arc::new(palette)),
            ..self.clone()
        }
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel as usize
    }

    pub fn red(&self) -> Channel {
        self.r
    }

    pub fn green(&self) -> Channel {
        self.g
    }

    pub fn blue(&self) -> Channel {
        self.b
    }

    pub fn alpha_channel(&self) -> Channel {
        self.a
    }

    pub fn rmask(&self) -> u32 {
        self.r.mask
    }

    pub fn gmask(&self) -> u32 {
        self.g.mask
    }

    pub fn bmask(&self) -> u32 {
        self.b.mask
    }

    pub fn amask(&self) -> u32 {
        self.a.mask
    }

    pub fn colorkey(&self) -> Option<u32> {
        self.colorkey
    }

    /// Per-surface alpha (255 = opaque).
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_deref()
    }

    /// Palette to use for an indexed format, falling back to 3-3-2.
    pub fn palette_or_dither(&self) -> &Palette {
        match &self.palette {
            Some(p) => p,
            None => shared_dither_palette(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.bits_per_pixel <= 8 && (self.r.mask | self.g.mask | self.b.mask) == 0
    }

    pub fn has_alpha_channel(&self) -> bool {
        self.a.mask != 0
    }

    pub fn layout(&self) -> PixelLayout {
        PixelLayout {
            bits_per_pixel: self.bits_per_pixel,
            bytes_per_pixel: self.bytes_per_pixel,
            rmask: self.r.mask,
            gmask: self.g.mask,
            bmask: self.b.mask,
            amask: self.a.mask,
        }
    }

    /// Same depth and masks.
    pub fn same_layout(&self, other: &PixelFormat) -> bool {
        self.layout() == other.layout()
    }

    /// Same layout and, for indexed formats, the same palette.
    pub fn same_pixels(&self, other: &PixelFormat) -> bool {
        self.same_layout(other) && (!self.is_indexed() || self.palette == other.palette)
    }

    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> u32 {
        if self.is_indexed() {
            return self.palette_or_dither().find_color(r, g, b) as u32;
        }
        self.r.pack(r as u32) | self.g.pack(g as u32) | self.b.pack(b as u32) | self.a.mask
    }

    pub fn map_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        if self.is_indexed() {
            return self.palette_or_dither().find_color(r, g, b) as u32;
        }
        self.pack_rgba(r as u32, g as u32, b as u32, a as u32)
    }

    /// Pack 8-bit channel values; used by the kernels.
    #[inline]
    pub fn pack_rgba(&self, r: u32, g: u32, b: u32, a: u32) -> u32 {
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.pack(a)
    }

    /// Unpack R, G, B as 8-bit values.
    #[inline]
    pub fn rgb_of(&self, pixel: u32) -> (u32, u32, u32) {
        if self.is_indexed() {
            let c = self.palette_or_dither().get(pixel as usize);
            return (c.r as u32, c.g as u32, c.b as u32);
        }
        (self.r.expand(pixel), self.g.expand(pixel), self.b.expand(pixel))
    }

    /// Unpack R, G, B, A as 8-bit values. Missing alpha reads as 0 here,
    /// matching what the raw mask arithmetic produces.
    #[inline]
    pub fn rgba_of(&self, pixel: u32) -> (u32, u32, u32, u32) {
        if self.is_indexed() {
            let c = self.palette_or_dither().get(pixel as usize);
            return (c.r as u32, c.g as u32, c.b as u32, c.a as u32);
        }
        (
            self.r.expand(pixel),
            self.g.expand(pixel),
            self.b.expand(pixel),
            self.a.expand(pixel),
        )
    }

    pub fn get_rgb(&self, pixel: u32) -> Color {
        let (r, g, b) = self.rgb_of(pixel);
        Color::new(r as u8, g as u8, b as u8)
    }

    /// Like [`get_rgb`](Self::get_rgb) but with alpha; formats without an
    /// alpha channel report opaque.
    pub fn get_rgba(&self, pixel: u32) -> Color {
        let (r, g, b, a) = self.rgba_of(pixel);
        let a = if self.is_indexed() || self.has_alpha_channel() {
            a
        } else {
            255
        };
        Color::with_alpha(r as u8, g as u8, b as u8, a as u8)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_indexed() {
            return write!(f, "{}-bit indexed", self.bits_per_pixel);
        }
        write!(
            f,
            "{}-bit R{:#x} G{:#x} B{:#x} A{:#x}",
            self.bits_per_pixel, self.r.mask, self.g.mask, self.b.mask, self.a.mask
        )
    }
}

fn default_masks(bits: u8) -> (u32, u32, u32) {
    let bits = bits.min(24) as u32;
    let width = bits / 3;
    let gwidth = width + bits % 3;
    let bmask = (1 << width) - 1;
    let gmask = ((1 << gwidth) - 1) << width;
    let rmask = ((1 << width) - 1) << (width + gwidth);
    (rmask, gmask, bmask)
}

// ==============================================================================
// Pixel words
// ==============================================================================

/// Reading and writing one packed pixel of a fixed byte width.
///
/// Pixels are stored in native byte order. Kernels are written once,
/// generic over the source and destination widths.
pub trait PixelWord {
    const BYTES: usize;

    fn load(bytes: &[u8]) -> u32;
    fn store(bytes: &mut [u8], value: u32);
}

pub enum Bpp1 {}
pub enum Bpp2 {}
pub enum Bpp3 {}
pub enum Bpp4 {}

impl PixelWord for Bpp1 {
    const BYTES: usize = 1;

    #[inline]
    fn load(bytes: &[u8]) -> u32 {
        bytes[0] as u32
    }

    #[inline]
    fn store(bytes: &mut [u8], value: u32) {
        bytes[0] = value as u8;
    }
}

impl PixelWord for Bpp2 {
    const BYTES: usize = 2;

    #[inline]
    fn load(bytes: &[u8]) -> u32 {
        u16::from_ne_bytes([bytes[0], bytes[1]]) as u32
    }

    #[inline]
    fn store(bytes: &mut [u8], value: u32) {
        bytes[..2].copy_from_slice(&(value as u16).to_ne_bytes());
    }
}

impl PixelWord for Bpp3 {
    const BYTES: usize = 3;

    #[inline]
    fn load(bytes: &[u8]) -> u32 {
        if cfg!(target_endian = "little") {
            bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
        } else {
            (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
        }
    }

    #[inline]
    fn store(bytes: &mut [u8], value: u32) {
        if cfg!(target_endian = "little") {
            bytes[0] = value as u8;
            bytes[1] = (value >> 8) as u8;
            bytes[2] = (value >> 16) as u8;
        } else {
            bytes[0] = (value >> 16) as u8;
            bytes[1] = (value >> 8) as u8;
            bytes[2] = value as u8;
        }
    }
}

impl PixelWord for Bpp4 {
    const BYTES: usize = 4;

    #[inline]
    fn load(bytes: &[u8]) -> u32 {
        u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn store(bytes: &mut [u8], value: u32) {
        bytes[..4].copy_from_slice(&value.to_ne_bytes());
    }
}

/// Runtime-width pixel read, for code off the hot path.
pub fn load_pixel(bytes: &[u8], bytes_per_pixel: usize) -> u32 {
    match bytes_per_pixel {
        1 => Bpp1::load(bytes),
        2 => Bpp2::load(bytes),
        3 => Bpp3::load(bytes),
        _ => Bpp4::load(bytes),
    }
}

/// Runtime-width pixel write, for code off the hot path.
pub fn store_pixel(bytes: &mut [u8], bytes_per_pixel: usize, value: u32) {
    match bytes_per_pixel {
        1 => Bpp1::store(bytes, value),
        2 => Bpp2::store(bytes, value),
        3 => Bpp3::store(bytes, value),
        _ => Bpp4::store(bytes, value),
    }
}

/// Call `$func::<S, D>(args..)` with `S`/`D` the [`PixelWord`] types for
/// the given source and destination byte widths.
macro_rules! dispatch_widths {
    ($sbpp:expr, $dbpp:expr, $func:ident ( $($arg:expr),* )) => {
        match $sbpp {
            1 => dispatch_widths!(@dst $crate::video::pixels::Bpp1, $dbpp, $func($($arg),*)),
            2 => dispatch_widths!(@dst $crate::video::pixels::Bpp2, $dbpp, $func($($arg),*)),
            3 => dispatch_widths!(@dst $crate::video::pixels::Bpp3, $dbpp, $func($($arg),*)),
            _ => dispatch_widths!(@dst $crate::video::pixels::Bpp4, $dbpp, $func($($arg),*)),
        }
    };
    (@dst $s:ty, $dbpp:expr, $func:ident ( $($arg:expr),* )) => {
        match $dbpp {
            1 => $func::<$s, $crate::video::pixels::Bpp1>($($arg),*),
            2 => $func::<$s, $crate::video::pixels::Bpp2>($($arg),*),
            3 => $func::<$s, $crate::video::pixels::Bpp3>($($arg),*),
            _ => $func::<$s, $crate::video::pixels::Bpp4>($($arg),*),
        }
    };
}

pub(crate) use dispatch_widths;
