use anyhow::{Context, Result};

use crate::cpuinfo::{self, Accel};
use crate::logging::{self, LogLevel};
use crate::video::blit::{kernel_cache, DEFAULT_KERNEL_CACHE_CAPACITY};
use crate::video::pixels::PixelFormat;
use crate::video::rect::Rect;

/// Environment variable overriding the acceleration policy
pub const ENV_ACCEL: &str = "SDLITE_ACCEL";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "SDLITE_LOG_LEVEL";
/// Environment variable overriding the kernel cache capacity
pub const ENV_KERNEL_CACHE: &str = "SDLITE_KERNEL_CACHE";

/// Named pixel formats understood by [`parse_pixel_format`].
pub const PIXEL_FORMAT_NAMES: &[&str] = &[
    "rgb565", "rgb555", "rgb888", "xrgb8888", "argb8888", "abgr8888", "rgba8888", "indexed8",
];

/// Process-wide settings, from the environment and the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub accel: Accel,
    pub log_level: LogLevel,
    pub kernel_cache_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            accel: Accel::Detect,
            log_level: LogLevel::Warning,
            kernel_cache_capacity: DEFAULT_KERNEL_CACHE_CAPACITY,
        }
    }
}

impl Options {
    /// Defaults overridden by whichever `SDLITE_*` variables are set.
    pub fn from_env() -> Result<Self> {
        let mut opts = Self::default();
        if let Ok(value) = std::env::var(ENV_ACCEL) {
            opts.accel = parse_accel(&value).with_context(|| format!("Invalid {}", ENV_ACCEL))?;
        }
        if let Ok(value) = std::env::var(ENV_LOG_LEVEL) {
            opts.log_level =
                parse_log_level(&value).with_context(|| format!("Invalid {}", ENV_LOG_LEVEL))?;
        }
        if let Ok(value) = std::env::var(ENV_KERNEL_CACHE) {
            opts.kernel_cache_capacity = parse_capacity(&value)
                .with_context(|| format!("Invalid {}", ENV_KERNEL_CACHE))?;
        }
        Ok(opts)
    }

    /// Push the settings into logging, the capability probe and the
    /// kernel cache.
    pub fn apply(&self) {
        logging::init(self.log_level);
        cpuinfo::set_accel(self.accel);
        kernel_cache().set_capacity(self.kernel_cache_capacity);
        log::debug!(
            "config: accel={} log_level={:?} kernel_cache={}",
            self.accel,
            self.log_level,
            self.kernel_cache_capacity
        );
    }
}

/// Parse an acceleration policy name (detect, none, neon, armsimd)
pub fn parse_accel(s: &str) -> Result<Accel> {
    match Accel::from_name(s) {
        Some(accel) => Ok(accel),
        None => anyhow::bail!(
            "Invalid acceleration mode: {}. Valid options: detect, none, neon, armsimd",
            s
        ),
    }
}

/// Parse a log level name
pub fn parse_log_level(s: &str) -> Result<LogLevel> {
    match LogLevel::from_name(s) {
        Some(level) => Ok(level),
        None => anyhow::bail!(
            "Invalid log level: {}. Valid options: nothing, user, error, warning, info, debug, all",
            s
        ),
    }
}

/// Parse a kernel cache capacity
pub fn parse_capacity(s: &str) -> Result<usize> {
    let capacity: usize = s.trim().parse().context("Invalid capacity value")?;
    if capacity == 0 {
        anyhow::bail!("Capacity must be positive");
    }
    Ok(capacity)
}

/// Parse an output size relative to `base`, the size being resized.
///
/// Accepts `WxH`, one edge with the other left blank to keep the aspect
/// of `base` (`320x`, `x240`), or a percentage of `base` (`50%`).
pub fn parse_size(s: &str, base: (u32, u32)) -> Result<(u32, u32)> {
    let s = s.trim();
    let (base_w, base_h) = base;
    let size = if let Some(percent) = s.strip_suffix('%') {
        let percent = pixel_count(percent)?;
        (scale(base_w, percent, 100), scale(base_h, percent, 100))
    } else {
        let (w, h) = s
            .split_once('x')
            .with_context(|| format!("Expected WxH, Wx, xH or N%, got {:?}", s))?;
        match (w.trim(), h.trim()) {
            ("", "") => anyhow::bail!("Size {:?} names neither edge", s),
            (w, "") => {
                let w = pixel_count(w)?;
                (w, scale(base_h, w, base_w))
            }
            ("", h) => {
                let h = pixel_count(h)?;
                (scale(base_w, h, base_h), h)
            }
            (w, h) => (pixel_count(w)?, pixel_count(h)?),
        }
    };
    if size.0 == 0 || size.1 == 0 {
        anyhow::bail!("Size {:?} of {}x{} gives an empty surface", s, base_w, base_h);
    }
    Ok(size)
}

fn pixel_count(s: &str) -> Result<u32> {
    s.trim()
        .parse()
        .with_context(|| format!("{:?} is not a pixel count", s))
}

/// `value * num / den`, saturating; zero when `den` is zero.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return 0;
    }
    u32::try_from(value as u64 * num as u64 / den as u64).unwrap_or(u32::MAX)
}

/// Parse a point in the format "X,Y"
pub fn parse_point(s: &str) -> Result<(i32, i32)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        anyhow::bail!("Point must be in X,Y format");
    }
    let x = parts[0].parse().context("Invalid x value")?;
    let y = parts[1].parse().context("Invalid y value")?;
    Ok((x, y))
}

/// Parse a rectangle in the format "X,Y,W,H"
pub fn parse_rect(s: &str) -> Result<Rect> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        anyhow::bail!("Rectangle must be in X,Y,W,H format");
    }
    let x = parts[0].parse().context("Invalid x value")?;
    let y = parts[1].parse().context("Invalid y value")?;
    let w = parts[2].parse().context("Invalid width value")?;
    let h = parts[3].parse().context("Invalid height value")?;
    Ok(Rect::new(x, y, w, h))
}

/// Parse a per-surface alpha value (0-255)
pub fn parse_alpha(s: &str) -> Result<u8> {
    let alpha: i64 = s.trim().parse().context("Invalid alpha value")?;
    if !(0..=255).contains(&alpha) {
        anyhow::bail!("Alpha value out of range (0 to 255)");
    }
    Ok(alpha as u8)
}

/// Parse a colorkey given as hex RRGGBB (optionally prefixed by `#` or `0x`)
pub fn parse_color_key(s: &str) -> Result<(u8, u8, u8)> {
    let s = s.trim();
    let hex = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .unwrap_or(s);
    if hex.len() != 6 {
        anyhow::bail!("Colorkey must be six hex digits (RRGGBB)");
    }
    let rgb = u32::from_str_radix(hex, 16).context("Invalid colorkey value")?;
    Ok(((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

/// Parse a named pixel format (see [`PIXEL_FORMAT_NAMES`])
pub fn parse_pixel_format(s: &str) -> Result<PixelFormat> {
    let format = match s.trim().to_ascii_lowercase().as_str() {
        "rgb565" | "565" => PixelFormat::rgb565(),
        "rgb555" | "555" => PixelFormat::rgb555(),
        "rgb888" | "rgb24" => PixelFormat::rgb888(),
        "xrgb8888" | "rgb32" => PixelFormat::xrgb8888(),
        "argb8888" => PixelFormat::argb8888(),
        "abgr8888" => PixelFormat::abgr8888(),
        "rgba8888" => PixelFormat::rgba8888(),
        "indexed8" | "8bit" => PixelFormat::indexed8(),
        _ => anyhow::bail!(
            "Invalid pixel format: {}. Valid options: {}",
            s,
            PIXEL_FORMAT_NAMES.join(", ")
        ),
    };
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_size_absolute() {
        assert_eq!(parse_size("640x480", (10, 10)).unwrap(), (640, 480));
        assert_eq!(parse_size(" 3 x 7 ", (0, 0)).unwrap(), (3, 7));
    }

    #[test]
    fn test_parse_size_keeps_aspect() {
        assert_eq!(parse_size("320x", (640, 480)).unwrap(), (320, 240));
        assert_eq!(parse_size("x60", (640, 480)).unwrap(), (80, 60));
        assert_eq!(parse_size("50%", (640, 481)).unwrap(), (320, 240));
        assert_eq!(parse_size("300%", (2, 1)).unwrap(), (6, 3));
    }

    #[test]
    fn test_parse_size_rejects_empty_results() {
        assert!(parse_size("640-480", (1, 1)).is_err());
        assert!(parse_size("x", (1, 1)).is_err());
        assert!(parse_size("0x480", (1, 1)).is_err());
        assert!(parse_size("1%", (10, 10)).is_err());
        assert!(parse_size("4x", (0, 0)).is_err());
        assert!(parse_size("abcxdef", (1, 1)).is_err());
    }

    #[test]
    fn test_parse_point_and_rect() {
        assert_eq!(parse_point("-3, 7").unwrap(), (-3, 7));
        assert!(parse_point("3").is_err());
        assert_eq!(parse_rect("1,2,3,4").unwrap(), Rect::new(1, 2, 3, 4));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,-3,4").is_err());
    }

    #[test]
    fn test_parse_alpha() {
        assert_eq!(parse_alpha("0").unwrap(), 0);
        assert_eq!(parse_alpha("255").unwrap(), 255);
        assert!(parse_alpha("256").is_err());
        assert!(parse_alpha("-1").is_err());
        assert!(parse_alpha("half").is_err());
    }

    #[test]
    fn test_parse_color_key() {
        assert_eq!(parse_color_key("ff00ff").unwrap(), (255, 0, 255));
        assert_eq!(parse_color_key("#102030").unwrap(), (0x10, 0x20, 0x30));
        assert_eq!(parse_color_key("0x0000FF").unwrap(), (0, 0, 255));
        assert!(parse_color_key("fff").is_err());
        assert!(parse_color_key("gggggg").is_err());
    }

    #[test]
    fn test_parse_pixel_format() {
        for name in PIXEL_FORMAT_NAMES {
            assert!(parse_pixel_format(name).is_ok(), "{}", name);
        }
        assert_eq!(parse_pixel_format("RGB565").unwrap(), PixelFormat::rgb565());
        assert!(parse_pixel_format("yuv420").is_err());
    }

    #[test]
    fn test_parse_accel_and_level() {
        assert_eq!(parse_accel("NEON").unwrap(), Accel::Neon);
        assert!(parse_accel("mmx").is_err());
        assert_eq!(parse_log_level("debug").unwrap(), LogLevel::Debug);
        assert_eq!(parse_log_level("Error").unwrap(), LogLevel::Error);
        assert!(parse_log_level("2").is_err());
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity("16").unwrap(), 16);
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("many").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(ENV_ACCEL, "none");
        std::env::set_var(ENV_LOG_LEVEL, "info");
        std::env::set_var(ENV_KERNEL_CACHE, "8");
        let opts = Options::from_env().unwrap();
        std::env::remove_var(ENV_ACCEL);
        std::env::remove_var(ENV_LOG_LEVEL);
        std::env::remove_var(ENV_KERNEL_CACHE);

        assert_eq!(
            opts,
            Options {
                accel: Accel::None,
                log_level: LogLevel::Info,
                kernel_cache_capacity: 8,
            }
        );
        assert_eq!(Options::from_env().unwrap(), Options::default());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        std::env::set_var(ENV_KERNEL_CACHE, "lots");
        let err = Options::from_env().unwrap_err();
        std::env::remove_var(ENV_KERNEL_CACHE);
        assert!(err.to_string().contains(ENV_KERNEL_CACHE));
    }

    #[test]
    #[serial]
    fn test_apply() {
        let opts = Options {
            accel: Accel::Neon,
            log_level: LogLevel::Warning,
            kernel_cache_capacity: 5,
        };
        opts.apply();
        assert_eq!(cpuinfo::accel(), Accel::Neon);
        assert_eq!(kernel_cache().capacity(), 5);

        Options::default().apply();
        assert_eq!(cpuinfo::accel(), Accel::Detect);
        assert_eq!(kernel_cache().capacity(), DEFAULT_KERNEL_CACHE_CAPACITY);
    }
}
