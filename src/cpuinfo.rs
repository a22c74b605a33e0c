//! CPU capability probe consulted by the blit dispatcher.
//!
//! Only the two features the blitters care about are reported. The probe
//! result can be overridden at runtime (see [`set_accel`]), mirroring the
//! `--accel` switch of the command line.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;

/// Capability queries the dispatcher needs.
pub trait CpuFeatures {
    fn has_neon(&self) -> bool;
    fn has_arm_simd(&self) -> bool;

    /// True if any wide-lane kernel variant may be selected.
    fn has_wide_lanes(&self) -> bool {
        self.has_neon() || self.has_arm_simd()
    }
}

/// A snapshot of CPU capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    pub neon: bool,
    pub arm_simd: bool,
}

impl Capabilities {
    /// No SIMD capabilities at all.
    pub const fn none() -> Self {
        Self {
            neon: false,
            arm_simd: false,
        }
    }

    /// Probe the host CPU.
    pub fn detect() -> Self {
        Self {
            neon: detect_neon(),
            arm_simd: detect_arm_simd(),
        }
    }
}

impl CpuFeatures for Capabilities {
    fn has_neon(&self) -> bool {
        self.neon
    }

    fn has_arm_simd(&self) -> bool {
        self.arm_simd
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_neon() -> bool {
    // ARMv8 always has NEON.
    true
}

#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn detect_neon() -> bool {
    const HWCAP_NEON: libc::c_ulong = 1 << 12;
    // SAFETY: getauxval only reads the process auxiliary vector.
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
    hwcap & HWCAP_NEON == HWCAP_NEON
}

#[cfg(not(any(target_arch = "aarch64", all(target_arch = "arm", target_os = "linux"))))]
fn detect_neon() -> bool {
    false
}

#[cfg(target_arch = "aarch64")]
fn detect_arm_simd() -> bool {
    true
}

#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn detect_arm_simd() -> bool {
    if cfg!(target_feature = "v6") {
        return true;
    }
    // SAFETY: AT_PLATFORM points at a NUL-terminated string owned by the
    // process for its whole lifetime, or is zero.
    unsafe {
        let plat = libc::getauxval(libc::AT_PLATFORM) as *const libc::c_char;
        if plat.is_null() {
            return false;
        }
        let plat = std::ffi::CStr::from_ptr(plat).to_bytes();
        plat.starts_with(b"v6l") || plat.starts_with(b"v7l")
    }
}

#[cfg(not(any(target_arch = "aarch64", all(target_arch = "arm", target_os = "linux"))))]
fn detect_arm_simd() -> bool {
    false
}

/// Acceleration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accel {
    /// Use whatever the host reports.
    #[default]
    Detect,
    /// Pretend no SIMD is present.
    None,
    /// Force NEON on (and ARM SIMD off).
    Neon,
    /// Force ARM SIMD on (and NEON off).
    ArmSimd,
}

impl Accel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "detect" | "auto" => Some(Accel::Detect),
            "none" | "off" => Some(Accel::None),
            "neon" => Some(Accel::Neon),
            "armsimd" | "arm-simd" | "simd" => Some(Accel::ArmSimd),
            _ => None,
        }
    }

    /// Resolve the policy against the host.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Accel::Detect => host_detected(),
            Accel::None => Capabilities::none(),
            Accel::Neon => Capabilities {
                neon: true,
                arm_simd: false,
            },
            Accel::ArmSimd => Capabilities {
                neon: false,
                arm_simd: true,
            },
        }
    }
}

impl fmt::Display for Accel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accel::Detect => "detect",
            Accel::None => "none",
            Accel::Neon => "neon",
            Accel::ArmSimd => "armsimd",
        };
        f.write_str(name)
    }
}

fn host_detected() -> Capabilities {
    static HOST: OnceLock<Capabilities> = OnceLock::new();
    *HOST.get_or_init(|| {
        let caps = Capabilities::detect();
        log::debug!("cpuinfo: detected {:?}", caps);
        caps
    })
}

static ACCEL: RwLock<Accel> = parking_lot::const_rwlock(Accel::Detect);

/// Set the process-wide acceleration policy.
pub fn set_accel(accel: Accel) {
    *ACCEL.write() = accel;
}

pub fn accel() -> Accel {
    *ACCEL.read()
}

/// Capabilities in effect under the current policy.
pub fn current() -> Capabilities {
    accel().capabilities()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_none_reports_nothing() {
        let caps = Capabilities::none();
        assert!(!caps.has_neon());
        assert!(!caps.has_arm_simd());
        assert!(!caps.has_wide_lanes());
    }

    #[test]
    fn test_forced_policies() {
        assert_eq!(
            Accel::Neon.capabilities(),
            Capabilities {
                neon: true,
                arm_simd: false
            }
        );
        assert!(Accel::ArmSimd.capabilities().has_wide_lanes());
        assert_eq!(Accel::None.capabilities(), Capabilities::none());
    }

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(Accel::Detect.capabilities(), Accel::Detect.capabilities());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_has_no_arm_features() {
        assert_eq!(Capabilities::detect(), Capabilities::none());
    }

    #[test]
    fn test_accel_names() {
        assert_eq!(Accel::from_name("detect"), Some(Accel::Detect));
        assert_eq!(Accel::from_name("NONE"), Some(Accel::None));
        assert_eq!(Accel::from_name("neon"), Some(Accel::Neon));
        assert_eq!(Accel::from_name("armsimd"), Some(Accel::ArmSimd));
        assert_eq!(Accel::from_name("mmx"), None);
        assert_eq!(Accel::ArmSimd.to_string(), "armsimd");
    }

    #[test]
    #[serial]
    fn test_set_accel_changes_current() {
        set_accel(Accel::Neon);
        assert!(current().has_neon());
        set_accel(Accel::None);
        assert!(!current().has_wide_lanes());
        set_accel(Accel::Detect);
        assert_eq!(accel(), Accel::Detect);
    }
}
