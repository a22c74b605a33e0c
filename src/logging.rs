//! Logging setup.
//!
//! Library code logs through the `log` facade. Binaries call [`init`] to
//! install an `env_logger` backend whose verbosity follows [`LogLevel`].

use log::LevelFilter;

/// Verbosity names accepted by `--log-level` and `SDLITE_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Nothing,
    User,
    Error,
    #[default]
    Warning,
    Info,
    Debug,
    All,
}

impl LogLevel {
    /// Parse a level name ("warning", "debug", ...), ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nothing" | "off" | "none" => Some(LogLevel::Nothing),
            "user" => Some(LogLevel::User),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "all" | "trace" => Some(LogLevel::All),
            _ => None,
        }
    }

    /// The `log` filter this level corresponds to.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            // User-facing fatal messages go out at error level.
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

/// Install the stderr logger and set the maximum level.
///
/// Only the first call installs a logger; later calls (or a logger set up
/// by someone else) return `false` and just move the global max level,
/// which can quieten output but not exceed the installed filter.
pub fn init(level: LogLevel) -> bool {
    let filter = level.to_level_filter();
    let installed = env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .format_target(true)
        .try_init()
        .is_ok();
    log::set_max_level(filter);
    installed
}
