//! Software surface blitting: format conversion, alpha compositing and
//! nearest-neighbour stretching.

pub mod cli;
pub mod config;
pub mod cpuinfo;
pub mod error;
pub mod logging;
pub mod video;

pub use cli::Cli;
pub use config::Options;
pub use error::{clear_error, get_error, set_error, BlitError, LockError, SurfaceRole};
pub use logging::LogLevel;
