use anyhow::{Context, Result};
use clap::Parser;

use sdlite::cli::Cli;
use sdlite::config::Options;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Environment first, command line overrides
    let options = Options::from_env().context("Failed to read configuration from environment")?;
    let options = cli.merge_into_options(options)?;
    options.apply();

    log::info!(
        "sdlite-blit {} (accel: {}, capabilities: {:?})",
        env!("CARGO_PKG_VERSION"),
        options.accel,
        sdlite::cpuinfo::current()
    );

    cli.run()
}
