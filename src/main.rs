mod app;
mod cli;
mod config;
mod error;
mod logging;
mod progress;
mod stack;
mod util;

#[cfg(test)]
mod testing;

use cli::Cli;
use color_eyre::eyre::Result;
use config::ConfigManager;

/// Exit status used when the user interrupts the display.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse_args();

    let mut manager = match &cli.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    app::apply_overrides(manager.app_config_mut(), &cli);

    let log_guard = logging::init(
        &manager.log_file(),
        &manager.app_config().general.log_level,
    )?;

    match app::run(cli, manager).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_cancelled() => {
            eprintln!("Interrupted; the deployment itself keeps running.");
            drop(log_guard);
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(err) => Err(err.into()),
    }
}
