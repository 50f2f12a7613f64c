#![allow(clippy::result_large_err)]

pub mod argv;
pub mod cli;
pub mod config;
mod error;
pub mod git;
pub mod install;
pub mod new;
pub mod npm;
pub mod plugin;
pub mod ui;

pub use error::{Result, SkyuxError};

use crate::argv::ArgumentVector;
use crate::cli::Route;
use crate::plugin::PluginHost;
use crate::ui::{ConsoleLogger, Logger};

/// Parses the process arguments, runs the command and returns the exit code.
pub fn run() -> Result<i32> {
    let raw: Vec<String> = std::env::args().collect();
    let argv = ArgumentVector::parse(raw.iter().skip(1));

    let logger = ConsoleLogger::new(argv.is_verbose(), argv.color_enabled());
    let cwd = std::env::current_dir()?;
    let config = config::read_config(&config::config_path_auto(&cwd))?;

    let route = cli::route_args(&raw, &argv);
    let command = route.command_name();
    logger.info(&format!("SKY UX processing command {}", command));

    if let Route::Local(local) = &route {
        cli::run_local(local, &config, &cwd, &logger)?;
    }

    let host = PluginHost::from_config(&config.discovery, &cwd, &logger)?;
    let outcome = host.invoke(&command, &argv, route.is_local())?;
    Ok(outcome.exit_code)
}
