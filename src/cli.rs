use std::path::Path;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::argv::ArgumentVector;
use crate::config::SkyuxConfig;
use crate::error::Result;
use crate::install::run_install;
use crate::new::run_new;
use crate::ui::{self, Logger};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI argument parser definition.
#[derive(Parser, Debug)]
#[command(
    name = "skyux",
    about = "SKY UX command dispatcher",
    disable_help_flag = true,
    disable_help_subcommand = true,
    allow_external_subcommands = true
)]
pub struct Cli {
    #[arg(short = 'v', long = "version")]
    pub version: bool,
    #[arg(short = 'h', long = "help")]
    pub help: bool,
    #[arg(long = "verbose", global = true)]
    pub verbose: bool,
    #[arg(long = "logLevel", global = true)]
    pub log_level: Option<String>,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands the CLI knows about. Anything else is passed to plugins.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Initialize a new SKY UX application")]
    New(NewArgs),
    #[command(about = "Display help information")]
    Help,
    #[command(about = "Display the CLI version")]
    Version,
    #[command(about = "Remove node_modules and package-lock.json, then run npm install")]
    Install,
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Arguments for `skyux new`.
#[derive(Args, Clone, Debug, Default)]
pub struct NewArgs {
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,
    #[arg(short = 'r', long = "repo", conflicts_with = "no_repo")]
    pub repo: Option<String>,
    #[arg(long = "no-repo")]
    pub no_repo: bool,
    #[arg(short = 't', long = "template")]
    pub template: Option<String>,
}

/// Commands answered by the CLI itself.
#[derive(Debug, Clone)]
pub enum LocalCommand {
    Version,
    Help,
    New(NewArgs),
    Install,
}

#[derive(Debug, Clone)]
pub enum Route {
    Local(LocalCommand),
    PassThrough(String),
}

impl Route {
    /// Name forwarded to plugins.
    pub fn command_name(&self) -> String {
        match self {
            Route::Local(LocalCommand::Version) => "version".to_string(),
            Route::Local(LocalCommand::Help) => "help".to_string(),
            Route::Local(LocalCommand::New(_)) => "new".to_string(),
            Route::Local(LocalCommand::Install) => "install".to_string(),
            Route::PassThrough(command) => command.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Route::Local(_))
    }
}

/// Maps parsed arguments to a local or pass-through command. `-v` wins
/// over `-h`; no command at all means help.
pub fn route(cli: &Cli, argv: &ArgumentVector) -> Route {
    if cli.version || argv.is_set("v") {
        return Route::Local(LocalCommand::Version);
    }
    if cli.help || argv.is_set("h") {
        return Route::Local(LocalCommand::Help);
    }

    match &cli.command {
        None | Some(Command::Help) => Route::Local(LocalCommand::Help),
        Some(Command::Version) => Route::Local(LocalCommand::Version),
        Some(Command::Install) => Route::Local(LocalCommand::Install),
        Some(Command::New(args)) => Route::Local(LocalCommand::New(args.clone())),
        Some(Command::External(args)) => match args.first().filter(|c| !c.is_empty()) {
            Some(command) => Route::PassThrough(command.clone()),
            None => Route::Local(LocalCommand::Help),
        },
    }
}

/// Routes the full process arguments, program name included. Flags clap
/// does not know are left to the argument vector, which plugins read anyway.
pub fn route_args<I, T>(raw: I, argv: &ArgumentVector) -> Route
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(raw) {
        Ok(cli) => route(&cli, argv),
        Err(_) => route_argv(argv),
    }
}

fn route_argv(argv: &ArgumentVector) -> Route {
    if argv.is_set("v") || argv.is_set("version") {
        return Route::Local(LocalCommand::Version);
    }
    if argv.is_set("h") || argv.is_set("help") {
        return Route::Local(LocalCommand::Help);
    }

    match argv.command().as_deref() {
        None | Some("") | Some("help") => Route::Local(LocalCommand::Help),
        Some("version") => Route::Local(LocalCommand::Version),
        Some("install") => Route::Local(LocalCommand::Install),
        Some("new") => Route::Local(LocalCommand::New(NewArgs {
            name: string_flag(argv, &["name", "n"]),
            repo: string_flag(argv, &["repo", "r"]),
            no_repo: argv.get("repo") == Some(&Value::Bool(false)),
            template: string_flag(argv, &["template", "t"]),
        })),
        Some(command) => Route::PassThrough(command.to_string()),
    }
}

fn string_flag(argv: &ArgumentVector, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match argv.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Runs a command the CLI answers itself.
pub fn run_local(
    command: &LocalCommand,
    config: &SkyuxConfig,
    cwd: &Path,
    logger: &dyn Logger,
) -> Result<()> {
    match command {
        LocalCommand::Version => {
            log_version(logger);
            Ok(())
        }
        LocalCommand::Help => {
            print_help();
            Ok(())
        }
        LocalCommand::Install => run_install(cwd, logger),
        LocalCommand::New(args) => run_new(args, config, cwd, logger),
    }
}

pub fn log_version(logger: &dyn Logger) {
    logger.info(&format!("skyux-cli: {}", VERSION));
}

fn print_help() {
    ui::heading(&format!("SKY UX App Builder ({})", VERSION));
    ui::info("Usage: skyux [command] [options]\n");
    ui::heading("Arguments");
    ui::option_row("[command]", "The skyux command to execute.");
    ui::option_row("[options]", "Options to pass to the command.");
    println!();
    ui::heading("Common Commands");
    ui::option_row("new", "Initializes a new SKY UX application.");
    ui::option_row("help", "Displays this help information.");
    ui::option_row("version", "Displays the CLI version.");
    ui::option_row("install", "Reinstalls the project's dependencies.");
    ui::option_row("serve", "Serves the current SKY UX application.");
    ui::option_row("build", "Builds the current SKY UX application into dist/.");
    ui::option_row("test", "Runs both the unit and end-to-end tests.");
    ui::option_row("e2e", "Runs the end-to-end tests.");
    ui::option_row("watch", "Runs unit tests and watches file system for changes.");
    println!();
    ui::heading("Common Options");
    ui::option_row("--verbose", "Shows diagnostic output.");
    ui::option_row("--no-color", "Disables colored output.");
    ui::option_row("-l | --launch", "Which URL to launch during serve.");
    ui::option_row("", "One of host (default), local, or none.");
    ui::option_row("", "Ex: skyux serve --launch local");
}
