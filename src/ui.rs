use std::cell::RefCell;

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Verbose,
    Info,
    Warn,
    Error,
}

/// Destination for diagnostic output, passed explicitly to each component.
pub trait Logger {
    fn log(&self, level: Level, message: &str);

    fn verbose(&self, message: &str) {
        self.log(Level::Verbose, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn is_verbose(&self) -> bool {
        false
    }
}

/// Terminal logger. Verbose lines are dropped unless enabled.
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool, color: bool) -> Self {
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Verbose if self.verbose => println!("{}", style(message).dim()),
            Level::Verbose => {}
            Level::Info => info(message),
            Level::Warn => warn(message),
            Level::Error => error(message),
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Logger that keeps every line in memory.
#[derive(Default)]
pub struct MemoryLogger {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }

    pub fn count(&self, level: Level, message: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, m)| *l == level && m == message)
            .count()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }

    fn is_verbose(&self) -> bool {
        true
    }
}

pub fn heading(text: &str) {
    println!("{}", style(text).bold().underlined());
}

pub fn info(text: &str) {
    println!("{}", text);
}

pub fn warn(text: &str) {
    let _ = Term::stderr().write_line(&style(text).yellow().to_string());
}

pub fn error(text: &str) {
    let _ = Term::stderr().write_line(&style(text).red().to_string());
}

/// Two-column help row.
pub fn option_row(name: &str, description: &str) {
    println!("  {} {}", style(format!("{:<16}", name)).cyan(), description);
}

/// Spinner for one long-running step, finished as `<label> Done.` or
/// `<label> Failed.`. Hidden when stdout is not a terminal.
pub struct Step {
    bar: ProgressBar,
    label: String,
}

impl Step {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        let bar = if Term::stdout().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.clone());
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar, label }
    }

    pub fn done(self) {
        self.bar
            .finish_with_message(format!("{} {}", self.label, style("Done.").green()));
    }

    pub fn failed(self) {
        self.bar
            .finish_with_message(format!("{} {}", self.label, style("Failed.").red()));
    }

    /// Replaces the label with a final message.
    pub fn finish_with(self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}
