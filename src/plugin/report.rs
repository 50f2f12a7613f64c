use std::path::PathBuf;

use crate::plugin::dispatch::DispatchResult;
use crate::ui::Logger;

const SPA_DIR_MARKER: &str = "skyux-spa";
const INSTALL_MARKER_DIR: &str = "node_modules";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Answered,
    NoModulesFound,
    NoModuleAnswered,
    /// Handled by the CLI itself; plugin results do not matter.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    pub kind: OutcomeKind,
    pub answered: Vec<String>,
}

/// Environment checks used to explain an empty discovery.
#[derive(Debug, Clone)]
pub struct ProjectProbe {
    cwd: PathBuf,
}

impl ProjectProbe {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }

    pub fn hints(&self) -> Vec<&'static str> {
        if !self.cwd.to_string_lossy().contains(SPA_DIR_MARKER) {
            return vec!["Are you in a SKY UX SPA directory?"];
        }
        if !self.cwd.join(INSTALL_MARKER_DIR).exists() {
            return vec!["Have you ran 'npm install'?"];
        }
        Vec::new()
    }
}

pub fn report(
    command: &str,
    located: usize,
    results: &[DispatchResult],
    is_local: bool,
    probe: &ProjectProbe,
    logger: &dyn Logger,
) -> Outcome {
    let answered: Vec<String> = results
        .iter()
        .filter(|r| r.answered)
        .map(|r| r.identity.clone())
        .collect();

    if answered.is_empty() {
        if is_local {
            return Outcome {
                exit_code: 0,
                kind: OutcomeKind::Local,
                answered,
            };
        }

        if located == 0 {
            logger.error(&format!("No modules found for {}", command));
            for hint in probe.hints() {
                logger.error(hint);
            }
            return Outcome {
                exit_code: 1,
                kind: OutcomeKind::NoModulesFound,
                answered,
            };
        }

        logger.error(&format!("No module answered {}", command));
        return Outcome {
            exit_code: 1,
            kind: OutcomeKind::NoModuleAnswered,
            answered,
        };
    }

    let noun = if answered.len() == 1 { "module" } else { "modules" };
    logger.verbose(&format!(
        "Successfully passed {} to {} {}:",
        command,
        answered.len(),
        noun
    ));
    logger.verbose(&answered.join(", "));

    Outcome {
        exit_code: 0,
        kind: if is_local {
            OutcomeKind::Local
        } else {
            OutcomeKind::Answered
        },
        answered,
    }
}
