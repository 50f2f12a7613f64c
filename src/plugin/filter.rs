use std::collections::HashSet;

use crate::plugin::load::LoadedPlugin;
use crate::ui::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    LoadFailed,
    NoCapability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(RejectReason),
    Duplicate,
}

/// Decides which loaded plugins get the command. Holds the identities
/// already admitted during one invocation.
#[derive(Debug, Default)]
pub struct CapabilityFilter {
    dispatched: HashSet<String>,
}

impl CapabilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, plugin: &LoadedPlugin, logger: &dyn Logger) -> Admission {
        if self.dispatched.contains(&plugin.identity) {
            logger.verbose(&format!(
                "Multiple instances found. Skipping passing command to {}",
                plugin.identity
            ));
            return Admission::Duplicate;
        }

        if plugin.module.is_none() {
            logger.verbose(&format!("Error loading module: {}", plugin.candidate));
            if let Some(err) = &plugin.load_error {
                logger.verbose(err);
            }
            return Admission::Rejected(RejectReason::LoadFailed);
        }

        if plugin.handler().is_none() {
            logger.warn(&format!(
                "Module {} does not expose a runCommand entry point.",
                plugin.identity
            ));
            return Admission::Rejected(RejectReason::NoCapability);
        }

        // Recorded before the plugin runs so a re-entrant lookup sees it.
        self.dispatched.insert(plugin.identity.clone());
        Admission::Admitted
    }
}
