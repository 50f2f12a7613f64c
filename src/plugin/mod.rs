//! Plugin discovery and dispatch.
//!
//! A command runs through five stages:
//!
//! 1. [`ModuleLocator`] lists candidate packages across ordered search roots.
//! 2. A [`ModuleLoader`] loads each one; failures are recorded, never raised.
//! 3. [`CapabilityFilter`] drops broken, capability-less and duplicate plugins.
//! 4. [`dispatch`] runs the command once per remaining plugin.
//! 5. [`report`] logs the result and picks the exit code.

mod dispatch;
mod filter;
mod load;
mod locate;
mod report;

use std::path::Path;

pub use dispatch::{DispatchResult, dispatch};
pub use filter::{Admission, CapabilityFilter, RejectReason};
pub use load::{
    CommandHandler, LoadedPlugin, MANIFEST_FILE, ModuleLoader, NOT_HANDLED_EXIT_CODE,
    PackageLoader, PackageManifest, PluginModule, fallback_identity, read_manifest,
};
pub use locate::{
    DevDependencyStrategy, DiscoveryStrategy, GlobStrategy, ModuleLocator, PluginCandidate,
    default_search_roots,
};
pub use report::{Outcome, OutcomeKind, ProjectProbe, report};

use crate::argv::ArgumentVector;
use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::ui::Logger;

/// Runs the discovery and dispatch pipeline for one CLI invocation.
pub struct PluginHost<'a> {
    locator: ModuleLocator,
    loader: Box<dyn ModuleLoader>,
    probe: ProjectProbe,
    logger: &'a dyn Logger,
}

impl<'a> PluginHost<'a> {
    pub fn new(
        locator: ModuleLocator,
        loader: Box<dyn ModuleLoader>,
        probe: ProjectProbe,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            locator,
            loader,
            probe,
            logger,
        }
    }

    /// Host backed by npm packages on disk.
    pub fn from_config(
        config: &DiscoveryConfig,
        cwd: &Path,
        logger: &'a dyn Logger,
    ) -> Result<Self> {
        let executable = std::env::current_exe().ok();
        let locator = ModuleLocator::from_config(config, cwd, executable.as_deref())?;
        let loader = PackageLoader::new(cwd.join("node_modules"));
        Ok(Self::new(
            locator,
            Box::new(loader),
            ProjectProbe::new(cwd.to_path_buf()),
            logger,
        ))
    }

    pub fn invoke(&self, command: &str, argv: &ArgumentVector, is_local: bool) -> Result<Outcome> {
        let candidates = self.locator.locate(self.logger)?;

        let loaded: Vec<LoadedPlugin> = candidates
            .iter()
            .map(|candidate| self.loader.load(candidate))
            .collect();

        let mut filter = CapabilityFilter::new();
        let admitted: Vec<&LoadedPlugin> = loaded
            .iter()
            .filter(|plugin| filter.admit(plugin, self.logger) == Admission::Admitted)
            .collect();

        let results = match dispatch(&admitted, command, argv, self.logger) {
            Ok(results) => results,
            // Local commands are already answered; a plugin cannot fail them.
            Err(err) if is_local => {
                self.logger.warn(&err.to_string());
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        Ok(report(
            command,
            candidates.len(),
            &results,
            is_local,
            &self.probe,
            self.logger,
        ))
    }
}
