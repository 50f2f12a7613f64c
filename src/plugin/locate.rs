//! Candidate discovery.
//!
//! A [`ModuleLocator`] walks its search roots in priority order and asks a
//! [`DiscoveryStrategy`] for candidates. Root order decides which copy of a
//! duplicated package wins later on.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::{DiscoveryConfig, StrategyKind};
use crate::error::Result;
use crate::plugin::load::{MANIFEST_FILE, read_manifest};
use crate::ui::Logger;

/// A location that might hold a plugin, before it is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginCandidate {
    /// Path to a package manifest found on disk.
    Manifest(PathBuf),
    /// Dependency name declared by the host project.
    Dependency(String),
}

impl fmt::Display for PluginCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginCandidate::Manifest(path) => write!(f, "{}", path.display()),
            PluginCandidate::Dependency(name) => write!(f, "{}", name),
        }
    }
}

/// Naming convention used to find candidates.
pub trait DiscoveryStrategy {
    fn locate(&self, roots: &[PathBuf], logger: &dyn Logger) -> Result<Vec<PluginCandidate>>;
}

/// Expands glob patterns beneath every root.
pub struct GlobStrategy {
    patterns: Vec<String>,
}

impl GlobStrategy {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl DiscoveryStrategy for GlobStrategy {
    fn locate(&self, roots: &[PathBuf], logger: &dyn Logger) -> Result<Vec<PluginCandidate>> {
        let mut candidates = Vec::new();

        for root in roots {
            let escaped = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));
            let patterns: Vec<String> = self
                .patterns
                .iter()
                .map(|p| escaped.join(p).to_string_lossy().to_string())
                .collect();

            logger.verbose(&format!(
                "Looking for modules in {}.",
                patterns.join(" and ")
            ));

            for pattern in &patterns {
                for path in glob::glob(pattern)?.filter_map(|e| e.ok()) {
                    candidates.push(PluginCandidate::Manifest(path));
                }
            }
        }

        Ok(candidates)
    }
}

/// Matches the host manifest's `devDependencies` names against a pattern.
pub struct DevDependencyStrategy {
    manifest_path: PathBuf,
    pattern: Regex,
}

impl DevDependencyStrategy {
    pub fn new(manifest_path: PathBuf, pattern: &str) -> Result<Self> {
        Ok(Self {
            manifest_path,
            pattern: Regex::new(pattern)?,
        })
    }
}

impl DiscoveryStrategy for DevDependencyStrategy {
    fn locate(&self, _roots: &[PathBuf], logger: &dyn Logger) -> Result<Vec<PluginCandidate>> {
        if !self.manifest_path.is_file() {
            return Ok(Vec::new());
        }

        logger.verbose(&format!(
            "Looking for modules in devDependencies of {}.",
            self.manifest_path.display()
        ));

        let manifest = match read_manifest(&self.manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                logger.warn(&format!(
                    "Unable to read {}: {}",
                    self.manifest_path.display(),
                    err
                ));
                return Ok(Vec::new());
            }
        };

        Ok(manifest
            .dev_dependencies
            .keys()
            .filter(|name| self.pattern.is_match(name))
            .map(|name| PluginCandidate::Dependency(name.clone()))
            .collect())
    }
}

/// Enumerates plugin candidates across ordered search roots.
pub struct ModuleLocator {
    roots: Vec<PathBuf>,
    strategy: Box<dyn DiscoveryStrategy>,
}

impl ModuleLocator {
    pub fn new(roots: Vec<PathBuf>, strategy: Box<dyn DiscoveryStrategy>) -> Self {
        Self { roots, strategy }
    }

    /// Builds the locator described by config for a project directory.
    pub fn from_config(
        config: &DiscoveryConfig,
        cwd: &Path,
        executable: Option<&Path>,
    ) -> Result<Self> {
        let mut roots = default_search_roots(cwd, executable);
        roots.extend(config.roots.iter().map(|root| cwd.join(root)));

        let strategy: Box<dyn DiscoveryStrategy> = match config.strategy {
            StrategyKind::Glob => Box::new(GlobStrategy::new(config.patterns.clone())),
            StrategyKind::DevDependencies => Box::new(DevDependencyStrategy::new(
                cwd.join(MANIFEST_FILE),
                &config.dependency_pattern,
            )?),
        };

        Ok(Self::new(roots, strategy))
    }

    pub fn locate(&self, logger: &dyn Logger) -> Result<Vec<PluginCandidate>> {
        self.strategy.locate(&self.roots, logger)
    }
}

/// Project `node_modules` first, then the directories around the CLI's own
/// package (its scope or `node_modules` folder, and the one above it).
pub fn default_search_roots(cwd: &Path, executable: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = vec![cwd.join("node_modules")];

    if let Some(executable) = executable {
        let executable =
            std::fs::canonicalize(executable).unwrap_or_else(|_| executable.to_path_buf());
        // <root>/<package>/bin/<executable>
        roots.extend(executable.ancestors().skip(3).take(2).map(Path::to_path_buf));
    }

    roots
}
