use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SkyuxError};

const CONFIG_DIR: &str = "skyux";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = ".skyux.toml";

pub const DEFAULT_TEMPLATE_URL: &str = "https://github.com/blackbaud/skyux-template";
pub const DEFAULT_DEPENDENCY_PATTERN: &str = "(.*)-sky-pages-out-(.*)";

/// Persistent CLI configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SkyuxConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

/// How plugin candidates are discovered.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Glob,
    DevDependencies,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    #[serde(default = "default_dependency_pattern")]
    pub dependency_pattern: String,
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            patterns: default_patterns(),
            dependency_pattern: default_dependency_pattern(),
            roots: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateConfig {
    #[serde(default = "default_template_url")]
    pub base_url: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            base_url: default_template_url(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec![
        "*/skyux-builder*/package.json".to_string(),
        "@skyux-sdk/builder*/package.json".to_string(),
    ]
}

fn default_dependency_pattern() -> String {
    DEFAULT_DEPENDENCY_PATTERN.to_string()
}

fn default_template_url() -> String {
    DEFAULT_TEMPLATE_URL.to_string()
}

/// Returns the local config path, or the global one when `global` is set.
pub fn config_path(cwd: &Path, global: bool) -> PathBuf {
    if global {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"));
        return config_home.join(CONFIG_DIR).join(CONFIG_FILE);
    }
    cwd.join(LOCAL_CONFIG_FILE)
}

/// Uses the local config if present, otherwise falls back to global.
pub fn config_path_auto(cwd: &Path) -> PathBuf {
    let local = config_path(cwd, false);
    if local.exists() {
        return local;
    }
    config_path(cwd, true)
}

/// Reads config from disk, returning defaults if missing.
pub fn read_config(path: &Path) -> Result<SkyuxConfig> {
    if !path.exists() {
        return Ok(SkyuxConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<SkyuxConfig> {
    toml::from_str(content).map_err(|err| SkyuxError::Message(err.to_string()))
}
