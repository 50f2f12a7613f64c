use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::argv::ArgumentVector;
use crate::error::{Result, SkyuxError};
use crate::plugin::locate::PluginCandidate;

pub const MANIFEST_FILE: &str = "package.json";

/// Exit status a process plugin uses to decline a command.
pub const NOT_HANDLED_EXIT_CODE: i32 = 3;

/// The command-handling capability a plugin may expose.
pub trait CommandHandler {
    /// Runs `command`. Returns `Ok(true)` when the plugin handled it.
    ///
    /// `PluginUnavailable` means the plugin never ran and is skipped; any
    /// other error is a fault raised by the plugin itself.
    fn run_command(&self, command: &str, argv: &ArgumentVector) -> Result<bool>;
}

/// A successfully loaded plugin package.
pub trait PluginModule {
    fn handler(&self) -> Option<&dyn CommandHandler>;
}

/// Turns candidates into loaded plugins without ever failing.
pub trait ModuleLoader {
    fn load(&self, candidate: &PluginCandidate) -> LoadedPlugin;
}

pub struct LoadedPlugin {
    pub identity: String,
    pub candidate: PluginCandidate,
    pub module: Option<Box<dyn PluginModule>>,
    pub load_error: Option<String>,
}

impl LoadedPlugin {
    pub fn loaded(
        candidate: PluginCandidate,
        identity: String,
        module: Box<dyn PluginModule>,
    ) -> Self {
        Self {
            identity,
            candidate,
            module: Some(module),
            load_error: None,
        }
    }

    pub fn failed(candidate: PluginCandidate, identity: String, error: String) -> Self {
        Self {
            identity,
            candidate,
            module: None,
            load_error: Some(error),
        }
    }

    pub fn handler(&self) -> Option<&dyn CommandHandler> {
        self.module.as_deref().and_then(|module| module.handler())
    }
}

/// The subset of `package.json` the CLI reads.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    #[serde(rename = "devDependencies", default)]
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,
    pub skyux: Option<SkyuxSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkyuxSection {
    #[serde(rename = "runCommand")]
    pub run_command: Option<String>,
}

pub fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Identity used when the manifest has no usable name.
pub fn fallback_identity(candidate: &PluginCandidate) -> String {
    match candidate {
        PluginCandidate::Manifest(path) => path
            .parent()
            .map(|dir| dir.to_string_lossy().to_string())
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| path.to_string_lossy().to_string()),
        PluginCandidate::Dependency(name) => name.clone(),
    }
}

/// Loads npm-style packages whose manifest declares an executable entry point.
pub struct PackageLoader {
    module_root: PathBuf,
}

impl PackageLoader {
    /// `module_root` resolves dependency candidates, usually `<cwd>/node_modules`.
    pub fn new(module_root: PathBuf) -> Self {
        Self { module_root }
    }

    fn manifest_path(&self, candidate: &PluginCandidate) -> PathBuf {
        match candidate {
            PluginCandidate::Manifest(path) => path.clone(),
            PluginCandidate::Dependency(name) => self.module_root.join(name).join(MANIFEST_FILE),
        }
    }
}

impl ModuleLoader for PackageLoader {
    fn load(&self, candidate: &PluginCandidate) -> LoadedPlugin {
        let manifest_path = self.manifest_path(candidate);
        let manifest = match read_manifest(&manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                return LoadedPlugin::failed(
                    candidate.clone(),
                    fallback_identity(candidate),
                    err.to_string(),
                );
            }
        };

        let identity = manifest
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback_identity(candidate));
        let package_dir = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let entry = manifest.skyux.and_then(|section| section.run_command);
        let Some(entry) = entry else {
            return LoadedPlugin::loaded(
                candidate.clone(),
                identity,
                Box::new(PackageModule { handler: None }),
            );
        };

        let executable = package_dir.join(&entry);
        if !executable.is_file() {
            return LoadedPlugin::failed(
                candidate.clone(),
                identity,
                format!("runCommand entry point not found: {}", executable.display()),
            );
        }
        if !is_executable(&executable) {
            return LoadedPlugin::failed(
                candidate.clone(),
                identity,
                format!(
                    "runCommand entry point is not executable: {}",
                    executable.display()
                ),
            );
        }

        let handler = ProcessHandler {
            identity: identity.clone(),
            executable,
        };
        LoadedPlugin::loaded(
            candidate.clone(),
            identity,
            Box::new(PackageModule {
                handler: Some(handler),
            }),
        )
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

struct PackageModule {
    handler: Option<ProcessHandler>,
}

impl PluginModule for PackageModule {
    fn handler(&self) -> Option<&dyn CommandHandler> {
        self.handler.as_ref().map(|h| h as &dyn CommandHandler)
    }
}

/// Runs a plugin executable as `<executable> <command> <argv json>`.
struct ProcessHandler {
    identity: String,
    executable: PathBuf,
}

impl ProcessHandler {
    fn fault(&self, reason: String) -> SkyuxError {
        SkyuxError::PluginFault {
            identity: self.identity.clone(),
            reason,
        }
    }
}

impl CommandHandler for ProcessHandler {
    fn run_command(&self, command: &str, argv: &ArgumentVector) -> Result<bool> {
        let argv_json = serde_json::to_string(&argv.to_json())?;
        let status = Command::new(&self.executable)
            .arg(command)
            .arg(&argv_json)
            .env("SKYUX_COMMAND", command)
            .env("SKYUX_ARGV", &argv_json)
            .status()
            .map_err(|err| SkyuxError::PluginUnavailable {
                identity: self.identity.clone(),
                reason: err.to_string(),
            })?;

        match status.code() {
            Some(0) => Ok(true),
            Some(NOT_HANDLED_EXIT_CODE) => Ok(false),
            Some(code) => Err(self.fault(format!("exited with status {}", code))),
            None => Err(self.fault("terminated by signal".to_string())),
        }
    }
}
