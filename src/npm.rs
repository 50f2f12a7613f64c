use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{Result, SkyuxError};
use crate::ui::Logger;

const REGISTRY_URL: &str = "https://registry.npmjs.org";

#[derive(Debug, Deserialize)]
struct RegistryPackage {
    version: String,
}

/// Runs `npm install`, optionally inside `path`.
pub fn npm_install(path: Option<&Path>, logger: &dyn Logger) -> Result<()> {
    logger.info("Running npm install");

    let mut command = Command::new(npm_program());
    command
        .arg("install")
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(path) = path {
        command.current_dir(path);
    }

    let status = command.status()?;
    if !status.success() {
        return Err(SkyuxError::Message("npm install failed.".to_string()));
    }
    Ok(())
}

/// Looks up the latest published version of a package.
pub fn latest_version(package: &str) -> Result<String> {
    let url = registry_url(package);
    let res = reqwest::blocking::get(url)?;
    if !res.status().is_success() {
        return Err(SkyuxError::Message(format!(
            "Unable to fetch the latest version of {}: {}",
            package,
            res.status()
        )));
    }
    let data: RegistryPackage = res.json()?;
    Ok(data.version)
}

/// Registry URL for the `latest` dist-tag; scoped names keep their `@`.
pub fn registry_url(package: &str) -> String {
    let encoded = match package.strip_prefix('@') {
        Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
        None => urlencoding::encode(package).to_string(),
    };
    format!("{}/{}/latest", REGISTRY_URL, encoded)
}

fn npm_program() -> &'static str {
    if cfg!(windows) { "npm.cmd" } else { "npm" }
}
