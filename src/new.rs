//! `skyux new`: scaffold a project from a template repository.

use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use serde_json::{Map, Value, json};
use walkdir::WalkDir;

use crate::cli::NewArgs;
use crate::config::SkyuxConfig;
use crate::error::{Result, SkyuxError};
use crate::git::{checkout_new_branch, clone_repo, is_repo_empty};
use crate::npm::{latest_version, npm_install};
use crate::plugin::MANIFEST_FILE;
use crate::ui::{self, Logger};

const SKYUX_PACKAGE: &str = "@blackbaud/skyux";
const BUILDER_PACKAGE: &str = "@blackbaud/skyux-builder";
const INITIAL_BRANCH: &str = "initial-commit";
const DEFAULT_TEMPLATE: &str = "default";
const LIBRARY_TEMPLATE: &str = "library";

/// Template repository to scaffold from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub url: String,
}

impl Template {
    /// A value containing `:` is a URL; any other value names a template
    /// repository next to the base one.
    pub fn from_arg(arg: Option<&str>, base_url: &str) -> Self {
        match arg.filter(|t| !t.is_empty()) {
            Some(template) if template.contains(':') => Self {
                name: template.to_string(),
                url: template.to_string(),
            },
            Some(template) => Self {
                name: template.to_string(),
                url: format!("{}-{}", base_url, template),
            },
            None => Self {
                name: DEFAULT_TEMPLATE.to_string(),
                url: base_url.to_string(),
            },
        }
    }

    pub fn is_library(&self) -> bool {
        self.name == LIBRARY_TEMPLATE
    }

    /// `skyux-spa-<name>`, or `skyux-lib-<name>` for libraries.
    pub fn package_name(&self, name: &str) -> String {
        let prefix = if self.is_library() { "lib" } else { "spa" };
        format!("skyux-{}-{}", prefix, name)
    }
}

/// Everything known about the project being created.
#[derive(Debug, Clone)]
pub struct Project {
    pub spa: String,
    pub name: String,
    pub path: PathBuf,
    pub repo_url: Option<String>,
    pub template: Template,
}

/// Checks a requested root directory name and returns the package name.
pub fn validate_name(value: &str, template: &Template, cwd: &Path) -> Result<String> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(SkyuxError::Message(
            "SPA root directories may only contain lower-case letters, numbers or dashes."
                .to_string(),
        ));
    }

    let package_name = template.package_name(value);
    if cwd.join(&package_name).exists() {
        return Err(SkyuxError::Message(
            "SPA directory already exists.".to_string(),
        ));
    }

    Ok(package_name)
}

/// Rewrites a template `package.json` for the new project.
pub fn prepare_package_json(package: Value, project: &Project, skyux: &str, builder: &str) -> Value {
    let mut package = match package {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let library = project.template.is_library();

    with_object(&mut package, "dependencies", |deps| {
        if library {
            // Libraries must not hard-depend on SKY UX.
            deps.remove(SKYUX_PACKAGE);
        } else {
            deps.insert(SKYUX_PACKAGE.to_string(), json!(skyux));
        }
    });
    with_object(&mut package, "peerDependencies", |peers| {
        if library {
            peers.insert(SKYUX_PACKAGE.to_string(), json!(format!("^{}", skyux)));
        }
    });
    with_object(&mut package, "devDependencies", |dev| {
        if library {
            dev.insert(SKYUX_PACKAGE.to_string(), json!(skyux));
        }
        dev.insert(BUILDER_PACKAGE.to_string(), json!(builder));
    });

    package.insert("name".to_string(), json!(format!("blackbaud-{}", project.name)));
    package.insert(
        "description".to_string(),
        json!(format!("Single-page-application for {}", project.name)),
    );
    package.insert(
        "repository".to_string(),
        json!({
            "type": "git",
            "url": project.repo_url.clone().unwrap_or_default(),
        }),
    );

    Value::Object(package)
}

fn with_object<F>(package: &mut Map<String, Value>, key: &str, f: F)
where
    F: FnOnce(&mut Map<String, Value>),
{
    if !matches!(package.get(key), Some(Value::Object(_))) {
        package.insert(key.to_string(), Value::Object(Map::new()));
    }
    if let Some(Value::Object(map)) = package.get_mut(key) {
        f(map);
    }
}

/// Scaffolds a new project in a subdirectory of `cwd`.
pub fn run_new(args: &NewArgs, config: &SkyuxConfig, cwd: &Path, logger: &dyn Logger) -> Result<()> {
    let template = Template::from_arg(args.template.as_deref(), &config.template.base_url);
    let spa = prompt_for_name(args.name.as_deref(), &template, cwd, logger)?;
    let name = template.package_name(&spa);
    let repo_url = prompt_for_url(args)?;
    let project = Project {
        path: cwd.join(&name),
        spa,
        name,
        repo_url,
        template,
    };

    clone_project_repo(&project)?;

    let template_dir = tempfile::tempdir()?;
    clone_template(&project.template, template_dir.path())?;

    let skyux = latest_version(SKYUX_PACKAGE)?;
    let builder = latest_version(BUILDER_PACKAGE)?;
    cleanup_template(&project, template_dir.path(), &skyux, &builder, logger)?;

    if project.repo_url.is_some() {
        let step = ui::Step::start(format!("Switching to branch {}.", INITIAL_BRANCH));
        let result = checkout_new_branch(&project.path, INITIAL_BRANCH, logger.is_verbose());
        step.clear();
        result?;
    }

    npm_install(Some(&project.path), logger)?;

    logger.info(&format!(
        "SPA {} created in directory {}",
        project.spa, project.name
    ));
    logger.info("Change into that directory and run \"skyux serve\" to begin.");
    Ok(())
}

fn prompt_for_name(
    requested: Option<&str>,
    template: &Template,
    cwd: &Path,
    logger: &dyn Logger,
) -> Result<String> {
    if let Some(name) = requested {
        match validate_name(name, template, cwd) {
            Ok(package_name) => {
                logger.info(&format!("Creating a new SPA named '{}'.", package_name));
                return Ok(name.to_string());
            }
            Err(err) => logger.error(&err.to_string()),
        }
    }

    let name: String = dialoguer::Input::with_theme(&ColorfulTheme::default())
        .with_prompt("What is the root directory for your SPA? (example: my-spa-name)")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            validate_name(input, template, cwd)
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .interact_text()
        .map_err(|err| SkyuxError::Message(err.to_string()))?;

    logger.info(&format!(
        "Creating a new SPA named '{}'.",
        template.package_name(&name)
    ));
    Ok(name)
}

fn prompt_for_url(args: &NewArgs) -> Result<Option<String>> {
    if args.no_repo {
        return Ok(None);
    }
    if let Some(repo) = &args.repo {
        return Ok(Some(repo.clone()).filter(|r| !r.is_empty()));
    }

    let url: String = dialoguer::Input::with_theme(&ColorfulTheme::default())
        .with_prompt("What is the URL to your repo? (leave this blank if you don't know)")
        .allow_empty(true)
        .interact_text()
        .map_err(|err| SkyuxError::Message(err.to_string()))?;
    Ok(Some(url.trim().to_string()).filter(|u| !u.is_empty()))
}

fn clone_project_repo(project: &Project) -> Result<()> {
    let Some(url) = &project.repo_url else {
        return Ok(());
    };

    let step = ui::Step::start("Cloning your repository.");
    if let Err(err) = clone_repo(url, &project.path) {
        step.failed();
        return Err(err);
    }
    if !is_repo_empty(&project.path)? {
        step.failed();
        return Err(SkyuxError::Message(
            "skyux new only works with empty repositories.".to_string(),
        ));
    }
    step.done();
    Ok(())
}

fn clone_template(template: &Template, dest: &Path) -> Result<()> {
    let step = ui::Step::start(format!("Cloning {} SKY UX template.", template.name));
    match clone_repo(&template.url, dest) {
        Ok(()) => {
            step.finish_with(format!(
                "{} template successfully cloned.",
                template.name
            ));
            Ok(())
        }
        Err(err) => {
            step.finish_with(format!(
                "Template not found at location, {}.",
                template.url
            ));
            Err(err)
        }
    }
}

fn cleanup_template(
    project: &Project,
    template_dir: &Path,
    skyux: &str,
    builder: &str,
    logger: &dyn Logger,
) -> Result<()> {
    let manifest_path = template_dir.join(MANIFEST_FILE);
    let package: Value = serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)?;
    let package = prepare_package_json(package, project, skyux, builder);

    logger.info(&format!("Setting {} version {}", SKYUX_PACKAGE, skyux));
    logger.info(&format!("Setting {} version {}", BUILDER_PACKAGE, builder));

    std::fs::write(&manifest_path, serde_json::to_string_pretty(&package)?)?;
    copy_template(template_dir, &project.path).inspect_err(|_| {
        logger.info("Template cleanup failed.");
    })
}

/// Recursively copies a template checkout, leaving out its git metadata.
pub fn copy_template(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry?;
        let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
