use std::path::Path;

use crate::error::Result;
use crate::npm::npm_install;
use crate::ui::{self, Logger};

const NODE_MODULES_DIR: &str = "node_modules";
const PACKAGE_LOCK_FILE: &str = "package-lock.json";

/// Removes installed dependencies and the lock file, then reinstalls.
pub fn run_install(cwd: &Path, logger: &dyn Logger) -> Result<()> {
    remove(&cwd.join(NODE_MODULES_DIR), NODE_MODULES_DIR, logger);
    remove(&cwd.join(PACKAGE_LOCK_FILE), PACKAGE_LOCK_FILE, logger);
    npm_install(Some(cwd), logger)
}

/// Deletes a file or directory. Failures are logged, not returned.
fn remove(target: &Path, label: &str, logger: &dyn Logger) {
    let step = ui::Step::start(format!("Remove {}.", label));
    let result = if target.is_dir() {
        std::fs::remove_dir_all(target)
    } else if target.exists() {
        std::fs::remove_file(target)
    } else {
        Ok(())
    };

    match result {
        Ok(()) => step.done(),
        Err(err) => {
            step.failed();
            logger.error(&err.to_string());
        }
    }
}
