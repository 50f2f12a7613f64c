use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::AtomicBool;

use crate::error::{Result, SkyuxError};

/// Clones a git repository URL into the destination directory.
pub fn clone_repo(url: &str, dest: &Path) -> Result<()> {
    let mut prepare = gix::prepare_clone(url, dest)?;
    let (mut checkout, _) =
        prepare.fetch_then_checkout(gix::progress::Discard, &AtomicBool::new(false))?;
    let _ = checkout.main_worktree(gix::progress::Discard, &AtomicBool::new(false))?;
    Ok(())
}

/// Creates and switches to a new branch in an existing checkout.
pub fn checkout_new_branch(repo_path: &Path, branch: &str, verbose: bool) -> Result<()> {
    let status = Command::new("git")
        .args(["checkout", "-b", branch])
        .current_dir(repo_path)
        .stdout(stdio(verbose))
        .stderr(stdio(verbose))
        .status()?;
    if !status.success() {
        return Err(SkyuxError::Message(format!(
            "Switching to branch {} failed.",
            branch
        )));
    }
    Ok(())
}

/// Returns true when a directory holds nothing but git metadata and a README.
pub fn is_repo_empty(dir: &Path) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.contains(".git") && !name.contains("README.md") {
            return Ok(false);
        }
    }
    Ok(true)
}

fn stdio(verbose: bool) -> Stdio {
    if verbose {
        Stdio::inherit()
    } else {
        Stdio::null()
    }
}
