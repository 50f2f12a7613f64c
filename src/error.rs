use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkyuxError {
    #[error("{0}")]
    Message(String),
    #[error("Module {identity} failed while running command: {reason}")]
    PluginFault { identity: String, reason: String },
    #[error("Module {identity} could not be invoked: {reason}")]
    PluginUnavailable { identity: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    GixClone(#[from] gix::clone::Error),
    #[error(transparent)]
    GixFetch(#[from] gix::clone::fetch::Error),
    #[error(transparent)]
    GixCheckout(#[from] gix::clone::checkout::main_worktree::Error),
    #[error(transparent)]
    Walkdir(#[from] walkdir::Error),
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, SkyuxError>;
