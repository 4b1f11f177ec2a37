use std::path::PathBuf;

use thiserror::Error;

use crate::client::SubmitFault;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Configuration artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("Malformed property file {path} (line {line}): {reason}")]
    MalformedProperties {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Launch argument error: {0}")]
    Arguments(String),

    #[error("Submission failed: {0}")]
    Submission(#[from] SubmitFault),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LaunchError>;
