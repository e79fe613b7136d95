use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("repository root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("`git {command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}
