//! Error types for the store, the prompt engine and the application loop.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the record store.
///
/// Reads never fail: an unreadable or corrupt file loads as an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode tasks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("title cannot be empty")]
    EmptyTitle,
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failures raised while a prompt is active.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("interrupted")]
    Interrupted,
}

/// Anything that can end an interactive session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Prompt(PromptError::Io(err))
    }
}
