use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid dataset slug: {0} (expected owner/dataset)")]
    InvalidDatasetSlug(String),

    #[error("invalid target folder name: {0:?}")]
    InvalidTargetName(String),

    #[error("Kaggle credentials not found")]
    #[diagnostic(help(
        "set KAGGLE_USERNAME and KAGGLE_KEY, or place kaggle.json in ~/.kaggle \
         (or $KAGGLE_CONFIG_DIR)"
    ))]
    MissingCredentials,

    #[error("failed to read Kaggle credentials at {0}")]
    CredentialsRead(PathBuf),

    #[error("failed to parse Kaggle credentials: {0}")]
    CredentialsParse(String),

    #[error("Kaggle request failed: {0}")]
    KaggleHttp(String),

    #[error("Kaggle returned status {status}: {message}")]
    KaggleStatus { status: u16, message: String },

    #[error("corrupt archive {path}: {message}")]
    CorruptArchive { path: PathBuf, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
