use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TfmvError {
    #[error("not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error(transparent)]
    Plan(#[from] crate::plans::PlanError),

    #[error(transparent)]
    Terraform(#[from] crate::terraform::TerraformError),

    #[error(transparent)]
    Backup(#[from] crate::backup::BackupError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("invalid selection: {0}")]
    Selection(#[from] crate::prompt::SelectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TfmvError>;
