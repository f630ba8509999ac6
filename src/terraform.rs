//! Thin wrappers around the `terraform` CLI and its JSON plan format.

pub mod command;
pub mod plan;
pub mod state;
pub mod workspace;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

use std::path::PathBuf;

use thiserror::Error;

pub use command::{CommandOutput, Terraform};

#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "'{command}' failed in {} (exit code {}): {stderr}",
        .dir.display(),
        display_code(.code)
    )]
    Failed {
        command: String,
        dir: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}
