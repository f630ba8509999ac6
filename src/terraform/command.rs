use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::TerraformError;

const DEFAULT_PROGRAM: &str = "terraform";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs `terraform` subcommands inside a directory, optionally pinned to a
/// workspace through `TF_WORKSPACE`.
///
/// Any Terraform wrapper (`terramate`) can be driven the same way through
/// [`Terraform::with_program`] and [`Terraform::with_env`].
#[derive(Debug, Clone)]
pub struct Terraform {
    program: String,
    workspace: Option<String>,
    envs: Vec<(String, String)>,
}

impl Default for Terraform {
    fn default() -> Self {
        Self::new()
    }
}

impl Terraform {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// NOTE: Tests point this at `sh` to avoid needing a terraform binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            workspace: None,
            envs: Vec::new(),
        }
    }

    pub fn in_workspace(&self, workspace: impl Into<String>) -> Self {
        Self {
            workspace: Some(workspace.into()),
            ..self.clone()
        }
    }

    /// Extra environment variable for every command; later values win.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    pub async fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, TerraformError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(dir)
            .env("TF_IN_AUTOMATION", "1")
            .kill_on_drop(true);

        if let Some(workspace) = &self.workspace {
            command.env("TF_WORKSPACE", workspace);
        }

        command.envs(self.envs.iter().map(|(key, value)| (key, value)));

        if std::env::var_os("KUBE_CONFIG_PATH").is_none() {
            if let Some(path) = kube_config_path() {
                command.env("KUBE_CONFIG_PATH", path);
            }
        }

        tracing::debug!(
            program = %self.program,
            args = ?args,
            dir = %dir.display(),
            workspace = ?self.workspace,
            "running command"
        );

        let output = command
            .output()
            .await
            .map_err(|source| TerraformError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`Terraform::run`], but a non-zero exit becomes an error carrying stderr.
    pub async fn run_checked(&self, dir: &Path, args: &[&str]) -> Result<String, TerraformError> {
        let output = self.run(dir, args).await?;
        if output.success() {
            return Ok(output.stdout);
        }

        Err(TerraformError::Failed {
            command: format!("{} {}", self.program, args.join(" ")),
            dir: dir.to_path_buf(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Kubernetes-backed providers read their kubeconfig from this variable
/// instead of the usual `KUBECONFIG` lookup.
pub fn kube_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}
