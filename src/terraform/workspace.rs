use std::path::{Path, PathBuf};

use super::Terraform;

/// Parses `terraform workspace list` output, dropping the `*` marking the
/// current workspace.
pub fn parse_workspace_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches('*').trim_start().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Workspaces of one directory; failures are logged and yield none.
pub async fn list_workspaces(terraform: &Terraform, dir: &Path) -> Vec<String> {
    match terraform.run_checked(dir, &["workspace", "list"]).await {
        Ok(stdout) => parse_workspace_list(&stdout),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to list workspaces");
            Vec::new()
        }
    }
}

/// Union of the workspaces of every directory, in first-seen order.
pub async fn collect_workspaces(terraform: &Terraform, dirs: &[PathBuf]) -> Vec<String> {
    let mut workspaces: Vec<String> = Vec::new();
    for dir in dirs {
        for workspace in list_workspaces(terraform, dir).await {
            if !workspaces.contains(&workspace) {
                workspaces.push(workspace);
            }
        }
    }
    workspaces
}
