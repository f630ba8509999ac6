//! State pull/push/mv against a directory's configured backend.

use std::path::Path;

use super::{Terraform, TerraformError};

pub async fn pull_state(terraform: &Terraform, dir: &Path) -> Result<String, TerraformError> {
    terraform.run_checked(dir, &["state", "pull"]).await
}

pub async fn push_state(
    terraform: &Terraform,
    dir: &Path,
    state_file: &Path,
    force: bool,
) -> Result<(), TerraformError> {
    let state_file = state_file.display().to_string();
    let mut args = vec!["state", "push"];
    if force {
        args.push("-force");
    }
    args.push(&state_file);

    terraform.run_checked(dir, &args).await.map(|_| ())
}

/// Moves `from_address` out of the local state file `from_state` into
/// `to_state` as `to_address`.
///
/// Runs in `work_dir`, which must not contain Terraform configuration so the
/// local backend (and its `-state`/`-state-out` flags) applies.
pub async fn move_state(
    terraform: &Terraform,
    work_dir: &Path,
    from_state: &Path,
    to_state: &Path,
    from_address: &str,
    to_address: &str,
) -> Result<(), TerraformError> {
    let state_flag = format!("-state={}", from_state.display());
    let state_out_flag = format!("-state-out={}", to_state.display());

    terraform
        .run_checked(
            work_dir,
            &[
                "state",
                "mv",
                "-lock=false",
                state_flag.as_str(),
                state_out_flag.as_str(),
                from_address,
                to_address,
            ],
        )
        .await
        .map(|_| ())
}
