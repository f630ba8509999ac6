use std::path::{Path, PathBuf};

use crate::backup::{BackupSnapshot, state_file_name};
use crate::terraform::Terraform;
use crate::terraform::state::push_state;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Force-pushes the pristine copy of every directory that has one in
/// `snapshot`. Directories without a backed-up state are left untouched.
pub async fn restore_snapshot(
    terraform: &Terraform,
    snapshot: &BackupSnapshot,
    root: &Path,
    dirs: &[PathBuf],
) -> RestoreSummary {
    let terraform = terraform.in_workspace(snapshot.workspace());
    let pristine = snapshot.pristine_dir();
    let mut summary = RestoreSummary::default();

    for dir in dirs {
        let state_file = pristine.join(state_file_name(root, dir));
        if !state_file.is_file() {
            tracing::debug!(dir = %dir.display(), "no backed-up state");
            summary.missing += 1;
            continue;
        }

        match push_state(&terraform, dir, &state_file, true).await {
            Ok(()) => {
                tracing::info!(dir = %dir.display(), "state restored");
                summary.restored += 1;
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to restore state");
                summary.failed += 1;
            }
        }
    }

    summary
}
