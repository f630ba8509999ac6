//! Applying selected moves to the real state backends.
//!
//! Every directory's state is pulled into a fresh [`BackupSnapshot`] and
//! sealed into a pristine copy before anything is changed. Moves are then
//! performed with `terraform state mv` between the pulled working copies, and
//! only the working copies that changed are pushed back: destinations first,
//! then sources, and sources only once every destination push succeeded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::backup::{BackupSnapshot, state_file_name};
use crate::error::TfmvError;
use crate::moves::MoveCandidate;
use crate::terraform::Terraform;
use crate::terraform::state::{move_state, pull_state, push_state};

#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub terraform: Terraform,
    pub workspace: String,
    /// Discovery root, used to derive state file names.
    pub root: PathBuf,
    pub dirs: Vec<PathBuf>,
    pub backup_root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub snapshot: Option<String>,
    pub pulled: usize,
    pub applied: usize,
    pub failed: usize,
    pub pushed: usize,
    /// Pushes that failed, plus source pushes withheld after a failed
    /// destination push. Non-zero means remote state may need a restore.
    pub push_failed: usize,
}

/// Applies `moves` in order. Individual pull, move and push failures are
/// logged and counted; failing to write the backup aborts before any move.
pub async fn apply_moves(
    context: &ApplyContext,
    moves: &[&MoveCandidate],
) -> Result<ApplySummary, TfmvError> {
    let terraform = context.terraform.in_workspace(&context.workspace);
    let snapshot = BackupSnapshot::now(&context.backup_root, &context.workspace);
    snapshot.create().await?;

    let mut summary = ApplySummary {
        snapshot: Some(snapshot.timestamp().to_string()),
        ..Default::default()
    };

    let mut state_files: BTreeMap<String, PathBuf> = BTreeMap::new();
    for dir in &context.dirs {
        match pull_state(&terraform, dir).await {
            Ok(state) => {
                let file_name = state_file_name(&context.root, dir);
                let path = snapshot.write_state(&file_name, &state).await?;
                state_files.insert(dir.display().to_string(), path);
                summary.pulled += 1;
            }
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to pull state"),
        }
    }

    snapshot.seal().await?;

    let work_dir = snapshot.working_dir();
    let mut destinations: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

    for candidate in moves {
        let (Some(from_state), Some(to_state)) = (
            state_files.get(&candidate.from.directory),
            state_files.get(&candidate.to.directory),
        ) else {
            tracing::warn!(
                from = %candidate.from.directory,
                to = %candidate.to.directory,
                "state not pulled for both directories, skipping move"
            );
            summary.failed += 1;
            continue;
        };

        match apply_move(&terraform, &work_dir, from_state, to_state, candidate).await {
            Ok(()) => {
                summary.applied += 1;
                destinations.insert(candidate.to.directory.clone(), to_state.clone());
                sources.insert(candidate.from.directory.clone(), from_state.clone());
            }
            Err(e) => {
                tracing::warn!(address = %candidate.from.address, error = %e, "state move failed");
                summary.failed += 1;
            }
        }
    }

    for (dir, state_file) in &destinations {
        push_modified(&terraform, dir, state_file, &mut summary).await;
    }

    let destinations_pushed = summary.push_failed == 0;
    for (dir, state_file) in sources.iter().filter(|(dir, _)| !destinations.contains_key(*dir)) {
        if destinations_pushed {
            push_modified(&terraform, dir, state_file, &mut summary).await;
        } else {
            tracing::warn!(dir = %dir, "destination push failed, leaving source state unchanged");
            summary.push_failed += 1;
        }
    }

    tracing::info!(
        snapshot = %snapshot.timestamp(),
        applied = summary.applied,
        failed = summary.failed,
        pushed = summary.pushed,
        push_failed = summary.push_failed,
        "moves applied"
    );

    Ok(summary)
}

async fn push_modified(
    terraform: &Terraform,
    dir: &str,
    state_file: &Path,
    summary: &mut ApplySummary,
) {
    match push_state(terraform, Path::new(dir), state_file, false).await {
        Ok(()) => summary.pushed += 1,
        Err(e) => {
            tracing::warn!(dir = %dir, error = %e, "failed to push state");
            summary.push_failed += 1;
        }
    }
}

async fn apply_move(
    terraform: &Terraform,
    work_dir: &Path,
    from_state: &Path,
    to_state: &Path,
    candidate: &MoveCandidate,
) -> Result<(), TfmvError> {
    tracing::info!(
        from = %format!("{} -> {}", candidate.from.directory, candidate.from.address),
        to = %format!("{} -> {}", candidate.to.directory, candidate.to.address),
        "moving resource state"
    );

    move_state(
        terraform,
        work_dir,
        from_state,
        to_state,
        &candidate.from.address,
        &candidate.to.address,
    )
    .await?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::moves::{ChangeAction, ConfigSnapshot, MatchReason, ResourceChangeRecord};
    use crate::terraform::test_support::fake_terraform;

    fn record(dir: &Path, address: &str, action: ChangeAction) -> ResourceChangeRecord {
        ResourceChangeRecord {
            directory: dir.display().to_string(),
            address: address.to_string(),
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            action,
            values: None,
            config: ConfigSnapshot::default(),
        }
    }

    /// `state pull` prints the directory name, `state mv` and `state push`
    /// are logged to `calls.log` next to the script.
    const FAKE: &str = r#"log="$(dirname "$0")/calls.log"
case "$1 $2" in
  "state pull") printf '{"dir":"%s"}' "$(basename "$(pwd)")" ;;
  "state mv") echo "mv $*" >> "$log" ;;
  "state push") echo "push $(basename "$(pwd)") $3" >> "$log" ;;
  *) exit 1 ;;
esac"#;

    #[tokio::test]
    async fn test_apply_moves_backs_up_then_moves() {
        let bin = tempfile::tempdir().unwrap();
        let infra = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        let env_a = infra.path().join("env-a");
        let env_b = infra.path().join("env-b");
        let env_c = infra.path().join("env-c");
        for dir in [&env_a, &env_b, &env_c] {
            std::fs::create_dir_all(dir).unwrap();
        }

        let context = ApplyContext {
            terraform: fake_terraform(bin.path(), FAKE),
            workspace: "default".to_string(),
            root: infra.path().to_path_buf(),
            dirs: vec![env_a.clone(), env_b.clone(), env_c.clone()],
            backup_root: backups.path().to_path_buf(),
        };
        let candidate = MoveCandidate {
            from: record(&env_a, "aws_instance.web", ChangeAction::Delete),
            to: record(&env_b, "module.app.aws_instance.web", ChangeAction::Create),
            confidence: 1.0,
            reason: vec![MatchReason::SameName, MatchReason::SameType],
        };

        let summary = apply_moves(&context, &[&candidate]).await.unwrap();
        assert_eq!(summary.pulled, 3);
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.pushed, 2);
        assert_eq!(summary.push_failed, 0);

        let snapshot = BackupSnapshot::existing(
            backups.path(),
            "default",
            summary.snapshot.as_deref().unwrap(),
        );
        let pristine =
            std::fs::read_to_string(snapshot.pristine_dir().join("env-a.tfstate")).unwrap();
        assert_eq!(pristine, "{\"dir\":\"env-a\"}");
        assert!(snapshot.pristine_dir().join("env-c.tfstate").is_file());

        let calls = std::fs::read_to_string(bin.path().join("calls.log")).unwrap();
        let lines: Vec<_> = calls.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("mv state mv -lock=false -state="));
        assert!(lines[0].ends_with("aws_instance.web module.app.aws_instance.web"));
        assert!(lines[1].starts_with("push env-b "));
        assert!(lines[1].ends_with("env-b.tfstate"));
        assert!(lines[2].starts_with("push env-a "));
        assert!(lines[2].ends_with("env-a.tfstate"));
    }

    #[tokio::test]
    async fn test_failed_destination_push_keeps_source_state() {
        let bin = tempfile::tempdir().unwrap();
        let infra = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        let env_a = infra.path().join("env-a");
        let env_b = infra.path().join("env-b");
        for dir in [&env_a, &env_b] {
            std::fs::create_dir_all(dir).unwrap();
        }

        let rejecting_push = r#"log="$(dirname "$0")/calls.log"
case "$1 $2" in
  "state pull") printf '{}' ;;
  "state mv") echo "mv $*" >> "$log" ;;
  "state push")
    [ "$(basename "$(pwd)")" = env-b ] && exit 1
    echo "push $(basename "$(pwd)") $3" >> "$log" ;;
  *) exit 1 ;;
esac"#;

        let context = ApplyContext {
            terraform: fake_terraform(bin.path(), rejecting_push),
            workspace: "default".to_string(),
            root: infra.path().to_path_buf(),
            dirs: vec![env_a.clone(), env_b.clone()],
            backup_root: backups.path().to_path_buf(),
        };
        let candidate = MoveCandidate {
            from: record(&env_a, "aws_instance.web", ChangeAction::Delete),
            to: record(&env_b, "aws_instance.web", ChangeAction::Create),
            confidence: 1.0,
            reason: vec![MatchReason::SameName, MatchReason::SameType],
        };

        let summary = apply_moves(&context, &[&candidate]).await.unwrap();
        assert_eq!(summary.pulled, 2);
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.pushed, 0);
        assert_eq!(summary.push_failed, 2);
        assert!(summary.snapshot.is_some());

        let calls = std::fs::read_to_string(bin.path().join("calls.log")).unwrap();
        assert!(!calls.contains("push env-a"));
    }

    #[tokio::test]
    async fn test_move_without_pulled_state_is_skipped() {
        let bin = tempfile::tempdir().unwrap();
        let infra = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        let env_a = infra.path().join("env-a");
        std::fs::create_dir_all(&env_a).unwrap();

        let context = ApplyContext {
            terraform: fake_terraform(bin.path(), FAKE),
            workspace: "default".to_string(),
            root: infra.path().to_path_buf(),
            dirs: vec![env_a.clone()],
            backup_root: backups.path().to_path_buf(),
        };
        let candidate = MoveCandidate {
            from: record(&env_a, "aws_instance.web", ChangeAction::Delete),
            to: record(&infra.path().join("gone"), "aws_instance.web", ChangeAction::Create),
            confidence: 0.9,
            reason: vec![MatchReason::SameType],
        };

        let summary = apply_moves(&context, &[&candidate]).await.unwrap();
        assert_eq!(summary.applied, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pushed, 0);
        assert_eq!(summary.push_failed, 0);
        assert!(!bin.path().join("calls.log").exists());
    }
}
