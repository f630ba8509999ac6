//! Timestamped state backups.
//!
//! A snapshot for workspace `ws` taken at `20250102_030405` lives under the
//! backup root as:
//!
//! ```text
//! 20250102_030405/ws/<dir>.tfstate          working copy, moves are applied here
//! 20250102_030405/ws_backup/<dir>.tfstate   pristine copy, used by restore
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const PRISTINE_SUFFIX: &str = "_backup";
const STATE_EXTENSION: &str = "tfstate";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backup '{timestamp}' for workspace '{workspace}'")]
    NotFound { workspace: String, timestamp: String },
}

impl BackupError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        BackupError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    root: PathBuf,
    timestamp: String,
    workspace: String,
}

impl BackupSnapshot {
    pub fn new(root: impl Into<PathBuf>, workspace: &str, taken_at: NaiveDateTime) -> Self {
        Self::existing(root, workspace, &taken_at.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn now(root: impl Into<PathBuf>, workspace: &str) -> Self {
        Self::new(root, workspace, Local::now().naive_local())
    }

    pub fn existing(root: impl Into<PathBuf>, workspace: &str, timestamp: &str) -> Self {
        Self {
            root: root.into(),
            timestamp: timestamp.to_string(),
            workspace: workspace.to_string(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn working_dir(&self) -> PathBuf {
        self.root.join(&self.timestamp).join(&self.workspace)
    }

    pub fn pristine_dir(&self) -> PathBuf {
        self.root
            .join(&self.timestamp)
            .join(format!("{}{PRISTINE_SUFFIX}", self.workspace))
    }

    pub async fn create(&self) -> Result<(), BackupError> {
        let dir = self.working_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| BackupError::io(&dir, e))
    }

    pub async fn write_state(
        &self,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf, BackupError> {
        let path = self.working_dir().join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| BackupError::io(&path, e))?;
        Ok(path)
    }

    /// Copies every file of the working copy into the pristine directory.
    pub async fn seal(&self) -> Result<usize, BackupError> {
        let source = self.working_dir();
        let target = self.pristine_dir();
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|e| BackupError::io(&target, e))?;

        let mut entries = tokio::fs::read_dir(&source)
            .await
            .map_err(|e| BackupError::io(&source, e))?;

        let mut copied = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackupError::io(&source, e))?
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let dest = target.join(entry.file_name());
            tokio::fs::copy(&path, &dest)
                .await
                .map_err(|e| BackupError::io(&dest, e))?;
            copied += 1;
        }

        tracing::info!(files = copied, dir = %target.display(), "backup sealed");
        Ok(copied)
    }
}

/// File name a directory's state is stored under: its path relative to the
/// discovery root with separators replaced by `__`, or its own name when it
/// is the root.
pub fn state_file_name(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).ok().filter(|p| !p.as_os_str().is_empty());

    let stem = match relative {
        Some(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("__"),
        None => dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string()),
    };

    format!("{stem}.{STATE_EXTENSION}")
}

pub fn is_timestamp(name: &str) -> bool {
    name.len() == 15 && NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).is_ok()
}

/// Backups under `root`, grouped by workspace, newest timestamp first.
///
/// Entries whose name is not a timestamp are skipped with a warning. A
/// missing root simply has no backups.
pub async fn list_backups(root: &Path) -> Result<BTreeMap<String, Vec<String>>, BackupError> {
    let mut backups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(backups),
        Err(e) => return Err(BackupError::io(root, e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BackupError::io(root, e))?
    {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_timestamp(&name) {
            tracing::warn!(dir = %name, "not a YYYYMMDD_HHmmSS backup directory, skipping");
            continue;
        }

        let mut workspaces = match tokio::fs::read_dir(&path).await {
            Ok(workspaces) => workspaces,
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "failed to read backup");
                continue;
            }
        };

        while let Some(workspace) = workspaces
            .next_entry()
            .await
            .map_err(|e| BackupError::io(&path, e))?
        {
            if !workspace.path().is_dir() {
                continue;
            }
            let workspace = workspace.file_name().to_string_lossy().into_owned();
            if workspace.ends_with(PRISTINE_SUFFIX) {
                continue;
            }
            backups.entry(workspace).or_default().push(name.clone());
        }
    }

    for timestamps in backups.values_mut() {
        timestamps.sort_unstable_by(|a, b| b.cmp(a));
    }

    Ok(backups)
}

/// Looks up a snapshot that has a pristine copy for `workspace`.
pub fn find_snapshot(
    root: &Path,
    workspace: &str,
    timestamp: &str,
) -> Result<BackupSnapshot, BackupError> {
    let snapshot = BackupSnapshot::existing(root, workspace, timestamp);
    if is_timestamp(timestamp) && snapshot.pristine_dir().is_dir() {
        Ok(snapshot)
    } else {
        Err(BackupError::NotFound {
            workspace: workspace.to_string(),
            timestamp: timestamp.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn taken_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_snapshot_layout() {
        let snapshot = BackupSnapshot::new("/backups", "staging", taken_at());
        assert_eq!(snapshot.timestamp(), "20250102_030405");
        assert_eq!(
            snapshot.working_dir(),
            PathBuf::from("/backups/20250102_030405/staging")
        );
        assert_eq!(
            snapshot.pristine_dir(),
            PathBuf::from("/backups/20250102_030405/staging_backup")
        );
    }

    #[test]
    fn test_state_file_name() {
        let root = Path::new("/infra");
        assert_eq!(state_file_name(root, Path::new("/infra/apps/web")), "apps__web.tfstate");
        assert_eq!(state_file_name(root, Path::new("/infra/network")), "network.tfstate");
        assert_eq!(state_file_name(root, Path::new("/infra")), "infra.tfstate");
        assert_eq!(state_file_name(root, Path::new("/elsewhere/db")), "db.tfstate");
    }

    #[test]
    fn test_is_timestamp() {
        assert!(is_timestamp("20250102_030405"));
        assert!(!is_timestamp("2025012_030405"));
        assert!(!is_timestamp("20251302_030405"));
        assert!(!is_timestamp("staging"));
    }

    #[tokio::test]
    async fn test_write_and_seal() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = BackupSnapshot::new(root.path(), "default", taken_at());
        snapshot.create().await.unwrap();
        snapshot.write_state("app.tfstate", "{\"serial\": 1}").await.unwrap();
        snapshot.write_state("db.tfstate", "{\"serial\": 2}").await.unwrap();

        assert_eq!(snapshot.seal().await.unwrap(), 2);
        let copy = std::fs::read_to_string(snapshot.pristine_dir().join("db.tfstate")).unwrap();
        assert_eq!(copy, "{\"serial\": 2}");
    }

    #[tokio::test]
    async fn test_list_backups_groups_by_workspace() {
        let root = tempfile::tempdir().unwrap();
        for (ts, ws) in [
            ("20250101_000000", "default"),
            ("20250301_120000", "default"),
            ("20250201_000000", "staging"),
        ] {
            std::fs::create_dir_all(root.path().join(ts).join(ws)).unwrap();
            std::fs::create_dir_all(root.path().join(ts).join(format!("{ws}_backup"))).unwrap();
        }
        std::fs::create_dir_all(root.path().join("scratch/default")).unwrap();
        std::fs::write(root.path().join("20250401_000000"), "").unwrap();

        let backups = list_backups(root.path()).await.unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups["default"], vec!["20250301_120000", "20250101_000000"]);
        assert_eq!(backups["staging"], vec!["20250201_000000"]);
    }

    #[tokio::test]
    async fn test_list_backups_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let backups = list_backups(&root.path().join("states")).await.unwrap();
        assert!(backups.is_empty());
    }

    #[test]
    fn test_find_snapshot() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("20250101_000000/default_backup")).unwrap();

        let snapshot = find_snapshot(root.path(), "default", "20250101_000000").unwrap();
        assert_eq!(snapshot.workspace(), "default");

        let err = find_snapshot(root.path(), "staging", "20250101_000000").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no backup '20250101_000000' for workspace 'staging'"
        );
    }
}
