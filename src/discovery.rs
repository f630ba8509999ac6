//! Locating the Terraform directories under an operator-supplied root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use walkdir::{DirEntry, WalkDir};

use crate::error::TfmvError;

/// Terramate stack definition file.
pub const STACK_FILE: &str = "stack.tm.hcl";

/// A stack is planned only when it declares this script.
const PLAN_SCRIPT_MARKER: &str = r#"script "plan-json""#;

/// How directories are selected for planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiscoveryMode {
    /// Directories holding a `*.tf` file
    #[default]
    Files,
    /// Terramate stacks that define the `plan-json` script
    Stacks,
}

/// Resolves `input` against the current directory and checks that it is a
/// directory.
pub fn resolve_root(input: &Path) -> Result<PathBuf, TfmvError> {
    let path = if input.is_absolute() {
        input.to_path_buf()
    } else {
        std::env::current_dir()?.join(input)
    };

    if path.is_dir() {
        Ok(path)
    } else {
        Err(TfmvError::InvalidRoot(path))
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_terraform_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "tf")
}

/// Every directory under `root` (inclusive) that directly holds a `*.tf`
/// file, sorted. Hidden directories such as `.terraform` are not entered.
pub fn find_terraform_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        match entry {
            Ok(entry) if is_terraform_file(&entry) => {
                if let Some(parent) = entry.path().parent() {
                    dirs.insert(parent.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "could not access path during discovery");
            }
        }
    }

    tracing::info!(count = dirs.len(), root = %root.display(), "terraform directories found");
    dirs.into_iter().collect()
}

fn is_plannable_stack(entry: &DirEntry) -> bool {
    if !entry.file_type().is_file() || entry.file_name() != STACK_FILE {
        return false;
    }

    match std::fs::read_to_string(entry.path()) {
        Ok(contents) => contents.contains(PLAN_SCRIPT_MARKER),
        Err(e) => {
            tracing::warn!(path = %entry.path().display(), error = %e, "could not read stack file");
            false
        }
    }
}

/// Every Terramate stack under `root` whose `stack.tm.hcl` defines the
/// `plan-json` script, sorted.
pub fn find_stack_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        match entry {
            Ok(entry) if is_plannable_stack(&entry) => {
                if let Some(parent) = entry.path().parent() {
                    dirs.insert(parent.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "could not access path during discovery");
            }
        }
    }

    tracing::info!(count = dirs.len(), root = %root.display(), "terramate stacks found");
    dirs.into_iter().collect()
}

pub fn discover(root: &Path, mode: DiscoveryMode) -> Vec<PathBuf> {
    match mode {
        DiscoveryMode::Files => find_terraform_dirs(root),
        DiscoveryMode::Stacks => find_stack_dirs(root),
    }
}
