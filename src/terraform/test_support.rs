//! Fake `terraform` executables for tests.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use super::Terraform;

/// Writes `body` as a `/bin/sh` script named `terraform` into `dir` and
/// returns a runner pointed at it.
pub(crate) fn fake_terraform(dir: &Path, body: &str) -> Terraform {
    let program = dir.join("terraform");
    std::fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    Terraform::with_program(program.display().to_string())
}

/// A fake that appends its working directory and arguments to `log`.
pub(crate) fn recording_terraform(dir: &Path, log: &Path) -> Terraform {
    fake_terraform(dir, &format!("echo \"$(pwd)|$*\" >> '{}'", log.display()))
}
