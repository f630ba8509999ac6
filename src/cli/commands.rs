use color_eyre::eyre::{Result, bail, eyre};

use tfmv::apply::{ApplyContext, apply_moves};
use tfmv::backup::{find_snapshot, list_backups};
use tfmv::discovery::{discover, resolve_root};
use tfmv::output::{render, render_backups};
use tfmv::plans::{SourceOptions, collect_plans, get_source};
use tfmv::prompt::{choose_one_interactive, parse_selection, select_moves_interactive};
use tfmv::restore::restore_snapshot;
use tfmv::terraform::Terraform;
use tfmv::terraform::workspace::collect_workspaces;
use tfmv::{DetectionConfig, MatchStrategy, MoveCandidate, MoveReport, TfmvError, select_options};

use super::{BackupsArgs, DetectArgs, RestoreArgs};

pub async fn detect(args: DetectArgs) -> Result<()> {
    let strategy = if args.exclusive {
        MatchStrategy::Exclusive
    } else {
        MatchStrategy::Greedy
    };
    let config = DetectionConfig::with_threshold(args.threshold).strategy(strategy);
    config.validate()?;

    let root = resolve_root(&args.root)?;
    let dirs = discover(&root, args.discover);
    if dirs.is_empty() {
        println!("No Terraform directories found under {}", root.display());
        return Ok(());
    }

    let terraform = Terraform::with_program(args.terraform);
    let workspace = match args.workspace {
        Some(workspace) => workspace,
        None => pick_workspace(&collect_workspaces(&terraform, &dirs).await)?
            .ok_or_else(|| eyre!("no Terraform workspaces found, pass --workspace"))?,
    };

    let options = SourceOptions {
        terraform: terraform.clone(),
        terramate: args.terramate,
        plan_file: args.plan_file,
    };
    let source = get_source(&args.source, &options)?;
    let plans = collect_plans(source.as_ref(), &dirs, &workspace).await;
    let report = tfmv::detect_with(&plans, &config);
    print!("{}", render(&report, args.format)?);

    if !args.apply || report.is_empty() {
        return Ok(());
    }

    let moves = selected_moves(&report, args.yes, args.select.as_deref())?;
    if moves.is_empty() {
        println!("No moves selected.");
        return Ok(());
    }

    let context = ApplyContext {
        terraform,
        workspace,
        root,
        dirs,
        backup_root: args.backups.backup_dir,
    };
    let summary = apply_moves(&context, &moves).await?;

    println!(
        "Applied {} of {} move(s), pushed {} state(s); backup {} in {}",
        summary.applied,
        moves.len(),
        summary.pushed,
        summary.snapshot.as_deref().unwrap_or("-"),
        context.backup_root.display()
    );
    if summary.push_failed > 0 {
        bail!(
            "{} state push(es) failed, remote state may be inconsistent; restore it with \
             `tfmv restore {} --workspace {} --backup {} --backup-dir {}`",
            summary.push_failed,
            context.root.display(),
            context.workspace,
            summary.snapshot.as_deref().unwrap_or("<timestamp>"),
            context.backup_root.display()
        );
    }
    if summary.failed > 0 {
        bail!("{} move(s) failed, see the log for details", summary.failed);
    }

    Ok(())
}

fn selected_moves<'a>(
    report: &'a MoveReport,
    all: bool,
    list: Option<&str>,
) -> Result<Vec<&'a MoveCandidate>> {
    let candidates = &report.candidates;
    if all {
        return Ok(candidates.iter().collect());
    }

    let indices = match list {
        Some(list) => parse_selection(list, candidates.len()).map_err(TfmvError::from)?,
        None => select_moves_interactive(&select_options(candidates))?,
    };

    Ok(indices.into_iter().map(|i| &candidates[i]).collect())
}

/// A single workspace is taken as is; several are offered to the operator.
fn pick_workspace(workspaces: &[String]) -> Result<Option<String>> {
    match workspaces {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        _ => {
            let index = choose_one_interactive("Select a workspace", workspaces)?;
            Ok(Some(workspaces[index].clone()))
        }
    }
}

pub async fn restore(args: RestoreArgs) -> Result<()> {
    let root = resolve_root(&args.root)?;
    let backup_dir = args.backups.backup_dir;
    let backups = list_backups(&backup_dir).await?;

    let workspace = match args.workspace {
        Some(workspace) => workspace,
        None => {
            let workspaces: Vec<String> = backups.keys().cloned().collect();
            pick_workspace(&workspaces)?
                .ok_or_else(|| eyre!("no backups found in {}", backup_dir.display()))?
        }
    };

    let timestamp = match args.backup {
        Some(timestamp) => timestamp,
        None => {
            let Some(timestamps) = backups.get(&workspace).filter(|t| !t.is_empty()) else {
                bail!("no backups for workspace '{workspace}' in {}", backup_dir.display());
            };
            let index = choose_one_interactive("Select a backup to restore", timestamps)?;
            timestamps[index].clone()
        }
    };

    let snapshot = find_snapshot(&backup_dir, &workspace, &timestamp)?;
    let dirs = discover(&root, args.discover);
    let terraform = Terraform::with_program(args.terraform);
    let summary = restore_snapshot(&terraform, &snapshot, &root, &dirs).await;

    println!(
        "Restored {} director{} from {timestamp} ({} without backup, {} failed)",
        summary.restored,
        if summary.restored == 1 { "y" } else { "ies" },
        summary.missing,
        summary.failed
    );
    if summary.failed > 0 {
        bail!("{} director(ies) could not be restored", summary.failed);
    }

    Ok(())
}

pub async fn backups(args: BackupsArgs) -> Result<()> {
    let backups = list_backups(&args.backup_dir).await?;
    print!("{}", render_backups(&backups));
    Ok(())
}
