//! Rendering of detection results and backup listings.

use std::collections::BTreeMap;

use clap::ValueEnum;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::moves::{MoveCandidate, MoveReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Tree,
    Json,
}

#[derive(Tabled)]
struct MoveRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl MoveRow {
    fn new(index: usize, candidate: &MoveCandidate) -> Self {
        Self {
            index: index + 1,
            resource: candidate.from.short_address(),
            from: format!("{} -> {}", candidate.from.directory, candidate.from.address),
            to: format!("{} -> {}", candidate.to.directory, candidate.to.address),
            confidence: format_confidence(candidate.confidence),
            reason: candidate.reason_text(),
        }
    }
}

fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

fn summary_line(report: &MoveReport) -> String {
    format!(
        "{} move(s) detected among {} deletion(s) and {} creation(s)",
        report.candidates.len(),
        report.deletions,
        report.creations
    )
}

pub fn render(report: &MoveReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Tree => Ok(render_tree(report)),
        OutputFormat::Json => render_json(report),
    }
}

pub fn render_table(report: &MoveReport) -> String {
    if report.is_empty() {
        return format!("No resource moves detected.\n{}\n", summary_line(report));
    }

    let rows: Vec<MoveRow> = report
        .candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| MoveRow::new(i, candidate))
        .collect();

    let mut output = Table::new(rows).to_string();
    output.push('\n');
    output.push_str(&summary_line(report));
    output.push('\n');
    output
}

/// Moves grouped by source directory, then by destination directory.
pub fn render_tree(report: &MoveReport) -> String {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&MoveCandidate>>> = BTreeMap::new();
    for candidate in &report.candidates {
        grouped
            .entry(candidate.from.directory.as_str())
            .or_default()
            .entry(candidate.to.directory.as_str())
            .or_default()
            .push(candidate);
    }

    let mut root = Tree::new(summary_line(report));
    for (from_dir, targets) in grouped {
        let mut source = Tree::new(from_dir.to_string());
        for (to_dir, candidates) in targets {
            let leaves = candidates.into_iter().map(|candidate| {
                format!(
                    "{} -> {} ({})",
                    candidate.from.address,
                    candidate.to.address,
                    format_confidence(candidate.confidence)
                )
            });
            source.push(Tree::new(format!("=> {to_dir}")).with_leaves(leaves));
        }
        root.push(source);
    }

    root.to_string()
}

pub fn render_json(report: &MoveReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn render_backups(backups: &BTreeMap<String, Vec<String>>) -> String {
    if backups.is_empty() {
        return "No backups found.\n".to_string();
    }

    let mut root = Tree::new("backups".to_string());
    for (workspace, timestamps) in backups {
        root.push(Tree::new(workspace.clone()).with_leaves(timestamps.iter().cloned()));
    }
    root.to_string()
}
