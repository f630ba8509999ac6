use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use tfmv::config::DEFAULT_THRESHOLD;
use tfmv::discovery::DiscoveryMode;
use tfmv::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect resources that moved between Terraform directories
    Detect(DetectArgs),
    /// Push a backed-up state snapshot back to its directories
    Restore(RestoreArgs),
    /// List state backups
    Backups(BackupsArgs),
}

#[derive(clap::Args, Debug)]
pub struct DetectArgs {
    /// Directory searched recursively for Terraform configurations
    pub root: PathBuf,

    /// Which directories are planned: any holding `*.tf` files, or only
    /// Terramate stacks defining the `plan-json` script
    #[arg(long, env = "TFMV_DISCOVER", value_enum, default_value_t = DiscoveryMode::Files)]
    pub discover: DiscoveryMode,

    #[arg(long, env = "TFMV_WORKSPACE")]
    pub workspace: Option<String>,

    /// Minimum confidence a move must strictly exceed
    #[arg(long, env = "TFMV_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Never pair one creation with more than one deletion
    #[arg(long)]
    pub exclusive: bool,

    /// Where plans come from: "terraform" runs plan, "terramate" runs the
    /// stack's plan-json script, "file" reads --plan-file
    #[arg(long, default_value = "terraform")]
    pub source: String,

    #[arg(long, default_value = "tfplan.json")]
    pub plan_file: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Move the selected resources' state
    #[arg(long)]
    pub apply: bool,

    /// Select every detected move without prompting
    #[arg(long, requires = "apply", conflicts_with = "select")]
    pub yes: bool,

    /// Moves to apply without prompting, e.g. "1,3" or "2-4"
    #[arg(long, requires = "apply")]
    pub select: Option<String>,

    #[command(flatten)]
    pub backups: BackupsArgs,

    #[arg(long, env = "TFMV_TERRAFORM", default_value = "terraform")]
    pub terraform: String,

    #[arg(long, env = "TFMV_TERRAMATE", default_value = "terramate")]
    pub terramate: String,
}

#[derive(clap::Args, Debug)]
pub struct RestoreArgs {
    pub root: PathBuf,

    #[arg(long, env = "TFMV_DISCOVER", value_enum, default_value_t = DiscoveryMode::Files)]
    pub discover: DiscoveryMode,

    #[arg(long, env = "TFMV_WORKSPACE")]
    pub workspace: Option<String>,

    /// Snapshot timestamp (YYYYMMDD_HHmmSS); prompts when omitted
    #[arg(long)]
    pub backup: Option<String>,

    #[command(flatten)]
    pub backups: BackupsArgs,

    #[arg(long, env = "TFMV_TERRAFORM", default_value = "terraform")]
    pub terraform: String,
}

#[derive(clap::Args, Debug)]
pub struct BackupsArgs {
    #[arg(long, env = "TFMV_BACKUP_DIR", default_value = "states")]
    pub backup_dir: PathBuf,
}
