pub mod file;
pub mod terraform;
pub mod terramate;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::terraform::{Terraform, TerraformError};
use crate::terraform::plan::{PlanDocument, PlanSet};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unknown plan source: {0}")]
    UnknownSource(String),
    #[error("invalid plan JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("plan document is not a JSON object")]
    NotAnObject,
    #[error("failed to read plan file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Terraform(#[from] TerraformError),
}

/// Produces the JSON plan of one Terraform directory for a workspace.
#[async_trait]
pub trait PlanSource: Send + Sync {
    fn name(&self) -> &str;
    async fn plan(&self, dir: &Path, workspace: &str) -> Result<PlanDocument, PlanError>;
}

/// What the plan sources need to be built.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub terraform: Terraform,
    /// Program invoked by the `terramate` source.
    pub terramate: String,
    /// File name read by the `file` source.
    pub plan_file: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            terraform: Terraform::new(),
            terramate: "terramate".to_string(),
            plan_file: "tfplan.json".to_string(),
        }
    }
}

pub fn get_source(name: &str, options: &SourceOptions) -> Result<Box<dyn PlanSource>, PlanError> {
    match name {
        "terraform" => {
            let terraform = options.terraform.clone();
            Ok(Box::new(terraform::TerraformPlanSource::new(terraform)))
        }
        "terramate" => {
            let terramate = Terraform::with_program(options.terramate.as_str());
            Ok(Box::new(terramate::TerramatePlanSource::new(terramate)))
        }
        "file" => Ok(Box::new(file::FilePlanSource::new(&options.plan_file))),
        other => Err(PlanError::UnknownSource(other.to_string())),
    }
}

/// Plans every directory in turn. A directory whose plan cannot be produced
/// is logged and left out of the returned set.
pub async fn collect_plans(source: &dyn PlanSource, dirs: &[PathBuf], workspace: &str) -> PlanSet {
    let mut plans = PlanSet::new();

    for dir in dirs {
        match source.plan(dir, workspace).await {
            Ok(document) => {
                tracing::debug!(
                    dir = %dir.display(),
                    changes = document.resource_changes.len(),
                    "plan loaded"
                );
                plans.insert(dir.display().to_string(), document);
            }
            Err(e) => {
                tracing::warn!(
                    dir = %dir.display(),
                    source = source.name(),
                    error = %e,
                    "skipping directory"
                );
            }
        }
    }

    tracing::info!(planned = plans.len(), total = dirs.len(), "plans collected");
    plans
}
