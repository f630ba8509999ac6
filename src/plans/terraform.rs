use std::path::Path;

use async_trait::async_trait;

use super::{PlanDocument, PlanError, PlanSource};
use crate::terraform::Terraform;

/// Plan output file, written inside the planned directory and removed afterwards.
const PLAN_OUT: &str = ".tfmv.tfplan";

/// Runs `terraform plan` followed by `terraform show -json` in the directory.
pub struct TerraformPlanSource {
    terraform: Terraform,
}

impl TerraformPlanSource {
    pub fn new(terraform: Terraform) -> Self {
        Self { terraform }
    }
}

#[async_trait]
impl PlanSource for TerraformPlanSource {
    fn name(&self) -> &str {
        "terraform"
    }

    async fn plan(&self, dir: &Path, workspace: &str) -> Result<PlanDocument, PlanError> {
        let terraform = self.terraform.in_workspace(workspace);
        let out_flag = format!("-out={PLAN_OUT}");

        let result = async {
            terraform
                .run_checked(dir, &["plan", "-input=false", "-lock=false", out_flag.as_str()])
                .await?;
            terraform.run_checked(dir, &["show", "-json", PLAN_OUT]).await
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(dir.join(PLAN_OUT)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to remove plan file");
            }
        }

        PlanDocument::from_json(&result?)
    }
}
