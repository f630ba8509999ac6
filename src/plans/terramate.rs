use std::path::Path;

use async_trait::async_trait;

use super::{PlanDocument, PlanError, PlanSource};
use crate::terraform::Terraform;

/// Files the `plan-json` script leaves in the stack directory.
const PLAN_JSON: &str = "tf.json";
const PLAN_BINARY: &str = "tf.plan";

/// Runs the stack's `plan-json` Terramate script and reads the `tf.json` it
/// writes. The workspace reaches the script through `WORKSPACE`.
pub struct TerramatePlanSource {
    terramate: Terraform,
}

impl TerramatePlanSource {
    pub fn new(terramate: Terraform) -> Self {
        Self {
            terramate: terramate.with_env("TM_DISABLE_SAFEGUARDS", "all"),
        }
    }
}

async fn remove_output(dir: &Path, name: &str) {
    if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                dir = %dir.display(),
                file = name,
                error = %e,
                "failed to remove plan output"
            );
        }
    }
}

#[async_trait]
impl PlanSource for TerramatePlanSource {
    fn name(&self) -> &str {
        "terramate"
    }

    async fn plan(&self, dir: &Path, workspace: &str) -> Result<PlanDocument, PlanError> {
        let terramate = self.terramate.clone().with_env("WORKSPACE", workspace);
        let path = dir.join(PLAN_JSON);

        let result = async {
            terramate.run_checked(dir, &["script", "run", "plan-json"]).await?;
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| PlanError::Read { path: path.clone(), source })
        }
        .await;

        remove_output(dir, PLAN_JSON).await;
        remove_output(dir, PLAN_BINARY).await;

        PlanDocument::from_json(&result?)
    }
}
