use std::path::Path;

use async_trait::async_trait;

use super::{PlanDocument, PlanError, PlanSource};

/// Reads a plan the operator already exported with
/// `terraform show -json <planfile> > <file_name>` in each directory.
pub struct FilePlanSource {
    file_name: String,
}

impl FilePlanSource {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

#[async_trait]
impl PlanSource for FilePlanSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn plan(&self, dir: &Path, _workspace: &str) -> Result<PlanDocument, PlanError> {
        let path = dir.join(&self.file_name);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PlanError::Read {
                path: path.clone(),
                source,
            })?;

        PlanDocument::from_json(&contents)
    }
}
