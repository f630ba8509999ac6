use serde::Serialize;
use serde_json::{Map, Value};

use crate::terraform::plan::{ActionKind, PlanSet, ResourceChange};

pub type ValueMap = Map<String, Value>;

/// The two action kinds that can take part in a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Delete,
}

impl ChangeAction {
    pub fn kind(self) -> ActionKind {
        match self {
            ChangeAction::Create => ActionKind::Create,
            ChangeAction::Delete => ActionKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<ValueMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<ValueMap>,
}

/// One resource's create or delete, flattened out of a plan document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceChangeRecord {
    pub directory: String,
    pub address: String,
    pub resource_type: String,
    pub name: String,
    pub action: ChangeAction,
    /// `before` for deletions, `after` for creations.
    pub values: Option<ValueMap>,
    pub config: ConfigSnapshot,
}

impl ResourceChangeRecord {
    /// Returns `None` when the entry does not carry `action` or has no
    /// before/after data at all.
    pub fn from_change(
        directory: &str,
        entry: &ResourceChange,
        action: ChangeAction,
    ) -> Option<Self> {
        let change = entry.change.as_ref()?;
        if !change.includes(action.kind()) || !change.has_values() {
            return None;
        }

        let config = ConfigSnapshot {
            before: change.before_values().cloned(),
            after: change.after_values().cloned(),
        };
        let values = match action {
            ChangeAction::Delete => config.before.clone(),
            ChangeAction::Create => config.after.clone(),
        };

        Some(Self {
            directory: directory.to_string(),
            address: entry.address.clone(),
            resource_type: entry.resource_type.clone(),
            name: entry.name.clone(),
            action,
            values,
            config,
        })
    }

    /// `type.name`, the module-independent part of the address.
    pub fn short_address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// Collects every change carrying `action`, in directory order and then in
/// plan order. Never fails; unusable entries are left out.
pub fn extract(documents: &PlanSet, action: ChangeAction) -> Vec<ResourceChangeRecord> {
    documents
        .iter()
        .flat_map(|(directory, document)| {
            document
                .resource_changes
                .iter()
                .filter_map(move |entry| {
                    ResourceChangeRecord::from_change(directory, entry, action)
                })
        })
        .collect()
}
