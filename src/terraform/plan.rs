//! Terraform JSON plan documents (`terraform show -json <planfile>`).
//!
//! Only the parts needed for move detection are modelled. Individual
//! `resource_changes` entries that do not match the expected shape are
//! dropped instead of failing the whole document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plans::PlanError;

/// Plan documents keyed by directory identifier.
///
/// A `BTreeMap` keeps directory iteration lexicographic, which in turn fixes
/// the order in which change records are extracted and ties are broken.
pub type PlanSet = BTreeMap<String, PlanDocument>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    NoOp,
    Create,
    Read,
    Update,
    Delete,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub actions: Vec<ActionKind>,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

impl Change {
    pub fn includes(&self, action: ActionKind) -> bool {
        self.actions.contains(&action)
    }

    pub fn before_values(&self) -> Option<&Map<String, Value>> {
        self.before.as_ref().and_then(Value::as_object)
    }

    pub fn after_values(&self) -> Option<&Map<String, Value>> {
        self.after.as_ref().and_then(Value::as_object)
    }

    pub fn has_values(&self) -> bool {
        self.before_values().is_some() || self.after_values().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub change: Option<Change>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    pub resource_changes: Vec<ResourceChange>,
}

impl PlanDocument {
    pub fn from_json(input: &str) -> Result<Self, PlanError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PlanError> {
        let Value::Object(mut root) = value else {
            return Err(PlanError::NotAnObject);
        };

        let resource_changes = match root.remove("resource_changes") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| {
                    serde_json::from_value::<ResourceChange>(entry)
                        .inspect_err(|e| {
                            tracing::debug!(
                                index,
                                error = %e,
                                "skipping malformed resource change"
                            );
                        })
                        .ok()
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            format_version: string_field(&root, "format_version"),
            terraform_version: string_field(&root, "terraform_version"),
            resource_changes,
        })
    }
}

fn string_field(root: &Map<String, Value>, key: &str) -> Option<String> {
    root.get(key).and_then(Value::as_str).map(str::to_string)
}
