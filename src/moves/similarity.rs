use std::collections::BTreeSet;

use serde_json::{Number, Value};

use super::extract::{ResourceChangeRecord, ValueMap};
use crate::config::SignalWeights;

/// A rule marking a value key as auto-generated by the provider.
///
/// Auto-generated keys change whenever a resource is recreated, so they are
/// left out of value comparison entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoGeneratedRule {
    Exact(&'static str),
    Suffix(&'static str),
    Contains(&'static str),
}

impl AutoGeneratedRule {
    pub fn matches(self, key: &str) -> bool {
        match self {
            AutoGeneratedRule::Exact(name) => key == name,
            AutoGeneratedRule::Suffix(suffix) => key.ends_with(suffix),
            AutoGeneratedRule::Contains(fragment) => key.contains(fragment),
        }
    }
}

pub const AUTO_GENERATED_RULES: &[AutoGeneratedRule] = &[
    AutoGeneratedRule::Exact("id"),
    AutoGeneratedRule::Exact("arn"),
    AutoGeneratedRule::Exact("self_link"),
    AutoGeneratedRule::Exact("creation_date"),
    AutoGeneratedRule::Exact("last_modified"),
    AutoGeneratedRule::Exact("etag"),
    AutoGeneratedRule::Exact("version"),
    AutoGeneratedRule::Exact("fingerprint"),
    AutoGeneratedRule::Exact("unique_id"),
    AutoGeneratedRule::Suffix("_id"),
    AutoGeneratedRule::Suffix("_arn"),
    AutoGeneratedRule::Contains("time"),
    AutoGeneratedRule::Contains("date"),
];

pub fn is_auto_generated_field(key: &str) -> bool {
    AUTO_GENERATED_RULES.iter().any(|rule| rule.matches(key))
}

/// How closely two resource names agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    /// Equal or contained in one another once case, `-` and `_` are ignored.
    Similar,
    Different,
}

impl NameMatch {
    pub fn classify(a: &str, b: &str) -> Self {
        if a == b {
            return NameMatch::Exact;
        }

        let (a, b) = (normalize_name(a), normalize_name(b));
        if a == b || a.contains(&b) || b.contains(&a) {
            NameMatch::Similar
        } else {
            NameMatch::Different
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            NameMatch::Exact => 1.0,
            NameMatch::Similar => 0.5,
            NameMatch::Different => 0.0,
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .collect::<String>()
        .to_lowercase()
}

/// Signal breakdown for one deletion/creation pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub name: NameMatch,
    pub config: f64,
    pub score: f64,
}

impl Similarity {
    /// Callers must have checked that both records share a resource type;
    /// the type signal always contributes its full weight.
    pub fn evaluate(
        deletion: &ResourceChangeRecord,
        creation: &ResourceChangeRecord,
        weights: &SignalWeights,
    ) -> Self {
        let name = NameMatch::classify(&deletion.name, &creation.name);
        let config = config_similarity(deletion.values.as_ref(), creation.values.as_ref());

        let total = weights.total();
        let score = if total > 0.0 {
            let matched =
                weights.name * name.factor() + weights.config * config + weights.resource_type;
            (matched / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            name,
            config,
            score,
        }
    }
}

/// Similarity in [0, 1] using the default signal weights.
pub fn score(deletion: &ResourceChangeRecord, creation: &ResourceChangeRecord) -> f64 {
    Similarity::evaluate(deletion, creation, &SignalWeights::default()).score
}

/// Fraction of non auto-generated keys whose values agree.
///
/// Deeply equal values count fully, strings equal after whitespace
/// normalization count half. Returns 0 when either side is missing or no
/// comparable key remains.
pub fn config_similarity(a: Option<&ValueMap>, b: Option<&ValueMap>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };

    let keys: BTreeSet<&str> = a
        .keys()
        .chain(b.keys())
        .map(String::as_str)
        .filter(|key| !is_auto_generated_field(key))
        .collect();

    if keys.is_empty() {
        return 0.0;
    }

    let matched: f64 = keys
        .iter()
        .map(|key| value_score(a.get(*key), b.get(*key)))
        .sum();

    matched / keys.len() as f64
}

fn value_score(a: Option<&Value>, b: Option<&Value>) -> f64 {
    match (a, b) {
        (None, None) => 1.0,
        (Some(a), Some(b)) if deep_equal(a, b) => 1.0,
        (Some(Value::String(a)), Some(Value::String(b)))
            if normalize_whitespace(a) == normalize_whitespace(b) =>
        {
            0.5
        }
        _ => 0.0,
    }
}

/// Structural equality. Arrays and objects never compare equal to each
/// other, and numbers compare by value regardless of integer/float encoding.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| deep_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| deep_equal(value, other)))
        }
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    a.as_f64() == b.as_f64()
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::extract::{ChangeAction, ConfigSnapshot};
    use serde_json::json;

    fn record(
        directory: &str,
        resource_type: &str,
        name: &str,
        action: ChangeAction,
        values: Value,
    ) -> ResourceChangeRecord {
        ResourceChangeRecord {
            directory: directory.to_string(),
            address: format!("{resource_type}.{name}"),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            action,
            values: values.as_object().cloned(),
            config: ConfigSnapshot::default(),
        }
    }

    fn map(value: Value) -> ValueMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_auto_generated_fields() {
        for key in [
            "id",
            "arn",
            "self_link",
            "etag",
            "version",
            "fingerprint",
            "unique_id",
            "vpc_id",
            "role_arn",
            "create_time",
            "timeout",
            "update_date",
            "last_modified",
        ] {
            assert!(is_auto_generated_field(key), "{key} should be excluded");
        }

        for key in ["instance_type", "tags", "name", "identifier", "arns"] {
            assert!(!is_auto_generated_field(key), "{key} should be compared");
        }
    }

    #[test]
    fn test_name_match_tiers() {
        assert_eq!(NameMatch::classify("web", "web"), NameMatch::Exact);
        assert_eq!(NameMatch::classify("Web-Server", "web_server"), NameMatch::Similar);
        assert_eq!(NameMatch::classify("web-server", "web_server_new"), NameMatch::Similar);
        assert_eq!(NameMatch::classify("web", "database"), NameMatch::Different);
    }

    #[test]
    fn test_config_similarity_ignores_generated_keys() {
        let a = map(json!({"instance_type": "t3.micro", "id": "i-123", "subnet_id": "a"}));
        let b = map(json!({"instance_type": "t3.micro", "id": "i-456", "subnet_id": "b"}));
        assert_eq!(config_similarity(Some(&a), Some(&b)), 1.0);
    }

    #[test]
    fn test_config_similarity_partial_and_whitespace() {
        let a = map(json!({"description": "hello   world ", "size": 10, "tags": {"env": "dev"}}));
        let b = map(json!({"description": "hello world", "size": 20, "tags": {"env": "dev"}}));
        // description 0.5 + size 0 + tags 1
        assert!((config_similarity(Some(&a), Some(&b)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_config_similarity_missing_side() {
        let a = map(json!({"size": 10}));
        assert_eq!(config_similarity(Some(&a), None), 0.0);
        assert_eq!(config_similarity(None, Some(&a)), 0.0);
        assert_eq!(config_similarity(None, None), 0.0);
    }

    #[test]
    fn test_config_similarity_only_generated_keys() {
        let a = map(json!({"id": "1", "arn": "x"}));
        let b = map(json!({"id": "2"}));
        assert_eq!(config_similarity(Some(&a), Some(&b)), 0.0);
    }

    #[test]
    fn test_absent_key_differs_from_null() {
        let a = map(json!({"size": 1, "kms_key": null}));
        let b = map(json!({"size": 1}));
        assert_eq!(config_similarity(Some(&a), Some(&b)), 0.5);
    }

    #[test]
    fn test_config_similarity_is_symmetric() {
        let a = map(json!({"a": 1, "b": "x  y", "c": [1, 2], "d": null}));
        let b = map(json!({"a": 1.0, "b": "x y", "c": {"0": 1, "1": 2}, "e": true}));
        assert_eq!(
            config_similarity(Some(&a), Some(&b)),
            config_similarity(Some(&b), Some(&a))
        );
    }

    #[test]
    fn test_deep_equal_structures() {
        assert!(deep_equal(&json!({"a": [1, {"b": null}]}), &json!({"a": [1, {"b": null}]})));
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(!deep_equal(&json!([1, 2]), &json!({"0": 1, "1": 2})));
        assert!(!deep_equal(&json!([]), &json!({})));
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_equal(&json!(null), &json!(false)));
        assert!(!deep_equal(&json!("1"), &json!(1)));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"b": 1})));
    }

    #[test]
    fn test_exact_match_scores_one() {
        let deletion = record(
            "/envA",
            "aws_instance",
            "web",
            ChangeAction::Delete,
            json!({"instance_type": "t3.micro", "id": "i-123"}),
        );
        let creation = record(
            "/envB",
            "aws_instance",
            "web",
            ChangeAction::Create,
            json!({"instance_type": "t3.micro", "id": "i-456"}),
        );
        assert!((score(&deletion, &creation) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similar_name_scores_point_eight_five() {
        let deletion = record(
            "/envA",
            "aws_instance",
            "web-server",
            ChangeAction::Delete,
            json!({"instance_type": "t3.micro"}),
        );
        let creation = record(
            "/envB",
            "aws_instance",
            "web_server_new",
            ChangeAction::Create,
            json!({"instance_type": "t3.micro"}),
        );
        let similarity = Similarity::evaluate(&deletion, &creation, &SignalWeights::default());
        assert_eq!(similarity.name, NameMatch::Similar);
        assert!((similarity.score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_differing_values_score_half() {
        let deletion = record(
            "/envA",
            "aws_instance",
            "web",
            ChangeAction::Delete,
            json!({"instance_type": "t3.micro", "ami": "ami-1"}),
        );
        let creation = record(
            "/envB",
            "aws_instance",
            "web",
            ChangeAction::Create,
            json!({"instance_type": "m5.large", "ami": "ami-2"}),
        );
        assert!((score(&deletion, &creation) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_score_without_config() {
        let deletion = record("/a", "t", "x", ChangeAction::Delete, json!(null));
        let creation = record("/b", "t", "x", ChangeAction::Create, json!({"k": 1}));
        assert!((score(&deletion, &creation) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_custom_weights() {
        let deletion = record("/a", "t", "x", ChangeAction::Delete, json!({"k": 1}));
        let creation = record("/b", "t", "y", ChangeAction::Create, json!({"k": 1}));
        let weights = SignalWeights {
            name: 1.0,
            config: 1.0,
            resource_type: 0.0,
        };
        let similarity = Similarity::evaluate(&deletion, &creation, &weights);
        assert!((similarity.score - 0.5).abs() < 1e-9);
    }
}
