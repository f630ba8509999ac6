use std::fmt;

use serde::Serialize;

use super::extract::{ChangeAction, extract};
use super::matching::{MoveCandidate, match_exclusive, match_greedy};
use super::similarity::{NameMatch, Similarity};
use crate::config::{DetectionConfig, MatchStrategy};
use crate::terraform::plan::PlanSet;

const HIGH_CONFIG_SIMILARITY: f64 = 0.8;
const MEDIUM_CONFIG_SIMILARITY: f64 = 0.5;

/// Signals that supported a move, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    SameName,
    SimilarName,
    SameType,
    HighConfigSimilarity,
    MediumConfigSimilarity,
}

impl MatchReason {
    pub fn label(self) -> &'static str {
        match self {
            MatchReason::SameName => "same resource name",
            MatchReason::SimilarName => "similar resource name",
            MatchReason::SameType => "same resource type",
            MatchReason::HighConfigSimilarity => "high config similarity",
            MatchReason::MediumConfigSimilarity => "medium config similarity",
        }
    }

    pub fn from_similarity(similarity: &Similarity) -> Vec<Self> {
        let mut reasons = Vec::with_capacity(3);

        match similarity.name {
            NameMatch::Exact => reasons.push(MatchReason::SameName),
            NameMatch::Similar => reasons.push(MatchReason::SimilarName),
            NameMatch::Different => {}
        }

        reasons.push(MatchReason::SameType);

        if similarity.config > HIGH_CONFIG_SIMILARITY {
            reasons.push(MatchReason::HighConfigSimilarity);
        } else if similarity.config > MEDIUM_CONFIG_SIMILARITY {
            reasons.push(MatchReason::MediumConfigSimilarity);
        }

        reasons
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub creations: usize,
    pub deletions: usize,
    pub candidates: Vec<MoveCandidate>,
}

impl MoveReport {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Entry handed to a multi-select prompt; `index` points into the
/// candidate list it was rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub index: usize,
    pub label: String,
}

/// Detects moves with the default configuration.
pub fn detect(documents: &PlanSet) -> Vec<MoveCandidate> {
    detect_with(documents, &DetectionConfig::default()).candidates
}

pub fn detect_with(documents: &PlanSet, config: &DetectionConfig) -> MoveReport {
    let creations = extract(documents, ChangeAction::Create);
    let deletions = extract(documents, ChangeAction::Delete);

    tracing::info!(
        creations = creations.len(),
        deletions = deletions.len(),
        directories = documents.len(),
        "extracted resource changes"
    );

    let candidates = match config.strategy {
        MatchStrategy::Greedy => match_greedy(&deletions, &creations, config),
        MatchStrategy::Exclusive => match_exclusive(&deletions, &creations, config),
    };

    tracing::info!(
        count = candidates.len(),
        strategy = ?config.strategy,
        "resource moves detected"
    );

    MoveReport {
        creations: creations.len(),
        deletions: deletions.len(),
        candidates,
    }
}

pub fn select_options(candidates: &[MoveCandidate]) -> Vec<SelectOption> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| SelectOption {
            index,
            label: option_label(candidate),
        })
        .collect()
}

fn option_label(candidate: &MoveCandidate) -> String {
    format!(
        "{}\n│  From:       {} -> {}\n│  To:         {} -> {}\n│  Confidence: {:.1}%\n│  Reason:     {}",
        candidate.from.short_address(),
        candidate.from.directory,
        candidate.from.address,
        candidate.to.directory,
        candidate.to.address,
        candidate.confidence * 100.0,
        candidate.reason_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::plan::PlanDocument;
    use serde_json::{Value, json};

    fn single_change(
        address: &str,
        name: &str,
        actions: Value,
        before: Value,
        after: Value,
    ) -> PlanDocument {
        PlanDocument::from_value(json!({
            "resource_changes": [{
                "address": address,
                "type": "aws_instance",
                "name": name,
                "change": {"actions": actions, "before": before, "after": after}
            }]
        }))
        .unwrap()
    }

    fn moved_instance() -> PlanSet {
        let mut set = PlanSet::new();
        set.insert(
            "/envA".to_string(),
            single_change(
                "aws_instance.web",
                "web",
                json!(["delete"]),
                json!({"instance_type": "t3.micro", "id": "i-123"}),
                json!(null),
            ),
        );
        set.insert(
            "/envB".to_string(),
            single_change(
                "module.app.aws_instance.web",
                "web",
                json!(["create"]),
                json!(null),
                json!({"instance_type": "t3.micro", "id": "i-456"}),
            ),
        );
        set
    }

    #[test]
    fn test_reason_tiers() {
        let similarity = Similarity {
            name: NameMatch::Similar,
            config: 0.6,
            score: 0.75,
        };
        assert_eq!(
            MatchReason::from_similarity(&similarity),
            vec![
                MatchReason::SimilarName,
                MatchReason::SameType,
                MatchReason::MediumConfigSimilarity
            ]
        );

        let similarity = Similarity {
            name: NameMatch::Different,
            config: 0.5,
            score: 0.45,
        };
        assert_eq!(MatchReason::from_similarity(&similarity), vec![MatchReason::SameType]);
    }

    #[test]
    fn test_detect_with_counts() {
        let report = detect_with(&moved_instance(), &DetectionConfig::default());
        assert_eq!(report.creations, 1);
        assert_eq!(report.deletions, 1);
        assert_eq!(report.candidates.len(), 1);
        assert!(!report.is_empty());

        let candidate = &report.candidates[0];
        assert_eq!(candidate.from.address, "aws_instance.web");
        assert_eq!(candidate.to.address, "module.app.aws_instance.web");
    }

    #[test]
    fn test_select_options_label() {
        let candidates = detect(&moved_instance());
        let options = select_options(&candidates);

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].index, 0);
        assert_eq!(
            options[0].label,
            "aws_instance.web\n\
             │  From:       /envA -> aws_instance.web\n\
             │  To:         /envB -> module.app.aws_instance.web\n\
             │  Confidence: 100.0%\n\
             │  Reason:     same resource name, same resource type, high config similarity"
        );
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&MatchReason::HighConfigSimilarity).unwrap();
        assert_eq!(json, "\"high_config_similarity\"");
        assert_eq!(MatchReason::SimilarName.to_string(), "similar resource name");
    }
}
