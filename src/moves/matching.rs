use serde::Serialize;

use super::extract::ResourceChangeRecord;
use super::report::MatchReason;
use super::similarity::Similarity;
use crate::config::DetectionConfig;

/// A deletion paired with the creation it most likely became.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCandidate {
    pub from: ResourceChangeRecord,
    pub to: ResourceChangeRecord,
    pub confidence: f64,
    pub reason: Vec<MatchReason>,
}

impl MoveCandidate {
    fn new(
        deletion: &ResourceChangeRecord,
        creation: &ResourceChangeRecord,
        similarity: &Similarity,
    ) -> Self {
        Self {
            from: deletion.clone(),
            to: creation.clone(),
            confidence: similarity.score,
            reason: MatchReason::from_similarity(similarity),
        }
    }

    pub fn reason_text(&self) -> String {
        self.reason
            .iter()
            .map(|reason| reason.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Same-directory pairs are plain replacements and cross-type pairs can
/// never be the same resource.
fn is_eligible(deletion: &ResourceChangeRecord, creation: &ResourceChangeRecord) -> bool {
    deletion.directory != creation.directory && deletion.resource_type == creation.resource_type
}

/// Best creation for `deletion`, if its score strictly exceeds the threshold.
///
/// Only a strictly higher score replaces the current best, so on ties the
/// creation extracted first wins.
pub fn find_best_match(
    deletion: &ResourceChangeRecord,
    creations: &[ResourceChangeRecord],
    config: &DetectionConfig,
) -> Option<MoveCandidate> {
    let mut best: Option<(&ResourceChangeRecord, Similarity)> = None;

    for creation in creations.iter().filter(|c| is_eligible(deletion, c)) {
        let similarity = Similarity::evaluate(deletion, creation, &config.weights);
        tracing::trace!(
            from = %deletion.address,
            to = %creation.address,
            score = similarity.score,
            "scored pair"
        );

        if best
            .as_ref()
            .is_none_or(|(_, current)| similarity.score > current.score)
        {
            best = Some((creation, similarity));
        }
    }

    let (creation, similarity) = best?;
    if similarity.score > config.threshold {
        Some(MoveCandidate::new(deletion, creation, &similarity))
    } else {
        tracing::debug!(
            address = %deletion.address,
            directory = %deletion.directory,
            best_score = similarity.score,
            "no creation above threshold"
        );
        None
    }
}

/// Every deletion picks its own best creation; creations may be shared.
pub fn match_greedy(
    deletions: &[ResourceChangeRecord],
    creations: &[ResourceChangeRecord],
    config: &DetectionConfig,
) -> Vec<MoveCandidate> {
    deletions
        .iter()
        .filter_map(|deletion| find_best_match(deletion, creations, config))
        .collect()
}

/// One-to-one assignment: pairs above the threshold are taken highest score
/// first, each deletion and creation at most once. Ties go to the earlier
/// deletion, then the earlier creation. Results keep deletion order.
pub fn match_exclusive(
    deletions: &[ResourceChangeRecord],
    creations: &[ResourceChangeRecord],
    config: &DetectionConfig,
) -> Vec<MoveCandidate> {
    let mut pairs: Vec<(usize, usize, Similarity)> = Vec::new();
    for (d, deletion) in deletions.iter().enumerate() {
        for (c, creation) in creations.iter().enumerate() {
            if !is_eligible(deletion, creation) {
                continue;
            }
            let similarity = Similarity::evaluate(deletion, creation, &config.weights);
            if similarity.score > config.threshold {
                pairs.push((d, c, similarity));
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.2.score
            .total_cmp(&a.2.score)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });

    let mut deletion_taken = vec![false; deletions.len()];
    let mut creation_taken = vec![false; creations.len()];
    let mut assigned: Vec<(usize, MoveCandidate)> = Vec::new();

    for (d, c, similarity) in &pairs {
        if deletion_taken[*d] || creation_taken[*c] {
            continue;
        }
        deletion_taken[*d] = true;
        creation_taken[*c] = true;
        assigned.push((*d, MoveCandidate::new(&deletions[*d], &creations[*c], similarity)));
    }

    assigned.sort_by_key(|(d, _)| *d);
    assigned.into_iter().map(|(_, candidate)| candidate).collect()
}
