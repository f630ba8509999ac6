//! Resource move detection over Terraform plan documents.
//!
//! The pipeline runs strictly forward and never mutates its inputs:
//!
//! - [`extract`] - flatten plan documents into create/delete change records
//! - [`similarity`] - score a deletion against a creation
//! - [`matching`] - pick the best creation for every deletion
//! - [`report`] - assemble move candidates and presentation records

pub mod extract;
pub mod matching;
pub mod report;
pub mod similarity;

pub use extract::{ChangeAction, ConfigSnapshot, ResourceChangeRecord, ValueMap, extract};
pub use matching::{MoveCandidate, find_best_match, match_exclusive, match_greedy};
pub use report::{MatchReason, MoveReport, SelectOption, detect, detect_with, select_options};
pub use similarity::{NameMatch, Similarity, config_similarity, is_auto_generated_field, score};
