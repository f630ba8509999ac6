//! tfmv - Terraform state auto-move
//!
//! A library for detecting Terraform resources that moved between directories
//! and relocating their state instead of destroying and recreating them.

pub mod apply;
pub mod backup;
pub mod config;
pub mod discovery;
pub mod moves;
pub mod output;
pub mod plans;
pub mod prompt;
pub mod restore;
pub mod terraform;

mod error;

pub use config::{DetectionConfig, MatchStrategy, SignalWeights};
pub use error::{Result, TfmvError};
pub use moves::{
    ChangeAction, MatchReason, MoveCandidate, MoveReport, ResourceChangeRecord, SelectOption,
    detect, detect_with, select_options,
};
pub use terraform::plan::{PlanDocument, PlanSet};
