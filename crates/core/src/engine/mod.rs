//! Consultation analysis pipeline
//!
//! Answers are normalized into a profile, concerns are prioritized, the
//! catalog is scored and selected per category, ingredient conflicts are
//! resolved, and the result is laid out as morning/evening routines with a
//! phased introduction plan. Every stage is a pure function of its inputs.

pub mod composer;
pub mod conflicts;
pub mod normalizer;
pub mod phases;
pub mod prioritizer;
pub mod routine;
pub mod scoring;
pub mod selector;
pub mod tips;

pub use composer::{analysis_digest, generate_complete_analysis, AnalysisEngine};
pub use conflicts::{conflicting_ingredients, detect_conflicts, Conflict};
pub use normalizer::{normalize_profile, RawResponses, TagList};
pub use phases::PhaseSchedule;
pub use prioritizer::{CoOccurrenceBonus, PriorityWeights, SeverityBonus};
pub use scoring::{ProductScorer, ScoringWeights};
pub use selector::{requested_categories, SelectionPolicy};

/// Default scoring weights
pub const DEFAULT_SCORING_WEIGHTS: ScoringWeights = ScoringWeights {
    skin_type: 2.0,
    concern: 1.0,
    ingredient_affinity: 0.2,
    ingredient_affinity_cap: 3,
    sensitivity_penalty: 5.0,
    budget_exact: 1.0,
    budget_adjacent: 0.5,
    climate_tag: 0.25,
    preference_tag: 0.25,
    rating: 0.5,
    avoid_ingredient_penalty: 1.0,
};

/// Rounds to four decimal places so serialized scores stay readable.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
