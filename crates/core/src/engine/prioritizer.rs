//! Concern priority scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::concern::{canonical_order, Concern, ConcernTag};
use crate::domain::profile::{AcneSeverity, SkinProfile};
use crate::engine::round_score;

/// Bonus applied to both concerns when they are reported together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoOccurrenceBonus {
    pub concerns: [String; 2],
    pub bonus: f64,
}

impl CoOccurrenceBonus {
    fn new(first: &str, second: &str, bonus: f64) -> Self {
        Self { concerns: [first.to_string(), second.to_string()], bonus }
    }

    fn partner_of(&self, tag: &str) -> Option<&str> {
        match &self.concerns {
            [first, second] if first == tag => Some(second),
            [first, second] if second == tag => Some(first),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBonus {
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl Default for SeverityBonus {
    fn default() -> Self {
        Self { mild: 0.25, moderate: 0.5, severe: 1.0 }
    }
}

impl SeverityBonus {
    pub fn for_severity(&self, severity: AcneSeverity) -> f64 {
        match severity {
            AcneSeverity::Mild => self.mild,
            AcneSeverity::Moderate => self.moderate,
            AcneSeverity::Severe => self.severe,
        }
    }
}

/// Weights behind concern prioritization. Every contribution is additive and
/// the final priority is clamped at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub base_weights: BTreeMap<String, f64>,
    pub default_base_weight: f64,
    pub acne_severity_bonus: SeverityBonus,
    /// Split across concerns by the position the user listed them in; the
    /// first concern receives the full amount.
    pub explicit_rank_bonus: f64,
    pub sensitivity_redness_bonus: f64,
    pub co_occurrence: Vec<CoOccurrenceBonus>,
    /// Age range tag to per-concern adjustment.
    pub age_adjustments: BTreeMap<String, BTreeMap<String, f64>>,
    /// Sun exposure tag to per-concern adjustment.
    pub sun_adjustments: BTreeMap<String, BTreeMap<String, f64>>,
}

fn table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(key, value)| ((*key).to_string(), *value)).collect()
}

impl Default for PriorityWeights {
    fn default() -> Self {
        let age_adjustments = [
            (
                "under18",
                table(&[("acne", 0.5), ("oiliness", 0.3), ("aging", -0.7), ("pigmentation", -0.2)]),
            ),
            ("18-25", table(&[("acne", 0.4), ("oiliness", 0.2), ("aging", -0.5)])),
            ("26-35", table(&[("aging", 0.2), ("pigmentation", 0.3), ("dryness", 0.1)])),
            (
                "36-45",
                table(&[("aging", 0.5), ("pigmentation", 0.4), ("dryness", 0.2), ("acne", -0.2)]),
            ),
            (
                "46-55",
                table(&[("aging", 0.7), ("dryness", 0.5), ("pigmentation", 0.3), ("acne", -0.5)]),
            ),
            (
                "56+",
                table(&[("aging", 0.8), ("dryness", 0.6), ("pigmentation", 0.2), ("acne", -0.7)]),
            ),
        ]
        .into_iter()
        .map(|(age, adjustments)| (age.to_string(), adjustments))
        .collect();

        let sun_adjustments = [
            ("moderate", table(&[("pigmentation", 0.3), ("aging", 0.2)])),
            ("high", table(&[("pigmentation", 0.6), ("aging", 0.4)])),
        ]
        .into_iter()
        .map(|(exposure, adjustments)| (exposure.to_string(), adjustments))
        .collect();

        Self {
            base_weights: table(&[
                ("acne", 1.2),
                ("pigmentation", 1.0),
                ("aging", 1.0),
                ("dryness", 1.0),
                ("oiliness", 0.9),
                ("dullness", 0.8),
                ("redness", 1.1),
                ("dark-circles", 0.7),
                ("large-pores", 0.8),
                ("texture", 0.8),
            ]),
            default_base_weight: 0.6,
            acne_severity_bonus: SeverityBonus::default(),
            explicit_rank_bonus: 0.3,
            sensitivity_redness_bonus: 0.4,
            co_occurrence: vec![
                CoOccurrenceBonus::new("acne", "oiliness", 0.2),
                CoOccurrenceBonus::new("acne", "large-pores", 0.15),
                CoOccurrenceBonus::new("oiliness", "large-pores", 0.15),
                CoOccurrenceBonus::new("aging", "pigmentation", 0.15),
                CoOccurrenceBonus::new("aging", "dryness", 0.15),
                CoOccurrenceBonus::new("dullness", "pigmentation", 0.1),
                CoOccurrenceBonus::new("dullness", "texture", 0.1),
                CoOccurrenceBonus::new("acne", "redness", 0.1),
            ],
            age_adjustments,
            sun_adjustments,
        }
    }
}

impl PriorityWeights {
    pub fn base_weight(&self, tag: &str) -> f64 {
        self.base_weights.get(tag).copied().unwrap_or(self.default_base_weight)
    }
}

/// Scores every profile concern and returns them highest priority first, ties
/// broken by canonical concern order.
pub fn prioritize_concerns(profile: &SkinProfile, weights: &PriorityWeights) -> Vec<Concern> {
    let listed = profile.primary_concerns.len();
    let mut concerns: Vec<Concern> = profile
        .primary_concerns
        .iter()
        .enumerate()
        .map(|(position, tag)| score_concern(profile, tag, position, listed, weights))
        .collect();

    concerns.sort_by(|left, right| {
        right
            .priority_score
            .total_cmp(&left.priority_score)
            .then_with(|| canonical_order(left.concern.as_str(), right.concern.as_str()))
    });
    concerns
}

fn score_concern(
    profile: &SkinProfile,
    tag: &ConcernTag,
    position: usize,
    listed: usize,
    weights: &PriorityWeights,
) -> Concern {
    let key = tag.as_str();
    let base = weights.base_weight(key);
    let mut score = base;
    let mut reasons = vec![format!("base weight {base:.2}")];

    if key == "acne" {
        if let Some(severity) = profile.acne_severity {
            let bonus = weights.acne_severity_bonus.for_severity(severity);
            score += bonus;
            reasons.push(format!("{} acne severity {bonus:+.2}", severity.as_str()));
        }
    }

    if listed > 0 && weights.explicit_rank_bonus != 0.0 {
        let bonus = weights.explicit_rank_bonus * (listed - position) as f64 / listed as f64;
        score += bonus;
        reasons.push(format!("listed #{} of {listed} {bonus:+.2}", position + 1));
    }

    for pair in &weights.co_occurrence {
        if let Some(partner) = pair.partner_of(key) {
            if profile.has_concern(partner) {
                score += pair.bonus;
                reasons.push(format!("reported with {partner} {:+.2}", pair.bonus));
            }
        }
    }

    if key == "redness" && profile.is_sensitive() {
        let bonus = weights.sensitivity_redness_bonus;
        score += bonus;
        reasons.push(format!("sensitive skin {bonus:+.2}"));
    }

    if let Some(adjustment) = lookup_adjustment(&weights.age_adjustments, &profile.age_range, key)
    {
        score += adjustment;
        reasons.push(format!(
            "age {} {adjustment:+.2}",
            profile.age_range.as_deref().unwrap_or_default()
        ));
    }

    if let Some(adjustment) =
        lookup_adjustment(&weights.sun_adjustments, &profile.sun_exposure, key)
    {
        score += adjustment;
        reasons.push(format!(
            "{} sun exposure {adjustment:+.2}",
            profile.sun_exposure.as_deref().unwrap_or_default()
        ));
    }

    Concern {
        concern: tag.clone(),
        name: tag.display_name(),
        priority_score: round_score(score.max(0.0)),
        reasons,
    }
}

fn lookup_adjustment(
    table: &BTreeMap<String, BTreeMap<String, f64>>,
    selector: &Option<String>,
    concern: &str,
) -> Option<f64> {
    let selector = selector.as_deref()?;
    table.get(selector)?.get(concern).copied().filter(|value| *value != 0.0)
}
