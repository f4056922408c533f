//! Product scoring against a profile and its prioritized concerns.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CatalogSnapshot;
use crate::domain::analysis::ScoredProduct;
use crate::domain::concern::{Concern, SENSITIVE_AVOID_INGREDIENTS};
use crate::domain::product::Product;
use crate::domain::profile::SkinProfile;
use crate::engine::{round_score, routine};

/// Weights for scoring signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Product lists the profile's skin type (default: 2.0)
    pub skin_type: f64,
    /// Multiplied by the priority of every addressed concern (default: 1.0)
    pub concern: f64,
    /// Per key ingredient recommended for the profile's concerns (default: 0.2)
    pub ingredient_affinity: f64,
    /// Maximum number of ingredient matches that count (default: 3)
    pub ingredient_affinity_cap: u32,
    /// Subtracted for non sensitivity-safe products on gated profiles (default: 5.0)
    pub sensitivity_penalty: f64,
    /// Product budget tier equals the profile tier (default: 1.0)
    pub budget_exact: f64,
    /// Product budget tier is one step away (default: 0.5)
    pub budget_adjacent: f64,
    /// Product suits the profile's climate (default: 0.25)
    pub climate_tag: f64,
    /// Per matching preference tag (default: 0.25)
    pub preference_tag: f64,
    /// Scaled by rating / 5 (default: 0.5)
    pub rating: f64,
    /// Subtracted when a key ingredient should be avoided (default: 1.0)
    pub avoid_ingredient_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_SCORING_WEIGHTS
    }
}

/// Why a product never reaches scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exclusion {
    Allergen(Vec<String>),
    Irrelevant,
    Unplaceable,
}

#[derive(Debug, Clone)]
pub struct ProductScorer<'a> {
    profile: &'a SkinProfile,
    weights: ScoringWeights,
    concern_priority: BTreeMap<String, f64>,
    preferred_ingredients: BTreeSet<String>,
    avoided_ingredients: BTreeSet<String>,
}

impl<'a> ProductScorer<'a> {
    pub fn new(profile: &'a SkinProfile, concerns: &[Concern], weights: ScoringWeights) -> Self {
        let mut concern_priority = BTreeMap::new();
        let mut preferred_ingredients = BTreeSet::new();
        let mut avoided_ingredients = BTreeSet::new();

        for concern in concerns {
            concern_priority.insert(concern.concern.as_str().to_string(), concern.priority_score);
            if let Some(knowledge) = concern.concern.knowledge() {
                preferred_ingredients
                    .extend(knowledge.key_ingredients.iter().map(|i| i.to_string()));
                avoided_ingredients
                    .extend(knowledge.avoid_ingredients.iter().map(|i| i.to_string()));
            }
        }
        if profile.is_sensitive() {
            avoided_ingredients.extend(SENSITIVE_AVOID_INGREDIENTS.iter().map(|i| i.to_string()));
        }
        // An ingredient a concern relies on is never penalized for another.
        let avoided_ingredients =
            avoided_ingredients.difference(&preferred_ingredients).cloned().collect();

        Self { profile, weights, concern_priority, preferred_ingredients, avoided_ingredients }
    }

    fn addresses_any_concern(&self, product: &Product) -> bool {
        product.concerns_addressed.iter().any(|tag| self.concern_priority.contains_key(tag))
    }

    /// Hard exclusions applied before any scoring.
    pub fn exclusion(&self, product: &Product) -> Option<Exclusion> {
        let allergens: Vec<String> =
            product.key_ingredients.intersection(&self.profile.allergies).cloned().collect();
        if !allergens.is_empty() {
            return Some(Exclusion::Allergen(allergens));
        }
        if !routine::is_placeable(product.category, product.usage) {
            return Some(Exclusion::Unplaceable);
        }
        let concern_overlap = self.addresses_any_concern(product);
        let relevant = if product.category.is_targeted() {
            concern_overlap
        } else {
            concern_overlap || product.suits_skin_type(self.profile.skin_type)
        };
        if !relevant {
            return Some(Exclusion::Irrelevant);
        }
        None
    }

    pub fn is_eligible(&self, product: &Product) -> bool {
        self.exclusion(product).is_none()
    }

    pub fn score(&self, product: &Product) -> Option<ScoredProduct> {
        if let Some(exclusion) = self.exclusion(product) {
            debug!(
                event_name = "engine.scoring.excluded",
                product_id = %product.product_id,
                reason = ?exclusion,
                "product excluded before scoring"
            );
            return None;
        }

        let weights = &self.weights;
        let profile = self.profile;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if product.suits_skin_type(profile.skin_type) {
            score += weights.skin_type;
            reasons.push(format!("suits {} skin", profile.skin_type));
        }

        for (tag, priority) in &self.concern_priority {
            if product.addresses(tag) {
                score += weights.concern * priority;
                reasons.push(format!("targets {tag}"));
            }
        }

        let affinity: Vec<&String> =
            product.key_ingredients.intersection(&self.preferred_ingredients).collect();
        if !affinity.is_empty() {
            let counted = affinity.len().min(weights.ingredient_affinity_cap as usize);
            score += weights.ingredient_affinity * counted as f64;
            let names: Vec<&str> = affinity.iter().take(counted).map(|i| i.as_str()).collect();
            reasons.push(format!("contains {}", names.join(", ")));
        }

        if profile.sensitivity_level.is_gated() && !product.sensitivity_safe {
            score -= weights.sensitivity_penalty;
            reasons.push("not marked sensitivity-safe".to_string());
        }

        match profile.budget_tier {
            None => score += weights.budget_exact,
            Some(tier) => match tier.distance(product.budget_tier) {
                0 => {
                    score += weights.budget_exact;
                    reasons.push(format!("{} budget match", tier.as_str()));
                }
                1 => score += weights.budget_adjacent,
                _ => {}
            },
        }

        if let Some(climate) = &profile.climate {
            if product.climate_suitability.contains(climate)
                || product.climate_suitability.contains("all")
            {
                score += weights.climate_tag;
                reasons.push(format!("suited to {climate} climate"));
            }
        }

        let preferences: Vec<&String> =
            product.preferences.intersection(&profile.preference_tags).collect();
        if !preferences.is_empty() {
            score += weights.preference_tag * preferences.len() as f64;
            let names: Vec<&str> = preferences.iter().map(|p| p.as_str()).collect();
            reasons.push(format!("matches {}", names.join(", ")));
        }

        score += weights.rating * (product.rating.clamp(0.0, 5.0) / 5.0);

        let avoided: Vec<&String> =
            product.key_ingredients.intersection(&self.avoided_ingredients).collect();
        if !avoided.is_empty() {
            score -= weights.avoid_ingredient_penalty;
            let names: Vec<&str> = avoided.iter().map(|i| i.as_str()).collect();
            reasons.push(format!("contains {} to avoid", names.join(", ")));
        }

        Some(ScoredProduct {
            product: product.clone(),
            match_score: round_score(score),
            matched_reasons: reasons,
        })
    }
}

/// Scores every eligible catalog product, returned in ranking order.
pub fn score_catalog(scorer: &ProductScorer<'_>, catalog: &CatalogSnapshot) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> =
        catalog.products().iter().filter_map(|product| scorer.score(product)).collect();
    scored.sort_by(ScoredProduct::rank_order);
    scored
}
