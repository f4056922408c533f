//! Per-category product selection.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::CatalogSnapshot;
use crate::domain::analysis::{Notice, NoticeCode, ScoredProduct, SelectionSet};
use crate::domain::concern::Concern;
use crate::domain::product::Category;
use crate::domain::profile::SkinProfile;
use crate::engine::scoring::ProductScorer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// How far below a conflicting product's score a substitute may score.
    pub substitution_margin: f64,
    /// Budget tiers a product may sit above the profile tier.
    pub budget_headroom: u8,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self { substitution_margin: 0.75, budget_headroom: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOutcome {
    pub selection: SelectionSet,
    /// Constraint-passing pool per category in ranking order, kept for
    /// conflict substitution.
    pub candidates: BTreeMap<Category, Vec<ScoredProduct>>,
    pub notices: Vec<Notice>,
}

/// Categories the profile's concerns call for, plus sun protection.
pub fn requested_categories(concerns: &[Concern]) -> BTreeSet<Category> {
    let mut requested = BTreeSet::from([Category::Spf]);
    for concern in concerns {
        if let Some(knowledge) = concern.concern.knowledge() {
            requested.extend(knowledge.required_categories.iter().copied());
        }
    }
    requested
}

pub fn select_products(
    profile: &SkinProfile,
    concerns: &[Concern],
    scored: &[ScoredProduct],
    catalog: &CatalogSnapshot,
    scorer: &ProductScorer<'_>,
    policy: &SelectionPolicy,
) -> SelectionOutcome {
    let requested = requested_categories(concerns);
    let mut outcome = SelectionOutcome::default();

    for category in Category::ALL {
        let limit = category.slot_limit();
        if limit == 0 {
            continue;
        }

        let mut pool: Vec<ScoredProduct> =
            scored.iter().filter(|candidate| candidate.category() == category).cloned().collect();

        if profile.sensitivity_level.is_gated() {
            let safe_alternative_exists = catalog
                .in_category(category)
                .any(|product| product.sensitivity_safe && scorer.is_eligible(product));
            if safe_alternative_exists {
                pool.retain(|candidate| candidate.product.sensitivity_safe);
            }
        }

        if let Some(tier) = profile.budget_tier {
            let ceiling = tier.rank().saturating_add(policy.budget_headroom);
            let within: Vec<ScoredProduct> = pool
                .iter()
                .filter(|candidate| candidate.product.budget_tier.rank() <= ceiling)
                .cloned()
                .collect();
            if within.is_empty() && !pool.is_empty() {
                info!(
                    event_name = "engine.selection.budget_widened",
                    category = %category,
                    budget_tier = tier.as_str(),
                    "no product within budget, widening to full pool"
                );
                outcome.notices.push(
                    Notice::info(
                        NoticeCode::BudgetWidened,
                        format!(
                            "No {category} is available at or near the {} price tier; \
                             showing the closest available options.",
                            tier.as_str()
                        ),
                    )
                    .with_products(pool.iter().take(limit).map(|c| c.id().clone())),
                );
            } else {
                pool = within;
            }
        }

        if pool.is_empty() {
            if requested.contains(&category) {
                info!(
                    event_name = "engine.selection.category_empty",
                    category = %category,
                    "no eligible product for requested category"
                );
                outcome.notices.push(Notice::info(
                    NoticeCode::EmptyCategory,
                    format!("No suitable {category} was found in the current catalog."),
                ));
            }
            continue;
        }

        let chosen = fill_slots(&pool, limit, concerns);
        outcome.selection.insert(category, chosen);
        outcome.candidates.insert(category, pool);
    }

    outcome
}

/// Gives each concern, in priority order, one slot filled by its best
/// product, then tops up by score.
fn fill_slots(pool: &[ScoredProduct], limit: usize, concerns: &[Concern]) -> Vec<ScoredProduct> {
    let mut chosen: Vec<ScoredProduct> = Vec::with_capacity(limit);
    if limit > 1 {
        for concern in concerns {
            if chosen.len() == limit {
                break;
            }
            let tag = concern.concern.as_str();
            if chosen.iter().any(|picked| picked.product.addresses(tag)) {
                continue;
            }
            if let Some(best) = pool
                .iter()
                .find(|candidate| candidate.product.addresses(tag) && !chosen.contains(candidate))
            {
                chosen.push(best.clone());
            }
        }
    }
    for candidate in pool {
        if chosen.len() == limit {
            break;
        }
        if !chosen.contains(candidate) {
            chosen.push(candidate.clone());
        }
    }
    chosen.sort_by(ScoredProduct::rank_order);
    chosen
}

#[cfg(test)]
mod tests {
    use super::{fill_slots, requested_categories};
    use crate::domain::analysis::ScoredProduct;
    use crate::domain::concern::{Concern, ConcernTag};
    use crate::domain::product::Category;
    use crate::engine::testing::product;

    fn concern(tag: &str, priority: f64) -> Concern {
        Concern {
            concern: ConcernTag::new(tag),
            name: tag.to_string(),
            priority_score: priority,
            reasons: Vec::new(),
        }
    }

    fn scored(id: &str, concerns: &[&str], score: f64) -> ScoredProduct {
        ScoredProduct {
            product: product(id, Category::Serum, concerns),
            match_score: score,
            matched_reasons: Vec::new(),
        }
    }

    #[test]
    fn serum_slots_cover_each_concern_before_filling_by_score() {
        let pool = vec![
            scored("a1", &["acne"], 6.0),
            scored("a2", &["acne"], 5.5),
            scored("a3", &["acne"], 5.0),
            scored("p1", &["pigmentation"], 3.0),
        ];
        let concerns = vec![concern("acne", 2.0), concern("pigmentation", 1.0)];

        let chosen = fill_slots(&pool, 3, &concerns);
        let ids: Vec<&str> = chosen.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "p1"]);
    }

    #[test]
    fn single_slot_categories_take_the_top_product() {
        let pool = vec![scored("p1", &["pigmentation"], 7.0), scored("a1", &["acne"], 6.0)];
        let chosen = fill_slots(&pool, 1, &[concern("acne", 2.0)]);
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id().as_str(), "p1");
    }

    #[test]
    fn spf_is_always_requested() {
        let requested = requested_categories(&[concern("dark-circles", 1.0)]);
        assert!(requested.contains(&Category::Spf));
        assert!(requested.contains(&Category::EyeCream));
        assert!(!requested.contains(&Category::Serum));
    }
}
