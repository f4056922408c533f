//! Ingredient conflict detection and one-pass substitution.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::domain::analysis::{Notice, NoticeCode, ScoredProduct, SelectionSet};
use crate::domain::product::{Category, Product, ProductId};
use crate::domain::profile::SkinProfile;
use crate::engine::selector::SelectionPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub first: ProductId,
    pub second: ProductId,
    pub ingredients: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResolution {
    pub selection: SelectionSet,
    pub notices: Vec<Notice>,
}

/// Ingredients either product warns against that the other one contains.
pub fn conflicting_ingredients(left: &Product, right: &Product) -> BTreeSet<String> {
    left.avoid_ingredients
        .intersection(&right.key_ingredients)
        .chain(right.avoid_ingredients.intersection(&left.key_ingredients))
        .cloned()
        .collect()
}

/// Every conflicting pair in the selection, ordered by product id.
pub fn detect_conflicts(selection: &SelectionSet) -> Vec<Conflict> {
    let mut products: Vec<&ScoredProduct> = selection.iter().collect();
    products.sort_by(|left, right| left.id().cmp(right.id()));

    let mut conflicts = Vec::new();
    for (index, left) in products.iter().enumerate() {
        for right in &products[index + 1..] {
            let ingredients = conflicting_ingredients(&left.product, &right.product);
            if !ingredients.is_empty() {
                conflicts.push(Conflict {
                    first: left.id().clone(),
                    second: right.id().clone(),
                    ingredients,
                });
            }
        }
    }
    conflicts
}

fn conflicts_with_selection(
    candidate: &ScoredProduct,
    selection: &SelectionSet,
    outgoing: &ProductId,
) -> bool {
    selection
        .iter()
        .filter(|selected| selected.id() != outgoing)
        .any(|selected| !conflicting_ingredients(&candidate.product, &selected.product).is_empty())
}

fn find_substitute<'a>(
    loser: &ScoredProduct,
    selection: &SelectionSet,
    candidates: &'a BTreeMap<Category, Vec<ScoredProduct>>,
    policy: &SelectionPolicy,
) -> Option<&'a ScoredProduct> {
    let floor = loser.match_score - policy.substitution_margin;
    candidates.get(&loser.category())?.iter().find(|candidate| {
        candidate.id() != loser.id()
            && !selection.contains(candidate.id())
            && candidate.match_score >= floor
            && !conflicts_with_selection(candidate, selection, loser.id())
    })
}

/// Runs a single substitution pass over detected conflicts, then reports
/// what remains. The lower-ranked product of a pair is replaced by the best
/// same-category candidate that scores within the policy margin and clashes
/// with nothing else selected.
pub fn resolve_conflicts(
    profile: &SkinProfile,
    selection: SelectionSet,
    candidates: &BTreeMap<Category, Vec<ScoredProduct>>,
    policy: &SelectionPolicy,
) -> ConflictResolution {
    let mut selection = selection;
    let mut notices = Vec::new();
    let mut touched: BTreeSet<ProductId> = BTreeSet::new();

    for conflict in detect_conflicts(&selection) {
        if touched.contains(&conflict.first) || touched.contains(&conflict.second) {
            continue;
        }
        let (Some(first), Some(second)) =
            (selection.find(&conflict.first).cloned(), selection.find(&conflict.second).cloned())
        else {
            continue;
        };
        let (winner, loser) = match first.rank_order(&second) {
            Ordering::Greater => (second, first),
            _ => (first, second),
        };

        let Some(substitute) = find_substitute(&loser, &selection, candidates, policy).cloned()
        else {
            continue;
        };

        info!(
            event_name = "engine.conflict.substituted",
            removed = %loser.id(),
            substitute = %substitute.id(),
            kept = %winner.id(),
            "replaced conflicting product"
        );
        notices.push(
            Notice::info(
                NoticeCode::ConflictSubstituted,
                format!(
                    "{} was swapped for {} to avoid combining {} with {}.",
                    loser.product.name,
                    substitute.product.name,
                    join(&conflict.ingredients),
                    winner.product.name
                ),
            )
            .with_products([loser.id().clone(), substitute.id().clone()])
            .with_ingredients(conflict.ingredients.iter().cloned()),
        );
        touched.insert(loser.id().clone());
        touched.insert(substitute.id().clone());
        selection.replace(loser.id(), substitute);
    }

    for conflict in detect_conflicts(&selection) {
        warn!(
            event_name = "engine.conflict.unresolved",
            first = %conflict.first,
            second = %conflict.second,
            "ingredient conflict left in selection"
        );
        let name = |id: &ProductId| {
            selection.find(id).map(|s| s.product.name.clone()).unwrap_or_else(|| id.to_string())
        };
        notices.push(
            Notice::warning(
                NoticeCode::IngredientConflict,
                format!(
                    "{} and {} both contain or warn against {}; \
                     use them at different times of day or on alternate days.",
                    name(&conflict.first),
                    name(&conflict.second),
                    join(&conflict.ingredients)
                ),
            )
            .with_products([conflict.first.clone(), conflict.second.clone()])
            .with_ingredients(conflict.ingredients.iter().cloned()),
        );
    }

    if profile.sensitivity_level.is_gated() {
        for selected in selection.iter().filter(|s| !s.product.sensitivity_safe) {
            notices.push(
                Notice::warning(
                    NoticeCode::SensitivityFallback,
                    format!(
                        "No sensitivity-safe {} is available; patch test {} before regular use.",
                        selected.category(),
                        selected.product.name
                    ),
                )
                .with_products([selected.id().clone()]),
            );
        }
    }

    ConflictResolution { selection, notices }
}

fn join(ingredients: &BTreeSet<String>) -> String {
    ingredients.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{conflicting_ingredients, detect_conflicts, resolve_conflicts};
    use crate::domain::analysis::{NoticeCode, NoticeSeverity, ScoredProduct, SelectionSet};
    use crate::domain::concern::ConcernTag;
    use crate::domain::product::Category;
    use crate::domain::profile::{SkinProfile, SkinType};
    use crate::engine::selector::SelectionPolicy;
    use crate::engine::testing::product;

    fn scored(
        id: &str,
        category: Category,
        key: &[&str],
        avoid: &[&str],
        score: f64,
    ) -> ScoredProduct {
        let mut product = product(id, category, &["acne"]);
        product.key_ingredients = key.iter().map(|i| i.to_string()).collect();
        product.avoid_ingredients = avoid.iter().map(|i| i.to_string()).collect();
        ScoredProduct { product, match_score: score, matched_reasons: Vec::new() }
    }

    fn profile() -> SkinProfile {
        SkinProfile::new(SkinType::Oily, vec![ConcernTag::new("acne")])
    }

    #[test]
    fn conflict_is_symmetric() {
        let retinol = scored("t1", Category::Treatment, &["retinol"], &[], 5.0);
        let acid = scored("s1", Category::Serum, &["glycolic-acid"], &["retinol"], 4.0);

        assert_eq!(
            conflicting_ingredients(&retinol.product, &acid.product),
            conflicting_ingredients(&acid.product, &retinol.product)
        );
        assert_eq!(
            conflicting_ingredients(&retinol.product, &acid.product),
            BTreeSet::from(["retinol".to_string()])
        );
    }

    #[test]
    fn lower_ranked_product_is_substituted_within_margin() {
        let treatment = scored("t1", Category::Treatment, &["retinol"], &[], 6.0);
        let acid = scored("s1", Category::Serum, &["glycolic-acid"], &["retinol"], 5.0);
        let calm = scored("s2", Category::Serum, &["centella"], &[], 4.5);

        let mut selection = SelectionSet::new();
        selection.insert(Category::Treatment, vec![treatment.clone()]);
        selection.insert(Category::Serum, vec![acid.clone()]);
        let candidates = BTreeMap::from([
            (Category::Treatment, vec![treatment]),
            (Category::Serum, vec![acid, calm]),
        ]);

        let resolution =
            resolve_conflicts(&profile(), selection, &candidates, &SelectionPolicy::default());

        let ids: Vec<&str> = resolution.selection.iter().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["s2", "t1"]);
        assert!(detect_conflicts(&resolution.selection).is_empty());
        assert_eq!(resolution.notices.len(), 1);
        assert_eq!(resolution.notices[0].code, NoticeCode::ConflictSubstituted);
        assert_eq!(resolution.notices[0].severity, NoticeSeverity::Info);
    }

    #[test]
    fn unresolved_conflict_becomes_warning() {
        let treatment = scored("t1", Category::Treatment, &["retinol"], &[], 6.0);
        let acid = scored("s1", Category::Serum, &["glycolic-acid"], &["retinol"], 5.0);
        let weak = scored("s2", Category::Serum, &["centella"], &[], 1.0);

        let mut selection = SelectionSet::new();
        selection.insert(Category::Treatment, vec![treatment.clone()]);
        selection.insert(Category::Serum, vec![acid.clone()]);
        let candidates = BTreeMap::from([
            (Category::Treatment, vec![treatment]),
            (Category::Serum, vec![acid, weak]),
        ]);

        let resolution =
            resolve_conflicts(&profile(), selection, &candidates, &SelectionPolicy::default());

        assert_eq!(resolution.selection.len(), 2);
        let warnings: Vec<_> = resolution
            .notices
            .iter()
            .filter(|n| n.code == NoticeCode::IngredientConflict)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, NoticeSeverity::Warning);
        assert_eq!(warnings[0].ingredients, vec!["retinol".to_string()]);
    }
}
