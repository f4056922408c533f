use std::collections::BTreeSet;

use regimen_core::catalog::CatalogSnapshot;
use regimen_core::domain::analysis::{NoticeCode, NoticeSeverity, RoutinePlan};
use regimen_core::engine::{AnalysisEngine, ProductScorer, RawResponses, ScoringWeights};
use regimen_core::{Analysis, Category, DomainError, Product, ProductId};

fn products(value: serde_json::Value) -> Vec<Product> {
    serde_json::from_value(value).expect("catalog fixture")
}

fn responses(value: serde_json::Value) -> RawResponses {
    serde_json::from_value(value).expect("responses fixture")
}

fn catalog() -> Vec<Product> {
    products(serde_json::json!([
        {"productId": "cl-gel", "name": "Clarifying Gel Cleanser", "brand": "Mizu", "category": "cleanser",
         "skinTypes": ["oily", "combination"], "concernsAddressed": ["acne", "oiliness"], "sensitivitySafe": true,
         "keyIngredients": ["salicylic-acid"], "budgetTier": "mid", "rating": 4.5},
        {"productId": "cl-cream", "name": "Barrier Cream Cleanser", "brand": "Mizu", "category": "cleanser",
         "skinTypes": ["dry", "normal", "sensitive"], "concernsAddressed": ["dryness", "redness"],
         "sensitivitySafe": true, "keyIngredients": ["ceramides"], "budgetTier": "budget", "rating": 4.2},
        {"productId": "cl-foam", "name": "Deep Foam Cleanser", "brand": "Kori", "category": "cleanser",
         "skinTypes": ["oily"], "concernsAddressed": ["acne"], "sensitivitySafe": false,
         "keyIngredients": ["sulfates"], "budgetTier": "premium", "rating": 4.8},
        {"productId": "tn-bha", "name": "BHA Toner", "brand": "Kori", "category": "toner",
         "skinTypes": ["oily", "combination"], "concernsAddressed": ["acne", "large-pores", "texture"],
         "sensitivitySafe": true, "keyIngredients": ["bha"], "frequency": "2-3 times a week",
         "budgetTier": "mid", "rating": 4.1},
        {"productId": "tn-hydra", "name": "Hydrating Toner", "brand": "Mizu", "category": "toner",
         "skinTypes": ["dry", "normal", "sensitive"], "concernsAddressed": ["dryness"], "sensitivitySafe": true,
         "keyIngredients": ["hyaluronic-acid"], "budgetTier": "budget", "rating": 4.3},
        {"productId": "se-niacin", "name": "Niacinamide Serum", "brand": "Kori", "category": "serum",
         "concernsAddressed": ["acne", "pigmentation", "oiliness", "large-pores"], "sensitivitySafe": true,
         "keyIngredients": ["niacinamide", "zinc"], "budgetTier": "budget", "rating": 4.6},
        {"productId": "se-vitc", "name": "Vitamin C Serum", "brand": "Hana", "category": "serum",
         "concernsAddressed": ["pigmentation", "dullness", "aging"], "sensitivitySafe": false,
         "keyIngredients": ["vitamin-c"], "budgetTier": "mid", "rating": 4.4},
        {"productId": "se-ha", "name": "Hyaluronic Serum", "brand": "Hana", "category": "serum",
         "concernsAddressed": ["dryness", "aging"], "sensitivitySafe": true,
         "keyIngredients": ["hyaluronic-acid", "peptides"], "budgetTier": "mid", "rating": 4.7},
        {"productId": "tr-retinol", "name": "Retinol Night Treatment", "brand": "Hana", "category": "treatment",
         "usage": "evening", "concernsAddressed": ["aging", "acne", "texture"], "sensitivitySafe": false,
         "keyIngredients": ["retinol"], "frequency": "alternate", "budgetTier": "premium", "rating": 4.5},
        {"productId": "tr-spot", "name": "Spot Treatment", "brand": "Kori", "category": "treatment",
         "usage": "evening", "concernsAddressed": ["acne"], "sensitivitySafe": true,
         "keyIngredients": ["benzoyl-peroxide"], "budgetTier": "budget", "rating": 4.0},
        {"productId": "mo-gel", "name": "Oil-Free Gel Moisturizer", "brand": "Mizu", "category": "moisturizer",
         "skinTypes": ["oily", "combination"], "concernsAddressed": ["oiliness", "acne"], "sensitivitySafe": true,
         "keyIngredients": ["niacinamide"], "budgetTier": "mid", "rating": 4.4},
        {"productId": "mo-rich", "name": "Rich Repair Cream", "brand": "Hana", "category": "moisturizer",
         "skinTypes": ["dry", "normal", "sensitive"], "concernsAddressed": ["dryness", "aging"],
         "sensitivitySafe": true, "keyIngredients": ["ceramides", "shea-butter"], "budgetTier": "mid", "rating": 4.6},
        {"productId": "spf-mineral", "name": "Mineral Sunscreen SPF 50", "brand": "Mizu", "category": "sunscreen",
         "usage": "morning", "skinTypes": ["all"], "concernsAddressed": ["redness"], "sensitivitySafe": true,
         "keyIngredients": ["zinc-oxide"], "budgetTier": "mid", "rating": 4.3},
        {"productId": "spf-chem", "name": "Daily Fluid SPF 50", "brand": "Kori", "category": "spf",
         "usage": "morning", "skinTypes": ["oily", "combination"], "concernsAddressed": ["oiliness"],
         "sensitivitySafe": false, "keyIngredients": ["avobenzone"], "budgetTier": "budget", "rating": 4.5},
        {"productId": "ey-caffeine", "name": "Caffeine Eye Cream", "brand": "Hana", "category": "eye-cream",
         "concernsAddressed": ["dark-circles", "puffiness"], "sensitivitySafe": true,
         "keyIngredients": ["caffeine"], "budgetTier": "premium", "rating": 4.2},
        {"productId": "mk-clay", "name": "Clay Mask", "brand": "Kori", "category": "mask", "usage": "evening",
         "skinTypes": ["oily", "combination"], "concernsAddressed": ["oiliness", "large-pores"],
         "sensitivitySafe": true, "keyIngredients": ["clay"], "frequency": "weekly", "budgetTier": "budget",
         "rating": 4.0},
        {"productId": "se-gone", "name": "Sold Out Serum", "brand": "Hana", "category": "serum",
         "concernsAddressed": ["acne"], "sensitivitySafe": true, "budgetTier": "mid", "rating": 5.0,
         "inStock": false}
    ]))
}

fn profiles() -> Vec<RawResponses> {
    vec![
        responses(serde_json::json!({
            "skinType": "oily", "sensitivity": "none", "primaryConcerns": ["acne", "large pores"],
            "acneSeverity": "severe", "budget": "mid", "climate": "hot-humid"
        })),
        responses(serde_json::json!({
            "skinType": "dry", "sensitivityLevel": "somewhat", "primaryConcerns": ["fine lines", "dehydration"],
            "ageRange": "46-55", "sunExposure": "high", "budgetTier": "premium"
        })),
        responses(serde_json::json!({
            "skinType": "sensitive", "sensitivity": "severe", "primaryConcerns": ["redness", "dark spots", "puffiness"],
            "budget": "low", "allergies": ["zinc"]
        })),
        responses(serde_json::json!({
            "skinType": "combination", "primaryConcerns": "dullness, texture", "lifestyleFactors": ["stress"]
        })),
    ]
}

fn analyze(responses: &RawResponses, catalog: &[Product]) -> Analysis {
    AnalysisEngine::default().generate_complete_analysis(responses, catalog).expect("analysis")
}

fn assert_contiguous(plan: &RoutinePlan) {
    let numbers: Vec<u32> = plan.steps().iter().map(|step| step.step_number).collect();
    let expected: Vec<u32> = (1..=plan.len() as u32).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn routine_steps_are_numbered_without_gaps() {
    let catalog = catalog();
    for raw in profiles() {
        let analysis = analyze(&raw, &catalog);
        assert_contiguous(&analysis.morning_routine);
        assert_contiguous(&analysis.evening_routine);
    }
}

#[test]
fn selected_products_stay_in_their_category() {
    let catalog = catalog();
    for raw in profiles() {
        let analysis = analyze(&raw, &catalog);
        for (category, selected) in analysis.recommendations.as_map() {
            assert!(!selected.is_empty());
            assert!(selected.len() <= category.slot_limit());
            assert!(selected.iter().all(|scored| scored.product.category == *category));
        }
        assert!(!analysis.recommendations.contains(&ProductId::from("se-gone")));
    }
}

#[test]
fn identical_input_gives_byte_identical_output() {
    let catalog = catalog();
    let mut reversed = catalog.clone();
    reversed.reverse();

    for raw in profiles() {
        let first = serde_json::to_string(&analyze(&raw, &catalog)).expect("serialize");
        let second = serde_json::to_string(&analyze(&raw, &catalog)).expect("serialize");
        let shuffled = serde_json::to_string(&analyze(&raw, &reversed)).expect("serialize");
        assert_eq!(first, second);
        assert_eq!(first, shuffled);
    }
}

#[test]
fn step_numbers_are_rederived_after_storage_edits() {
    let analysis = analyze(&profiles()[0], &catalog());
    let mut stored = serde_json::to_value(&analysis.evening_routine).expect("serialize");
    let steps = stored.as_array_mut().expect("routine serializes as array");
    assert!(steps.len() >= 3);
    steps.remove(1);
    steps.reverse();

    let restored: RoutinePlan = serde_json::from_value(stored).expect("deserialize");
    assert_eq!(restored.len(), analysis.evening_routine.len() - 1);
    assert_contiguous(&restored);
}

#[test]
fn severe_sensitivity_only_keeps_unsafe_products_without_safe_alternatives() {
    let catalog = catalog();
    let raw = responses(serde_json::json!({
        "skinType": "oily", "sensitivity": "very", "primaryConcerns": ["acne", "aging"], "budget": "premium"
    }));
    let analysis = analyze(&raw, &catalog);

    let snapshot = CatalogSnapshot::new(catalog);
    let scorer =
        ProductScorer::new(&analysis.profile, &analysis.concerns, ScoringWeights::default());
    for selected in analysis.recommendations.iter().filter(|s| !s.product.sensitivity_safe) {
        let safe_alternative = snapshot
            .in_category(selected.product.category)
            .any(|product| product.sensitivity_safe && scorer.is_eligible(product));
        assert!(!safe_alternative, "{} had a safe alternative", selected.id());
        assert!(analysis.notices.iter().any(|notice| {
            notice.code == NoticeCode::SensitivityFallback
                && notice.product_ids.contains(selected.id())
        }));
    }
    assert!(!analysis.recommendations.contains(&ProductId::from("cl-foam")));
    assert!(!analysis.recommendations.contains(&ProductId::from("spf-chem")));
}

fn conflict_catalog(with_substitute: bool) -> Vec<Product> {
    let mut records = vec![
        serde_json::json!({"productId": "cl", "name": "Cleanser", "category": "cleanser",
            "concernsAddressed": ["acne"], "sensitivitySafe": true, "budgetTier": "mid", "rating": 4.0}),
        serde_json::json!({"productId": "tr-retinol", "name": "Retinol", "category": "treatment",
            "usage": "evening", "concernsAddressed": ["acne"], "sensitivitySafe": true,
            "keyIngredients": ["retinol"], "budgetTier": "mid", "rating": 5.0}),
        serde_json::json!({"productId": "tn-aha", "name": "Glycolic Toner", "category": "toner",
            "concernsAddressed": ["acne"], "sensitivitySafe": true, "keyIngredients": ["glycolic-acid"],
            "avoidIngredients": ["retinol"], "budgetTier": "mid", "rating": 4.8}),
    ];
    if with_substitute {
        records.push(serde_json::json!({"productId": "tn-calm", "name": "Calming Toner",
            "category": "toner", "concernsAddressed": ["acne"], "sensitivitySafe": true,
            "keyIngredients": ["centella"], "budgetTier": "mid", "rating": 4.0}));
    }
    products(serde_json::Value::Array(records))
}

fn oily_acne() -> RawResponses {
    responses(serde_json::json!({
        "skinType": "oily", "sensitivityLevel": "none", "primaryConcerns": ["acne"], "budgetTier": "mid"
    }))
}

#[test]
fn unresolved_conflict_is_reported_once_with_both_products() {
    let analysis = analyze(&oily_acne(), &conflict_catalog(false));

    let conflicts: Vec<_> = analysis
        .notices
        .iter()
        .filter(|notice| notice.code == NoticeCode::IngredientConflict)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].severity, NoticeSeverity::Warning);
    assert!(conflicts[0].product_ids.contains(&ProductId::from("tn-aha")));
    assert!(conflicts[0].product_ids.contains(&ProductId::from("tr-retinol")));
    assert!(analysis.recommendations.contains(&ProductId::from("tn-aha")));
}

#[test]
fn conflict_substitution_swaps_the_weaker_product() {
    let analysis = analyze(&oily_acne(), &conflict_catalog(true));

    assert!(!analysis.recommendations.contains(&ProductId::from("tn-aha")));
    assert!(analysis.recommendations.contains(&ProductId::from("tn-calm")));
    assert!(analysis.recommendations.contains(&ProductId::from("tr-retinol")));
    assert!(analysis.notices.iter().all(|notice| notice.code != NoticeCode::IngredientConflict));

    let substitution = analysis
        .notices
        .iter()
        .find(|notice| notice.code == NoticeCode::ConflictSubstituted)
        .expect("substitution notice");
    assert_eq!(substitution.severity, NoticeSeverity::Info);
    assert_eq!(
        substitution.product_ids,
        vec![ProductId::from("tn-aha"), ProductId::from("tn-calm")]
    );
}

#[test]
fn phases_cover_routine_products_exactly_once() {
    let catalog = catalog();
    for raw in profiles() {
        let analysis = analyze(&raw, &catalog);
        let routine: BTreeSet<&ProductId> = analysis
            .morning_routine
            .product_ids()
            .chain(analysis.evening_routine.product_ids())
            .collect();
        let introduced: Vec<&ProductId> =
            analysis.phased_recommendations.introduced_product_ids().collect();
        let unique: BTreeSet<&ProductId> = introduced.iter().copied().collect();

        assert_eq!(introduced.len(), unique.len(), "product introduced twice");
        assert_eq!(unique, routine);
        let selected: BTreeSet<&ProductId> =
            analysis.recommendations.iter().map(|scored| scored.id()).collect();
        assert_eq!(unique, selected);

        let phases = analysis.phased_recommendations.phases();
        assert_eq!(phases[0].start_offset_days, 0);
        assert!(phases
            .windows(2)
            .all(|pair| pair[0].start_offset_days < pair[1].start_offset_days));
    }
}

#[test]
fn concerns_are_ordered_by_priority() {
    let catalog = catalog();
    for raw in profiles() {
        let analysis = analyze(&raw, &catalog);
        assert!(analysis
            .concerns
            .windows(2)
            .all(|pair| pair[0].priority_score >= pair[1].priority_score));
        assert!(analysis.concerns.iter().all(|concern| concern.priority_score >= 0.0));
    }
}

#[test]
fn end_to_end_oily_acne_example() {
    let catalog = products(serde_json::json!([
        {"productId": "cleanser-1", "name": "Acne Gel Cleanser", "category": "cleanser",
         "skinTypes": ["oily"], "concernsAddressed": ["acne"], "sensitivitySafe": true,
         "budgetTier": "mid", "rating": 4.0},
        {"productId": "serum-1", "name": "Luxury Glow Serum", "category": "serum",
         "skinTypes": ["oily"], "concernsAddressed": ["dullness"], "sensitivitySafe": true,
         "budgetTier": "premium", "rating": 4.9}
    ]));

    let analysis = analyze(&oily_acne(), &catalog);

    let cleansers = analysis.recommendations.get(Category::Cleanser);
    assert_eq!(cleansers.len(), 1);
    assert_eq!(cleansers[0].id(), &ProductId::from("cleanser-1"));
    assert!(analysis.recommendations.get(Category::Serum).is_empty());
    assert!(analysis.notices.iter().any(|notice| {
        notice.severity == NoticeSeverity::Info
            && notice.code == NoticeCode::EmptyCategory
            && notice.message.contains("serum")
    }));

    let json = serde_json::to_value(&analysis).expect("serialize");
    assert!(json["recommendations"].get("serum").is_none());
    assert_eq!(json["morningRoutine"][0]["stepNumber"], 1);
    assert_eq!(json["concerns"][0]["concern"], "acne");
}

#[test]
fn budget_ceiling_excludes_far_tiers_unless_nothing_else_exists() {
    let catalog = products(serde_json::json!([
        {"productId": "c-bud", "name": "Basic Cleanser", "category": "cleanser",
         "skinTypes": ["oily"], "sensitivitySafe": true, "budgetTier": "budget", "rating": 3.0},
        {"productId": "c-prem", "name": "Prestige Cleanser", "category": "cleanser",
         "skinTypes": ["oily"], "concernsAddressed": ["acne"], "sensitivitySafe": true,
         "budgetTier": "premium", "rating": 5.0},
        {"productId": "s-prem", "name": "Prestige Serum", "category": "serum",
         "skinTypes": ["oily"], "concernsAddressed": ["acne"], "sensitivitySafe": true,
         "budgetTier": "premium", "rating": 4.5}
    ]));
    let budget_acne = responses(serde_json::json!({
        "skinType": "oily", "primaryConcerns": ["acne"], "budgetTier": "budget"
    }));

    let analysis = analyze(&budget_acne, &catalog);

    let scorer =
        ProductScorer::new(&analysis.profile, &analysis.concerns, ScoringWeights::default());
    let score = |index: usize| scorer.score(&catalog[index]).expect("eligible").match_score;
    assert!(score(1) > score(0), "premium cleanser outscores the budget one");

    let cleansers: Vec<&str> =
        analysis.recommendations.get(Category::Cleanser).iter().map(|c| c.id().as_str()).collect();
    assert_eq!(cleansers, vec!["c-bud"]);

    let serums: Vec<&str> =
        analysis.recommendations.get(Category::Serum).iter().map(|c| c.id().as_str()).collect();
    assert_eq!(serums, vec!["s-prem"]);

    let widened: Vec<_> =
        analysis.notices.iter().filter(|n| n.code == NoticeCode::BudgetWidened).collect();
    assert_eq!(widened.len(), 1);
    assert_eq!(widened[0].severity, NoticeSeverity::Info);
    assert_eq!(widened[0].product_ids, vec![ProductId::from("s-prem")]);
    assert!(widened[0].message.contains("serum"));
    assert!(widened[0].message.contains("budget price tier"));
    assert!(!widened[0].message.contains("budget budget"));
}

#[test]
fn catalog_category_spellings_reach_recommendations() {
    let (records, issues) = regimen_core::catalog::parse_catalog(&serde_json::json!([
        {"productId": "c1", "name": "Foam Cleanser", "category": "Cleanser",
         "skinTypes": ["oily"], "concernsAddressed": ["acne"], "sensitivitySafe": true},
        {"productId": "e1", "name": "Cooling Eye Gel", "category": "eye care",
         "concernsAddressed": ["dark-circles"], "sensitivitySafe": true}
    ]))
    .expect("catalog parses");
    assert!(issues.is_empty());
    assert!(regimen_core::catalog::validate_catalog(&serde_json::json!([
        {"productId": "c1", "name": "Foam Cleanser", "category": "Cleanser"},
        {"productId": "e1", "name": "Cooling Eye Gel", "category": "eye care"}
    ]))
    .expect("records validate")
    .is_empty());

    let tired_oily = responses(serde_json::json!({
        "skinType": "oily", "primaryConcerns": ["acne", "dark circles"]
    }));
    let analysis = analyze(&tired_oily, &records);

    assert_eq!(analysis.recommendations.get(Category::Cleanser)[0].id().as_str(), "c1");
    assert_eq!(analysis.recommendations.get(Category::EyeCream)[0].id().as_str(), "e1");
    assert!(!analysis.notices.iter().any(|notice| {
        notice.code == NoticeCode::EmptyCategory
            && (notice.message.contains("cleanser") || notice.message.contains("eye"))
    }));
}

#[test]
fn missing_inputs_fail_before_scoring() {
    let engine = AnalysisEngine::default();
    let no_concerns = responses(serde_json::json!({"skinType": "oily", "primaryConcerns": []}));
    assert!(matches!(
        engine.generate_complete_analysis(&no_concerns, &catalog()),
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        engine.generate_complete_analysis(&oily_acne(), &[]),
        Err(DomainError::CatalogUnavailable { .. })
    ));
}
