//! Morning and evening routine assembly.

use crate::domain::analysis::{RoutinePlan, RoutineStep, RoutineTime, ScoredProduct, SelectionSet};
use crate::domain::product::{Category, Frequency, Usage};
use crate::domain::profile::{SkinProfile, SkinType};

pub const MORNING_ORDER: &[Category] = &[
    Category::Cleanser,
    Category::Toner,
    Category::Serum,
    Category::EyeCream,
    Category::Moisturizer,
    Category::Spf,
];

pub const EVENING_ORDER: &[Category] = &[
    Category::Cleanser,
    Category::Toner,
    Category::Treatment,
    Category::Serum,
    Category::EyeCream,
    Category::Mask,
    Category::Moisturizer,
];

/// Whether a product with this category and usage fits at least one routine.
pub fn is_placeable(category: Category, usage: Usage) -> bool {
    (usage.allows_morning() && MORNING_ORDER.contains(&category))
        || (usage.allows_evening() && EVENING_ORDER.contains(&category))
}

pub fn assemble_routines(
    profile: &SkinProfile,
    selection: &SelectionSet,
) -> (RoutinePlan, RoutinePlan) {
    (
        assemble(profile, selection, RoutineTime::Morning),
        assemble(profile, selection, RoutineTime::Evening),
    )
}

fn assemble(profile: &SkinProfile, selection: &SelectionSet, time: RoutineTime) -> RoutinePlan {
    let order = match time {
        RoutineTime::Morning => MORNING_ORDER,
        RoutineTime::Evening => EVENING_ORDER,
    };

    let mut steps = Vec::new();
    for category in order {
        for scored in selection.get(*category) {
            let usage = scored.product.usage;
            let allowed = match time {
                RoutineTime::Morning => usage.allows_morning(),
                RoutineTime::Evening => usage.allows_evening(),
            };
            if allowed {
                steps.push(step_for(profile, scored, time));
            }
        }
    }
    RoutinePlan::new(steps)
}

fn step_for(profile: &SkinProfile, scored: &ScoredProduct, time: RoutineTime) -> RoutineStep {
    let product = &scored.product;
    let mut instructions = base_instruction(profile, product.category, time).to_string();
    match product.frequency {
        Frequency::Daily => {}
        Frequency::Alternate => instructions.push_str(" Use every other day."),
        Frequency::Weekly => instructions.push_str(" Use once a week."),
    }

    RoutineStep {
        step_number: 0,
        product_id: product.product_id.clone(),
        product_name: product.name.clone(),
        brand: product.brand.clone(),
        category: product.category,
        instructions,
        frequency: product.frequency,
        important: matches!(
            (time, product.category),
            (RoutineTime::Morning, Category::Spf) | (RoutineTime::Evening, Category::Treatment)
        ),
    }
}

fn base_instruction(profile: &SkinProfile, category: Category, time: RoutineTime) -> &'static str {
    match (category, time) {
        (Category::Cleanser, RoutineTime::Morning) => {
            if matches!(profile.skin_type, SkinType::Dry | SkinType::Normal) {
                "Optional in the morning if skin feels clean. Use lukewarm water."
            } else {
                "Gently massage onto damp skin, rinse with lukewarm water."
            }
        }
        (Category::Cleanser, RoutineTime::Evening) => {
            "Massage onto damp skin for 60 seconds. Double cleanse first if wearing makeup or SPF."
        }
        (Category::Toner, _) => "Apply to clean skin with a cotton pad or pat in with hands.",
        (Category::Serum, RoutineTime::Morning) => {
            "Apply 2-3 drops to face and neck. Pat gently and wait 30 seconds before the next step."
        }
        (Category::Serum, RoutineTime::Evening) => {
            "Layer serums from thinnest to thickest. Wait 30 seconds between each."
        }
        (Category::EyeCream, _) => {
            "Gently pat a small amount around the eye area using your ring finger."
        }
        (Category::Moisturizer, RoutineTime::Morning) => {
            "Apply evenly to face and neck. Let it absorb for 1-2 minutes."
        }
        (Category::Moisturizer, RoutineTime::Evening) => {
            "Apply generously as the last step to seal in earlier layers."
        }
        (Category::Spf, _) => {
            "Apply generously (two finger lengths). Reapply every 2 hours if outdoors."
        }
        (Category::Treatment, _) => {
            "Apply a thin layer to dry skin. Start slowly and always follow with moisturizer."
        }
        (Category::Mask, _) => "Apply to clean skin, leave on as directed, then rinse or pat in.",
        (Category::Other, _) => "Use as directed.",
    }
}
