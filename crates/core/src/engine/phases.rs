//! Staged introduction of recommended products.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::{Phase, PhasePlan, RoutinePlan, ScoredProduct, SelectionSet};
use crate::domain::product::{Category, ProductId};
use crate::domain::profile::{SensitivityLevel, SkinProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSchedule {
    pub targeted_offset_days: u32,
    pub intensive_offset_days: u32,
    /// Used instead of `intensive_offset_days` for severe sensitivity.
    pub severe_intensive_offset_days: u32,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            targeted_offset_days: 7,
            intensive_offset_days: 14,
            severe_intensive_offset_days: 21,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Foundation,
    Targeted,
    Intensive,
}

impl Stage {
    fn index(self) -> u32 {
        match self {
            Self::Foundation => 0,
            Self::Targeted => 1,
            Self::Intensive => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Foundation => "Build the foundation",
            Self::Targeted => "Add targeted care",
            Self::Intensive => "Introduce actives",
        }
    }
}

fn stage_for(product: &ScoredProduct) -> Stage {
    let product = &product.product;
    if matches!(product.category, Category::Treatment | Category::Mask)
        || !product.frequency.is_daily()
    {
        Stage::Intensive
    } else if matches!(product.category, Category::Serum | Category::EyeCream)
        || !product.sensitivity_safe
    {
        Stage::Targeted
    } else {
        Stage::Foundation
    }
}

/// Assigns every routine product to exactly one phase. Phase 0 is always
/// present; later phases only when they introduce something.
pub fn plan_phases(
    profile: &SkinProfile,
    morning: &RoutinePlan,
    evening: &RoutinePlan,
    selection: &SelectionSet,
    schedule: &PhaseSchedule,
) -> PhasePlan {
    let mut seen: Vec<&ProductId> = Vec::new();
    let mut staged: [Vec<ProductId>; 3] = Default::default();

    for product_id in morning.product_ids().chain(evening.product_ids()) {
        if seen.contains(&product_id) {
            continue;
        }
        seen.push(product_id);
        let Some(scored) = selection.find(product_id) else {
            continue;
        };
        staged[stage_for(scored).index() as usize].push(product_id.clone());
    }

    let intensive_offset = if profile.sensitivity_level == SensitivityLevel::Severe {
        schedule.severe_intensive_offset_days
    } else {
        schedule.intensive_offset_days
    };

    let mut phases = Vec::new();
    for (stage, offset) in [
        (Stage::Foundation, 0),
        (Stage::Targeted, schedule.targeted_offset_days),
        (Stage::Intensive, intensive_offset),
    ] {
        let introduced = std::mem::take(&mut staged[stage.index() as usize]);
        if stage != Stage::Foundation && introduced.is_empty() {
            continue;
        }
        phases.push(Phase {
            phase_index: stage.index(),
            start_offset_days: offset,
            label: stage.label().to_string(),
            introduced_product_ids: introduced,
        });
    }
    PhasePlan::new(phases)
}
