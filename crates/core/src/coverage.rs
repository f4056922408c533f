//! Catalog coverage over a grid of representative profiles.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;

use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::domain::concern::canonical_concern_tags;
use crate::domain::product::{Category, ProductId};
use crate::domain::profile::{BudgetTier, SensitivityLevel, SkinProfile, SkinType};
use crate::engine::{requested_categories, AnalysisEngine};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStat {
    pub total: usize,
    pub covered: usize,
}

impl CoverageStat {
    fn record(&mut self, covered: bool) {
        self.total += 1;
        if covered {
            self.covered += 1;
        }
    }

    pub fn missing(&self) -> usize {
        self.total - self.covered
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub total_profiles: usize,
    pub fully_covered_profiles: usize,
    /// Profiles that requested the category, and how many got a product.
    pub categories: BTreeMap<Category, CoverageStat>,
    pub concerns: BTreeMap<String, CoverageStat>,
    pub skin_types: BTreeMap<SkinType, CoverageStat>,
    pub product_frequency: BTreeMap<ProductId, usize>,
    pub never_recommended: Vec<ProductId>,
}

impl CoverageReport {
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_profiles == 0 {
            return 0.0;
        }
        self.fully_covered_profiles as f64 / self.total_profiles as f64
    }
}

/// Every skin type, sensitivity level, canonical concern and budget tier.
pub fn profile_grid() -> Vec<SkinProfile> {
    let mut profiles = Vec::new();
    for skin_type in SkinType::ALL {
        for sensitivity in SensitivityLevel::ALL {
            for concern in canonical_concern_tags() {
                for budget in BudgetTier::ALL {
                    let mut profile = SkinProfile::new(skin_type, vec![concern.clone()]);
                    profile.sensitivity_level = sensitivity;
                    profile.budget_tier = Some(budget);
                    profiles.push(profile);
                }
            }
        }
    }
    profiles
}

pub fn analyze_coverage(catalog: &CatalogSnapshot, config: &EngineConfig) -> CoverageReport {
    let engine = AnalysisEngine::new(config.clone());
    let mut report = CoverageReport::default();

    for profile in profile_grid() {
        let skin_type = profile.skin_type;
        let concern = profile
            .primary_concerns
            .first()
            .map(|tag| tag.as_str().to_string())
            .unwrap_or_default();

        let analysis = engine.analyze_profile(profile, catalog);
        let requested = requested_categories(&analysis.concerns);
        let filled: BTreeSet<Category> = analysis.recommendations.categories().collect();

        for category in &requested {
            report.categories.entry(*category).or_default().record(filled.contains(category));
        }
        let complete = requested.is_subset(&filled);
        report.concerns.entry(concern).or_default().record(complete);
        report.skin_types.entry(skin_type).or_default().record(complete);

        for scored in analysis.recommendations.iter() {
            *report.product_frequency.entry(scored.id().clone()).or_default() += 1;
        }

        report.total_profiles += 1;
        if complete {
            report.fully_covered_profiles += 1;
        }
    }

    report.never_recommended = catalog
        .products()
        .iter()
        .map(|product| product.product_id.clone())
        .filter(|id| !report.product_frequency.contains_key(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    info!(
        event_name = "coverage.analysis.completed",
        total_profiles = report.total_profiles,
        fully_covered = report.fully_covered_profiles,
        never_recommended = report.never_recommended.len(),
        "coverage analysis completed"
    );
    report
}
