use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::domain::analysis::Analysis;
use crate::domain::product::Product;
use crate::domain::profile::SkinProfile;
use crate::engine::conflicts::resolve_conflicts;
use crate::engine::normalizer::{normalize_profile, RawResponses};
use crate::engine::phases::plan_phases;
use crate::engine::prioritizer::prioritize_concerns;
use crate::engine::routine::assemble_routines;
use crate::engine::scoring::{score_catalog, ProductScorer};
use crate::engine::selector::select_products;
use crate::engine::tips::personalized_tips;
use crate::errors::DomainError;

/// Runs the full consultation pipeline. Holds no state besides its policy
/// table, so one engine can serve any number of analyses.
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates the answers first, then the catalog, and only then scores.
    pub fn generate_complete_analysis(
        &self,
        responses: &RawResponses,
        products: &[Product],
    ) -> Result<Analysis, DomainError> {
        let profile = normalize_profile(responses)?;
        let catalog = CatalogSnapshot::new(products.to_vec());
        catalog.ensure_available()?;
        Ok(self.analyze_profile(profile, &catalog))
    }

    pub fn analyze_profile(&self, profile: SkinProfile, catalog: &CatalogSnapshot) -> Analysis {
        let config = &self.config;

        let concerns = prioritize_concerns(&profile, &config.priority);
        debug!(
            event_name = "engine.concerns.prioritized",
            concerns = concerns.len(),
            top = concerns.first().map(|c| c.concern.as_str()).unwrap_or_default(),
            "concerns prioritized"
        );

        let scorer = ProductScorer::new(&profile, &concerns, config.scoring);
        let scored = score_catalog(&scorer, catalog);
        debug!(
            event_name = "engine.scoring.completed",
            catalog = catalog.len(),
            eligible = scored.len(),
            "catalog scored"
        );

        let outcome =
            select_products(&profile, &concerns, &scored, catalog, &scorer, &config.selection);
        let resolution =
            resolve_conflicts(&profile, outcome.selection, &outcome.candidates, &config.selection);
        let selection = resolution.selection;

        let (morning_routine, evening_routine) = assemble_routines(&profile, &selection);
        let phased_recommendations =
            plan_phases(&profile, &morning_routine, &evening_routine, &selection, &config.phasing);

        let mut notices = outcome.notices;
        notices.extend(resolution.notices);
        let tips = personalized_tips(&profile);

        info!(
            event_name = "engine.analysis.completed",
            selected = selection.len(),
            morning_steps = morning_routine.len(),
            evening_steps = evening_routine.len(),
            phases = phased_recommendations.phases().len(),
            notices = notices.len(),
            "analysis completed"
        );

        Analysis {
            profile,
            concerns,
            recommendations: selection,
            morning_routine,
            evening_routine,
            phased_recommendations,
            notices,
            tips,
        }
    }
}

/// Convenience wrapper over [`AnalysisEngine`] with an explicit policy table.
pub fn generate_complete_analysis(
    responses: &RawResponses,
    products: &[Product],
    config: &EngineConfig,
) -> Result<Analysis, DomainError> {
    AnalysisEngine::new(config.clone()).generate_complete_analysis(responses, products)
}

/// `sha256:`-prefixed digest of the analysis JSON.
pub fn analysis_digest(analysis: &Analysis) -> Result<String, DomainError> {
    let canonical = serde_json::to_vec(analysis).map_err(|error| {
        DomainError::InvariantViolation(format!("analysis is not serializable: {error}"))
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}
