use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{Analysis, RoutinePlan};
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsultationId(pub String);

impl ConsultationId {
    pub fn generate() -> Self {
        Self(format!("CONS-{}", uuid::Uuid::new_v4().simple()).to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routine a customer chose to keep after reviewing an analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoutine {
    pub product_ids: Vec<ProductId>,
    pub morning_routine: RoutinePlan,
    pub evening_routine: RoutinePlan,
    pub saved_at: DateTime<Utc>,
}

impl SavedRoutine {
    pub fn from_analysis(analysis: &Analysis, saved_at: DateTime<Utc>) -> Self {
        let mut product_ids = Vec::new();
        let routine_ids =
            analysis.morning_routine.product_ids().chain(analysis.evening_routine.product_ids());
        for id in routine_ids {
            if !product_ids.contains(id) {
                product_ids.push(id.clone());
            }
        }
        Self {
            product_ids,
            morning_routine: analysis.morning_routine.clone(),
            evening_routine: analysis.evening_routine.clone(),
            saved_at,
        }
    }
}

/// Raw answers plus the analysis computed from them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: ConsultationId,
    pub responses: serde_json::Value,
    pub analysis: Analysis,
    pub analysis_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_routine: Option<SavedRoutine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultation {
    pub fn new(
        id: ConsultationId,
        responses: serde_json::Value,
        analysis: Analysis,
        analysis_digest: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            responses,
            analysis,
            analysis_digest,
            saved_routine: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn save_routine(&mut self, now: DateTime<Utc>) {
        self.saved_routine = Some(SavedRoutine::from_analysis(&self.analysis, now));
        self.updated_at = now;
    }
}
