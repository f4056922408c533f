//! Questionnaire answers to [`SkinProfile`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::concern::ConcernTag;
use crate::domain::profile::{AcneSeverity, BudgetTier, SensitivityLevel, SkinProfile, SkinType};
use crate::domain::tags::{canonical_climate, canonical_tag, canonical_tag_list, canonical_tag_set};
use crate::errors::ValidationError;

/// A questionnaire field that may arrive as a single string or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    One(String),
    Many(Vec<String>),
}

impl TagList {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(value) => value.split(',').collect(),
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Answers as submitted. Every field is optional at this layer; required
/// fields are checked by [`normalize_profile`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponses {
    #[serde(default, alias = "age")]
    pub age_range: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default, alias = "sensitivityLevel")]
    pub sensitivity: Option<String>,
    #[serde(default, alias = "concerns")]
    pub primary_concerns: Option<TagList>,
    #[serde(default)]
    pub acne_severity: Option<String>,
    #[serde(default)]
    pub current_routine: Option<String>,
    #[serde(default)]
    pub sun_exposure: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub lifestyle_factors: Option<TagList>,
    #[serde(default, alias = "budgetTier")]
    pub budget: Option<String>,
    #[serde(default, alias = "preferenceTags")]
    pub preferences: Option<TagList>,
    #[serde(default)]
    pub allergies: Option<TagList>,
    #[serde(default)]
    pub scent_preference: Option<String>,
}

fn optional_tag(value: &Option<String>) -> Option<String> {
    value.as_deref().map(canonical_tag).filter(|tag| !tag.is_empty())
}

fn tag_values(value: &Option<TagList>) -> Vec<&str> {
    value.as_ref().map(TagList::values).unwrap_or_default()
}

/// Validates the answers and builds the canonical profile. Unrecognized
/// optional answers fall back to neutral values; a missing skin type or an
/// empty concern list is rejected.
pub fn normalize_profile(responses: &RawResponses) -> Result<SkinProfile, ValidationError> {
    let raw_skin_type = optional_tag(&responses.skin_type)
        .ok_or_else(|| ValidationError::new("skinType", "is required"))?;
    let skin_type = SkinType::parse(&raw_skin_type).ok_or_else(|| {
        ValidationError::new("skinType", format!("unsupported skin type `{raw_skin_type}`"))
    })?;

    let concerns = canonical_tag_list(tag_values(&responses.primary_concerns));
    let mut primary_concerns: Vec<ConcernTag> = Vec::new();
    for raw in &concerns {
        let tag = ConcernTag::new(raw);
        if !primary_concerns.contains(&tag) {
            primary_concerns.push(tag);
        }
    }
    if primary_concerns.is_empty() {
        return Err(ValidationError::new("primaryConcerns", "at least one concern is required"));
    }

    let sensitivity_level = match optional_tag(&responses.sensitivity) {
        None => SensitivityLevel::None,
        Some(raw) => SensitivityLevel::parse(&raw).unwrap_or_else(|| {
            warn!(
                event_name = "engine.normalize.sensitivity_defaulted",
                value = %raw,
                "unrecognized sensitivity level, treating as none"
            );
            SensitivityLevel::None
        }),
    };

    let acne_severity = optional_tag(&responses.acne_severity).and_then(|raw| {
        let parsed = AcneSeverity::parse(&raw);
        if parsed.is_none() {
            warn!(
                event_name = "engine.normalize.acne_severity_ignored",
                value = %raw,
                "unrecognized acne severity ignored"
            );
        }
        parsed
    });

    let budget_tier = match optional_tag(&responses.budget) {
        None => None,
        Some(raw) if raw == "no-preference" || raw == "any" => None,
        Some(raw) => {
            let parsed = BudgetTier::parse(&raw);
            if parsed.is_none() {
                warn!(
                    event_name = "engine.normalize.budget_ignored",
                    value = %raw,
                    "unrecognized budget tier, treating as no preference"
                );
            }
            parsed
        }
    };

    let mut preference_tags = canonical_tag_set(tag_values(&responses.preferences));
    if matches!(
        optional_tag(&responses.scent_preference).as_deref(),
        Some("unscented" | "fragrance-free")
    ) {
        preference_tags.insert("fragrance-free".to_string());
    }

    Ok(SkinProfile {
        skin_type,
        sensitivity_level,
        age_range: optional_tag(&responses.age_range),
        gender: optional_tag(&responses.gender),
        primary_concerns,
        acne_severity,
        climate: responses
            .climate
            .as_deref()
            .map(canonical_climate)
            .filter(|tag| !tag.is_empty()),
        sun_exposure: optional_tag(&responses.sun_exposure),
        lifestyle_factors: canonical_tag_set(tag_values(&responses.lifestyle_factors)),
        budget_tier,
        preference_tags,
        allergies: canonical_tag_set(tag_values(&responses.allergies)),
        current_routine: optional_tag(&responses.current_routine),
    })
}
