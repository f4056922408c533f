use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::concern::ConcernTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkinType {
    Dry,
    Oily,
    Combination,
    Normal,
    SensitiveLeaning,
}

impl SkinType {
    pub const ALL: [SkinType; 5] =
        [Self::Dry, Self::Oily, Self::Combination, Self::Normal, Self::SensitiveLeaning];

    pub fn parse(raw: &str) -> Option<Self> {
        match crate::domain::tags::canonical_tag(raw).as_str() {
            "dry" => Some(Self::Dry),
            "oily" => Some(Self::Oily),
            "combination" | "combo" => Some(Self::Combination),
            "normal" | "not-sure" => Some(Self::Normal),
            "sensitive" | "sensitive-leaning" => Some(Self::SensitiveLeaning),
            _ => None,
        }
    }

    /// Tag used in a product's `skinTypes` set.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Dry => "dry",
            Self::Oily => "oily",
            Self::Combination => "combination",
            Self::Normal => "normal",
            Self::SensitiveLeaning => "sensitive",
        }
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl SensitivityLevel {
    pub const ALL: [SensitivityLevel; 4] = [Self::None, Self::Mild, Self::Moderate, Self::Severe];

    pub fn parse(raw: &str) -> Option<Self> {
        match crate::domain::tags::canonical_tag(raw).as_str() {
            "none" | "not" | "not-sensitive" => Some(Self::None),
            "mild" | "slightly" => Some(Self::Mild),
            "moderate" | "somewhat" => Some(Self::Moderate),
            "severe" | "very" | "very-sensitive" => Some(Self::Severe),
            _ => None,
        }
    }

    /// Moderate and severe sensitivity gate products that are not marked
    /// sensitivity-safe.
    pub fn is_gated(self) -> bool {
        matches!(self, Self::Moderate | Self::Severe)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcneSeverity {
    Mild,
    Moderate,
    Severe,
}

impl AcneSeverity {
    pub fn parse(raw: &str) -> Option<Self> {
        match crate::domain::tags::canonical_tag(raw).as_str() {
            "mild" => Some(Self::Mild),
            "moderate" => Some(Self::Moderate),
            "severe" => Some(Self::Severe),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum BudgetTier {
    Budget,
    #[default]
    Mid,
    Premium,
}

impl TryFrom<String> for BudgetTier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown budget tier `{value}`"))
    }
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [Self::Budget, Self::Mid, Self::Premium];

    pub fn parse(raw: &str) -> Option<Self> {
        match crate::domain::tags::canonical_tag(raw).as_str() {
            "budget" | "low" => Some(Self::Budget),
            "mid" | "medium" | "mid-range" => Some(Self::Mid),
            "premium" | "high" | "luxury" => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Budget => 0,
            Self::Mid => 1,
            Self::Premium => 2,
        }
    }

    pub fn distance(self, other: BudgetTier) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Mid => "mid",
            Self::Premium => "premium",
        }
    }
}

/// Normalized questionnaire answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinProfile {
    pub skin_type: SkinType,
    pub sensitivity_level: SensitivityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Canonical concern tags in the order the user listed them.
    pub primary_concerns: Vec<ConcernTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acne_severity: Option<AcneSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_exposure: Option<String>,
    #[serde(default)]
    pub lifestyle_factors: BTreeSet<String>,
    /// `None` means the user expressed no budget preference.
    #[serde(default)]
    pub budget_tier: Option<BudgetTier>,
    #[serde(default)]
    pub preference_tags: BTreeSet<String>,
    #[serde(default)]
    pub allergies: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_routine: Option<String>,
}

impl SkinProfile {
    pub fn new(skin_type: SkinType, primary_concerns: Vec<ConcernTag>) -> Self {
        Self {
            skin_type,
            sensitivity_level: SensitivityLevel::None,
            age_range: None,
            gender: None,
            primary_concerns,
            acne_severity: None,
            climate: None,
            sun_exposure: None,
            lifestyle_factors: BTreeSet::new(),
            budget_tier: None,
            preference_tags: BTreeSet::new(),
            allergies: BTreeSet::new(),
            current_routine: None,
        }
    }

    /// True for gated sensitivity levels or a sensitive-leaning skin type.
    pub fn is_sensitive(&self) -> bool {
        self.sensitivity_level.is_gated() || self.skin_type == SkinType::SensitiveLeaning
    }

    pub fn has_concern(&self, tag: &str) -> bool {
        self.primary_concerns.iter().any(|concern| concern.as_str() == tag)
    }

    pub fn has_lifestyle_factor(&self, factor: &str) -> bool {
        self.lifestyle_factors.contains(factor)
    }
}
