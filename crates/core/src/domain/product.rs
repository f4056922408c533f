use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::profile::{BudgetTier, SkinType};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Product category. Declaration order is the order categories appear in
/// serialized recommendation maps. Deserialization goes through
/// [`Category::parse`], so catalog spellings like `"Cleanser"` or
/// `"eye care"` are accepted and unknown values are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Category {
    Cleanser,
    Toner,
    Serum,
    Moisturizer,
    Spf,
    Mask,
    EyeCream,
    Treatment,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Cleanser,
        Category::Toner,
        Category::Serum,
        Category::Moisturizer,
        Category::Spf,
        Category::Mask,
        Category::EyeCream,
        Category::Treatment,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cleanser => "cleanser",
            Self::Toner => "toner",
            Self::Serum => "serum",
            Self::Moisturizer => "moisturizer",
            Self::Spf => "spf",
            Self::Mask => "mask",
            Self::EyeCream => "eye_cream",
            Self::Treatment => "treatment",
            Self::Other => "other",
        }
    }

    /// Case-insensitive parse accepting catalog aliases. Unknown values yield
    /// `None` instead of folding into [`Category::Other`].
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "cleanser" | "cleansers" => Some(Self::Cleanser),
            "toner" | "toners" => Some(Self::Toner),
            "serum" | "serums" => Some(Self::Serum),
            "moisturizer" | "moisturizers" => Some(Self::Moisturizer),
            "spf" | "sunscreen" | "sunscreens" | "sun_protection" => Some(Self::Spf),
            "mask" | "masks" | "sheet_mask" => Some(Self::Mask),
            "eye_cream" | "eyecream" | "eye_care" => Some(Self::EyeCream),
            "treatment" | "treatments" | "spot_treatment" => Some(Self::Treatment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Maximum number of products selected from this category.
    pub fn slot_limit(self) -> usize {
        match self {
            Self::Serum | Self::Treatment => 3,
            Self::Other => 0,
            _ => 1,
        }
    }

    /// Targeted categories are only worth recommending when they address one
    /// of the profile's concerns; foundation categories only need to suit the
    /// skin type.
    pub fn is_targeted(self) -> bool {
        matches!(self, Self::Serum | Self::Treatment | Self::Mask | Self::EyeCream)
    }

    pub fn is_foundation(self) -> bool {
        matches!(self, Self::Cleanser | Self::Toner | Self::Moisturizer | Self::Spf)
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown category `{value}`"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Usage {
    Morning,
    Evening,
    #[default]
    Both,
}

impl TryFrom<String> for Usage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown usage `{value}`"))
    }
}

impl Usage {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" | "am" | "day" => Some(Self::Morning),
            "evening" | "pm" | "night" => Some(Self::Evening),
            "both" | "am/pm" | "any" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn allows_morning(self) -> bool {
        matches!(self, Self::Morning | Self::Both)
    }

    pub fn allows_evening(self) -> bool {
        matches!(self, Self::Evening | Self::Both)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Frequency {
    #[default]
    Daily,
    Alternate,
    Weekly,
}

impl Frequency {
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = crate::domain::tags::canonical_tag(raw);
        match tag.as_str() {
            "daily" | "nightly" | "twice-daily" | "as-needed" | "reapply-as-needed" => {
                Some(Self::Daily)
            }
            "alternate" | "every-other-day" | "2-3-times-a-week" | "3-4-times-a-week" => {
                Some(Self::Alternate)
            }
            "weekly" | "1-2-times-a-week" | "once-a-week" => Some(Self::Weekly),
            _ => None,
        }
    }

    pub fn is_daily(self) -> bool {
        matches!(self, Self::Daily)
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or_default()
    }
}

fn default_in_stock() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub skin_types: BTreeSet<String>,
    #[serde(default)]
    pub concerns_addressed: BTreeSet<String>,
    #[serde(default)]
    pub sensitivity_safe: bool,
    #[serde(default)]
    pub key_ingredients: BTreeSet<String>,
    #[serde(default)]
    pub avoid_ingredients: BTreeSet<String>,
    #[serde(default)]
    pub climate_suitability: BTreeSet<String>,
    #[serde(default)]
    pub budget_tier: BudgetTier,
    #[serde(default)]
    pub preferences: BTreeSet<String>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

impl Product {
    /// Empty skin type sets are treated as suitable for every skin type.
    pub fn suits_skin_type(&self, skin_type: SkinType) -> bool {
        self.skin_types.is_empty()
            || self.skin_types.contains("all")
            || self.skin_types.contains(skin_type.as_tag())
    }

    pub fn addresses(&self, concern: &str) -> bool {
        self.concerns_addressed.contains(concern)
    }

    pub fn shares_ingredient_with(&self, ingredients: &BTreeSet<String>) -> bool {
        !self.key_ingredients.is_disjoint(ingredients)
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Frequency, Product, Usage};

    #[test]
    fn category_deserializes_aliases_in_any_case() {
        for (raw, expected) in [
            ("\"eye-cream\"", Category::EyeCream),
            ("\"eye care\"", Category::EyeCream),
            ("\"Eye_Cream\"", Category::EyeCream),
            ("\"Cleanser\"", Category::Cleanser),
            ("\" SUNSCREEN \"", Category::Spf),
            ("\"other\"", Category::Other),
        ] {
            let parsed: Category = serde_json::from_str(raw).expect("known category");
            assert_eq!(parsed, expected, "{raw}");
        }
    }

    #[test]
    fn unknown_category_is_rejected_not_folded_into_other() {
        let error = serde_json::from_str::<Category>("\"lip-balm\"").expect_err("unknown category");
        assert!(error.to_string().contains("unknown category `lip-balm`"));
        assert_eq!(Category::parse("lip-balm"), None);
    }

    #[test]
    fn category_serializes_as_snake_case_and_reads_back_as_map_key() {
        assert_eq!(serde_json::to_string(&Category::EyeCream).expect("serialize"), "\"eye_cream\"");
        let map: std::collections::BTreeMap<Category, u8> =
            serde_json::from_str(r#"{"eye_cream": 1, "Serum": 2}"#).expect("category keys");
        assert_eq!(map.get(&Category::EyeCream), Some(&1));
        assert_eq!(map.get(&Category::Serum), Some(&2));
    }

    #[test]
    fn frequency_folds_catalog_phrasings() {
        assert_eq!(Frequency::from("nightly".to_string()), Frequency::Daily);
        assert_eq!(Frequency::from("2-3 times a week".to_string()), Frequency::Alternate);
        assert_eq!(Frequency::from("1-2 times a week".to_string()), Frequency::Weekly);
        assert_eq!(Frequency::parse("fortnightly"), None);
    }

    #[test]
    fn product_defaults_fill_optional_catalog_fields() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "productId": "p-1",
            "name": "Gel Cleanser",
            "category": "cleanser"
        }))
        .expect("minimal product");

        assert!(product.in_stock);
        assert_eq!(product.usage, Usage::Both);
        assert_eq!(product.frequency, Frequency::Daily);
        assert!(product.suits_skin_type(crate::domain::profile::SkinType::Oily));
    }
}
