//! Concern vocabulary and the static knowledge table behind it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::product::Category;
use crate::domain::tags::canonical_tag;

/// Canonical, lowercase, hyphenated concern identifier such as `dark-circles`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcernTag(String);

impl ConcernTag {
    /// Canonicalizes the raw value and folds known aliases.
    pub fn new(raw: &str) -> Self {
        Self(canonical_concern(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn knowledge(&self) -> Option<&'static ConcernKnowledge> {
        knowledge_for(&self.0)
    }

    pub fn display_name(&self) -> String {
        self.knowledge().map(|entry| entry.name.to_string()).unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for ConcernTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prioritized concern carried in an analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concern {
    pub concern: ConcernTag,
    pub name: String,
    pub priority_score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Debug)]
pub struct ConcernKnowledge {
    pub tag: &'static str,
    pub name: &'static str,
    pub required_categories: &'static [Category],
    pub key_ingredients: &'static [&'static str],
    pub avoid_ingredients: &'static [&'static str],
}

const FULL_ROUTINE: &[Category] =
    &[Category::Cleanser, Category::Toner, Category::Serum, Category::Moisturizer, Category::Spf];
const CORE_ROUTINE: &[Category] =
    &[Category::Cleanser, Category::Serum, Category::Moisturizer, Category::Spf];

/// Ordered by canonical concern rank; position in this table breaks
/// priority ties.
pub const CONCERN_KNOWLEDGE: &[ConcernKnowledge] = &[
    ConcernKnowledge {
        tag: "acne",
        name: "Acne & Breakouts",
        required_categories: FULL_ROUTINE,
        key_ingredients: &[
            "salicylic-acid",
            "benzoyl-peroxide",
            "niacinamide",
            "tea-tree-oil",
            "azelaic-acid",
        ],
        avoid_ingredients: &["heavy-oils", "coconut-oil", "thick-butters"],
    },
    ConcernKnowledge {
        tag: "pigmentation",
        name: "Pigmentation & Dark Spots",
        required_categories: CORE_ROUTINE,
        key_ingredients: &[
            "vitamin-c",
            "niacinamide",
            "alpha-arbutin",
            "kojic-acid",
            "tranexamic-acid",
            "licorice-extract",
        ],
        avoid_ingredients: &["harsh-scrubs", "high-alcohol"],
    },
    ConcernKnowledge {
        tag: "aging",
        name: "Anti-Aging & Fine Lines",
        required_categories: CORE_ROUTINE,
        key_ingredients: &[
            "retinol",
            "retinaldehyde",
            "peptides",
            "hyaluronic-acid",
            "vitamin-c",
            "ceramides",
        ],
        avoid_ingredients: &["harsh-exfoliants", "drying-alcohols"],
    },
    ConcernKnowledge {
        tag: "dryness",
        name: "Dryness & Dehydration",
        required_categories: FULL_ROUTINE,
        key_ingredients: &[
            "hyaluronic-acid",
            "ceramides",
            "glycerin",
            "squalane",
            "niacinamide",
            "shea-butter",
        ],
        avoid_ingredients: &["alcohol", "harsh-surfactants", "fragrance"],
    },
    ConcernKnowledge {
        tag: "oiliness",
        name: "Excess Oil & Shine",
        required_categories: FULL_ROUTINE,
        key_ingredients: &["niacinamide", "salicylic-acid", "zinc", "clay", "tea-tree-oil"],
        avoid_ingredients: &["heavy-oils", "thick-creams", "coconut-oil"],
    },
    ConcernKnowledge {
        tag: "dullness",
        name: "Dullness & Lack of Radiance",
        required_categories: FULL_ROUTINE,
        key_ingredients: &["vitamin-c", "niacinamide", "aha", "glycolic-acid", "lactic-acid"],
        avoid_ingredients: &["harsh-scrubs", "high-alcohol"],
    },
    ConcernKnowledge {
        tag: "redness",
        name: "Redness & Sensitivity",
        required_categories: FULL_ROUTINE,
        key_ingredients: &[
            "centella",
            "niacinamide",
            "azelaic-acid",
            "ceramides",
            "green-tea",
            "aloe-vera",
        ],
        avoid_ingredients: &["fragrance", "alcohol", "harsh-acids", "retinol"],
    },
    ConcernKnowledge {
        tag: "dark-circles",
        name: "Dark Circles & Under-Eye",
        required_categories: &[Category::EyeCream],
        key_ingredients: &["caffeine", "vitamin-k", "retinol", "peptides", "hyaluronic-acid"],
        avoid_ingredients: &["harsh-acids", "strong-retinoids"],
    },
    ConcernKnowledge {
        tag: "large-pores",
        name: "Large Pores",
        required_categories: FULL_ROUTINE,
        key_ingredients: &["niacinamide", "salicylic-acid", "retinol", "clay"],
        avoid_ingredients: &["heavy-oils", "thick-butters"],
    },
    ConcernKnowledge {
        tag: "texture",
        name: "Rough Texture",
        required_categories: FULL_ROUTINE,
        key_ingredients: &["aha", "bha", "retinol", "niacinamide", "glycolic-acid"],
        avoid_ingredients: &["harsh-scrubs"],
    },
];

const CONCERN_ALIASES: &[(&str, &str)] = &[
    ("breakouts", "acne"),
    ("blackheads", "acne"),
    ("whiteheads", "acne"),
    ("pimples", "acne"),
    ("blemishes", "acne"),
    ("mild-acne", "acne"),
    ("acne-prone", "acne"),
    ("hyperpigmentation", "pigmentation"),
    ("dark-spots", "pigmentation"),
    ("acne-scars", "pigmentation"),
    ("uneven-tone", "pigmentation"),
    ("uneven-skin-tone", "pigmentation"),
    ("melasma", "pigmentation"),
    ("fine-lines", "aging"),
    ("wrinkles", "aging"),
    ("anti-aging", "aging"),
    ("loss-of-elasticity", "aging"),
    ("loss-of-firmness", "aging"),
    ("dehydration", "dryness"),
    ("flakiness", "dryness"),
    ("compromised-barrier", "dryness"),
    ("barrier-repair", "dryness"),
    ("sebum-control", "oiliness"),
    ("excess-sebum", "oiliness"),
    ("oil-control", "oiliness"),
    ("loss-of-glow", "dullness"),
    ("sensitivity", "redness"),
    ("irritation", "redness"),
    ("puffiness", "dark-circles"),
    ("enlarged-pores", "large-pores"),
    ("pores", "large-pores"),
    ("pore-care", "large-pores"),
    ("rough-texture", "texture"),
    ("uneven-texture", "texture"),
    ("gentle-exfoliation", "texture"),
];

/// Ingredients sensitive profiles should stay away from regardless of
/// concerns.
pub const SENSITIVE_AVOID_INGREDIENTS: &[&str] = &["fragrance", "alcohol", "harsh-acids"];

pub fn canonical_concern(raw: &str) -> String {
    let tag = canonical_tag(raw);
    CONCERN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(tag)
}

pub fn knowledge_for(tag: &str) -> Option<&'static ConcernKnowledge> {
    CONCERN_KNOWLEDGE.iter().find(|entry| entry.tag == tag)
}

/// Position of a tag in the canonical order; unknown tags sort after every
/// known one.
pub fn canonical_rank(tag: &str) -> usize {
    CONCERN_KNOWLEDGE.iter().position(|entry| entry.tag == tag).unwrap_or(CONCERN_KNOWLEDGE.len())
}

pub fn canonical_order(left: &str, right: &str) -> Ordering {
    canonical_rank(left).cmp(&canonical_rank(right)).then_with(|| left.cmp(right))
}

pub fn canonical_concern_tags() -> impl Iterator<Item = ConcernTag> {
    CONCERN_KNOWLEDGE.iter().map(|entry| ConcernTag(entry.tag.to_string()))
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{canonical_concern, canonical_order, canonical_rank, ConcernTag, CONCERN_KNOWLEDGE};

    #[test]
    fn aliases_fold_to_canonical_tags() {
        assert_eq!(canonical_concern("Hyperpigmentation"), "pigmentation");
        assert_eq!(canonical_concern("fine lines"), "aging");
        assert_eq!(canonical_concern("Enlarged_Pores"), "large-pores");
        assert_eq!(canonical_concern("eczema"), "eczema");
    }

    #[test]
    fn unknown_tags_sort_after_known_ones_alphabetically() {
        assert_eq!(canonical_rank("acne"), 0);
        assert_eq!(canonical_rank("texture"), CONCERN_KNOWLEDGE.len() - 1);
        assert_eq!(canonical_order("texture", "eczema"), Ordering::Less);
        assert_eq!(canonical_order("eczema", "rosacea"), Ordering::Less);
    }

    #[test]
    fn knowledge_lookup_uses_canonical_tag() {
        let tag = ConcernTag::new("puffiness");
        assert_eq!(tag.as_str(), "dark-circles");
        assert_eq!(tag.display_name(), "Dark Circles & Under-Eye");
        assert!(ConcernTag::new("eczema").knowledge().is_none());
    }
}
