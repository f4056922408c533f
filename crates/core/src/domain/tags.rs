//! Canonical tag handling shared by the questionnaire and the catalog.

use std::collections::BTreeSet;

/// Lowercases, trims and joins inner whitespace/underscores with `-`, so
/// `" Dark_Circles "` and `"dark circles"` both become `dark-circles`.
pub fn canonical_tag(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Canonicalizes a list of tags, dropping empties and the questionnaire's
/// `none` sentinel while keeping first-seen order.
pub fn canonical_tag_list<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for value in raw {
        let tag = canonical_tag(value.as_ref());
        if tag.is_empty() || tag == "none" {
            continue;
        }
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags
}

const CLIMATE_ALIASES: &[(&str, &str)] = &[
    ("humid", "hot-humid"),
    ("tropical", "hot-humid"),
    ("arid", "hot-dry"),
    ("desert", "hot-dry"),
    ("dry", "cold-dry"),
    ("temperate", "moderate"),
    ("moderate-temperate", "moderate"),
    ("moderate/temperate", "moderate"),
];

/// Canonical climate tag, shared by the questionnaire and catalog ingestion so
/// both sides compare the same vocabulary (`hot-humid`, `hot-dry`, `cold-dry`,
/// `cold-humid`, `moderate`).
pub fn canonical_climate(raw: &str) -> String {
    let tag = canonical_tag(raw);
    CLIMATE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(tag)
}

pub fn canonical_tag_set<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    canonical_tag_list(raw).into_iter().collect()
}
