use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::catalog_records;
use crate::domain::product::{Category, Frequency, Usage};
use crate::domain::profile::SkinType;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    Malformed,
    MissingId,
    DuplicateId,
    UnknownCategory,
    UnknownSkinType,
    UnknownUsage,
    UnknownFrequency,
    NonPositivePrice,
    RatingOutOfRange,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Malformed => "malformed",
            Self::MissingId => "missing_id",
            Self::DuplicateId => "duplicate_id",
            Self::UnknownCategory => "unknown_category",
            Self::UnknownSkinType => "unknown_skin_type",
            Self::UnknownUsage => "unknown_usage",
            Self::UnknownFrequency => "unknown_frequency",
            Self::NonPositivePrice => "non_positive_price",
            Self::RatingOutOfRange => "rating_out_of_range",
        };
        f.write_str(code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogIssue {
    pub product_id: String,
    pub code: IssueCode,
    pub message: String,
}

pub(crate) fn record_id(record: &Value, index: usize) -> String {
    record
        .get("productId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(single)) => single.split(',').collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

/// Checks raw catalog records before they are trusted. Issues come back in
/// record order.
pub fn validate_catalog(value: &Value) -> Result<Vec<CatalogIssue>, DomainError> {
    let records = catalog_records(value)?;
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let product_id = record_id(record, index);
        let mut issue = |code: IssueCode, message: String| {
            issues.push(CatalogIssue { product_id: product_id.clone(), code, message });
        };

        if !record.is_object() {
            issue(IssueCode::Malformed, "record is not an object".to_string());
            continue;
        }

        match record.get("productId").and_then(Value::as_str) {
            None => issue(IssueCode::MissingId, "productId is missing".to_string()),
            Some(id) if !seen.insert(id.to_string()) => {
                issue(IssueCode::DuplicateId, format!("productId `{id}` appears more than once"));
            }
            Some(_) => {}
        }

        match record.get("category").and_then(Value::as_str) {
            Some(raw) if Category::parse(raw).is_some() => {}
            Some(raw) => issue(IssueCode::UnknownCategory, format!("unknown category `{raw}`")),
            None => issue(IssueCode::UnknownCategory, "category is missing".to_string()),
        }

        for raw in strings(record.get("skinTypes")) {
            let tag = raw.trim();
            if tag.eq_ignore_ascii_case("all") || tag.is_empty() {
                continue;
            }
            if SkinType::parse(tag).is_none() {
                issue(IssueCode::UnknownSkinType, format!("unknown skin type `{tag}`"));
            }
        }

        if let Some(raw) = record.get("usage").and_then(Value::as_str) {
            if Usage::parse(raw).is_none() {
                issue(IssueCode::UnknownUsage, format!("unknown usage `{raw}`"));
            }
        }

        if let Some(raw) = record.get("frequency").and_then(Value::as_str) {
            if Frequency::parse(raw).is_none() {
                issue(IssueCode::UnknownFrequency, format!("unknown frequency `{raw}`"));
            }
        }

        if let Some(raw) = record.get("price") {
            match number(raw) {
                Some(price) if price > Decimal::ZERO => {}
                _ => issue(IssueCode::NonPositivePrice, format!("price `{raw}` must be positive")),
            }
        }

        if let Some(raw) = record.get("rating") {
            match raw.as_f64() {
                Some(rating) if (0.0..=5.0).contains(&rating) => {}
                _ => issue(
                    IssueCode::RatingOutOfRange,
                    format!("rating `{raw}` must be within 0..=5"),
                ),
            }
        }
    }

    Ok(issues)
}
