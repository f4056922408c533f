//! In-stock catalog snapshot with canonical tags.

mod validation;

pub use validation::{validate_catalog, CatalogIssue, IssueCode};

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::domain::concern::canonical_concern;
use crate::domain::product::{Category, Product};
use crate::domain::tags::{canonical_climate, canonical_tag_set};
use crate::errors::DomainError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
}

impl CatalogSnapshot {
    /// Canonicalizes tags, drops out-of-stock products and keeps the first
    /// record for any repeated product id.
    pub fn new(products: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let mut snapshot = Vec::with_capacity(products.len());
        let mut out_of_stock = 0usize;

        for product in products {
            if !product.in_stock {
                out_of_stock += 1;
                continue;
            }
            if !seen.insert(product.product_id.clone()) {
                warn!(
                    event_name = "catalog.snapshot.duplicate_dropped",
                    product_id = %product.product_id,
                    "duplicate product id, keeping first record"
                );
                continue;
            }
            snapshot.push(canonicalize(product));
        }

        debug!(
            event_name = "catalog.snapshot.built",
            products = snapshot.len(),
            out_of_stock,
            "catalog snapshot built"
        );
        Self { products: snapshot }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |product| product.category == category)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Fails when nothing is left to recommend from.
    pub fn ensure_available(&self) -> Result<(), DomainError> {
        if self.products.is_empty() {
            return Err(DomainError::CatalogUnavailable {
                reason: "catalog has no in-stock products".to_string(),
            });
        }
        Ok(())
    }
}

fn canonicalize(mut product: Product) -> Product {
    product.skin_types = canonical_tag_set(&product.skin_types);
    product.concerns_addressed =
        product.concerns_addressed.iter().map(|tag| canonical_concern(tag)).collect();
    product.key_ingredients = canonical_tag_set(&product.key_ingredients);
    product.avoid_ingredients = canonical_tag_set(&product.avoid_ingredients);
    product.climate_suitability = product
        .climate_suitability
        .iter()
        .map(|tag| canonical_climate(tag))
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>();
    product.preferences = canonical_tag_set(&product.preferences);
    product.concerns_addressed.remove("");
    product
}

/// Parses catalog JSON given either as a bare array or as `{"products": [...]}`.
/// Records that fail to decode are reported and skipped.
pub fn parse_catalog(
    value: &serde_json::Value,
) -> Result<(Vec<Product>, Vec<CatalogIssue>), DomainError> {
    let records = catalog_records(value)?;
    let mut issues = Vec::new();
    let mut products = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let product_id = validation::record_id(record, index);
        if let Some(raw) = record.get("category").and_then(serde_json::Value::as_str) {
            if Category::parse(raw).is_none() {
                warn!(
                    event_name = "catalog.parse.unknown_category",
                    product_id = %product_id,
                    category = raw,
                    "skipping record with unknown category"
                );
                issues.push(CatalogIssue {
                    product_id,
                    code: IssueCode::UnknownCategory,
                    message: format!("unknown category `{raw}`"),
                });
                continue;
            }
        }
        match serde_json::from_value::<Product>(record.clone()) {
            Ok(product) => products.push(product),
            Err(error) => issues.push(CatalogIssue {
                product_id,
                code: IssueCode::Malformed,
                message: error.to_string(),
            }),
        }
    }
    Ok((products, issues))
}

pub(crate) fn catalog_records(
    value: &serde_json::Value,
) -> Result<&Vec<serde_json::Value>, DomainError> {
    let records = match value {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Object(map) => match map.get("products") {
            Some(serde_json::Value::Array(records)) => records,
            _ => {
                return Err(DomainError::CatalogUnavailable {
                    reason: "catalog object has no `products` array".to_string(),
                })
            }
        },
        _ => {
            return Err(DomainError::CatalogUnavailable {
                reason: "catalog must be an array of products".to_string(),
            })
        }
    };
    if records.is_empty() {
        return Err(DomainError::CatalogUnavailable { reason: "catalog is empty".to_string() });
    }
    Ok(records)
}
