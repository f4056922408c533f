//! Bundled sample catalog. Callers may fall back to it when no catalog is
//! supplied; the engine itself never does.

use serde_json::Value;
use tracing::warn;

use regimen_core::{parse_catalog, Product};

use crate::repositories::RepositoryError;

const SAMPLE_CATALOG_JSON: &str = include_str!("../fixtures/sample_catalog.json");

pub fn sample_catalog_value() -> Result<Value, RepositoryError> {
    serde_json::from_str(SAMPLE_CATALOG_JSON)
        .map_err(|e| RepositoryError::Decode(format!("sample catalog: {e}")))
}

pub fn sample_catalog() -> Result<Vec<Product>, RepositoryError> {
    let value = sample_catalog_value()?;
    let (products, issues) =
        parse_catalog(&value).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    for issue in &issues {
        warn!(
            event_name = "db.fixtures.sample_catalog_issue",
            product_id = %issue.product_id,
            code = %issue.code,
            "{}",
            issue.message
        );
    }
    Ok(products)
}
