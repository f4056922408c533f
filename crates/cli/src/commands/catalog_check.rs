use std::collections::BTreeMap;
use std::path::Path;

use serde_json::json;
use tracing::info;

use regimen_core::{validate_catalog, IssueCode};

use crate::commands::{read_json, CommandResult};

const COMMAND: &str = "catalog-check";

/// Validates every record and reports all issues at once. Exits 3 when any
/// issue is found so scripts can gate catalog uploads on it.
pub fn run(catalog: &Path) -> CommandResult {
    let value = match read_json(COMMAND, catalog) {
        Ok(value) => value,
        Err(result) => return result,
    };
    let issues = match validate_catalog(&value) {
        Ok(issues) => issues,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog_unavailable", error.to_string(), 3)
        }
    };

    let records = value
        .as_array()
        .or_else(|| value.get("products").and_then(|products| products.as_array()))
        .map_or(0, Vec::len);
    let mut by_code: BTreeMap<IssueCode, usize> = BTreeMap::new();
    for issue in &issues {
        *by_code.entry(issue.code).or_default() += 1;
    }
    let by_code: BTreeMap<String, usize> =
        by_code.into_iter().map(|(code, count)| (code.to_string(), count)).collect();

    info!(
        event_name = "cli.catalog_check.completed",
        records,
        issues = issues.len(),
        "catalog validated"
    );

    let data = json!({ "records": records, "issueCounts": by_code, "issues": issues });
    if issues.is_empty() {
        let message = format!("{records} records, no issues");
        CommandResult::success_with_data(COMMAND, message, Some(data))
    } else {
        CommandResult::failure_with_data(
            COMMAND,
            "catalog_invalid",
            format!("{records} records, {} issues", issues.len()),
            3,
            Some(data),
        )
    }
}
