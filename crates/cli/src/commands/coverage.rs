use std::path::Path;

use regimen_core::{analyze_coverage, CatalogSnapshot};

use crate::commands::{load_catalog, load_config, CommandResult};

const COMMAND: &str = "coverage";

pub fn run(
    config_path: Option<&Path>,
    catalog: Option<&Path>,
    sample_catalog: bool,
) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let products = match load_catalog(COMMAND, catalog, sample_catalog) {
        Ok(products) => products,
        Err(result) => return result,
    };

    let snapshot = CatalogSnapshot::new(products);
    if let Err(error) = snapshot.ensure_available() {
        return CommandResult::failure(COMMAND, "catalog_unavailable", error.to_string(), 3);
    }
    let report = analyze_coverage(&snapshot, &config.engine);

    match serde_json::to_value(&report) {
        Ok(data) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "{} of {} profiles fully covered",
                report.fully_covered_profiles, report.total_profiles
            ),
            Some(data),
        ),
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
    }
}
