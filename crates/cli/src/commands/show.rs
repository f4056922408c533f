use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use regimen_core::{ConsultationId, DomainError};
use regimen_db::ConsultationRepository;

use crate::commands::{load_config, open_repository, runtime, CommandFailure, CommandResult};

fn to_value(value: &impl serde::Serialize) -> Result<Value, CommandFailure> {
    serde_json::to_value(value).map_err(|error| {
        CommandFailure::Application(DomainError::InvariantViolation(error.to_string()).into())
    })
}

/// Prints a stored consultation. Older documents are upgraded on read.
pub fn run(config_path: Option<&Path>, id: &str) -> CommandResult {
    const COMMAND: &str = "show";
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let consultation_id = ConsultationId(id.to_string());
    let loaded = runtime.block_on(async {
        let repository = open_repository(&config).await?;
        let consultation = repository
            .find(&consultation_id)
            .await?
            .ok_or_else(|| CommandFailure::NotFound(id.to_string()))?;
        to_value(&consultation)
    });

    match loaded {
        Ok(consultation) => {
            let message = format!("consultation {id}");
            CommandResult::success_with_data(COMMAND, message, Some(consultation))
        }
        Err(failure) => failure.into_result(COMMAND, id),
    }
}

/// Marks the consultation's current routine as the one the customer keeps.
pub fn save_routine(config_path: Option<&Path>, id: &str) -> CommandResult {
    const COMMAND: &str = "save-routine";
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let consultation_id = ConsultationId(id.to_string());
    let saved = runtime.block_on(async {
        let repository = open_repository(&config).await?;
        let mut consultation = repository
            .find(&consultation_id)
            .await?
            .ok_or_else(|| CommandFailure::NotFound(id.to_string()))?;
        consultation.save_routine(Utc::now());
        let saved_routine = to_value(&consultation.saved_routine)?;
        repository.update(consultation).await?;
        Ok::<Value, CommandFailure>(saved_routine)
    });

    match saved {
        Ok(saved_routine) => CommandResult::success_with_data(
            COMMAND,
            format!("routine saved for consultation {id}"),
            Some(saved_routine),
        ),
        Err(failure) => failure.into_result(COMMAND, id),
    }
}
