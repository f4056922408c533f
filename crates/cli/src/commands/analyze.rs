use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use regimen_core::{
    analysis_digest, Analysis, AnalysisEngine, ApplicationError, Consultation, ConsultationId,
    DomainError, RawResponses, ValidationError,
};
use regimen_db::ConsultationRepository;

use crate::commands::{
    load_catalog, load_config, open_repository, read_json, runtime, CommandFailure, CommandResult,
};

const COMMAND: &str = "analyze";

#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub responses: PathBuf,
    pub catalog: Option<PathBuf>,
    pub sample_catalog: bool,
    pub persist: bool,
}

fn analysis_value(analysis: &Analysis) -> Result<Value, ApplicationError> {
    serde_json::to_value(analysis)
        .map_err(|error| DomainError::InvariantViolation(error.to_string()).into())
}

pub fn run(config_path: Option<&Path>, args: &AnalyzeArgs) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let responses = match read_json(COMMAND, &args.responses) {
        Ok(responses) => responses,
        Err(result) => return result,
    };

    let consultation_id = ConsultationId::generate();
    let fail = |error: ApplicationError| {
        CommandResult::from_application_error(COMMAND, error, consultation_id.as_str())
    };

    let raw: RawResponses = match serde_json::from_value(responses.clone()) {
        Ok(raw) => raw,
        Err(error) => {
            let error = DomainError::from(ValidationError::new("responses", error.to_string()));
            return fail(error.into());
        }
    };
    let products = match load_catalog(COMMAND, args.catalog.as_deref(), args.sample_catalog) {
        Ok(products) => products,
        Err(result) => return result,
    };

    let engine = AnalysisEngine::new(config.engine.clone());
    let analysis = match engine.generate_complete_analysis(&raw, &products) {
        Ok(analysis) => analysis,
        Err(error) => return fail(error.into()),
    };
    let (digest, analysis_json) =
        match analysis_digest(&analysis).map_err(ApplicationError::from).and_then(|digest| {
            analysis_value(&analysis).map(|value| (digest, value))
        }) {
            Ok(encoded) => encoded,
            Err(error) => return fail(error),
        };

    info!(
        event_name = "cli.analyze.completed",
        correlation_id = %consultation_id,
        catalog_size = products.len(),
        digest = %digest,
        persist = args.persist,
        "analysis generated"
    );

    if !args.persist {
        return CommandResult::success_with_data(
            COMMAND,
            "analysis generated",
            Some(json!({ "analysisDigest": digest, "analysis": analysis_json })),
        );
    }

    let consultation =
        Consultation::new(consultation_id.clone(), responses, analysis, digest.clone(), Utc::now());
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let stored = runtime.block_on(async {
        let repository = open_repository(&config).await?;
        let id = repository.create(consultation).await?;
        Ok::<ConsultationId, CommandFailure>(id)
    });

    match stored {
        Ok(id) => CommandResult::success_with_data(
            COMMAND,
            format!("analysis stored as consultation {id}"),
            Some(json!({
                "consultationId": id,
                "analysisDigest": digest,
                "analysis": analysis_json,
            })),
        ),
        Err(failure) => failure.into_result(COMMAND, consultation_id.as_str()),
    }
}
