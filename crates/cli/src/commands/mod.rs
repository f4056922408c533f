pub mod analyze;
pub mod catalog_check;
pub mod config;
pub mod coverage;
pub mod show;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use regimen_core::config::{AppConfig, LoadOptions};
use regimen_core::{parse_catalog, ApplicationError, DomainError, Product};
use regimen_db::{connection, migrations, RepositoryError, SqlConsultationRepository};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an application error onto the operator exit-code contract:
    /// 2 for validation/configuration, 3 for catalog problems, 4 for
    /// persistence and 1 for anything internal.
    pub fn from_application_error(
        command: &str,
        error: ApplicationError,
        correlation_id: &str,
    ) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(DomainError::Validation(_)) => ("validation", 2),
            ApplicationError::Configuration(_) => ("config_validation", 2),
            ApplicationError::Domain(DomainError::CatalogUnavailable { .. }) => {
                ("catalog_unavailable", 3)
            }
            ApplicationError::Persistence(_) => ("persistence", 4),
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => ("internal", 1),
        };
        let detail = error.to_string();
        let interface = error.into_interface(correlation_id);
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({detail})", interface.user_message()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    config_path: Option<&Path>,
) -> Result<AppConfig, CommandResult> {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    AppConfig::load(options).map_err(|error| {
        let message = format!("configuration issue: {error}");
        CommandResult::failure(command, "config_validation", message, 2)
    })
}

fn read_json_file(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(value)
}

pub(crate) fn read_json(command: &str, path: &Path) -> Result<Value, CommandResult> {
    read_json_file(path).map_err(|error| {
        CommandResult::failure(command, "input_unreadable", format!("{error:#}"), 3)
    })
}

/// Loads products from `catalog`, or from the bundled sample when allowed.
pub(crate) fn load_catalog(
    command: &str,
    catalog: Option<&Path>,
    sample_catalog: bool,
) -> Result<Vec<Product>, CommandResult> {
    let products = match catalog {
        Some(path) => {
            let value = read_json(command, path)?;
            let (products, issues) = parse_catalog(&value).map_err(|error| {
                CommandResult::failure(command, "catalog_unavailable", error.to_string(), 3)
            })?;
            for issue in &issues {
                warn!(
                    event_name = "cli.catalog.record_skipped",
                    product_id = %issue.product_id,
                    code = %issue.code,
                    "{}",
                    issue.message
                );
            }
            products
        }
        None if sample_catalog => regimen_db::sample_catalog().map_err(|error| {
            CommandResult::failure(command, "catalog_unavailable", error.to_string(), 3)
        })?,
        None => {
            return Err(CommandResult::failure(
                command,
                "catalog_unavailable",
                "no catalog supplied; pass --catalog <file> or --sample-catalog",
                3,
            ))
        }
    };
    Ok(products)
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            4,
        )
    })
}

pub(crate) fn persistence_error(error: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

pub(crate) async fn open_repository(
    config: &AppConfig,
) -> Result<SqlConsultationRepository, ApplicationError> {
    let pool = connection::connect_with_config(&config.database).await.map_err(persistence_error)?;
    migrations::run_pending(&pool).await.map_err(persistence_error)?;
    Ok(SqlConsultationRepository::new(pool))
}

/// Failure carried out of a command's async block.
pub(crate) enum CommandFailure {
    Application(ApplicationError),
    NotFound(String),
}

impl From<RepositoryError> for CommandFailure {
    fn from(error: RepositoryError) -> Self {
        Self::Application(persistence_error(error))
    }
}

impl From<ApplicationError> for CommandFailure {
    fn from(error: ApplicationError) -> Self {
        Self::Application(error)
    }
}

impl CommandFailure {
    pub(crate) fn into_result(self, command: &str, correlation_id: &str) -> CommandResult {
        match self {
            Self::Application(error) => {
                CommandResult::from_application_error(command, error, correlation_id)
            }
            Self::NotFound(id) => CommandResult::failure(
                command,
                "not_found",
                format!("consultation `{id}` does not exist"),
                4,
            ),
        }
    }
}
