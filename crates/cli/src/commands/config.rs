use std::env;
use std::fs;
use std::path::Path;

use regimen_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field<'a> {
    key_path: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run(config_path: Option<&Path>) -> String {
    let options =
        LoadOptions { config_path: config_path.map(Path::to_path_buf), ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let database_url = redact_url(&config.database.url);
    let engine = &config.engine;
    let fields = [
        Field {
            key_path: "database.url",
            value: database_url,
            env_keys: &["REGIMEN_DATABASE_URL"],
        },
        Field {
            key_path: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["REGIMEN_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key_path: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["REGIMEN_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["REGIMEN_LOGGING_LEVEL", "REGIMEN_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["REGIMEN_LOGGING_FORMAT", "REGIMEN_LOG_FORMAT"],
        },
        Field {
            key_path: "engine.scoring.sensitivity_penalty",
            value: engine.scoring.sensitivity_penalty.to_string(),
            env_keys: &["REGIMEN_ENGINE_SENSITIVITY_PENALTY"],
        },
        Field {
            key_path: "engine.scoring.skin_type",
            value: engine.scoring.skin_type.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.scoring.concern",
            value: engine.scoring.concern.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.selection.substitution_margin",
            value: engine.selection.substitution_margin.to_string(),
            env_keys: &["REGIMEN_ENGINE_SUBSTITUTION_MARGIN"],
        },
        Field {
            key_path: "engine.selection.budget_headroom",
            value: engine.selection.budget_headroom.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.phasing.targeted_offset_days",
            value: engine.phasing.targeted_offset_days.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.phasing.intensive_offset_days",
            value: engine.phasing.intensive_offset_days.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.phasing.severe_intensive_offset_days",
            value: engine.phasing.severe_intensive_offset_days.to_string(),
            env_keys: &[],
        },
        Field {
            key_path: "engine.priority.base_weights",
            value: format!("{} concerns", engine.priority.base_weights.len()),
            env_keys: &[],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Hides credentials embedded in a database URL's query string.
fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) if query.contains("password") => format!("{base}?<redacted>"),
        _ => url.to_string(),
    }
}
