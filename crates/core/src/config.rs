use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{
    CoOccurrenceBonus, PhaseSchedule, PriorityWeights, ScoringWeights, SelectionPolicy,
    SeverityBonus,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://regimen.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Policy tables for the analysis pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub priority: PriorityWeights,
    pub selection: SelectionPolicy,
    pub phasing: PhaseSchedule,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Config file names searched in the working directory, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["regimen.toml", "config/regimen.toml"];

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(scoring) = engine.scoring {
                self.engine.scoring = scoring;
            }
            if let Some(selection) = engine.selection {
                self.engine.selection = selection;
            }
            if let Some(phasing) = engine.phasing {
                self.engine.phasing = phasing;
            }
            if let Some(priority) = engine.priority {
                priority.apply_to(&mut self.engine.priority);
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REGIMEN_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("REGIMEN_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("REGIMEN_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("REGIMEN_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("REGIMEN_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("REGIMEN_LOGGING_LEVEL").or_else(|| read_env("REGIMEN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REGIMEN_LOGGING_FORMAT").or_else(|| read_env("REGIMEN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("REGIMEN_ENGINE_SUBSTITUTION_MARGIN") {
            self.engine.selection.substitution_margin =
                parse_f64("REGIMEN_ENGINE_SUBSTITUTION_MARGIN", &value)?;
        }
        if let Some(value) = read_env("REGIMEN_ENGINE_SENSITIVITY_PENALTY") {
            self.engine.scoring.sensitivity_penalty =
                parse_f64("REGIMEN_ENGINE_SENSITIVITY_PENALTY", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_logging(&self.logging)?;
        self.engine.validate()?;
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_scoring(&self.scoring)?;
        validate_priority(&self.priority)?;
        validate_selection(&self.selection)?;
        validate_phasing(&self.phasing)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be a finite, non-negative number")))
    }
}

fn validate_scoring(scoring: &ScoringWeights) -> Result<(), ConfigError> {
    for (key, value) in [
        ("engine.scoring.skin_type", scoring.skin_type),
        ("engine.scoring.concern", scoring.concern),
        ("engine.scoring.ingredient_affinity", scoring.ingredient_affinity),
        ("engine.scoring.sensitivity_penalty", scoring.sensitivity_penalty),
        ("engine.scoring.budget_exact", scoring.budget_exact),
        ("engine.scoring.budget_adjacent", scoring.budget_adjacent),
        ("engine.scoring.climate_tag", scoring.climate_tag),
        ("engine.scoring.preference_tag", scoring.preference_tag),
        ("engine.scoring.rating", scoring.rating),
        ("engine.scoring.avoid_ingredient_penalty", scoring.avoid_ingredient_penalty),
    ] {
        non_negative(key, value)?;
    }

    if scoring.budget_adjacent > scoring.budget_exact {
        return Err(ConfigError::Validation(
            "engine.scoring.budget_adjacent must not exceed engine.scoring.budget_exact"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_priority(priority: &PriorityWeights) -> Result<(), ConfigError> {
    non_negative("engine.priority.default_base_weight", priority.default_base_weight)?;
    non_negative("engine.priority.explicit_rank_bonus", priority.explicit_rank_bonus)?;
    non_negative("engine.priority.sensitivity_redness_bonus", priority.sensitivity_redness_bonus)?;
    for (concern, weight) in &priority.base_weights {
        non_negative(&format!("engine.priority.base_weights.{concern}"), *weight)?;
    }
    let severity = &priority.acne_severity_bonus;
    for (key, value) in
        [("mild", severity.mild), ("moderate", severity.moderate), ("severe", severity.severe)]
    {
        non_negative(&format!("engine.priority.acne_severity_bonus.{key}"), value)?;
    }
    for pair in &priority.co_occurrence {
        if pair.concerns[0] == pair.concerns[1] {
            return Err(ConfigError::Validation(format!(
                "engine.priority.co_occurrence pairs `{}` with itself",
                pair.concerns[0]
            )));
        }
        non_negative("engine.priority.co_occurrence.bonus", pair.bonus)?;
    }
    for (table, adjustments) in [
        ("age_adjustments", &priority.age_adjustments),
        ("sun_adjustments", &priority.sun_adjustments),
    ] {
        let finite = adjustments.values().flat_map(BTreeMap::values).all(|value| value.is_finite());
        if !finite {
            return Err(ConfigError::Validation(format!(
                "engine.priority.{table} must contain finite numbers"
            )));
        }
    }
    Ok(())
}

fn validate_selection(selection: &SelectionPolicy) -> Result<(), ConfigError> {
    non_negative("engine.selection.substitution_margin", selection.substitution_margin)?;
    if selection.budget_headroom > 2 {
        return Err(ConfigError::Validation(
            "engine.selection.budget_headroom must be in range 0..=2".to_string(),
        ));
    }
    Ok(())
}

fn validate_phasing(phasing: &PhaseSchedule) -> Result<(), ConfigError> {
    let ascending = 0 < phasing.targeted_offset_days
        && phasing.targeted_offset_days < phasing.intensive_offset_days
        && phasing.intensive_offset_days <= phasing.severe_intensive_offset_days;
    if !ascending {
        return Err(ConfigError::Validation(
            "engine.phasing offsets must satisfy 0 < targeted < intensive <= severe_intensive"
                .to_string(),
        ));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
    engine: Option<EnginePatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    scoring: Option<ScoringWeights>,
    priority: Option<PriorityPatch>,
    selection: Option<SelectionPolicy>,
    phasing: Option<PhaseSchedule>,
}

/// Map entries are merged into the defaults; lists replace them.
#[derive(Debug, Default, Deserialize)]
struct PriorityPatch {
    base_weights: Option<BTreeMap<String, f64>>,
    default_base_weight: Option<f64>,
    acne_severity_bonus: Option<SeverityBonus>,
    explicit_rank_bonus: Option<f64>,
    sensitivity_redness_bonus: Option<f64>,
    co_occurrence: Option<Vec<CoOccurrenceBonus>>,
    age_adjustments: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    sun_adjustments: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

impl PriorityPatch {
    fn apply_to(self, priority: &mut PriorityWeights) {
        if let Some(base_weights) = self.base_weights {
            priority.base_weights.extend(base_weights);
        }
        if let Some(default_base_weight) = self.default_base_weight {
            priority.default_base_weight = default_base_weight;
        }
        if let Some(acne_severity_bonus) = self.acne_severity_bonus {
            priority.acne_severity_bonus = acne_severity_bonus;
        }
        if let Some(explicit_rank_bonus) = self.explicit_rank_bonus {
            priority.explicit_rank_bonus = explicit_rank_bonus;
        }
        if let Some(sensitivity_redness_bonus) = self.sensitivity_redness_bonus {
            priority.sensitivity_redness_bonus = sensitivity_redness_bonus;
        }
        if let Some(co_occurrence) = self.co_occurrence {
            priority.co_occurrence = co_occurrence;
        }
        if let Some(age_adjustments) = self.age_adjustments {
            for (age, adjustments) in age_adjustments {
                priority.age_adjustments.entry(age).or_default().extend(adjustments);
            }
        }
        if let Some(sun_adjustments) = self.sun_adjustments {
            for (exposure, adjustments) in sun_adjustments {
                priority.sun_adjustments.entry(exposure).or_default().extend(adjustments);
            }
        }
    }
}
