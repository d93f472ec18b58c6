use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use prtriage_core::TriageConfig;

const DEFAULT_CONFIG_FILENAME: &str = "prtriage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Unparseable {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid boolean '{value}' for {field}, expected true/false/1/0")]
    InvalidBool { field: &'static str, value: String },
}

/// Configuration as it arrives at the boundary: label groups and the check
/// allow-list are comma-delimited strings. Every field can come from the
/// TOML file or be overridden through a PRT_* environment variable.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub waiting_for_review: Option<String>,
    pub ready_for_merge: Option<String>,
    pub waiting_for_author: Option<String>,
    pub ci_passed: Option<String>,
    pub required_checks: Option<String>,
    pub require_description: Option<bool>,
    pub require_review: Option<bool>,
}

impl From<RawConfig> for TriageConfig {
    fn from(value: RawConfig) -> Self {
        let RawConfig {
            waiting_for_review,
            ready_for_merge,
            waiting_for_author,
            ci_passed,
            required_checks,
            require_description,
            require_review,
        } = value;

        TriageConfig {
            waiting_for_review_labels: parse_list(waiting_for_review.as_deref()),
            ready_for_merge_labels: parse_list(ready_for_merge.as_deref()),
            waiting_for_author_labels: parse_list(waiting_for_author.as_deref()),
            ci_passed_labels: parse_list(ci_passed.as_deref()),
            requires_description: require_description.unwrap_or(false),
            requires_review: require_review.unwrap_or(true),
            required_checks: parse_list(required_checks.as_deref()),
        }
    }
}

pub fn parse_list(value: Option<&str>) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();

    for part in value.unwrap_or("").split(',') {
        let part = part.trim();
        if part.is_empty() || entries.iter().any(|entry| entry == part) {
            continue;
        }
        entries.push(part.to_string());
    }

    entries
}

pub fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

async fn read_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let mut config_file = File::open(path).await.map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut config_file_contents = vec![];
    config_file
        .read_to_end(&mut config_file_contents)
        .await
        .map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

    toml::from_str(String::from_utf8_lossy(&config_file_contents).as_ref()).map_err(|e| {
        ConfigError::Unparseable {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

fn apply_env_overrides(raw: &mut RawConfig) -> Result<(), ConfigError> {
    if let Ok(value) = env::var("PRT_WAITING_FOR_REVIEW") {
        raw.waiting_for_review = Some(value);
    }
    if let Ok(value) = env::var("PRT_READY_FOR_MERGE") {
        raw.ready_for_merge = Some(value);
    }
    if let Ok(value) = env::var("PRT_WAITING_FOR_AUTHOR") {
        raw.waiting_for_author = Some(value);
    }
    if let Ok(value) = env::var("PRT_CI_PASSED") {
        raw.ci_passed = Some(value);
    }
    if let Ok(value) = env::var("PRT_REQUIRED_CHECKS") {
        raw.required_checks = Some(value);
    }
    if let Ok(value) = env::var("PRT_REQUIRE_DESCRIPTION") {
        raw.require_description = Some(parse_bool("require_description", &value)?);
    }
    if let Ok(value) = env::var("PRT_REQUIRE_REVIEW") {
        raw.require_review = Some(parse_bool("require_review", &value)?);
    }

    Ok(())
}

/// Loads the run configuration. An explicitly given path must exist; the
/// default path is optional so a run can be configured from the environment
/// alone. Fails before any API call is made.
pub async fn load(path_override: Option<PathBuf>) -> Result<TriageConfig, ConfigError> {
    let explicit = path_override.or(env::var("PRT_CONFIG_FILE").ok().map(PathBuf::from));

    let mut raw = match explicit {
        Some(path) => read_config_file(&path).await?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if tokio::fs::try_exists(&default_path).await.unwrap_or(false) {
                read_config_file(&default_path).await?
            } else {
                RawConfig::default()
            }
        }
    };

    apply_env_overrides(&mut raw)?;

    Ok(raw.into())
}
