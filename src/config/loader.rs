//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing section `{0}`")]
    MissingSection(&'static str),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML, everything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Top-level section holding the proxy settings in the legacy layout.
const LEGACY_ROOT: &str = "caul";
const LEGACY_SECTION: &str = "proxy";

/// Parse and validate configuration text.
///
/// Both the flat layout and the legacy `caul: proxy:` layout are accepted.
/// Unknown keys are rejected in either layout.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<ProxyConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Yaml => parse_yaml(content)?,
        ConfigFormat::Toml => parse_toml(content)?,
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_yaml(content: &str) -> Result<ProxyConfig, ConfigError> {
    use serde_yaml::{Mapping, Value};

    let mut root: Value = serde_yaml::from_str(content)?;
    if root.get(LEGACY_ROOT).is_some() {
        root = root
            .get_mut(LEGACY_ROOT)
            .and_then(|caul| caul.get_mut(LEGACY_SECTION))
            .map(std::mem::take)
            .ok_or(ConfigError::MissingSection("caul.proxy"))?;

        // Legacy files carry `log_level` next to the rules.
        if let Value::Mapping(map) = &mut root {
            if let Some(level) = map.remove("log_level") {
                let observability = map
                    .entry(Value::from("observability"))
                    .or_insert_with(|| Value::Mapping(Mapping::new()));
                if let Value::Mapping(observability) = observability {
                    observability.entry(Value::from("log_level")).or_insert(level);
                }
            }
        }
    }

    // An empty document is a valid, all-defaults configuration.
    if root.is_null() {
        return Ok(ProxyConfig::default());
    }
    Ok(serde_yaml::from_value(root)?)
}

fn parse_toml(content: &str) -> Result<ProxyConfig, ConfigError> {
    let mut root: toml::Table = toml::from_str(content)?;
    if let Some(caul) = root.remove(LEGACY_ROOT) {
        root = match caul {
            toml::Value::Table(mut caul) => match caul.remove(LEGACY_SECTION) {
                Some(toml::Value::Table(proxy)) => proxy,
                _ => return Err(ConfigError::MissingSection("caul.proxy")),
            },
            _ => return Err(ConfigError::MissingSection("caul.proxy")),
        };

        if let Some(level) = root.remove("log_level") {
            if let toml::Value::Table(observability) = root
                .entry("observability")
                .or_insert_with(|| toml::Value::Table(toml::Table::new()))
            {
                observability.entry("log_level").or_insert(level);
            }
        }
    }

    Ok(toml::Value::Table(root).try_into()?)
}

/// Load and validate configuration from a YAML or TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, ConfigFormat::from_path(path))
}
