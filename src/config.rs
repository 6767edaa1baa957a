use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::diagnostics::Diagnostic;

pub const DEFAULT_MAX_SUFFIX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Base name of the synthetic provenance predicate.
    pub provenance_name: String,
    /// Base name reserved for feeding answer set atoms back in.
    pub model_name: String,
    pub max_suffix_depth: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provenance_name: "h".to_string(),
            model_name: "model".to_string(),
            max_suffix_depth: DEFAULT_MAX_SUFFIX_DEPTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{key}` must be a lowercase identifier, got `{value}`")]
    InvalidName { key: &'static str, value: String },
    #[error("provenance_name and model_name must differ, both are `{0}`")]
    SameName(String),
}

impl From<ConfigError> for Diagnostic {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::Io { .. } => "E-IO",
            ConfigError::Toml(_) | ConfigError::InvalidName { .. } | ConfigError::SameName(_) => {
                "E-CONFIG"
            }
        };
        Diagnostic::new(code, err.to_string(), None)
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = toml::from_str(body)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&body)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("provenance_name", &self.provenance_name),
            ("model_name", &self.model_name),
        ] {
            if !is_predicate_name(value) {
                return Err(ConfigError::InvalidName {
                    key,
                    value: value.clone(),
                });
            }
        }
        if self.provenance_name == self.model_name {
            return Err(ConfigError::SameName(self.model_name.clone()));
        }
        Ok(())
    }
}

fn is_predicate_name(name: &str) -> bool {
    let stripped = name.trim_start_matches('_');
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() && !first.is_uppercase() => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str("provenance_name = \"why\"\n").expect("config");
        assert_eq!(config.provenance_name, "why");
        assert_eq!(config.model_name, "model");
        assert_eq!(config.max_suffix_depth, DEFAULT_MAX_SUFFIX_DEPTH);
    }

    #[test]
    fn uppercase_name_is_rejected() {
        let err = AnalyzerConfig::from_toml_str("model_name = \"Model\"\n").expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidName { key: "model_name", .. }));
    }

    #[test]
    fn reserved_names_must_differ() {
        let err = AnalyzerConfig::from_toml_str("model_name = \"h\"\n").expect_err("invalid");
        assert!(matches!(err, ConfigError::SameName(_)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = AnalyzerConfig::from_toml_str("colour = 1\n").expect_err("invalid");
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
