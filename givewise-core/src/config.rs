use crate::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedding: EmbeddingConfig,
    pub recommendations: RecommendationConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Name of the environment variable holding the provider API key.
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Provider API key from the configured environment variable. Unset and
    /// blank values are both reported as missing.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: self.api_key_env.clone(),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub default_limit: usize,
    pub similarity_floor: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RECOMMENDATION_LIMIT,
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub database_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://givewise.db?mode=rwc".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
        })?;

        let config = Self::from_toml(&raw)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recommendations.default_limit == 0 {
            return Err(invalid("recommendations.default_limit", "0"));
        }

        let floor = self.recommendations.similarity_floor;
        if !floor.is_finite() || !(-1.0..=1.0).contains(&floor) {
            return Err(invalid("recommendations.similarity_floor", floor));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(invalid("embedding.timeout_secs", "0"));
        }

        if self.embedding.model.trim().is_empty() {
            return Err(invalid("embedding.model", "\"\""));
        }

        if url::Url::parse(&self.embedding.api_base).is_err() {
            return Err(invalid("embedding.api_base", &self.embedding.api_base));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").expect("empty config is valid");
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.embedding.api_base, DEFAULT_API_BASE);
        assert_eq!(config.recommendations.default_limit, 3);
        assert_eq!(config.recommendations.similarity_floor, 0.1);
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [embedding]
            model = "text-embedding-3-large"

            [recommendations]
            default_limit = 5
            "#,
        )
        .expect("valid config");

        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.recommendations.default_limit, 5);
        assert_eq!(config.recommendations.similarity_floor, 0.1);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = AppConfig::from_toml("[recommendations]\ndefault_limit = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "recommendations.default_limit"
        ));
    }

    #[test]
    fn test_bad_api_base_is_rejected() {
        let err = AppConfig::from_toml("[embedding]\napi_base = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[embedding\nmodel = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AppConfig::load("/definitely/not/here/givewise.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_api_key_from_unset_variable_is_missing() {
        let config = EmbeddingConfig {
            api_key_env: "GIVEWISE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::MissingEnvironmentVariable { ref var_name })
                if var_name == "GIVEWISE_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
