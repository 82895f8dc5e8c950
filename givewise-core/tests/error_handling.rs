use givewise_core::{
    ConfigError, CoreError, DatabaseError, EmbeddingError, ErrorExt, ErrorReporter,
    ProviderError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let provider_error = CoreError::Provider(ProviderError::InvalidApiKey {
        provider: "openai".to_string(),
    });
    assert_eq!(provider_error.error_code(), "PROVIDER");

    let db_error = CoreError::Database(DatabaseError::DatabaseLocked);
    assert_eq!(db_error.error_code(), "DATABASE");

    let embedding_error = CoreError::Embedding(EmbeddingError::DimensionMismatch {
        expected: 384,
        actual: 1536,
    });
    assert_eq!(embedding_error.error_code(), "EMBEDDING");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "OPENAI_API_KEY".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_retryable_errors() {
    let rate_limited = CoreError::Provider(ProviderError::RateLimitExceeded {
        provider: "openai".to_string(),
        retry_after: 20,
    });
    assert!(rate_limited.is_retryable());

    let unavailable = CoreError::Provider(ProviderError::ServiceUnavailable {
        provider: "openai".to_string(),
        status_code: 503,
    });
    assert!(unavailable.is_retryable());

    let bad_key = CoreError::Provider(ProviderError::InvalidApiKey {
        provider: "openai".to_string(),
    });
    assert!(!bad_key.is_retryable());

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "embedding.timeout_secs".to_string(),
        value: "0".to_string(),
    });
    assert!(!config_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limited = CoreError::Provider(ProviderError::RateLimitExceeded {
        provider: "openai".to_string(),
        retry_after: 20,
    });
    assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(20)));

    let locked = CoreError::Database(DatabaseError::DatabaseLocked);
    assert_eq!(locked.retry_after(), Some(Duration::from_millis(100)));

    let invalid = CoreError::InvalidInput {
        message: "amount must be positive".to_string(),
    };
    assert_eq!(invalid.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let provider_error = CoreError::Provider(ProviderError::InvalidApiKey {
        provider: "openai".to_string(),
    });
    let message = provider_error.user_friendly_message();
    assert!(message.contains("Invalid API key for openai"));

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "recommendations.default_limit".to_string(),
        value: "0".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("recommendations.default_limit"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::Database(DatabaseError::CorruptRecord {
        details: "bad timestamp".to_string(),
    });

    // Only checks that reporting never panics
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
