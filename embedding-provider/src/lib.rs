pub mod retry;

use async_trait::async_trait;
use givewise_core::{CoreError, Embedding, EmbeddingConfig, EmbeddingError, EmbeddingProvider, ProviderError};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use retry::{RetryConfig, RetryExecutor};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

const PROVIDER_NAME: &str = "openai";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f64>,
    #[serde(default)]
    pub index: usize,
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Clone)]
pub struct OpenAiEmbeddingProvider {
    http_client: Client,
    api_key: String,
    endpoint: Url,
    retry: RetryExecutor,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String, config: &EmbeddingConfig) -> Result<Self, CoreError> {
        let endpoint = embeddings_endpoint(&config.api_base)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            endpoint,
            retry: RetryExecutor::new(RetryConfig::embeddings(config.max_retries)),
        })
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request_embedding(&self, text: &str, model: &str) -> Result<Embedding, CoreError> {
        let body = EmbeddingRequest { model, input: text };

        debug!("Requesting embedding from {} with model {}", self.endpoint, model);
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Provider(ProviderError::RequestTimeout {
                        provider: PROVIDER_NAME.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Embedding request failed with status: {}", status);
            return Err(status_error(status, response.headers(), model).into());
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!("Failed to parse embedding response: {}", e);
            CoreError::Provider(ProviderError::InvalidResponseFormat {
                provider: PROVIDER_NAME.to_string(),
                details: e.to_string(),
            })
        })?;

        first_embedding(parsed)
    }
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Embedding, CoreError> {
        self.retry
            .execute("openai_embedding", || self.request_embedding(text, model))
            .await
    }
}

fn embeddings_endpoint(api_base: &str) -> Result<Url, CoreError> {
    let raw = format!("{}/embeddings", api_base.trim_end_matches('/'));
    Url::parse(&raw).map_err(|e| CoreError::InvalidInput {
        message: format!("invalid embedding api base '{}': {}", api_base, e),
    })
}

/// Map a non-success HTTP status to a provider error.
pub fn status_error(status: StatusCode, headers: &HeaderMap, model: &str) -> ProviderError {
    let provider = PROVIDER_NAME.to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::InvalidApiKey { provider },
        StatusCode::NOT_FOUND => ProviderError::ModelNotAvailable {
            model: model.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited by {}, retry after {} seconds", provider, retry_after);
            ProviderError::RateLimitExceeded {
                provider,
                retry_after,
            }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::RequestTimeout { provider }
        }
        s if s.is_server_error() => ProviderError::ServiceUnavailable {
            provider,
            status_code: s.as_u16(),
        },
        s => ProviderError::RequestRejected {
            provider,
            status_code: s.as_u16(),
        },
    }
}

/// Pull the vector for the single input out of a response body.
pub fn first_embedding(response: EmbeddingResponse) -> Result<Embedding, CoreError> {
    let data = response
        .data
        .into_iter()
        .min_by_key(|entry| entry.index)
        .ok_or_else(|| ProviderError::InvalidResponseFormat {
            provider: PROVIDER_NAME.to_string(),
            details: "response contained no embeddings".to_string(),
        })?;

    if data.embedding.is_empty() {
        return Err(EmbeddingError::EmptyEmbedding.into());
    }

    debug!(
        "Received {}-dimensional embedding from model {}",
        data.embedding.len(),
        response.model.as_deref().unwrap_or("unknown")
    );
    Ok(data.embedding)
}
