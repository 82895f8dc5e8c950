use crate::fallback::fallback_embedding;
use givewise_core::{Embedding, EmbeddingProvider, ErrorExt, Post};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns text into embeddings.
///
/// Uses the configured provider when there is one and falls back to the
/// deterministic local embedding whenever the provider fails. Never errors.
#[derive(Clone)]
pub struct TextVectorizer {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    model: String,
}

impl TextVectorizer {
    pub fn fallback_only() -> Self {
        Self {
            provider: None,
            model: String::new(),
        }
    }

    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn vectorize(&self, text: &str) -> Embedding {
        let Some(provider) = &self.provider else {
            return fallback_embedding(text);
        };

        match provider.embed(text, &self.model).await {
            Ok(embedding) if !embedding.is_empty() => {
                debug!(
                    "{} returned {}-dimensional embedding",
                    provider.name(),
                    embedding.len()
                );
                embedding
            }
            Ok(_) => {
                warn!(
                    "{} returned an empty embedding, using fallback embedding",
                    provider.name()
                );
                fallback_embedding(text)
            }
            Err(error) => {
                error.log_warn();
                warn!(
                    "Embedding provider {} failed, using fallback embedding",
                    provider.name()
                );
                fallback_embedding(text)
            }
        }
    }

    pub async fn vectorize_post(&self, post: &Post) -> Embedding {
        self.vectorize(&post.embedding_text()).await
    }
}

impl std::fmt::Debug for TextVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextVectorizer")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("model", &self.model)
            .finish()
    }
}
