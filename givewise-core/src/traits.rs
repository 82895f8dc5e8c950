use crate::{CoreError, Embedding};
use async_trait::async_trait;
use std::collections::HashSet;

/// External text-embedding service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    async fn embed(&self, text: &str, model: &str) -> Result<Embedding, CoreError>;
}

/// Read side of the donation ledger that recommendations depend on.
#[async_trait]
pub trait DonationHistory: Send + Sync {
    /// Distinct ids of every post the user has donated to.
    async fn donated_post_ids(&self, user_id: &str) -> Result<HashSet<String>, CoreError>;
}
