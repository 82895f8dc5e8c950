use givewise_core::Embedding;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::trace;

/// Per-post embedding memo. Entries live as long as the cache; nothing is evicted.
///
/// Concurrent misses on the same post may both compute; the later write wins.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, Embedding>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached vector for `post_id`, or run `compute` and cache its result.
    pub async fn get_or_compute<F, Fut>(&self, post_id: &str, compute: F) -> Embedding
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Embedding>,
    {
        if let Some(hit) = self.get(post_id).await {
            trace!("Embedding cache hit for {}", post_id);
            return hit;
        }

        // The lock is not held while computing; provider calls can be slow.
        let embedding = compute().await;
        self.entries
            .write()
            .await
            .insert(post_id.to_string(), embedding.clone());
        embedding
    }

    pub async fn get(&self, post_id: &str) -> Option<Embedding> {
        self.entries.read().await.get(post_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
