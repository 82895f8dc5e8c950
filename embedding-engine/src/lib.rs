pub mod cache;
pub mod fallback;
pub mod ranker;
pub mod similarity;
pub mod taste;
pub mod vectorizer;

pub use cache::EmbeddingCache;
pub use fallback::{fallback_embedding, FALLBACK_DIMENSION};
pub use ranker::Ranker;
pub use similarity::cosine_similarity;
pub use taste::{TasteProfile, TasteProfileBuilder};
pub use vectorizer::TextVectorizer;

use givewise_core::{DonationHistory, Post, PostRecommendation, RecommendationConfig};
use std::sync::Arc;
use tracing::debug;

/// Post recommendations from donation history.
///
/// Owns the embedding cache shared by taste building and ranking, so cached
/// vectors live as long as the recommender.
#[derive(Clone)]
pub struct Recommender {
    ranker: Ranker,
    cache: Arc<EmbeddingCache>,
    default_limit: usize,
}

impl Recommender {
    pub fn new(vectorizer: TextVectorizer, history: Arc<dyn DonationHistory>) -> Self {
        Self::with_cache(vectorizer, history, Arc::new(EmbeddingCache::new()))
    }

    pub fn with_cache(
        vectorizer: TextVectorizer,
        history: Arc<dyn DonationHistory>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        debug!(
            "Recommender using {} embeddings",
            if vectorizer.has_provider() { "provider" } else { "fallback" }
        );
        let vectorizer = Arc::new(vectorizer);
        let taste = TasteProfileBuilder::new(vectorizer.clone(), cache.clone(), history);
        let ranker = Ranker::new(taste, vectorizer, cache.clone());

        Self {
            ranker,
            cache,
            default_limit: givewise_core::DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn with_config(mut self, config: &RecommendationConfig) -> Self {
        self.ranker = self.ranker.with_similarity_floor(config.similarity_floor);
        self.default_limit = config.default_limit;
        self
    }

    pub async fn get_recommended_posts(
        &self,
        user_id: &str,
        all_posts: &[Post],
        limit: usize,
    ) -> Vec<PostRecommendation> {
        self.ranker.rank(user_id, all_posts, limit).await
    }

    /// Recommendations using the configured default limit.
    pub async fn recommend(&self, user_id: &str, all_posts: &[Post]) -> Vec<PostRecommendation> {
        self.get_recommended_posts(user_id, all_posts, self.default_limit)
            .await
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }
}
