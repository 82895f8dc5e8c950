use crate::cache::EmbeddingCache;
use crate::similarity::{l2_normalize, mean};
use crate::vectorizer::TextVectorizer;
use futures::future::join_all;
use givewise_core::{DonationHistory, Embedding, EmbeddingError, ErrorExt, Post};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A user's taste vector together with the donation snapshot it was built from.
#[derive(Debug, Clone)]
pub struct TasteProfile {
    pub vector: Embedding,
    pub donated_post_ids: HashSet<String>,
}

/// Averages the embeddings of the posts a user donated to.
#[derive(Clone)]
pub struct TasteProfileBuilder {
    vectorizer: Arc<TextVectorizer>,
    cache: Arc<EmbeddingCache>,
    history: Arc<dyn DonationHistory>,
}

impl TasteProfileBuilder {
    pub fn new(
        vectorizer: Arc<TextVectorizer>,
        cache: Arc<EmbeddingCache>,
        history: Arc<dyn DonationHistory>,
    ) -> Self {
        Self {
            vectorizer,
            cache,
            history,
        }
    }

    /// Normalized mean embedding of the user's donated posts that are still in
    /// `all_posts`. `None` when there is nothing to learn from.
    pub async fn build_taste(&self, user_id: &str, all_posts: &[Post]) -> Option<Embedding> {
        self.build_profile(user_id, all_posts)
            .await
            .map(|profile| profile.vector)
    }

    pub async fn build_profile(&self, user_id: &str, all_posts: &[Post]) -> Option<TasteProfile> {
        let donated_post_ids = self.donated_post_ids(user_id).await;
        if donated_post_ids.is_empty() {
            debug!("No donation history for {}", user_id);
            return None;
        }

        let donated_posts: Vec<&Post> = all_posts
            .iter()
            .filter(|post| donated_post_ids.contains(&post.id))
            .collect();
        if donated_posts.is_empty() {
            debug!(
                "None of the {} posts {} donated to are in the catalog",
                donated_post_ids.len(),
                user_id
            );
            return None;
        }

        let embeddings = join_all(donated_posts.iter().map(move |&post| {
            self.cache
                .get_or_compute(&post.id, move || self.vectorizer.vectorize_post(post))
        }))
        .await;

        let vector = average(embeddings)?;
        Some(TasteProfile {
            vector,
            donated_post_ids,
        })
    }

    /// History read failures count as no history.
    async fn donated_post_ids(&self, user_id: &str) -> HashSet<String> {
        match self.history.donated_post_ids(user_id).await {
            Ok(ids) => ids,
            Err(error) => {
                error.log_warn();
                warn!("Could not load donation history for {}", user_id);
                HashSet::new()
            }
        }
    }
}

/// Mean of the embeddings sharing the first one's dimension, then normalized.
fn average(embeddings: Vec<Embedding>) -> Option<Embedding> {
    let dimension = embeddings.first()?.len();
    let comparable: Vec<Embedding> = embeddings
        .into_iter()
        .filter(|embedding| match check_dimension(embedding, dimension) {
            Ok(()) => true,
            Err(mismatch) => {
                mismatch.log_warn();
                false
            }
        })
        .collect();

    let mut taste = mean(&comparable)?;
    l2_normalize(&mut taste);
    Some(taste)
}

fn check_dimension(embedding: &[f64], expected: usize) -> Result<(), EmbeddingError> {
    if embedding.len() == expected {
        Ok(())
    } else {
        Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        })
    }
}
