use crate::cache::EmbeddingCache;
use crate::similarity::cosine_similarity;
use crate::taste::TasteProfileBuilder;
use crate::vectorizer::TextVectorizer;
use givewise_core::{Post, PostRecommendation, DEFAULT_SIMILARITY_FLOOR};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Scores catalog posts against a user's taste vector.
#[derive(Clone)]
pub struct Ranker {
    taste: TasteProfileBuilder,
    vectorizer: Arc<TextVectorizer>,
    cache: Arc<EmbeddingCache>,
    similarity_floor: f64,
}

impl Ranker {
    pub fn new(
        taste: TasteProfileBuilder,
        vectorizer: Arc<TextVectorizer>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            taste,
            vectorizer,
            cache,
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
        }
    }

    pub fn with_similarity_floor(mut self, similarity_floor: f64) -> Self {
        self.similarity_floor = similarity_floor;
        self
    }

    /// Up to `limit` posts the user has not donated to, most similar first.
    ///
    /// Posts above the similarity floor are preferred, but when fewer than
    /// `limit` clear it the list is filled from the best remaining posts.
    /// Ties keep catalog order.
    pub async fn rank(&self, user_id: &str, all_posts: &[Post], limit: usize) -> Vec<PostRecommendation> {
        let Some(profile) = self.taste.build_profile(user_id, all_posts).await else {
            return Vec::new();
        };

        let mut scored = Vec::with_capacity(all_posts.len());
        for post in all_posts {
            if profile.donated_post_ids.contains(&post.id) {
                continue;
            }

            let embedding = self
                .cache
                .get_or_compute(&post.id, || self.vectorizer.vectorize_post(post))
                .await;
            scored.push(PostRecommendation {
                post: post.clone(),
                similarity: cosine_similarity(&profile.vector, &embedding),
            });
        }

        // Vec::sort_by is stable, so equal scores stay in catalog order.
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });

        let total = scored.len();
        let above_floor = scored
            .iter()
            .filter(|rec| rec.similarity > self.similarity_floor)
            .count();

        let selected: Vec<PostRecommendation> = if above_floor >= limit {
            scored
                .into_iter()
                .filter(|rec| rec.similarity > self.similarity_floor)
                .take(limit)
                .collect()
        } else {
            scored.into_iter().take(limit).collect()
        };

        debug!(
            total,
            above_floor,
            returned = selected.len(),
            "Ranked recommendations for {}: {:?}",
            user_id,
            selected
                .iter()
                .map(|rec| (rec.post.id.as_str(), rec.similarity))
                .collect::<Vec<_>>()
        );

        selected
    }
}
