use crate::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

/// Dense text vector. Vectors compared against each other must share a dimension.
pub type Embedding = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub organization_id: String,
    pub organization_name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub goal_amount: Option<f64>,
    #[serde(default)]
    pub current_amount: f64,
    pub created_at: DateTime<Utc>,
    /// Fields the recommender ignores, such as `imageUrl` and
    /// `organizationLogoUrl`, kept so callers get back what they passed in.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    /// Text fed to the vectorizer: title, description, category and tags,
    /// with empty parts dropped so no double spaces appear.
    pub fn embedding_text(&self) -> String {
        let tags = self.tags.join(" ");
        let parts = [
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_deref().unwrap_or(""),
            tags.as_str(),
        ];

        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parse a JSON array of posts.
pub fn posts_from_json(raw: &str) -> Result<Vec<Post>, CoreError> {
    Ok(serde_json::from_str(raw)?)
}

/// Read a post catalog from a JSON file.
pub fn load_posts(path: impl AsRef<Path>) -> Result<Vec<Post>, CoreError> {
    let raw = std::fs::read_to_string(path)?;
    posts_from_json(&raw)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub post_id: String,
    pub amount: f64,
    pub donated_at: DateTime<Utc>,
}

impl DonationRecord {
    pub fn new(user_id: impl Into<String>, post_id: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            post_id: post_id.into(),
            amount,
            donated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecommendation {
    pub post: Post,
    pub similarity: f64,
}
