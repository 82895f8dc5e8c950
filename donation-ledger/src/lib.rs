mod memory;

pub use memory::InMemoryDonationLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use givewise_core::{CoreError, DatabaseError, DonationHistory, DonationRecord};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Donation ledger persisted in SQLite.
pub struct DonationLedger {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl DonationLedger {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        // Every connection to an in-memory database sees its own empty database.
        let in_memory = self.connection_string.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect(&self.connection_string)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to donation ledger at {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        sqlx::migrate!("./migrations")
            .run(self.pool()?)
            .await
            .map_err(|e| DatabaseError::MigrationFailed {
                migration: e.to_string(),
            })?;

        debug!("Donation ledger migrations applied");
        Ok(())
    }

    /// Append a donation stamped with the current time.
    pub async fn record_donation(
        &self,
        user_id: &str,
        post_id: &str,
        amount: f64,
    ) -> Result<DonationRecord, CoreError> {
        validate_donation(user_id, post_id, amount)?;
        let record = DonationRecord::new(user_id, post_id, amount);

        sqlx::query(
            "INSERT INTO post_donations (id, user_id, post_id, amount, donated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.user_id)
        .bind(&record.post_id)
        .bind(record.amount)
        .bind(record.donated_at)
        .execute(self.pool()?)
        .await
        .map_err(DatabaseError::from)?;

        info!(
            "Recorded donation of {:.2} from {} to post {}",
            amount, user_id, post_id
        );
        Ok(record)
    }

    /// All donations made by a user, oldest first.
    pub async fn user_donations(&self, user_id: &str) -> Result<Vec<DonationRecord>, CoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, post_id, amount, donated_at FROM post_donations \
             WHERE user_id = ? ORDER BY donated_at ASC, rowid ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await
        .map_err(DatabaseError::from)?;

        rows.iter()
            .map(|row| -> Result<DonationRecord, CoreError> {
                let id: String = row.try_get("id").map_err(DatabaseError::from)?;
                let id = Uuid::parse_str(&id).map_err(|e| DatabaseError::CorruptRecord {
                    details: format!("donation id '{}': {}", id, e),
                })?;
                let donated_at: DateTime<Utc> =
                    row.try_get("donated_at").map_err(DatabaseError::from)?;

                Ok(DonationRecord {
                    id,
                    user_id: row.try_get("user_id").map_err(DatabaseError::from)?,
                    post_id: row.try_get("post_id").map_err(DatabaseError::from)?,
                    amount: row.try_get("amount").map_err(DatabaseError::from)?,
                    donated_at,
                })
            })
            .collect()
    }

    fn pool(&self) -> Result<&SqlitePool, CoreError> {
        self.pool.as_ref().ok_or_else(|| {
            DatabaseError::ConnectionFailed {
                reason: "ledger is not connected".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl DonationHistory for DonationLedger {
    async fn donated_post_ids(&self, user_id: &str) -> Result<HashSet<String>, CoreError> {
        let rows = sqlx::query("SELECT DISTINCT post_id FROM post_donations WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(self.pool()?)
            .await
            .map_err(DatabaseError::from)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("post_id")
                    .map_err(|e| CoreError::from(DatabaseError::from(e)))
            })
            .collect()
    }
}

pub(crate) fn validate_donation(user_id: &str, post_id: &str, amount: f64) -> Result<(), CoreError> {
    if user_id.trim().is_empty() || post_id.trim().is_empty() {
        return Err(CoreError::InvalidInput {
            message: "donation requires a user id and a post id".to_string(),
        });
    }

    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::InvalidInput {
            message: format!("donation amount must be positive, got {}", amount),
        });
    }

    Ok(())
}
