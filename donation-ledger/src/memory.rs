use crate::validate_donation;
use async_trait::async_trait;
use givewise_core::{CoreError, DonationHistory, DonationRecord};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local ledger, used for demos and tests.
#[derive(Debug, Default)]
pub struct InMemoryDonationLedger {
    records: RwLock<Vec<DonationRecord>>,
}

impl InMemoryDonationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_donation(
        &self,
        user_id: &str,
        post_id: &str,
        amount: f64,
    ) -> Result<DonationRecord, CoreError> {
        validate_donation(user_id, post_id, amount)?;
        let record = DonationRecord::new(user_id, post_id, amount);

        self.records.write().await.push(record.clone());
        debug!("Recorded in-memory donation from {} to {}", user_id, post_id);
        Ok(record)
    }

    pub async fn user_donations(&self, user_id: &str) -> Vec<DonationRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DonationHistory for InMemoryDonationLedger {
    async fn donated_post_ids(&self, user_id: &str) -> Result<HashSet<String>, CoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .map(|record| record.post_id.clone())
            .collect())
    }
}
