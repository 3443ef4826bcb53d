use chrono::Utc;
use futures::future::try_join_all;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::queries;
use crate::error::{ReconError, Result};
use crate::models::BusinessReport;
use crate::service::Reconciler;

/// Reconciles businesses stored in Postgres and persists the results
pub struct StoredReconciler {
    pool: PgPool,
    reconciler: Arc<Reconciler>,
}

impl StoredReconciler {
    pub fn new(pool: PgPool, reconciler: Arc<Reconciler>) -> Self {
        Self { pool, reconciler }
    }

    pub async fn reconcile_businesses(&self, business_ids: &[i64]) -> Result<Vec<BusinessReport>> {
        // 1. load every snapshot
        let batches = try_join_all(
            business_ids
                .iter()
                .map(|&id| queries::load_batch(&self.pool, id)),
        )
        .await?;

        // 2. batches are independent; run them off the async runtime
        let reconciler = Arc::clone(&self.reconciler);
        let reports = tokio::task::spawn_blocking(move || reconciler.reconcile_batches(&batches))
            .await
            .map_err(|e| ReconError::Worker(e.to_string()))?;

        // 3. persist all businesses in one transaction
        let reconciled_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (&business_id, report) in business_ids.iter().zip(&reports) {
            if !report.ingestion_errors.is_empty() {
                tracing::warn!(
                    "Business {}: {} records excluded at ingestion",
                    business_id,
                    report.ingestion_errors.len()
                );
            }
            queries::replace_results(&mut tx, business_id, &report.records, reconciled_at).await?;
        }
        tx.commit().await?;

        let out: Vec<BusinessReport> = business_ids
            .iter()
            .zip(reports)
            .map(|(&business_id, report)| {
                tracing::info!(
                    "Business {}: reconciled {} credit memos",
                    business_id,
                    report.records.len()
                );
                BusinessReport { business_id, report }
            })
            .collect();

        Ok(out)
    }
}
