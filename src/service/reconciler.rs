use rayon::prelude::*;

use crate::config::ReconConfig;
use crate::models::{IngestionError, RawBatch, ReconReport};
use crate::service::analytics;
use crate::service::classifier::DiscrepancyClassifier;
use crate::service::normalizer;
use crate::service::resolver;
use crate::service::validator::MatchValidator;
use crate::store::{CreditMemoList, CreditMemoStore, InvoiceIndex, InvoiceStore};

/// Reconciliation engine: resolve -> validate -> classify -> summarize.
/// Stateless between runs; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Reconciler {
    classifier: DiscrepancyClassifier,
}

impl Reconciler {
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            classifier: DiscrepancyClassifier::new(config),
        }
    }

    /// Use a validator carrying extra rules
    pub fn with_validator(validator: MatchValidator, config: &ReconConfig) -> Self {
        Self {
            classifier: DiscrepancyClassifier::with_validator(
                validator,
                config.large_credit_percent,
            ),
        }
    }

    /// Normalize a raw batch, then reconcile what survived ingestion.
    pub fn reconcile(&self, batch: &RawBatch) -> ReconReport {
        let ingested = normalizer::ingest(&batch.invoices, &batch.credit_memos);
        let invoices = InvoiceIndex::new(ingested.invoices);
        let credit_memos = CreditMemoList::new(ingested.credit_memos);
        self.run(&invoices, &credit_memos, ingested.errors)
    }

    /// Reconcile an already-normalized snapshot.
    pub fn run<I, C>(
        &self,
        invoices: &I,
        credit_memos: &C,
        ingestion_errors: Vec<IngestionError>,
    ) -> ReconReport
    where
        I: InvoiceStore + ?Sized,
        C: CreditMemoStore + ?Sized,
    {
        let resolved = resolver::resolve(invoices, credit_memos);
        tracing::info!(
            "Reconciling {} credit memos against {} invoices ({} duplicate groups)",
            resolved.memos.len(),
            invoices.len(),
            resolved.duplicate_groups.len()
        );

        let records = self.classifier.classify_all(&resolved);
        let analytics = analytics::summarize(&records, invoices, ingestion_errors.len());
        let invoice_balances = analytics::invoice_balances(&records, invoices);

        tracing::info!(
            "Reconciliation complete: accepted {}, rejected {}, orphaned {}, ingestion errors {}",
            analytics.primary_counts.accepted,
            analytics.primary_counts.rejected,
            analytics.primary_counts.orphaned,
            analytics.ingestion_error_count
        );

        ReconReport {
            records,
            analytics,
            invoice_balances,
            ingestion_errors,
        }
    }

    /// Independent batches on the rayon pool; output order follows input order.
    pub fn reconcile_batches(&self, batches: &[RawBatch]) -> Vec<ReconReport> {
        batches.par_iter().map(|b| self.reconcile(b)).collect()
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(&ReconConfig::default())
    }
}
