use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::result::DiscrepancyKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrimaryCounts {
    pub accepted: usize,
    pub rejected: usize,
    pub orphaned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationCounts {
    pub duplicate: usize,
    pub suspicious: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

/// Batch summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub credit_memos_processed: usize,
    pub invoices_total: usize,
    pub primary_counts: PrimaryCounts,
    pub annotation_counts: AnnotationCounts,
    pub discrepancy_histogram: BTreeMap<DiscrepancyKind, usize>,
    pub severity_breakdown: SeverityBreakdown,
    pub total_accepted_credit: BigDecimal,
    /// Invoice amount summed over Accepted pairs
    pub total_matched_invoice_amount: BigDecimal,
    /// total_matched_invoice_amount - total_accepted_credit
    pub amount_difference: BigDecimal,
    /// Mean over memos that reached validation; None when there were none
    pub average_confidence: Option<f64>,
    /// accepted / processed, 0 for an empty batch
    pub acceptance_ratio: f64,
    /// invoices with an applied memo / invoices, 0 for no invoices
    pub invoice_match_rate: f64,
    pub unmatched_invoices: Vec<String>,
    pub ingestion_error_count: usize,
}

/// Outstanding balance of one invoice after this run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceBalance {
    pub invoice_id: String,
    pub invoice_amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_credit_memo_id: Option<String>,
    pub applied_credit: BigDecimal,
    pub outstanding: BigDecimal,
}
