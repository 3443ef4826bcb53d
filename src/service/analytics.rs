use bigdecimal::{BigDecimal, Zero};
use std::collections::{BTreeMap, HashMap};

use crate::models::{
    AnalyticsSummary, Annotation, AnnotationCounts, InvoiceBalance, MatchRecord, PrimaryCounts,
    PrimaryResult, Severity, SeverityBreakdown,
};
use crate::service::normalizer::canonical_id;
use crate::store::InvoiceStore;

/// First Accepted memo per invoice, in input order
fn applied_memos(records: &[MatchRecord]) -> HashMap<String, &MatchRecord> {
    let mut applied: HashMap<String, &MatchRecord> = HashMap::new();
    for r in records.iter().filter(|r| r.primary_result == PrimaryResult::Accepted) {
        applied.entry(canonical_id(&r.invoice_id)).or_insert(r);
    }
    applied
}

/// At most one Accepted memo reduces each invoice's balance.
pub fn invoice_balances<I>(records: &[MatchRecord], invoices: &I) -> Vec<InvoiceBalance>
where
    I: InvoiceStore + ?Sized,
{
    let applied = applied_memos(records);
    invoices
        .invoices()
        .map(|inv| {
            let memo = applied.get(&canonical_id(&inv.id));
            let applied_credit = memo.map_or_else(BigDecimal::zero, |m| m.credit_amount.clone());
            InvoiceBalance {
                invoice_id: inv.id.clone(),
                invoice_amount: inv.amount.clone(),
                applied_credit_memo_id: memo.map(|m| m.credit_memo_id.clone()),
                outstanding: &inv.amount - &applied_credit,
                applied_credit,
            }
        })
        .collect()
}

/// Pure reduction over classified records; never alters classification.
pub fn summarize<I>(
    records: &[MatchRecord],
    invoices: &I,
    ingestion_errors: usize,
) -> AnalyticsSummary
where
    I: InvoiceStore + ?Sized,
{
    let mut primary_counts = PrimaryCounts::default();
    let mut annotation_counts = AnnotationCounts::default();
    let mut histogram = BTreeMap::new();
    let mut severity = SeverityBreakdown::default();
    let mut total_accepted_credit = BigDecimal::zero();
    let mut total_matched_invoice_amount = BigDecimal::zero();
    let mut confidence_sum = 0.0;
    let mut scored = 0usize;

    for r in records {
        match r.primary_result {
            PrimaryResult::Accepted => {
                primary_counts.accepted += 1;
                total_accepted_credit += &r.credit_amount;
                if let Some(inv) = invoices.get(&r.invoice_id) {
                    total_matched_invoice_amount += &inv.amount;
                }
            }
            PrimaryResult::Rejected => primary_counts.rejected += 1,
            PrimaryResult::Orphaned => primary_counts.orphaned += 1,
        }

        for a in &r.secondary_annotations {
            match a {
                Annotation::Duplicate => annotation_counts.duplicate += 1,
                Annotation::Suspicious => annotation_counts.suspicious += 1,
            }
        }

        for d in &r.discrepancies {
            *histogram.entry(d.kind).or_insert(0usize) += 1;
            match d.severity {
                Severity::High => severity.high += 1,
                Severity::Medium => severity.medium += 1,
                Severity::Low => severity.low += 1,
            }
            severity.total += 1;
        }

        if let Some(c) = r.confidence {
            confidence_sum += c;
            scored += 1;
        }
    }

    let applied = applied_memos(records);
    let unmatched_invoices: Vec<String> = invoices
        .invoices()
        .filter(|inv| !applied.contains_key(&canonical_id(&inv.id)))
        .map(|inv| inv.id.clone())
        .collect();
    let invoices_total = invoices.len();
    let matched_invoices = invoices_total - unmatched_invoices.len();

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    AnalyticsSummary {
        credit_memos_processed: records.len(),
        invoices_total,
        acceptance_ratio: ratio(primary_counts.accepted, records.len()),
        invoice_match_rate: ratio(matched_invoices, invoices_total),
        primary_counts,
        annotation_counts,
        discrepancy_histogram: histogram,
        severity_breakdown: severity,
        amount_difference: &total_matched_invoice_amount - &total_accepted_credit,
        total_matched_invoice_amount,
        total_accepted_credit,
        average_confidence: (scored > 0).then(|| confidence_sum / scored as f64),
        unmatched_invoices,
        ingestion_error_count: ingestion_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Discrepancy, DiscrepancyKind, Invoice, InvoiceStatus};
    use crate::store::InvoiceIndex;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn invoice(id: &str, amount: &str) -> Invoice {
        Invoice {
            id: id.into(),
            customer_name: "Acme".into(),
            vendor_name: None,
            currency: "USD".into(),
            amount: BigDecimal::from_str(amount).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: InvoiceStatus::Open,
        }
    }

    fn record(
        id: &str,
        invoice_id: &str,
        amount: &str,
        primary: PrimaryResult,
        confidence: Option<f64>,
    ) -> MatchRecord {
        let discrepancies = primary
            .discrepancy()
            .map(|k| vec![Discrepancy::new(k, String::new())])
            .unwrap_or_default();
        MatchRecord {
            credit_memo_id: id.into(),
            invoice_id: invoice_id.into(),
            credit_amount: BigDecimal::from_str(amount).unwrap(),
            primary_result: primary,
            secondary_annotations: Vec::new(),
            confidence,
            issues: Vec::new(),
            discrepancies,
        }
    }

    #[test]
    fn empty_batch_has_zero_ratios() {
        let summary = summarize(&[], &InvoiceIndex::default(), 0);
        assert_eq!(summary.credit_memos_processed, 0);
        assert_eq!(summary.acceptance_ratio, 0.0);
        assert_eq!(summary.invoice_match_rate, 0.0);
        assert_eq!(summary.average_confidence, None);
        assert!(summary.total_accepted_credit.is_zero());
        assert!(summary.total_matched_invoice_amount.is_zero());
        assert!(summary.amount_difference.is_zero());
    }

    #[test]
    fn orphans_are_excluded_from_average_confidence() {
        let invoices = InvoiceIndex::new(vec![invoice("I1", "100"), invoice("I2", "100")]);
        let mut dup = record("C2", "I1", "10", PrimaryResult::Rejected, Some(50.0));
        dup.secondary_annotations.push(Annotation::Duplicate);
        dup.discrepancies
            .push(Discrepancy::new(DiscrepancyKind::DuplicateCreditMemos, String::new()));
        let records = vec![
            record("C1", "I1", "25.50", PrimaryResult::Accepted, Some(100.0)),
            dup,
            record("C3", "GONE", "5", PrimaryResult::Orphaned, None),
        ];

        let s = summarize(&records, &invoices, 2);
        assert_eq!(s.primary_counts, PrimaryCounts { accepted: 1, rejected: 1, orphaned: 1 });
        assert_eq!(s.annotation_counts.duplicate, 1);
        assert_eq!(s.average_confidence, Some(75.0));
        assert_eq!(s.total_accepted_credit, BigDecimal::from_str("25.50").unwrap());
        assert_eq!(s.total_matched_invoice_amount, BigDecimal::from(100));
        assert_eq!(s.amount_difference, BigDecimal::from_str("74.50").unwrap());
        assert!((s.acceptance_ratio - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.invoice_match_rate, 0.5);
        assert_eq!(s.unmatched_invoices, vec!["I2".to_string()]);
        assert_eq!(s.discrepancy_histogram[&DiscrepancyKind::WrongCreditMemoMatch], 1);
        assert_eq!(s.discrepancy_histogram[&DiscrepancyKind::OrphanedCreditMemo], 1);
        assert_eq!(s.discrepancy_histogram[&DiscrepancyKind::DuplicateCreditMemos], 1);
        assert_eq!(s.severity_breakdown.high, 2);
        assert_eq!(s.severity_breakdown.medium, 1);
        assert_eq!(s.ingestion_error_count, 2);
    }

    #[test]
    fn only_first_accepted_memo_reduces_balance() {
        let invoices = InvoiceIndex::new(vec![invoice("I1", "100.00")]);
        let records = vec![
            record("C1", "I1", "30.00", PrimaryResult::Accepted, Some(100.0)),
            record("C2", "i1", "20.00", PrimaryResult::Accepted, Some(100.0)),
        ];

        let balances = invoice_balances(&records, &invoices);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].applied_credit_memo_id.as_deref(), Some("C1"));
        assert_eq!(balances[0].outstanding, BigDecimal::from_str("70.00").unwrap());

        let s = summarize(&records, &invoices, 0);
        assert_eq!(s.total_accepted_credit, BigDecimal::from(50));
        // each Accepted pair counts its invoice, even when the invoice repeats
        assert_eq!(s.total_matched_invoice_amount, BigDecimal::from(200));
        assert_eq!(s.amount_difference, BigDecimal::from(150));
    }
}
