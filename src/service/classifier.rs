use bigdecimal::{BigDecimal, Zero};

use crate::config::ReconConfig;
use crate::models::{Annotation, Discrepancy, MatchRecord, PrimaryResult};
use crate::service::resolver::{CandidatePair, Resolution, Resolved, ResolvedMemo};
use crate::service::validator::MatchValidator;

/// True when `credit` is strictly above `percent`% of `invoice`
pub fn is_large_credit(credit: &BigDecimal, invoice: &BigDecimal, percent: u32) -> bool {
    credit.clone() * BigDecimal::from(100) > invoice.clone() * BigDecimal::from(percent)
}

fn large_credit_description(pair: &CandidatePair<'_>) -> String {
    let (credit, invoice) = (&pair.credit_memo.amount, &pair.invoice.amount);
    if invoice.is_zero() {
        return format!("Credit amount ({credit}) is applied to a zero-amount invoice");
    }
    let percent = (credit.clone() * BigDecimal::from(100) / invoice.clone()).with_scale(1);
    format!("Credit amount ({credit}) is {percent}% of invoice amount ({invoice})")
}

/// Turns resolver findings and validator output into per-memo records
#[derive(Debug, Clone)]
pub struct DiscrepancyClassifier {
    validator: MatchValidator,
    large_credit_percent: u32,
}

impl DiscrepancyClassifier {
    pub fn new(config: &ReconConfig) -> Self {
        Self::with_validator(MatchValidator::new(config), config.large_credit_percent)
    }

    pub fn with_validator(validator: MatchValidator, large_credit_percent: u32) -> Self {
        Self {
            validator,
            large_credit_percent,
        }
    }

    pub fn classify_all(&self, resolved: &Resolved<'_>) -> Vec<MatchRecord> {
        resolved.memos.iter().map(|m| self.classify(m)).collect()
    }

    pub fn classify(&self, resolved: &ResolvedMemo<'_>) -> MatchRecord {
        let cm = resolved.resolution.credit_memo();
        let mut annotations = Vec::new();
        let mut discrepancies = Vec::new();

        // 1-2. primary result
        let (primary, confidence, issues) = match &resolved.resolution {
            Resolution::Orphaned(_) => (PrimaryResult::Orphaned, None, Vec::new()),
            Resolution::Candidate(pair) => {
                let outcome = self.validator.validate(pair);
                let primary = if outcome.accepted {
                    PrimaryResult::Accepted
                } else {
                    PrimaryResult::Rejected
                };
                (primary, Some(outcome.confidence), outcome.issues)
            }
        };

        if let Some(kind) = primary.discrepancy() {
            let description = match primary {
                PrimaryResult::Orphaned => format!(
                    "Credit memo {} references non-existent invoice {}",
                    cm.id, cm.invoice_id
                ),
                _ => format!(
                    "Credit memo {} references invoice {} but validation failed: {}",
                    cm.id,
                    cm.invoice_id,
                    issues.iter().map(|i| i.detail.as_str()).collect::<Vec<_>>().join("; ")
                ),
            };
            discrepancies.push(Discrepancy::new(kind, description));
        }

        // 3. duplicate group membership
        if resolved.is_duplicate() {
            annotations.push(Annotation::Duplicate);
            discrepancies.push(Discrepancy::new(
                Annotation::Duplicate.discrepancy(),
                format!(
                    "Multiple credit memos ({}) reference the same invoice {}",
                    resolved.references_to_invoice, cm.invoice_id
                ),
            ));
        }

        // 4. large credit; informational only
        if let Resolution::Candidate(pair) = &resolved.resolution {
            if is_large_credit(&cm.amount, &pair.invoice.amount, self.large_credit_percent) {
                annotations.push(Annotation::Suspicious);
                discrepancies.push(Discrepancy::new(
                    Annotation::Suspicious.discrepancy(),
                    large_credit_description(pair),
                ));
            }
        }

        tracing::debug!("Credit memo {} classified {} {:?}", cm.id, primary, annotations);

        MatchRecord {
            credit_memo_id: cm.id.clone(),
            invoice_id: cm.invoice_id.clone(),
            credit_amount: cm.amount.clone(),
            primary_result: primary,
            secondary_annotations: annotations,
            confidence,
            issues,
            discrepancies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreditMemo, DiscrepancyKind, Invoice, InvoiceStatus, Severity};
    use crate::service::resolver::resolve;
    use crate::store::{CreditMemoList, InvoiceIndex};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn invoice(id: &str, amount: &str) -> Invoice {
        Invoice {
            id: id.into(),
            customer_name: "Acme".into(),
            vendor_name: None,
            currency: "USD".into(),
            amount: BigDecimal::from_str(amount).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            status: InvoiceStatus::Open,
        }
    }

    fn memo(id: &str, invoice_id: &str, amount: &str) -> CreditMemo {
        CreditMemo {
            id: id.into(),
            invoice_id: invoice_id.into(),
            customer_name: "Acme".into(),
            vendor_name: None,
            currency: "USD".into(),
            amount: BigDecimal::from_str(amount).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn classify(invoices: Vec<Invoice>, memos: Vec<CreditMemo>) -> Vec<MatchRecord> {
        let invoices = InvoiceIndex::new(invoices);
        let memos = CreditMemoList::new(memos);
        DiscrepancyClassifier::new(&ReconConfig::default())
            .classify_all(&resolve(&invoices, &memos))
    }

    #[test]
    fn large_credit_threshold_is_strict() {
        let inv = BigDecimal::from(1000);
        assert!(!is_large_credit(&BigDecimal::from(500), &inv, 50));
        assert!(is_large_credit(&BigDecimal::from_str("500.01").unwrap(), &inv, 50));
    }

    #[test]
    fn large_credit_is_annotation_only() {
        let records = classify(vec![invoice("I", "1000.00")], vec![memo("C", "I", "600.00")]);
        let r = &records[0];
        assert_eq!(r.primary_result, PrimaryResult::Accepted);
        assert_eq!(r.secondary_annotations, vec![Annotation::Suspicious]);
        assert_eq!(r.confidence, Some(100.0));
        assert_eq!(r.discrepancies.len(), 1);
        assert_eq!(r.discrepancies[0].kind, DiscrepancyKind::LargeCreditAmount);
        assert_eq!(r.discrepancies[0].severity, Severity::Medium);
        assert_eq!(
            r.discrepancies[0].description,
            "Credit amount (600.00) is 60.0% of invoice amount (1000.00)"
        );
    }

    #[test]
    fn orphan_has_no_confidence() {
        let records = classify(vec![], vec![memo("C", "MISSING", "10")]);
        let r = &records[0];
        assert_eq!(r.primary_result, PrimaryResult::Orphaned);
        assert_eq!(r.confidence, None);
        assert!(r.issues.is_empty());
        assert_eq!(r.discrepancies[0].kind, DiscrepancyKind::OrphanedCreditMemo);
        assert_eq!(r.discrepancies[0].severity, Severity::High);
    }

    #[test]
    fn duplicate_and_rejected_are_both_reported() {
        let mut wrong = memo("B", "I", "50");
        wrong.customer_name = "Someone Else".into();
        let records = classify(vec![invoice("I", "1000")], vec![memo("A", "I", "50"), wrong]);

        assert_eq!(records[0].primary_result, PrimaryResult::Accepted);
        assert_eq!(records[0].secondary_annotations, vec![Annotation::Duplicate]);

        let b = &records[1];
        assert_eq!(b.primary_result, PrimaryResult::Rejected);
        assert_eq!(b.secondary_annotations, vec![Annotation::Duplicate]);
        let kinds: Vec<_> = b.discrepancies.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiscrepancyKind::WrongCreditMemoMatch, DiscrepancyKind::DuplicateCreditMemos]
        );
        assert!(b.discrepancies[0].description.contains("Customer mismatch"));
    }

    #[test]
    fn zero_amount_invoice_does_not_divide() {
        let records = classify(vec![invoice("I", "0")], vec![memo("C", "I", "5")]);
        assert!(records[0].has_annotation(Annotation::Suspicious));
        assert_eq!(records[0].primary_result, PrimaryResult::Rejected);
    }
}
