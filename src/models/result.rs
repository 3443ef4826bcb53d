use bigdecimal::BigDecimal;
use serde::Serialize;
use std::fmt;

use super::stats::{AnalyticsSummary, InvoiceBalance};

/// Closed discrepancy taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    WrongCreditMemoMatch,
    OrphanedCreditMemo,
    DuplicateCreditMemos,
    LargeCreditAmount,
}

impl DiscrepancyKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::WrongCreditMemoMatch | Self::OrphanedCreditMemo => Severity::High,
            Self::DuplicateCreditMemos | Self::LargeCreditAmount => Severity::Medium,
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongCreditMemoMatch => write!(f, "WRONG_CREDIT_MEMO_MATCH"),
            Self::OrphanedCreditMemo => write!(f, "ORPHANED_CREDIT_MEMO"),
            Self::DuplicateCreditMemos => write!(f, "DUPLICATE_CREDIT_MEMOS"),
            Self::LargeCreditAmount => write!(f, "LARGE_CREDIT_AMOUNT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    /// No built-in kind maps here; backs the `low` bucket of `SeverityBreakdown`
    Low,
}

/// Exactly one per credit memo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryResult {
    Accepted,
    Rejected,
    Orphaned,
}

impl PrimaryResult {
    pub fn discrepancy(self) -> Option<DiscrepancyKind> {
        match self {
            Self::Accepted => None,
            Self::Rejected => Some(DiscrepancyKind::WrongCreditMemoMatch),
            Self::Orphaned => Some(DiscrepancyKind::OrphanedCreditMemo),
        }
    }
}

impl fmt::Display for PrimaryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Orphaned => write!(f, "Orphaned"),
        }
    }
}

/// Supplementary annotation; never changes the primary result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Annotation {
    Duplicate,
    Suspicious,
}

impl Annotation {
    pub fn discrepancy(self) -> DiscrepancyKind {
        match self {
            Self::Duplicate => DiscrepancyKind::DuplicateCreditMemos,
            Self::Suspicious => DiscrepancyKind::LargeCreditAmount,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "Duplicate"),
            Self::Suspicious => write!(f, "Suspicious"),
        }
    }
}

/// One violated validation rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub label: &'static str,
    pub penalty: f64,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub severity: Severity,
    pub description: String,
}

impl Discrepancy {
    pub fn new(kind: DiscrepancyKind, description: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            description,
        }
    }
}

/// Per-credit-memo output record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub credit_memo_id: String,
    pub invoice_id: String,
    pub credit_amount: BigDecimal,
    pub primary_result: PrimaryResult,
    pub secondary_annotations: Vec<Annotation>,
    /// Absent for orphans, which never reach validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub issues: Vec<Issue>,
    pub discrepancies: Vec<Discrepancy>,
}

impl MatchRecord {
    pub fn has_annotation(&self, annotation: Annotation) -> bool {
        self.secondary_annotations.contains(&annotation)
    }

    pub fn issue_labels(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.label).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Invoice,
    CreditMemo,
}

/// A record excluded from matching because it could not be normalized
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionError {
    pub record_kind: RecordKind,
    pub record_id: String,
    pub reason: String,
}

/// Engine output handed to the result sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconReport {
    pub records: Vec<MatchRecord>,
    pub analytics: AnalyticsSummary,
    pub invoice_balances: Vec<InvoiceBalance>,
    pub ingestion_errors: Vec<IngestionError>,
}

/// Report for one stored business batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReport {
    pub business_id: i64,
    pub report: ReconReport,
}
