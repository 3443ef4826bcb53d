pub mod credit_memo;
pub mod invoice;
pub mod raw;
pub mod result;
pub mod stats;

pub use credit_memo::CreditMemo;
pub use invoice::{Invoice, InvoiceStatus};
pub use raw::{CreditMemoRow, InvoiceRow, RawAmount, RawBatch, RawCreditMemo, RawInvoice};
pub use result::{
    Annotation, BusinessReport, Discrepancy, DiscrepancyKind, IngestionError, Issue, MatchRecord,
    PrimaryResult, ReconReport, RecordKind, Severity,
};
pub use stats::{
    AnalyticsSummary, AnnotationCounts, InvoiceBalance, PrimaryCounts, SeverityBreakdown,
};
