use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::{MatchRecord, ReconReport};

/// Consumer of a finished reconciliation
pub trait ResultSink {
    fn consume(&mut self, report: &ReconReport) -> Result<()>;
}

const CSV_HEADER: [&str; 8] = [
    "credit_memo_id",
    "invoice_id",
    "credit_amount",
    "primary_result",
    "secondary_annotations",
    "confidence",
    "issues",
    "discrepancies",
];

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join("|")
}

fn csv_row(r: &MatchRecord) -> [String; 8] {
    [
        r.credit_memo_id.clone(),
        r.invoice_id.clone(),
        r.credit_amount.to_string(),
        r.primary_result.to_string(),
        join(r.secondary_annotations.iter()),
        r.confidence.map(|c| format!("{c:.1}")).unwrap_or_default(),
        join(r.issues.iter().map(|i| i.label)),
        join(r.discrepancies.iter().map(|d| d.kind)),
    ]
}

/// One CSV row per credit memo; the header is written once per sink
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::ReconError::Io(e.into_error()))
    }
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn consume(&mut self, report: &ReconReport) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(CSV_HEADER)?;
            self.header_written = true;
        }
        for r in &report.records {
            self.writer.write_record(csv_row(r))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Whole report as pretty JSON
pub struct JsonSink<W: Write> {
    inner: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    fn consume(&mut self, report: &ReconReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.inner, report)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawAmount, RawBatch, RawCreditMemo, RawInvoice};
    use crate::service::Reconciler;

    fn report() -> ReconReport {
        let batch = RawBatch {
            invoices: vec![RawInvoice {
                id: Some("INV-1".into()),
                customer_name: Some("Acme".into()),
                amount: Some(RawAmount::Text("100.00".into())),
                date: Some("2024-01-01".into()),
                ..Default::default()
            }],
            credit_memos: vec![
                RawCreditMemo {
                    id: Some("CM-1".into()),
                    invoice_id: Some("INV-1".into()),
                    customer_name: Some("Acme".into()),
                    amount: Some(RawAmount::Text("60.00".into())),
                    date: Some("2024-01-05".into()),
                    ..Default::default()
                },
                RawCreditMemo {
                    id: Some("CM-2".into()),
                    invoice_id: Some("INV-404".into()),
                    customer_name: Some("Acme".into()),
                    amount: Some(RawAmount::Text("1".into())),
                    date: Some("2024-01-05".into()),
                    ..Default::default()
                },
            ],
        };
        Reconciler::default().reconcile(&batch)
    }

    #[test]
    fn csv_sink_writes_one_row_per_memo() {
        let mut sink = CsvSink::new(Vec::new());
        sink.consume(&report()).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("credit_memo_id,invoice_id"));
        assert_eq!(lines[1], "CM-1,INV-1,60.00,Accepted,Suspicious,100.0,,LARGE_CREDIT_AMOUNT");
        assert_eq!(lines[2], "CM-2,INV-404,1,Orphaned,,,,ORPHANED_CREDIT_MEMO");
    }

    #[test]
    fn csv_sink_reused_for_two_reports_writes_header_once() {
        let mut sink = CsvSink::new(Vec::new());
        sink.consume(&report()).unwrap();
        sink.consume(&report()).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines.iter().filter(|l| l.starts_with("credit_memo_id,")).count(), 1);
        assert_eq!(lines[1], lines[3]);
        assert_eq!(lines[2], lines[4]);
    }

    #[test]
    fn json_sink_omits_confidence_for_orphans() {
        let mut sink = JsonSink::new(Vec::new());
        sink.consume(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();

        let records = value["records"].as_array().unwrap();
        assert_eq!(records[0]["primaryResult"], "Accepted");
        assert_eq!(records[0]["confidence"], 100.0);
        assert!(records[1].get("confidence").is_none());
        assert_eq!(value["analytics"]["primaryCounts"]["orphaned"], 1);
    }
}
