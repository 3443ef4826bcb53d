use std::collections::HashMap;

use crate::models::{CreditMemo, Invoice};
use crate::service::normalizer::canonical_id;

/// Read-only invoice lookup
pub trait InvoiceStore {
    fn get(&self, invoice_id: &str) -> Option<&Invoice>;

    /// All invoices in a stable order
    fn invoices(&self) -> Box<dyn Iterator<Item = &Invoice> + '_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only, ordered credit memo iteration
pub trait CreditMemoStore {
    fn credit_memos(&self) -> Box<dyn Iterator<Item = &CreditMemo> + '_>;
}

/// Indexed in-memory invoice store keyed by canonical identifier
#[derive(Debug, Clone, Default)]
pub struct InvoiceIndex {
    invoices: Vec<Invoice>,
    by_id: HashMap<String, usize>,
}

impl InvoiceIndex {
    /// Later invoices with an identifier already present are ignored.
    pub fn new(invoices: Vec<Invoice>) -> Self {
        let mut kept = Vec::with_capacity(invoices.len());
        let mut by_id = HashMap::with_capacity(invoices.len());
        for inv in invoices {
            let key = canonical_id(&inv.id);
            if by_id.contains_key(&key) {
                tracing::warn!("Invoice {} already indexed, ignoring repeat", inv.id);
                continue;
            }
            by_id.insert(key, kept.len());
            kept.push(inv);
        }
        Self { invoices: kept, by_id }
    }
}

impl InvoiceStore for InvoiceIndex {
    fn get(&self, invoice_id: &str) -> Option<&Invoice> {
        self.by_id
            .get(&canonical_id(invoice_id))
            .map(|&idx| &self.invoices[idx])
    }

    fn invoices(&self) -> Box<dyn Iterator<Item = &Invoice> + '_> {
        Box::new(self.invoices.iter())
    }

    fn len(&self) -> usize {
        self.invoices.len()
    }
}

/// In-memory credit memos in input order
#[derive(Debug, Clone, Default)]
pub struct CreditMemoList {
    memos: Vec<CreditMemo>,
}

impl CreditMemoList {
    pub fn new(memos: Vec<CreditMemo>) -> Self {
        Self { memos }
    }

    pub fn len(&self) -> usize {
        self.memos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memos.is_empty()
    }
}

impl CreditMemoStore for CreditMemoList {
    fn credit_memos(&self) -> Box<dyn Iterator<Item = &CreditMemo> + '_> {
        Box::new(self.memos.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn invoice(id: &str, amount: i64) -> Invoice {
        Invoice {
            id: id.into(),
            customer_name: "Acme".into(),
            vendor_name: None,
            currency: "USD".into(),
            amount: BigDecimal::from(amount),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: InvoiceStatus::Open,
        }
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        let index = InvoiceIndex::new(vec![invoice("INV-2024-001", 10)]);
        assert!(index.get(" inv-2024-001 ").is_some());
        assert!(index.get("INV-2024-999").is_none());
    }

    #[test]
    fn first_invoice_wins_on_repeat() {
        let index = InvoiceIndex::new(vec![invoice("A", 1), invoice("a", 2)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("A").unwrap().amount, BigDecimal::from(1));
    }
}
