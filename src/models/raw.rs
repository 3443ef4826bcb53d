use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Amount as it arrives on the wire: a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl From<BigDecimal> for RawAmount {
    fn from(value: BigDecimal) -> Self {
        RawAmount::Text(value.to_string())
    }
}

/// Unvalidated invoice record (JSON body or database row)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInvoice {
    pub id: Option<String>,
    pub customer_name: Option<String>,
    pub vendor_name: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<RawAmount>,
    pub date: Option<String>,
    pub status: Option<String>,
}

/// Unvalidated credit memo record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCreditMemo {
    pub id: Option<String>,
    pub invoice_id: Option<String>,
    pub customer_name: Option<String>,
    pub vendor_name: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<RawAmount>,
    pub date: Option<String>,
}

/// One reconciliation run's input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatch {
    #[serde(default)]
    pub invoices: Vec<RawInvoice>,
    #[serde(default)]
    pub credit_memos: Vec<RawCreditMemo>,
}

/// Invoice table row (t_recon_invoice)
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub fid: Option<String>,
    pub fcustomer: Option<String>,
    pub fvendor: Option<String>,
    pub fcurrency: Option<String>,
    pub famount: Option<BigDecimal>,
    pub fissuedate: Option<String>,
    pub fstatus: Option<String>,
}

/// Credit memo table row (t_recon_credit_memo)
#[derive(Debug, Clone, FromRow)]
pub struct CreditMemoRow {
    pub fid: Option<String>,
    pub finvoiceid: Option<String>,
    pub fcustomer: Option<String>,
    pub fvendor: Option<String>,
    pub fcurrency: Option<String>,
    pub famount: Option<BigDecimal>,
    pub fissuedate: Option<String>,
}

impl From<InvoiceRow> for RawInvoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            id: row.fid,
            customer_name: row.fcustomer,
            vendor_name: row.fvendor,
            currency: row.fcurrency,
            amount: row.famount.map(RawAmount::from),
            date: row.fissuedate,
            status: row.fstatus,
        }
    }
}

impl From<CreditMemoRow> for RawCreditMemo {
    fn from(row: CreditMemoRow) -> Self {
        Self {
            id: row.fid,
            invoice_id: row.finvoiceid,
            customer_name: row.fcustomer,
            vendor_name: row.fvendor,
            currency: row.fcurrency,
            amount: row.famount.map(RawAmount::from),
            date: row.fissuedate,
        }
    }
}
