use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized credit memo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditMemo {
    pub id: String,
    /// Referenced invoice identifier, as written on the memo
    pub invoice_id: String,
    pub customer_name: String,
    pub vendor_name: Option<String>,
    pub currency: String,
    pub amount: BigDecimal,
    pub date: NaiveDate,
}
