use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::MalformedRecord;
use crate::models::{
    CreditMemo, IngestionError, Invoice, InvoiceStatus, RawAmount, RawCreditMemo, RawInvoice,
    RecordKind,
};

const DEFAULT_CURRENCY: &str = "USD";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Case-insensitive, whitespace-collapsed form of a customer/vendor name
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn normalize_currency(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Key used for identifier lookup and duplicate grouping
pub fn canonical_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parse a date, discarding any time of day
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Decimal exponents accepted in scientific notation
const MAX_AMOUNT_EXPONENT: i64 = 32;
/// Digits in the mantissa, leading integer zeros excluded
const MAX_AMOUNT_DIGITS: usize = 38;

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Reject text whose shape or magnitude cannot be a monetary amount.
/// Runs before `BigDecimal::from_str`, which does not bound the exponent.
fn check_amount_text(text: &str) -> Result<(), String> {
    let non_numeric = || format!("non-numeric amount '{text}'");
    let out_of_range = || format!("amount out of range '{text}'");

    let unsigned = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(|c: char| c == 'e' || c == 'E') {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let empty = int_part.is_empty() && frac_part.is_empty();
    if empty || !is_digits(int_part) || !is_digits(frac_part) {
        return Err(non_numeric());
    }
    if int_part.trim_start_matches('0').len() + frac_part.len() > MAX_AMOUNT_DIGITS {
        return Err(out_of_range());
    }

    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
        if digits.is_empty() || !is_digits(digits) {
            return Err(non_numeric());
        }
        let exp: i64 = exp.parse().map_err(|_| out_of_range())?;
        if !(-MAX_AMOUNT_EXPONENT..=MAX_AMOUNT_EXPONENT).contains(&exp) {
            return Err(out_of_range());
        }
    }
    Ok(())
}

/// Parse a non-negative fixed-point amount
pub fn parse_amount(raw: &RawAmount) -> Result<BigDecimal, String> {
    let text = match raw {
        RawAmount::Number(n) => n.to_string(),
        RawAmount::Text(s) => s.trim().to_string(),
    };
    check_amount_text(&text)?;
    let amount = BigDecimal::from_str(&text).map_err(|_| format!("non-numeric amount '{text}'"))?;
    if amount < BigDecimal::zero() {
        return Err(format!("negative amount {amount}"));
    }
    Ok(amount)
}

fn parse_status(raw: Option<&str>) -> Result<InvoiceStatus, String> {
    let Some(raw) = raw else {
        return Ok(InvoiceStatus::Open);
    };
    match raw.trim().to_lowercase().as_str() {
        "" | "open" | "pending" => Ok(InvoiceStatus::Open),
        "closed" | "paid" => Ok(InvoiceStatus::Closed),
        "void" | "cancelled" | "canceled" => Ok(InvoiceStatus::Void),
        other => Err(format!("unknown invoice status '{other}'")),
    }
}

fn required_id(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn optional_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn currency_or_default(raw: Option<&str>) -> String {
    match raw.map(normalize_currency) {
        Some(c) if !c.is_empty() => c,
        _ => DEFAULT_CURRENCY.to_string(),
    }
}

fn common_fields(
    kind: RecordKind,
    id: &str,
    amount: Option<&RawAmount>,
    date: Option<&str>,
) -> Result<(BigDecimal, NaiveDate), MalformedRecord> {
    let amount = amount
        .ok_or_else(|| MalformedRecord::new(kind, id, "missing amount"))
        .and_then(|a| parse_amount(a).map_err(|reason| MalformedRecord::new(kind, id, reason)))?;
    let date_text = date.ok_or_else(|| MalformedRecord::new(kind, id, "missing date"))?;
    let date = parse_date(date_text)
        .ok_or_else(|| MalformedRecord::new(kind, id, format!("unparsable date '{date_text}'")))?;
    Ok((amount, date))
}

/// Normalize one invoice; `position` names the record when its id is missing
pub fn normalize_invoice(raw: &RawInvoice, position: usize) -> Result<Invoice, MalformedRecord> {
    let kind = RecordKind::Invoice;
    let id = required_id(raw.id.as_deref()).ok_or_else(|| {
        MalformedRecord::new(kind, format!("invoice[{position}]"), "missing invoice identifier")
    })?;
    let (amount, date) = common_fields(kind, &id, raw.amount.as_ref(), raw.date.as_deref())?;
    let status =
        parse_status(raw.status.as_deref()).map_err(|r| MalformedRecord::new(kind, &id, r))?;

    Ok(Invoice {
        customer_name: raw.customer_name.as_deref().map(str::trim).unwrap_or_default().to_string(),
        vendor_name: optional_name(raw.vendor_name.as_deref()),
        currency: currency_or_default(raw.currency.as_deref()),
        amount,
        date,
        status,
        id,
    })
}

pub fn normalize_credit_memo(
    raw: &RawCreditMemo,
    position: usize,
) -> Result<CreditMemo, MalformedRecord> {
    let kind = RecordKind::CreditMemo;
    let id = required_id(raw.id.as_deref()).ok_or_else(|| {
        MalformedRecord::new(
            kind,
            format!("creditMemo[{position}]"),
            "missing credit memo identifier",
        )
    })?;
    let invoice_id = required_id(raw.invoice_id.as_deref())
        .ok_or_else(|| MalformedRecord::new(kind, &id, "missing referenced invoice identifier"))?;
    let (amount, date) = common_fields(kind, &id, raw.amount.as_ref(), raw.date.as_deref())?;

    Ok(CreditMemo {
        customer_name: raw.customer_name.as_deref().map(str::trim).unwrap_or_default().to_string(),
        vendor_name: optional_name(raw.vendor_name.as_deref()),
        currency: currency_or_default(raw.currency.as_deref()),
        amount,
        date,
        invoice_id,
        id,
    })
}

impl From<MalformedRecord> for IngestionError {
    fn from(err: MalformedRecord) -> Self {
        Self {
            record_kind: err.kind,
            record_id: err.record_id,
            reason: err.reason,
        }
    }
}

/// Normalized batch plus the records that were excluded
#[derive(Debug, Default)]
pub struct Ingested {
    pub invoices: Vec<Invoice>,
    pub credit_memos: Vec<CreditMemo>,
    pub errors: Vec<IngestionError>,
}

/// Normalize a whole batch. Malformed records are reported, not dropped silently.
pub fn ingest(invoices: &[RawInvoice], credit_memos: &[RawCreditMemo]) -> Ingested {
    let mut out = Ingested::default();
    let mut seen_invoices: HashSet<String> = HashSet::new();

    for (pos, raw) in invoices.iter().enumerate() {
        match normalize_invoice(raw, pos) {
            Ok(inv) => {
                if !seen_invoices.insert(canonical_id(&inv.id)) {
                    let err = MalformedRecord::new(
                        RecordKind::Invoice,
                        &inv.id,
                        "duplicate invoice identifier",
                    );
                    tracing::warn!("Excluding record: {}", err);
                    out.errors.push(err.into());
                    continue;
                }
                out.invoices.push(inv);
            }
            Err(err) => {
                tracing::warn!("Excluding record: {}", err);
                out.errors.push(err.into());
            }
        }
    }

    let mut seen_memos: HashSet<String> = HashSet::new();
    for (pos, raw) in credit_memos.iter().enumerate() {
        match normalize_credit_memo(raw, pos) {
            Ok(cm) => {
                if !seen_memos.insert(canonical_id(&cm.id)) {
                    let err = MalformedRecord::new(
                        RecordKind::CreditMemo,
                        &cm.id,
                        "duplicate credit memo identifier",
                    );
                    tracing::warn!("Excluding record: {}", err);
                    out.errors.push(err.into());
                    continue;
                }
                out.credit_memos.push(cm);
            }
            Err(err) => {
                tracing::warn!("Excluding record: {}", err);
                out.errors.push(err.into());
            }
        }
    }

    out
}
