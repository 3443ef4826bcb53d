use crate::error::{ReconError, Result};
use crate::models::{CreditMemoRow, InvoiceRow, MatchRecord, RawBatch};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

const INSERT_CHUNK: usize = 1000;
const INSERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Invoices belonging to one business
pub async fn list_invoices(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<InvoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT fid, fcustomer, fvendor, fcurrency, famount, fissuedate, fstatus
        FROM t_recon_invoice
        WHERE fbusinessid = $1
        ORDER BY fseq
        "#
    )
    .bind(business_id)
    .fetch_all(pool)
    .await
}

/// Credit memos belonging to one business, in entry order
pub async fn list_credit_memos(
    pool: &PgPool,
    business_id: i64,
) -> Result<Vec<CreditMemoRow>, sqlx::Error> {
    sqlx::query_as::<_, CreditMemoRow>(
        r#"
        SELECT fid, finvoiceid, fcustomer, fvendor, fcurrency, famount, fissuedate
        FROM t_recon_credit_memo
        WHERE fbusinessid = $1
        ORDER BY fseq
        "#
    )
    .bind(business_id)
    .fetch_all(pool)
    .await
}

/// Snapshot of one business as a raw batch
pub async fn load_batch(pool: &PgPool, business_id: i64) -> Result<RawBatch> {
    let invoices = list_invoices(pool, business_id).await?;
    let credit_memos = list_credit_memos(pool, business_id).await?;
    tracing::info!(
        "Business {}: loaded {} invoices, {} credit memos",
        business_id,
        invoices.len(),
        credit_memos.len()
    );
    Ok(RawBatch {
        invoices: invoices.into_iter().map(Into::into).collect(),
        credit_memos: credit_memos.into_iter().map(Into::into).collect(),
    })
}

fn join_labels<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join("|")
}

/// Replace one business's stored results inside `tx`: previous rows are
/// deleted, then the new records are inserted in chunks.
pub async fn replace_results(
    tx: &mut Transaction<'_, Postgres>,
    business_id: i64,
    records: &[MatchRecord],
    reconciled_at: DateTime<Utc>,
) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM t_recon_result WHERE fbusinessid = $1")
        .bind(business_id)
        .execute(&mut **tx)
        .await?;
    tracing::debug!(
        "Business {}: removed {} previous result rows",
        business_id,
        deleted.rows_affected()
    );

    for chunk in records.chunks(INSERT_CHUNK) {
        insert_chunk(tx, business_id, chunk, reconciled_at).await?;
    }
    Ok(())
}

async fn insert_chunk(
    tx: &mut Transaction<'_, Postgres>,
    business_id: i64,
    records: &[MatchRecord],
    reconciled_at: DateTime<Utc>,
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    tracing::debug!("Building bulk insert for {} records", records.len());

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO t_recon_result (
            fbusinessid, fcreditmemoid, finvoiceid, fcreditamount,
            fprimaryresult, fannotations, fconfidence, fissues,
            fdiscrepancies, freconciledat
        ) "
    );

    query_builder.push_values(records, |mut b, r| {
        b.push_bind(business_id)
            .push_bind(&r.credit_memo_id)
            .push_bind(&r.invoice_id)
            .push_bind(r.credit_amount.clone())
            .push_bind(r.primary_result.to_string())
            .push_bind(join_labels(r.secondary_annotations.iter()))
            .push_bind(r.confidence)
            .push_bind(join_labels(r.issues.iter().map(|i| i.label)))
            .push_bind(join_labels(r.discrepancies.iter().map(|d| d.kind)))
            .push_bind(reconciled_at);
    });

    let execute_start = std::time::Instant::now();
    match tokio::time::timeout(INSERT_TIMEOUT, query_builder.build().execute(&mut **tx)).await {
        Ok(Ok(result)) => {
            tracing::info!(
                "INSERT ok, {} rows, took {:?}",
                result.rows_affected(),
                execute_start.elapsed()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("INSERT failed after {:?}: {:?}", execute_start.elapsed(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("INSERT timed out (>{:?})", INSERT_TIMEOUT);
            Err(ReconError::Timeout(INSERT_TIMEOUT))
        }
    }
}
