//! Runs against a live Postgres named by `DATABASE_URL`:
//! `cargo test --test stored -- --ignored`

use std::sync::Arc;

use credit_recon::service::stored::StoredReconciler;
use credit_recon::Reconciler;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.unwrap();
    for statement in include_str!("../sql/schema.sql").split(';') {
        if !statement.trim().is_empty() {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
    }
    pool
}

async fn seed(pool: &PgPool, business_id: i64) {
    sqlx::query(
        "INSERT INTO t_recon_invoice
            (fbusinessid, fid, fcustomer, fcurrency, famount, fissuedate, fstatus)
         VALUES ($1, 'INV-1', 'Acme', 'USD', 1000.00, '2024-01-01', 'open')",
    )
    .bind(business_id)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO t_recon_credit_memo
            (fbusinessid, fid, finvoiceid, fcustomer, fcurrency, famount, fissuedate)
         VALUES ($1, 'CM-1', 'INV-1', 'Acme', 'USD', 100.00, '2024-01-05'),
                ($1, 'CM-2', 'INV-404', 'Acme', 'USD', 5.00, '2024-01-05')",
    )
    .bind(business_id)
    .execute(pool)
    .await
    .unwrap();
}

async fn result_rows(pool: &PgPool, business_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM t_recon_result WHERE fbusinessid = $1")
        .bind(business_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn cleanup(pool: &PgPool, business_id: i64) {
    for table in ["t_recon_result", "t_recon_credit_memo", "t_recon_invoice"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE fbusinessid = $1"))
            .bind(business_id)
            .execute(pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn rerun_replaces_previous_results() {
    let pool = pool().await;
    let business_id = chrono::Utc::now().timestamp_micros();
    seed(&pool, business_id).await;

    let stored = StoredReconciler::new(pool.clone(), Arc::new(Reconciler::default()));
    let first = stored.reconcile_businesses(&[business_id]).await.unwrap();
    assert_eq!(first[0].report.records.len(), 2);
    assert_eq!(result_rows(&pool, business_id).await, 2);

    stored.reconcile_businesses(&[business_id]).await.unwrap();
    assert_eq!(result_rows(&pool, business_id).await, 2);

    cleanup(&pool, business_id).await;
}
