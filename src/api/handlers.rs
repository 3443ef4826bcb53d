use crate::models::{BusinessReport, RawBatch};
use crate::service::stored::StoredReconciler;
use crate::service::Reconciler;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state: in-memory engine plus the Postgres-backed runner
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub stored: Arc<StoredReconciler>,
}

/// Request body: business ids to reconcile from the database
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReconcileRequest {
    pub business_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct StoredReconcileResponse {
    pub success: bool,
    pub message: String,
    pub reports: Option<Vec<BusinessReport>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Reconcile the invoices and credit memos in the request body
pub async fn reconcile(State(state): State<AppState>, Json(batch): Json<RawBatch>) -> Response {
    let reconciler = Arc::clone(&state.reconciler);
    match tokio::task::spawn_blocking(move || reconciler.reconcile(&batch)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!("Reconciliation worker failed: {}", e);
            let response = ErrorResponse {
                success: false,
                message: format!("Error: {}", e),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// Reconcile stored businesses and persist the results
pub async fn reconcile_stored(
    State(state): State<AppState>,
    Json(req): Json<StoredReconcileRequest>,
) -> Response {
    match state.stored.reconcile_businesses(&req.business_ids).await {
        Ok(reports) => {
            let memos: usize = reports.iter().map(|r| r.report.records.len()).sum();
            let accepted: usize = reports
                .iter()
                .map(|r| r.report.analytics.primary_counts.accepted)
                .sum();
            let response = StoredReconcileResponse {
                success: true,
                message: format!(
                    "Reconciled {} businesses, {} credit memos, {} accepted",
                    req.business_ids.len(),
                    memos,
                    accepted
                ),
                reports: Some(reports),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Stored reconciliation failed: {}", e);
            let response = StoredReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                reports: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
