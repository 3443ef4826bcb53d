use credit_recon::api::{self, AppState};
use credit_recon::service::stored::StoredReconciler;
use credit_recon::{create_pool, AppConfig, Reconciler};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // local-time log format
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let reconciler = Arc::new(Reconciler::new(&config.recon));
    let state = AppState {
        stored: Arc::new(StoredReconciler::new(pool, Arc::clone(&reconciler))),
        reconciler,
    };
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/reconcile         - reconcile the batch in the request body");
    info!("  POST /api/reconcile/stored  - reconcile stored businesses and persist results");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
