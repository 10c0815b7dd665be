//! Thin HTTP adapter: decodes requests, calls the ledger service, and maps
//! typed ledger errors onto status codes.

mod error;
mod routes;

pub use error::*;
pub use routes::*;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::application::LedgerService;
use crate::storage::Storage;

/// Shared handler state. Storage is type-erased so the same router serves any backend.
pub type AppState = LedgerService<dyn Storage>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/account", post(create_account).get(list_accounts))
        .route("/account/:id", get(get_account).delete(delete_account))
        .route("/transfer", post(transfer))
        .with_state(service)
}

/// Bind `listen_addr` and serve until the process is stopped.
pub async fn serve(listen_addr: &str, service: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    tracing::info!("ledger API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .await
        .context("HTTP server failed")
}
