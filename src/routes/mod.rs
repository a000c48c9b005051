// Route exports
pub mod matches;
pub mod search;

use actix_web::{error, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::error::MatchError;
use crate::models::HealthResponse;
use crate::services::{MatchService, SearchService};
use crate::store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub matches: Arc<MatchService>,
    pub store: Arc<dyn Store>,
}

/// Mount every route under `/api/v1` with JSON error bodies for bad payloads
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .app_data(web::PathConfig::default().error_handler(handle_path_error))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(health_check))
                .configure(search::configure)
                .configure(matches::configure),
        );
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    MatchError::InvalidInput(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    MatchError::InvalidInput(format!("Invalid query: {}", err)).into()
}

fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    MatchError::InvalidInput(format!("Invalid path: {}", err)).into()
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = match state.store.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}
