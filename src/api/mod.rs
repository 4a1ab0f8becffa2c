// src/api/mod.rs — HTTP surface for the diagnosis pipeline

pub mod auth;
pub mod handlers;
pub mod types;

use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::entitlement::EntitlementGate;
use crate::infra::config::Config;
use crate::pipeline::FallbackPipeline;
use crate::storage::Store;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Mutex<Store>>,
    pub pipeline: Arc<FallbackPipeline>,
    pub gate: Arc<EntitlementGate>,
    pub token: Option<String>,
}

impl ApiState {
    pub fn new(config: &Config, store: Arc<Mutex<Store>>) -> Self {
        let pipeline = Arc::new(FallbackPipeline::from_config(config, store.clone()));
        let gate = Arc::new(EntitlementGate::new(
            store.clone(),
            config.quota.daily_limit,
        ));
        Self {
            store,
            pipeline,
            gate,
            token: config.server.api_token.clone(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/diagnoses", post(handlers::create_diagnosis))
        .route("/api/v1/diagnoses/{id}", get(handlers::get_diagnosis))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the configured port (blocking).
pub async fn start_server(port: u16, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageManager;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let store = Arc::new(Mutex::new(StorageManager::in_memory().unwrap().store));
        ApiState::new(&Config::default(), store)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
