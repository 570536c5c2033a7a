//! Thin JSON-only HTTP front end over the audit pipeline.
//!
//! Deliberately does not render HTML: presentation/templating is an
//! external collaborator's concern, not this binary's.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use pkgaudit::cache::Namespace;
use pkgaudit::{Cache, Config, RiskReport};
use serde::Deserialize;

struct AppState {
    config: Config,
    cache: Cache,
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    pkg: String,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn audit_endpoint(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Response {
    if query.pkg.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "pkg must not be empty" })),
        )
            .into_response();
    }

    let state = Arc::clone(&state);
    let pkg = query.pkg;
    let result = tokio::task::spawn_blocking(move || {
        pkgaudit::audit_json(&pkg, &state.config, &state.cache)
    })
    .await
    .unwrap_or_else(|_| serde_json::json!({ "error": "audit task panicked" }));

    Json(result).into_response()
}

async fn report_endpoint(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let name = name.trim_end_matches(".json").to_lowercase();
    match state.cache.get::<RiskReport>(Namespace::Report, &name) {
        Some(report) => Json(report).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Package not found", "status": 404 })),
        )
            .into_response(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env();
    let cache_dir = config
        .cache_dir
        .clone()
        .unwrap_or_else(Cache::default_base_dir);
    let cache = Cache::new(cache_dir, config.cache_ttl);
    let state = Arc::new(AppState { config, cache });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/audit", get(audit_endpoint))
        .route("/api/report/:name", get(report_endpoint))
        .with_state(state);

    let addr = std::env::var("PKGAUDIT_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
