use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use hyper::Server;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::DataConfig;
use crate::constants;
use crate::dashboard;
use crate::error::DashboardError;
use crate::metrics;
use crate::pipeline::{self, processing::RangeFilter};

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DataConfig>,
}

impl AppState {
    pub fn new(data: DataConfig) -> Self {
        Self { data: Arc::new(data) }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

/// Body of every JSON error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub error: String,
}

fn error_response(status: StatusCode, message: &str, error: impl ToString) -> Response {
    metrics::record_request(status.as_u16());
    (
        status,
        Json(ErrorEnvelope {
            message: message.to_string(),
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "btc-dashboard",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn dashboard_page() -> impl IntoResponse {
    Html(dashboard::render_page())
}

/// Balance records endpoint. The export is re-read on every request.
async fn btc_addresses(
    method: Method,
    State(state): State<AppState>,
    query: Option<Query<RangeQuery>>,
) -> Response {
    if method != Method::GET {
        warn!(%method, "rejected non-GET request");
        metrics::record_request(StatusCode::METHOD_NOT_ALLOWED.as_u16());
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET")],
            format!("Method {} Not Allowed", method),
        )
            .into_response();
    }

    let filter = match query {
        Some(Query(RangeQuery { range: Some(name) })) => match name.parse::<RangeFilter>() {
            Ok(filter) => filter,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid range filter", e),
        },
        Some(Query(RangeQuery { range: None })) => RangeFilter::All,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid range filter",
                "malformed query string",
            )
        }
    };

    let data = state.data.clone();
    let loaded = tokio::task::spawn_blocking(move || {
        pipeline::load_records(&data.path, data.strict_columns)
    })
    .await;

    let records = match loaded {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                constants::LOAD_ERROR_MESSAGE,
                e,
            )
        }
        Err(join_error) => {
            error!("load task failed: {}", join_error);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                constants::LOAD_ERROR_MESSAGE,
                join_error,
            );
        }
    };

    let records = pipeline::processing::apply_range_filter(&records, filter);
    metrics::record_request(StatusCode::OK.as_u16());
    metrics::record_records_served(records.len());
    Json(records).into_response()
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    // CORS stays off the balances route so every non-GET, OPTIONS included, gets 405
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let pages: Router<AppState> = Router::new()
        .route(constants::DASHBOARD_ROUTE, get(dashboard_page))
        .route(constants::HEALTH_ROUTE, get(health))
        .layer(cors);

    Router::new()
        .route(constants::BTC_ADDRESSES_ROUTE, any(btc_addresses))
        .merge(pages)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Start the HTTP server on `addr`, stopping on Ctrl-C
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), DashboardError> {
    let data_path = state.data.path.display().to_string();
    let app = create_server(state);

    info!(%addr, data = %data_path, "HTTP server starting");
    println!("🚀 Dashboard running on http://{addr}{}", constants::DASHBOARD_ROUTE);
    println!("📈 Balances:     http://{addr}{}", constants::BTC_ADDRESSES_ROUTE);
    println!("💚 Health check: http://{addr}{}", constants::HEALTH_ROUTE);

    Server::try_bind(&addr)
        .map_err(|e| DashboardError::Config(format!("Failed to bind {}: {}", addr, e)))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DashboardError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
    }
}
