mod catalog;
mod config;
mod http;
mod images;
mod metrics;
mod models;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use catalog::{CatalogError, CatalogService, SheetKind};
use images::{
    ImageKind,
    proxy::{self, ProxyError},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::ApiError;
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "zahara.api", "server crashed: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    if config::service_account_configured() {
        info!(
            target = "zahara.api",
            client_email = %*config::GOOGLE_CLIENT_EMAIL,
            "service account credentials present; sheet access stays on the public CSV export"
        );
    } else {
        info!(
            target = "zahara.api",
            "no service account credentials; using the public CSV export"
        );
    }

    let client = http::build_client();
    let openapi: serde_json::Value = serde_yaml::from_str(include_str!("../docs/openapi.yaml"))
        .unwrap_or(json!({"openapi": "3.0.3"}));
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prom recorder");

    let state = AppState {
        catalog: CatalogService::new(client.clone()),
        client,
        openapi: Arc::new(openapi),
        prometheus_handle,
    };

    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
        .route("/catalog", get(catalog_endpoint))
        .route("/decants", get(decants_endpoint))
        .route("/image-proxy", get(image_proxy_endpoint))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "zahara.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    catalog: CatalogService,
    client: reqwest::Client,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "zahara-api-rs",
    }))
}

async fn openapi_json(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Response {
    if let Ok(key) = std::env::var("OPENAPI_KEY") {
        let presented = headers
            .get("X-Docs-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != key {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::bare("unauthorized")),
            )
                .into_response();
        }
    }
    Json((*state.openapi).clone()).into_response()
}

async fn swagger_ui() -> axum::http::Response<String> {
    let html = r#"<!doctype html>
<html>
<head>
  <meta charset='utf-8'/>
  <title>Zahara API Docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    };
  </script>
</body>
</html>"#;
    axum::http::Response::builder()
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.to_string())
        .unwrap()
}

async fn metrics_endpoint(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::http::Response<String> {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return axum::http::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body("unauthorized".into())
                .unwrap();
        }
    }
    let body = state.prometheus_handle.render();
    axum::http::Response::builder()
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .unwrap()
}

#[derive(Debug, Deserialize)]
struct CatalogQuery {
    id: Option<String>,
}

/// Full fragrance listing, or one item by id.
///
/// - Method: `GET`
/// - Path: `/catalog?id=<optional>`
/// - Response: array of items, or a single item when `id` is given
async fn catalog_endpoint(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    crate::metrics::inc_requests("/catalog");
    serve_sheet(&state, SheetKind::Fragrance, query.id).await
}

/// Same contract as `/catalog`, backed by the decants sheet.
async fn decants_endpoint(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    crate::metrics::inc_requests("/decants");
    serve_sheet(&state, SheetKind::Decant, query.id).await
}

async fn serve_sheet(
    state: &AppState,
    kind: SheetKind,
    id: Option<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    match id.filter(|value| !value.trim().is_empty()) {
        Some(id) => {
            let item = state.catalog.get_by_id(kind, id.trim()).await?;
            Ok(Json(serde_json::to_value(item).unwrap_or_default()))
        }
        None => {
            let items = state.catalog.list_all(kind).await?;
            Ok(Json(serde_json::to_value(items).unwrap_or_default()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageProxyQuery {
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Stream an allow-listed origin image without revealing its URL.
///
/// - Method: `GET`
/// - Path: `/image-proxy?url=<base64>&type=<fragrance|decant>`
/// - Response: image bytes with long-lived public caching, or JSON error
async fn image_proxy_endpoint(
    State(state): State<AppState>,
    Query(query): Query<ImageProxyQuery>,
) -> Result<Response, AppError> {
    crate::metrics::inc_requests("/image-proxy");

    let Some(token) = query.url.filter(|value| !value.trim().is_empty()) else {
        return Err(AppError::MissingUrl);
    };
    let kind = ImageKind::from_query(query.kind.as_deref().unwrap_or(""));

    let origin = proxy::decode_token(&token)?;
    if !proxy::host_allowed(&origin) {
        warn!(
            target = "zahara.proxy",
            host = origin.host_str().unwrap_or("<none>"),
            "image_host_rejected"
        );
        return Err(ProxyError::DomainRejected.into());
    }

    let upstream = proxy::fetch_image(&state.client, origin).await?;
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header("X-Image-Source", kind.source_label())
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|_| AppError::Proxy(ProxyError::Upstream))
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiError::bare("method_not_allowed")),
    )
        .into_response()
}

#[derive(Debug)]
enum AppError {
    Catalog(CatalogError),
    Proxy(ProxyError),
    MissingUrl,
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ProxyError> for AppError {
    fn from(value: ProxyError) -> Self {
        Self::Proxy(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            AppError::Catalog(CatalogError::Transport(detail)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("sheet_unavailable", detail),
            ),
            AppError::Catalog(CatalogError::EmptyFeed) => (
                StatusCode::NOT_FOUND,
                ApiError::new("no_data", "the feed has no data rows"),
            ),
            AppError::Catalog(CatalogError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                ApiError::new("item_not_found", format!("no item with id {id}")),
            ),
            AppError::Proxy(ProxyError::MalformedToken) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("invalid_url_token", "url token could not be decoded"),
            ),
            AppError::Proxy(ProxyError::DomainRejected) => (
                StatusCode::FORBIDDEN,
                ApiError::new("domain_not_allowed", "image host is not allow-listed"),
            ),
            AppError::Proxy(ProxyError::UpstreamStatus(_)) => (
                StatusCode::NOT_FOUND,
                ApiError::new("image_not_found", "upstream image was not found"),
            ),
            AppError::Proxy(ProxyError::Upstream) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("image_proxy_failed", "failed to proxy image"),
            ),
            AppError::MissingUrl => (
                StatusCode::BAD_REQUEST,
                ApiError::new("missing_url", "url query parameter is required"),
            ),
        };
        (status, Json(payload)).into_response()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
