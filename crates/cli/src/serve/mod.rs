//! `lilit serve` -- HTTP JSON API for planetary positions and ascendants.
//!
//! Every request passes through the access gateway before routing:
//! - Public paths (`/`, `/docs`, `/openapi.json`) skip all checks
//! - Per-client rate limiting over a resetting window
//! - API key authentication by header, or by query parameter on `/planets`
//! - Repeated credential failures block the client for a while
//!
//! Endpoints:
//! - GET       /                     - Service banner
//! - GET       /docs                 - Interactive API reference
//! - GET       /openapi.json         - OpenAPI 3.0 document
//! - GET|POST  /planets              - Positions of the ten bodies (4 decimals)
//! - GET|POST  /planetary-positions  - Positions of the ten bodies (2 decimals)
//! - POST      /ascendant            - Ascendant for a moment and place
//!
//! All responses use Content-Type: application/json, except `/docs`.

mod docs;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use lilit_astro::LowPrecision;
use lilit_gateway::{GatewayConfig, KeyRegistry, SystemClock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use self::docs::{handle_docs, handle_openapi};
use self::handlers::{
    handle_ascendant, handle_not_found, handle_planetary_positions, handle_planets, handle_root,
};
use self::middleware::access_middleware;
use self::state::AppState;

/// Maximum request body size: 64 KB.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Shortest sweep period the background task will run at.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Where and how to listen.
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

/// Construct a JSON error response of the form `{"detail": message}`.
pub(crate) fn json_detail(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({ "detail": message })))
}

/// Start the HTTP server.
///
/// Gateway limits come from the environment (see [`GatewayConfig::from_env`]),
/// accepted keys from `API_KEYS` or `API_KEY`. When TLS cert/key paths are
/// provided and the `tls` feature is enabled, the server listens over HTTPS
/// using `axum-server` with rustls.
pub async fn start_server(options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_env();
    let keys = KeyRegistry::from_env();

    if keys.is_empty() {
        tracing::warn!("no API keys configured; every protected request will be rejected");
    } else {
        tracing::info!(keys = keys.len(), "API key registry loaded");
    }
    tracing::info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        max_failed_attempts = config.abuse.max_failed_attempts,
        block_secs = config.abuse.block_duration.as_secs(),
        key_name = %config.key_name,
        "access gateway configured"
    );

    let state = Arc::new(AppState::new(
        &config,
        keys,
        Arc::new(SystemClock),
        Arc::new(LowPrecision),
    )?);
    tokio::spawn(run_sweeper(state.clone(), config.sweep_interval));

    let app = build_router(state);
    let addr = format!("{}:{}", options.host, options.port);

    // TLS support via axum-server + rustls (requires `tls` feature)
    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&options.tls_cert, &options.tls_key) {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: SocketAddr = addr.parse()?;
        tracing::info!("LILIT API listening on https://{addr}");
        axum_server::bind_rustls(socket_addr, tls)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
        return Ok(());
    }
    #[cfg(not(feature = "tls"))]
    if options.tls_cert.is_some() || options.tls_key.is_some() {
        return Err("TLS requested but lilit was built without the `tls` feature".into());
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("LILIT API listening on http://{addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Routes, behind the access gateway and the outer CORS/trace/body layers.
pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/docs", get(handle_docs))
        .route("/openapi.json", get(handle_openapi))
        .route("/planets", get(handle_planets).post(handle_planets))
        .route(
            "/planetary-positions",
            get(handle_planetary_positions).post(handle_planetary_positions),
        )
        .route("/ascendant", post(handle_ascendant))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            access_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Span per request. Only the path is recorded so query credentials stay
/// out of the logs.
fn request_span(request: &axum::extract::Request) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = request.uri().path(),
    )
}

/// Periodically drop tracking records that no longer affect any decision.
async fn run_sweeper(state: Arc<AppState>, every: Duration) {
    let mut ticker = tokio::time::interval(every.max(MIN_SWEEP_INTERVAL));
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let stats = state.gateway.sweep();
        if stats.total() > 0 {
            tracing::debug!(
                windows = stats.windows,
                failures = stats.failures,
                "swept idle client records"
            );
        }
    }
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use lilit_gateway::{AbuseConfig, ManualClock, RateLimitConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const KEY: &str = "test-api-key-123";

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            rate_limit: RateLimitConfig {
                max_requests: 100,
                window: Duration::from_secs(3600),
            },
            abuse: AbuseConfig {
                max_failed_attempts: 5,
                block_duration: Duration::from_secs(300),
                ..AbuseConfig::default()
            },
            ..GatewayConfig::default()
        }
    }

    fn app_with(config: GatewayConfig) -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let state = AppState::new(
            &config,
            KeyRegistry::new([KEY]),
            clock.clone(),
            Arc::new(LowPrecision),
        )
        .unwrap();
        (build_router(Arc::new(state)), clock)
    }

    fn app() -> Router {
        app_with(test_config()).0
    }

    fn request(method: &str, uri: &str, header_key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = header_key {
            builder = builder.header("API_KEY", key);
        }
        if !body.is_empty() {
            builder = builder.header("content-type", "application/json");
        }
        let mut req = builder.body(Body::from(body.to_string())).unwrap();
        let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        req
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn root_is_public() {
        let (status, json) = send(&app(), request("GET", "/", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "LILIT's astrological API");
    }

    #[tokio::test]
    async fn docs_and_openapi_are_public() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request("GET", "/docs", None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, json) = send(&app, request("GET", "/openapi.json", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["openapi"], "3.0.3");
    }

    #[tokio::test]
    async fn planets_accepts_query_credential() {
        let (status, json) = send(
            &app(),
            request("GET", &format!("/planets?API_KEY={KEY}"), None, ""),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["Sun"]["sign"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn query_credential_is_ignored_off_planets() {
        let (status, json) = send(
            &app(),
            request(
                "GET",
                &format!("/planetary-positions?API_KEY={KEY}"),
                None,
                "",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["detail"], "credential required");
    }

    #[tokio::test]
    async fn header_credential_is_case_insensitive() {
        let app = app();
        let mut req = request("GET", "/planetary-positions", None, "");
        req.headers_mut().insert("api_key", KEY.parse().unwrap());
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_and_invalid_credentials_are_forbidden() {
        let app = app();
        let (status, json) = send(&app, request("POST", "/ascendant", None, "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["detail"], "credential required");

        let (status, json) = send(&app, request("POST", "/ascendant", Some("nope"), "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["detail"], "invalid credential");
    }

    #[tokio::test]
    async fn repeated_failures_block_even_valid_keys() {
        let (app, clock) = app_with(test_config());
        for _ in 0..5 {
            let (status, _) = send(&app, request("GET", "/planets", Some("wrong"), "")).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        let (status, json) = send(&app, request("GET", "/planets", Some(KEY), "")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["detail"], "too many requests");

        // Public paths stay reachable while blocked.
        let (status, _) = send(&app, request("GET", "/", None, "")).await;
        assert_eq!(status, StatusCode::OK);

        clock.advance(Duration::from_secs(301));
        let (status, _) = send(&app, request("GET", "/planets", Some(KEY), "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn request_budget_is_enforced() {
        let mut config = test_config();
        config.rate_limit.max_requests = 2;
        let (app, _clock) = app_with(config);

        for _ in 0..2 {
            let (status, _) = send(&app, request("GET", "/planets", Some(KEY), "")).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send(&app, request("GET", "/planets", Some(KEY), "")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn custom_key_name_is_honoured() {
        let config = GatewayConfig {
            key_name: "X-Lilit-Key".to_string(),
            ..test_config()
        };
        let (app, _clock) = app_with(config);

        let mut req = request("GET", "/planetary-positions", None, "");
        req.headers_mut().insert("x-lilit-key", KEY.parse().unwrap());
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, request("GET", "/planetary-positions", Some(KEY), "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_path_requires_credential_then_404s() {
        let app = app();
        let (status, _) = send(&app, request("GET", "/nowhere", None, "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = send(&app, request("GET", "/nowhere", Some(KEY), "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "not found");
    }

    #[tokio::test]
    async fn missing_peer_address_falls_back_to_shared_identity() {
        let app = app();
        let req = Request::builder()
            .uri("/planets")
            .header("API_KEY", KEY)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn ascendant_end_to_end() {
        let body = r#"{"date_time":"1990-06-15T14:30:00","latitude":48.8566,"longitude":2.3522,"tz_offset":"+02:00"}"#;
        let (status, json) = send(&app(), request("POST", "/ascendant", Some(KEY), body)).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert!(json["sign"].is_string());
        assert_eq!(json["debug"]["datetime_utc"], "1990-06-15 12:30:00");
        assert_eq!(json["debug"]["latitude"], 48.8566);
    }

    #[tokio::test]
    async fn non_ascii_header_credential_is_invalid_not_missing() {
        let app = app();
        let mut req = request("GET", "/planetary-positions", None, "");
        req.headers_mut().insert(
            "api_key",
            axum::http::HeaderValue::from_bytes(b"caf\xE9").unwrap(),
        );
        let (status, json) = send(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["detail"], "invalid credential");
    }

    #[tokio::test]
    async fn out_of_range_instant_is_unprocessable() {
        let app = app();
        let body = r#"{"date_time":"9999-12-31T23:00:00-05:00"}"#;
        let (status, json) = send(&app, request("POST", "/planets", Some(KEY), body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].is_string());

        let body = r#"{"date_time":"9999-12-31T23:00:00","latitude":0.0,"longitude":0.0,"tz_offset":"-05:00"}"#;
        let (status, _) = send(&app, request("POST", "/ascendant", Some(KEY), body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn bad_input_is_unprocessable() {
        let app = app();
        let body = r#"{"date_time":"2024-01-01T00:00:00","latitude":95.0,"longitude":0.0}"#;
        let (status, json) = send(&app, request("POST", "/ascendant", Some(KEY), body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().unwrap().contains("latitude"));

        let (status, _) = send(&app, request("POST", "/ascendant", Some(KEY), "{")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
