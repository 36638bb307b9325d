//! Service wiring: database pool, router, middleware stack and lifecycle.

pub mod admission;
pub mod audit;
pub mod config;
pub mod handlers;
pub mod tenant;

use crate::gatehouse::{
    admission::AdmissionGate, audit::PgAuditLog, config::GateConfig, tenant::PgSettingsStore,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, HeaderName, HeaderValue, Request},
    routing::{get, options},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    set_header::{SetRequestHeaderLayer, SetResponseHeaderLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::health::live,
        handlers::health::ready,
        handlers::login::login,
        handlers::portal::portal,
    ),
    components(schemas(handlers::health::Health)),
    tags(
        (name = "gate", description = "Pre-authentication admission gate"),
        (name = "health", description = "Service health probes")
    )
)]
struct ApiDoc;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, gate: GateConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let settings = Arc::new(PgSettingsStore::new(pool.clone()));
    let audit = Arc::new(PgAuditLog::new(pool.clone()));
    let admission = Arc::new(AdmissionGate::new(settings, audit, gate));

    // The gate pages carry a restrictive CSP. Swagger UI ships inline assets,
    // so the header stays off the documentation routes.
    let gated = Router::new()
        .route("/login", get(handlers::login::login))
        .route("/portal", get(handlers::portal::portal))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ));

    // Routes added after the ServiceBuilder stack (`/` and `OPTIONS /health`)
    // skip tracing and request ids on purpose.
    let app = Router::new()
        .merge(gated)
        .route("/health", get(handlers::health::health))
        .route("/live", get(handlers::health::live))
        .route("/ready", get(handlers::health::ready))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(admission.clone()))
                .layer(Extension(pool.clone())),
        )
        .route("/", get(handlers::root::root))
        .route("/health", options(handlers::health::health))
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_signal().await;
        info!("Gracefully shutdown");
    })
    .await?;

    Ok(())
}

/// Resolve when the process receives an interrupt.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the interrupt signal: {}", error);
        // A failed listener must not shut the server down.
        std::future::pending::<()>().await;
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
