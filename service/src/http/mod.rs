//! HTTP surface: routes, CORS and response hardening.
//!
//! `main.rs` and the integration tests build the router through
//! [`build_router`], so both see identical layer ordering:
//! routes, then extensions, then tracing and CORS, then security headers
//! (outermost).

pub mod security;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use security::{build_security_headers, security_headers_middleware};

use crate::config::{Config, SecurityHeadersConfig};
use crate::graphql::{graphql_handler, graphql_playground, ApiSchema};

/// Which optional pieces of the HTTP stack to mount.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub playground_enabled: bool,
    /// `None` mounts no CORS layer at all.
    pub cors_origins: Option<Vec<String>>,
    /// `None` (or `enabled: false`) skips the headers middleware.
    pub security_headers: Option<SecurityHeadersConfig>,
}

impl RouterOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            playground_enabled: config.graphql.playground_enabled,
            cors_origins: Some(config.cors.allowed_origins.clone()),
            security_headers: Some(config.security_headers.clone()),
        }
    }
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Translate configured origins into a CORS layer. An empty list blocks all
/// cross-origin requests; `"*"` allows any.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow any origin - not recommended for production");
        AllowOrigin::any()
    } else if origins.is_empty() {
        tracing::info!("CORS allowed origins not configured - cross-origin requests will be blocked");
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else {
        tracing::info!(origins = ?origins, "CORS allowed origins configured");
        AllowOrigin::list(origins.iter().filter_map(|origin| origin.parse().ok()))
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(allow_origin)
}

/// Assemble the application router around an executable schema.
#[must_use]
pub fn build_router(schema: ApiSchema, options: &RouterOptions) -> Router {
    let graphql_route = if options.playground_enabled {
        get(graphql_playground).post(graphql_handler)
    } else {
        post(graphql_handler)
    };

    let mut app = Router::new()
        .route("/graphql", graphql_route)
        .route("/health", get(health_check))
        .layer(Extension(schema))
        .layer(TraceLayer::new_for_http());

    if let Some(origins) = &options.cors_origins {
        app = app.layer(cors_layer(origins));
    }

    if let Some(config) = options.security_headers.as_ref().filter(|c| c.enabled) {
        app = app
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(Extension(build_security_headers(config)));
    }

    app
}
