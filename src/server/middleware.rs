// Origin allow-list enforcement and CORS

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Compiled origin allow-list: exact origins plus anchored
/// single-wildcard-subdomain patterns ("https://*.netlify.app").
#[derive(Debug, Clone)]
pub struct OriginMatcher {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginMatcher {
    pub fn new(allowed: &[String]) -> anyhow::Result<Self> {
        let mut exact = Vec::new();
        let mut patterns = Vec::new();

        for origin in allowed {
            if origin.contains('*') {
                let pattern = format!(
                    "^{}$",
                    origin
                        .split('*')
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(".*")
                );
                patterns.push(
                    Regex::new(&pattern)
                        .map_err(|e| anyhow::anyhow!("Invalid origin pattern '{}': {}", origin, e))?,
                );
            } else {
                exact.push(origin.clone());
            }
        }

        Ok(Self { exact, patterns })
    }

    pub fn matches(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin)
            || self.patterns.iter().any(|p| p.is_match(origin))
    }
}

/// Reject disallowed cross-origin requests before any body handling.
///
/// Requests without an Origin header (curl, same-origin, mobile apps) pass
/// through; a present but unlisted Origin is turned away with no pipeline
/// invocation and no sends.
pub async fn origin_guard(
    State(matcher): State<Arc<OriginMatcher>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match origin {
        Some(origin) if !matcher.matches(&origin) => {
            tracing::warn!(origin = %origin, "Blocked by CORS");
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "success": false,
                    "message": "Not allowed by CORS",
                })),
            )
                .into_response()
        }
        _ => next.run(request).await,
    }
}

/// Preflight handling and response headers for allow-listed origins
pub fn cors_layer(matcher: Arc<OriginMatcher>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| matcher.matches(o))
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400))
}
