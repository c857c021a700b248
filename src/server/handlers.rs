// HTTP request handlers

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::middleware::{cors_layer, origin_guard};
use super::AlertServer;
use crate::dispatch::AlertRequest;
use crate::location::Coordinates;

/// Create the main application router
pub fn create_router(server: Arc<AlertServer>) -> Router {
    let matcher = Arc::clone(server.origin_matcher());

    Router::new()
        .route("/api/crisis-alert", post(handle_crisis_alert))
        .route("/api/health", get(health_check))
        .route("/", get(root))
        .fallback(not_found)
        .with_state(server)
        // Guard runs inside the CORS layer: preflights are answered by the
        // layer, everything else is origin-checked before body handling
        .layer(middleware::from_fn_with_state(
            Arc::clone(&matcher),
            origin_guard,
        ))
        .layer(cors_layer(matcher))
}

/// Request body for POST /api/crisis-alert.
///
/// Fields are optional so that absence maps to a 400 with the fixed
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CrisisAlertRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Response body for a fully delivered alert
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisAlertResponse {
    pub success: bool,
    pub message: String,
    pub sms_message_ids: Vec<String>,
    pub whatsapp_message_ids: Vec<String>,
}

/// Handle POST /api/crisis-alert
async fn handle_crisis_alert(
    State(server): State<Arc<AlertServer>>,
    Json(request): Json<CrisisAlertRequest>,
) -> Response {
    let (username, latitude, longitude) =
        match (request.username, request.latitude, request.longitude) {
            (Some(username), Some(latitude), Some(longitude)) if !username.is_empty() => {
                (username, latitude, longitude)
            }
            _ => {
                tracing::error!("Missing required fields in crisis alert request");
                return bad_request("Missing required fields");
            }
        };

    tracing::info!(
        username = %username,
        latitude,
        longitude,
        "Received crisis alert request"
    );

    let coordinates = match Coordinates::new(latitude, longitude) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            tracing::error!(error = %e, "Rejected crisis alert request");
            return bad_request(&e.to_string());
        }
    };

    let alert = AlertRequest {
        requester: username,
        coordinates,
    };

    match server.dispatcher().dispatch(&alert, server.recipients()).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(CrisisAlertResponse {
                success: true,
                message: "Crisis alerts sent successfully".to_string(),
                sms_message_ids: receipt.sms_message_ids,
                whatsapp_message_ids: receipt.whatsapp_message_ids,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to send crisis alerts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Failed to send crisis alerts",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "message": message,
        })),
    )
        .into_response()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub success: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub timestamp: String,
}

/// Handle GET /api/health
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        success: true,
        status: "ok".to_string(),
        environment: std::env::var("ZENITH_ENV").ok(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handle GET / - service banner
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Zenith Crisis Alert API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "crisisAlert": "POST /api/crisis-alert",
            "health": "GET /api/health"
        }
    }))
}

/// Fallback for unknown routes
async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::info!(method = %method, path = %uri.path(), "404 Not Found");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Endpoint not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
        .into_response()
}
