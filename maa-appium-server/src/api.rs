use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use maa_appium::Device;
use serde_json::json;
use tracing::{info, warn};

use crate::session_manager::{AppState, NOT_INITIALIZED};
use crate::types::{HealthResponse, InitRequest, LongPressRequest, Reply, SwipeRequest, TapRequest};

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: NOT_INITIALIZED.to_string(),
        }
    }

    /// The device or the Appium server refused the request.
    pub fn device(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("❌ {}", self.message);
        (self.status, Json(Reply::error(self.message))).into_response()
    }
}

async fn require_device(state: &AppState) -> Result<Device, ApiError> {
    state
        .manager
        .device()
        .await
        .ok_or_else(ApiError::not_initialized)
}

fn seconds(value: f64) -> Result<Duration, ApiError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| ApiError::bad_request(format!("invalid duration {value}")))
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_active: state.manager.is_active().await,
    })
}

// ============================================================================
// Session
// ============================================================================

pub async fn init(
    State(state): State<AppState>,
    Json(request): Json<InitRequest>,
) -> Result<Json<Reply>, ApiError> {
    info!("📥 POST /init");
    let session_id = state
        .manager
        .init(request)
        .await
        .map_err(ApiError::device)?;
    info!("✅ Session {} ready", session_id);
    Ok(Json(Reply::success().with_session(session_id)))
}

pub async fn screen_info(State(state): State<AppState>) -> Result<Json<Reply>, ApiError> {
    let device = require_device(&state).await?;
    let size = device.screen_size();
    Ok(Json(Reply::success().with_data(json!({
        "width": size.width,
        "height": size.height
    }))))
}

// ============================================================================
// Gestures
// ============================================================================

pub async fn tap(
    State(state): State<AppState>,
    Json(request): Json<TapRequest>,
) -> Result<Json<Reply>, ApiError> {
    let device = require_device(&state).await?;
    if !device.tap(request.x, request.y).await {
        return Err(ApiError::device("tap failed"));
    }
    Ok(Json(Reply::success()))
}

pub async fn swipe(
    State(state): State<AppState>,
    Json(request): Json<SwipeRequest>,
) -> Result<Json<Reply>, ApiError> {
    let device = require_device(&state).await?;
    let duration = seconds(request.duration)?;
    let swiped = device
        .swipe(
            (request.start_x, request.start_y),
            (request.end_x, request.end_y),
            duration,
        )
        .await;
    if !swiped {
        return Err(ApiError::device("swipe failed"));
    }
    Ok(Json(Reply::success()))
}

pub async fn long_press(
    State(state): State<AppState>,
    Json(request): Json<LongPressRequest>,
) -> Result<Json<Reply>, ApiError> {
    let device = require_device(&state).await?;
    let duration = seconds(request.duration)?;
    if !device.long_press(request.x, request.y, duration).await {
        return Err(ApiError::device("long press failed"));
    }
    Ok(Json(Reply::success()))
}
