use maa_appium::{Capabilities, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitRequest {
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Appium server to use instead of the configured one.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Falls back to `platformName` in the capabilities, then iOS.
    #[serde(default)]
    pub platform: Option<Platform>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TapRequest {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    #[serde(default)]
    pub start_x: i32,
    #[serde(default)]
    pub start_y: i32,
    #[serde(default)]
    pub end_x: i32,
    #[serde(default)]
    pub end_y: i32,
    /// Seconds.
    #[serde(default = "default_swipe_duration")]
    pub duration: f64,
}

fn default_swipe_duration() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct LongPressRequest {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// Seconds.
    #[serde(default = "default_long_press_duration")]
    pub duration: f64,
}

fn default_long_press_duration() -> f64 {
    1.0
}

// ============================================================================
// Response Types
// ============================================================================

/// Body of every control endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Reply {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            session_id: None,
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            ..Self::success()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_active: bool,
}

// ============================================================================
// WebSocket Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebSocketMessage {
    /// Base64 JPEG of the current screen.
    Screen { data: String },
    Error { message: String },
}
