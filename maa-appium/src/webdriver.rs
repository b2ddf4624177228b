//! Minimal W3C WebDriver client for talking to an Appium server.
//!
//! Only the commands the controllers need are wrapped. Every call returns the
//! `value` member of the response body, or an [`AutomationError`] built from
//! the WebDriver error object.

use std::time::Duration;

use base64::Engine;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::AutomationError;
use crate::types::{Capabilities, DeviceSize, Rect};

/// Appium's default listen address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4723";

// Appium answers slowly while it boots WDA/UiAutomator2 for a new session
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// One step of a W3C pointer input source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerStep {
    PointerMove { duration: u64, x: i32, y: i32 },
    PointerDown { button: u8 },
    PointerUp { button: u8 },
    Pause { duration: u64 },
}

impl PointerStep {
    pub fn move_to(x: i32, y: i32) -> Self {
        PointerStep::PointerMove { duration: 0, x, y }
    }

    pub fn down() -> Self {
        PointerStep::PointerDown { button: 0 }
    }

    pub fn up() -> Self {
        PointerStep::PointerUp { button: 0 }
    }

    pub fn pause(duration: Duration) -> Self {
        PointerStep::Pause {
            duration: duration.as_millis() as u64,
        }
    }
}

/// A touch pointer and the steps it performs.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchSequence {
    pub id: String,
    pub steps: Vec<PointerStep>,
}

impl TouchSequence {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    pub fn then(mut self, step: PointerStep) -> Self {
        self.steps.push(step);
        self
    }

    fn to_json(&self) -> Value {
        json!({
            "type": "pointer",
            "id": self.id,
            "parameters": { "pointerType": "touch" },
            "actions": self.steps,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireRect {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    width: f64,
    height: f64,
}

impl From<WireRect> for Rect {
    fn from(r: WireRect) -> Self {
        Rect::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32)
    }
}

/// An open Appium session.
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    base_url: String,
    session_id: String,
    client: reqwest::Client,
}

impl WebDriverSession {
    /// Negotiate a new session with the given capabilities.
    pub async fn create(
        server_url: &str,
        capabilities: &Capabilities,
    ) -> Result<Self, AutomationError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_COMMAND_TIMEOUT)
            .build()?;
        let base_url = server_url.trim_end_matches('/').to_string();

        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities,
                "firstMatch": [{}],
            }
        });
        let value = send(&client, Method::POST, &format!("{base_url}/session"), Some(body), "newSession").await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AutomationError::SessionNotCreated(format!("no sessionId in response: {value}"))
            })?
            .to_string();

        info!("Connected to Appium server {}, session {}", base_url, session_id);
        Ok(Self {
            base_url,
            session_id,
            client,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AutomationError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        send(&self.client, method, &url, body, path).await
    }

    pub async fn delete(&self) -> Result<(), AutomationError> {
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }

    pub async fn window_size(&self) -> Result<DeviceSize, AutomationError> {
        let value = self.command(Method::GET, "/window/rect", None).await?;
        let rect: WireRect = serde_json::from_value(value)?;
        Ok(DeviceSize::new(rect.width as i32, rect.height as i32))
    }

    /// Raw PNG bytes of the current screen.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>, AutomationError> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value.as_str().ok_or_else(|| {
            AutomationError::Image("screenshot response is not a string".to_string())
        })?;
        // some drivers wrap the payload every 76 characters
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| AutomationError::Image(format!("invalid base64 screenshot: {e}")))
    }

    pub async fn perform_actions(&self, sequences: &[TouchSequence]) -> Result<(), AutomationError> {
        let actions: Vec<Value> = sequences.iter().map(TouchSequence::to_json).collect();
        debug!("perform actions: {}", serde_json::Value::Array(actions.clone()));
        self.command(Method::POST, "/actions", Some(json!({ "actions": actions })))
            .await
            .map(|_| ())
    }

    pub async fn find_elements(
        &self,
        using: &str,
        selector: &str,
    ) -> Result<Vec<String>, AutomationError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": using, "value": selector })),
            )
            .await?;
        let items = value.as_array().cloned().unwrap_or_default();
        Ok(items.iter().filter_map(element_id).collect())
    }

    pub async fn element_rect(&self, element: &str) -> Result<Rect, AutomationError> {
        let value = self
            .command(Method::GET, &format!("/element/{element}/rect"), None)
            .await?;
        let rect: WireRect = serde_json::from_value(value)?;
        Ok(rect.into())
    }

    pub async fn active_element(&self) -> Result<String, AutomationError> {
        let value = self.command(Method::GET, "/element/active", None).await?;
        element_id(&value)
            .ok_or_else(|| AutomationError::ElementNotFound("no focused element".to_string()))
    }

    pub async fn send_keys(&self, element: &str, text: &str) -> Result<(), AutomationError> {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        self.command(
            Method::POST,
            &format!("/element/{element}/value"),
            Some(json!({ "text": text, "value": chars })),
        )
        .await
        .map(|_| ())
    }

    pub async fn back(&self) -> Result<(), AutomationError> {
        self.command(Method::POST, "/back", Some(json!({})))
            .await
            .map(|_| ())
    }

    /// Run an Appium `mobile:` extension command.
    pub async fn execute_mobile(&self, command: &str, args: Value) -> Result<Value, AutomationError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": format!("mobile: {command}"), "args": [args] })),
        )
        .await
    }

    pub async fn press_keycode(&self, keycode: i32) -> Result<(), AutomationError> {
        self.command(
            Method::POST,
            "/appium/device/press_keycode",
            Some(json!({ "keycode": keycode })),
        )
        .await
        .map(|_| ())
    }
}

fn element_id(value: &Value) -> Option<String> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    command: &str,
) -> Result<Value, AutomationError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response.json().await.unwrap_or(Value::Null);
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value.get("error").and_then(Value::as_str).map(str::to_string);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        warn!("WebDriver command {} failed: {}", command, message);
        return Err(AutomationError::WebDriver {
            command: command.to_string(),
            error,
            message,
        });
    }
    Ok(value)
}

/// Quote `text` as an XPath 1.0 string literal.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
