use std::sync::Arc;

use base64::Engine;
use maa_appium::{Device, Platform};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::types::InitRequest;

const JPEG_QUALITY: u8 = 80;

pub const NOT_INITIALIZED: &str = "controller not initialized";

/// Owns the single device session the server drives.
pub struct SessionManager {
    appium_url: String,
    current: Arc<Mutex<Option<Device>>>,
}

impl SessionManager {
    pub fn new(appium_url: impl Into<String>) -> Self {
        Self {
            appium_url: appium_url.into(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Open a new session, closing any previous one first.
    pub async fn init(&self, request: InitRequest) -> Result<String, String> {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            info!("🔄 Closing previous session {}", previous.session_id());
            previous.close().await;
        }

        let platform = request
            .platform
            .or_else(|| Platform::from_capabilities(&request.capabilities))
            .unwrap_or(Platform::Ios);
        let server_url = request.server_url.as_deref().unwrap_or(&self.appium_url);
        info!("🎬 Connecting {} device through {}", platform, server_url);

        let device = Device::connect(platform, request.capabilities, server_url)
            .await
            .map_err(|e| format!("session creation failed: {e}"))?;
        let session_id = device.session_id();
        *current = Some(device);
        Ok(session_id)
    }

    /// The active device, if any.
    pub async fn device(&self) -> Option<Device> {
        self.current.lock().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Close and forget the active session.
    pub async fn reset(&self) {
        if let Some(device) = self.current.lock().await.take() {
            info!("🔌 Resetting session {}", device.session_id());
            device.close().await;
        }
    }

    /// The current screen as base64 JPEG.
    ///
    /// `Ok(None)` when no session is active. A failed capture resets the
    /// session, since it usually means the driver went away.
    pub async fn screen_frame(&self) -> Result<Option<String>, String> {
        let Some(device) = self.device().await else {
            return Ok(None);
        };

        let encoded = match device.screenshot().await {
            Some(frame) => frame.to_jpeg(JPEG_QUALITY).map_err(|e| e.to_string()),
            None => Err("screen capture failed".to_string()),
        };
        match encoded {
            Ok(jpeg) => Ok(Some(
                base64::engine::general_purpose::STANDARD.encode(jpeg),
            )),
            Err(e) => {
                warn!("⚠️ {}, session may be gone", e);
                self.reset().await;
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub async fn install(&self, device: Device) {
        *self.current.lock().await = Some(device);
    }
}

/// Shared state of all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub frame_interval: std::time::Duration,
}
