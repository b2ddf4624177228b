use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;
use crate::types::{Capabilities, DeviceSize, Rect, ScreenshotResult};

pub mod android;
pub mod appium;
pub mod ios;

pub use android::Android;
pub use appium::{AppiumDriver, PlatformBehavior};
pub use ios::Ios;

/// Mobile platforms an Appium session can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Infer the platform from the `platformName` capability.
    pub fn from_capabilities(capabilities: &Capabilities) -> Option<Self> {
        capabilities
            .get("platformName")
            .and_then(|v| v.as_str())
            .and_then(|name| name.parse().ok())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "Android"),
            Platform::Ios => write!(f, "iOS"),
        }
    }
}

impl FromStr for Platform {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(AutomationError::InvalidArgument(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

/// The action surface every device controller offers.
///
/// Pipeline extensions only ever talk to a device through this trait, so they
/// stay platform-agnostic. Operations never return errors: a driver failure is
/// logged and reported as `false`, `None` or an empty result, which lets the
/// executor branch on it like any other failed node.
#[async_trait::async_trait]
pub trait AppiumController: Send + Sync {
    fn platform(&self) -> Platform;

    /// Whether the driver session is still usable.
    async fn connect(&self) -> bool;

    /// End the driver session.
    async fn disconnect(&self) -> bool;

    /// Driver session identifier, empty when there is none.
    fn request_uuid(&self) -> String;

    /// Display size cached when the controller was created.
    fn device_size(&self) -> DeviceSize;

    /// Current screen, scaled to the device size.
    async fn screencap(&self) -> Option<ScreenshotResult>;

    async fn click(&self, x: i32, y: i32) -> bool;

    async fn long_click(&self, x: i32, y: i32, duration: Duration) -> bool;

    /// Swipe from `(x1, y1)` to `(x2, y2)`, holding for `duration_ms` first.
    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> bool;

    async fn touch_down(&self, contact: u32, x: i32, y: i32, pressure: i32) -> bool;

    async fn touch_move(&self, contact: u32, x: i32, y: i32, pressure: i32) -> bool;

    async fn touch_up(&self, contact: u32) -> bool;

    async fn press_key(&self, keycode: i32) -> bool;

    /// Type into the focused input field.
    async fn input_text(&self, text: &str) -> bool;

    async fn start_app(&self, intent: &str) -> bool;

    async fn stop_app(&self, intent: &str) -> bool;

    async fn app_back(&self) -> bool;

    /// Bounding boxes of elements whose text, label or value contains `text`.
    async fn find_element_by_text(&self, text: &str) -> Vec<Rect>;
}

/// Create the controller for `platform`, opening a session on `server_url`.
pub async fn create_controller(
    platform: Platform,
    capabilities: Capabilities,
    server_url: &str,
) -> Result<Arc<dyn AppiumController>, AutomationError> {
    match platform {
        Platform::Android => Ok(Arc::new(
            AppiumDriver::connect(Android, capabilities, server_url).await?,
        )),
        Platform::Ios => Ok(Arc::new(
            AppiumDriver::connect(Ios, capabilities, server_url).await?,
        )),
    }
}
