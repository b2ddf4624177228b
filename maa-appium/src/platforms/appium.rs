//! Appium-backed controller shared by all platforms.
//!
//! Gestures, screen capture and session handling are identical on Android and
//! iOS; the handful of operations that differ are delegated to a
//! [`PlatformBehavior`].

use std::time::Duration;

use image::imageops::FilterType;
use tracing::{debug, info, instrument, warn};

use super::{AppiumController, Platform};
use crate::errors::AutomationError;
use crate::types::{Capabilities, DeviceSize, Rect, ScreenshotResult};
use crate::webdriver::{PointerStep, TouchSequence, WebDriverSession};

const TAP_HOLD: Duration = Duration::from_millis(100);

/// The platform-specific half of a controller.
#[async_trait::async_trait]
pub trait PlatformBehavior: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    /// Fill in capabilities the platform cannot run without.
    fn prepare_capabilities(&self, capabilities: &mut Capabilities);

    async fn start_app(&self, session: &WebDriverSession, intent: &str)
        -> Result<(), AutomationError>;

    async fn stop_app(&self, session: &WebDriverSession, intent: &str)
        -> Result<(), AutomationError>;

    async fn input_text(&self, session: &WebDriverSession, text: &str)
        -> Result<(), AutomationError>;

    async fn press_key(&self, session: &WebDriverSession, keycode: i32)
        -> Result<(), AutomationError>;

    /// XPath matching elements whose visible text contains `text`.
    fn text_query(&self, text: &str) -> String;
}

/// Controller driving one Appium session.
pub struct AppiumDriver<P> {
    behavior: P,
    session: WebDriverSession,
    device_size: DeviceSize,
}

impl<P: PlatformBehavior> AppiumDriver<P> {
    /// Open a session and read the device size.
    #[instrument(skip(behavior, capabilities))]
    pub async fn connect(
        behavior: P,
        mut capabilities: Capabilities,
        server_url: &str,
    ) -> Result<Self, AutomationError> {
        behavior.prepare_capabilities(&mut capabilities);
        let session = WebDriverSession::create(server_url, &capabilities).await?;

        let mut driver = Self {
            behavior,
            session,
            device_size: DeviceSize::default(),
        };
        if let Err(e) = driver.refresh_device_size().await {
            warn!("Failed to read device size: {}", e);
        }
        Ok(driver)
    }

    /// Query the window size again, e.g. after a rotation.
    pub async fn refresh_device_size(&mut self) -> Result<DeviceSize, AutomationError> {
        let size = self.session.window_size().await?;
        info!(
            "{} screen size: {}x{}",
            self.behavior.platform(),
            size.width,
            size.height
        );
        self.device_size = size;
        Ok(size)
    }

    pub fn session(&self) -> &WebDriverSession {
        &self.session
    }

    async fn tap_sequence(&self, x: i32, y: i32, hold: Duration) -> Result<(), AutomationError> {
        let finger = TouchSequence::new("touch")
            .then(PointerStep::move_to(x, y))
            .then(PointerStep::down())
            .then(PointerStep::pause(hold))
            .then(PointerStep::up());
        self.session.perform_actions(&[finger]).await
    }

    async fn capture(&self) -> Result<ScreenshotResult, AutomationError> {
        let png = self.session.screenshot_png().await?;
        let mut frame = image::load_from_memory(&png)?;

        let DeviceSize { width, height } = self.device_size;
        if width > 0 && height > 0 && (frame.width(), frame.height()) != (width as u32, height as u32) {
            frame = frame.resize_exact(width as u32, height as u32, FilterType::Lanczos3);
        }

        let rgba = frame.to_rgba8();
        Ok(ScreenshotResult {
            width: rgba.width(),
            height: rgba.height(),
            image_data: rgba.into_raw(),
        })
    }

    async fn lookup_text(&self, text: &str) -> Result<Vec<Rect>, AutomationError> {
        let query = self.behavior.text_query(text);
        let elements = self.session.find_elements("xpath", &query).await?;
        let mut rects = Vec::with_capacity(elements.len());
        for element in elements {
            // elements can go stale between the query and the rect lookup
            match self.session.element_rect(&element).await {
                Ok(rect) => rects.push(rect),
                Err(e) => debug!("Skipping element {}: {}", element, e),
            }
        }
        Ok(rects)
    }
}

/// Log a failed operation and collapse it to `false`.
fn degrade(operation: &str, result: Result<(), AutomationError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("{} failed: {}", operation, e);
            false
        }
    }
}

#[async_trait::async_trait]
impl<P: PlatformBehavior> AppiumController for AppiumDriver<P> {
    fn platform(&self) -> Platform {
        self.behavior.platform()
    }

    async fn connect(&self) -> bool {
        degrade("Connect", self.session.window_size().await.map(|_| ()))
    }

    async fn disconnect(&self) -> bool {
        info!("Closing session {}", self.session.session_id());
        degrade("Disconnect", self.session.delete().await)
    }

    fn request_uuid(&self) -> String {
        self.session.session_id().to_string()
    }

    fn device_size(&self) -> DeviceSize {
        self.device_size
    }

    async fn screencap(&self) -> Option<ScreenshotResult> {
        match self.capture().await {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Screenshot failed: {}", e);
                None
            }
        }
    }

    async fn click(&self, x: i32, y: i32) -> bool {
        debug!("Click {} {}", x, y);
        degrade("Click", self.tap_sequence(x, y, TAP_HOLD).await)
    }

    async fn long_click(&self, x: i32, y: i32, duration: Duration) -> bool {
        debug!("Long click at {}, {} for {:?}", x, y, duration);
        degrade("Long click", self.tap_sequence(x, y, duration).await)
    }

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> bool {
        debug!("Swipe ({}, {}) -> ({}, {}) over {}ms", x1, y1, x2, y2, duration_ms);
        let finger = TouchSequence::new("touch")
            .then(PointerStep::move_to(x1, y1))
            .then(PointerStep::down())
            .then(PointerStep::pause(Duration::from_millis(duration_ms)))
            .then(PointerStep::move_to(x2, y2))
            .then(PointerStep::up());
        degrade("Swipe", self.session.perform_actions(&[finger]).await)
    }

    async fn touch_down(&self, contact: u32, x: i32, y: i32, _pressure: i32) -> bool {
        debug!("Touch down #{} at {}, {}", contact, x, y);
        let finger = TouchSequence::new(format!("finger{contact}"))
            .then(PointerStep::move_to(x, y))
            .then(PointerStep::down());
        degrade("Touch down", self.session.perform_actions(&[finger]).await)
    }

    async fn touch_move(&self, contact: u32, x: i32, y: i32, _pressure: i32) -> bool {
        debug!("Touch move #{} to {}, {}", contact, x, y);
        let finger = TouchSequence::new(format!("finger{contact}")).then(PointerStep::move_to(x, y));
        degrade("Touch move", self.session.perform_actions(&[finger]).await)
    }

    async fn touch_up(&self, contact: u32) -> bool {
        debug!("Touch up #{}", contact);
        let finger = TouchSequence::new(format!("finger{contact}")).then(PointerStep::up());
        degrade("Touch up", self.session.perform_actions(&[finger]).await)
    }

    async fn press_key(&self, keycode: i32) -> bool {
        debug!("Press key {}", keycode);
        degrade("Press key", self.behavior.press_key(&self.session, keycode).await)
    }

    async fn input_text(&self, text: &str) -> bool {
        debug!("Input text {:?}", text);
        degrade("Input text", self.behavior.input_text(&self.session, text).await)
    }

    async fn start_app(&self, intent: &str) -> bool {
        info!("Starting app {}", intent);
        degrade("Start app", self.behavior.start_app(&self.session, intent).await)
    }

    async fn stop_app(&self, intent: &str) -> bool {
        info!("Stopping app {}", intent);
        degrade("Stop app", self.behavior.stop_app(&self.session, intent).await)
    }

    async fn app_back(&self) -> bool {
        degrade("Back", self.session.back().await)
    }

    async fn find_element_by_text(&self, text: &str) -> Vec<Rect> {
        debug!("Finding elements with text: {}", text);
        match self.lookup_text(text).await {
            Ok(rects) => rects,
            Err(e) => {
                warn!("Find elements by text failed: {}", e);
                Vec::new()
            }
        }
    }
}
