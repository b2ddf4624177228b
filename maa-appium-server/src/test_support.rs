use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maa_appium::{AppiumController, Device, DeviceSize, Platform, Rect, ScreenshotResult};

use crate::session_manager::{AppState, SessionManager};

/// Device double that records gestures and serves a flat grey frame.
pub struct MockDevice {
    size: DeviceSize,
    pub gestures_succeed: bool,
    pub screen_available: bool,
    pub disconnects: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockDevice {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: DeviceSize::new(width, height),
            gestures_succeed: true,
            screen_available: true,
            disconnects: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> bool {
        self.calls.lock().unwrap().push(call);
        self.gestures_succeed
    }
}

#[async_trait::async_trait]
impl AppiumController for MockDevice {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    async fn connect(&self) -> bool {
        true
    }

    async fn disconnect(&self) -> bool {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn request_uuid(&self) -> String {
        "mock".to_string()
    }

    fn device_size(&self) -> DeviceSize {
        self.size
    }

    async fn screencap(&self) -> Option<ScreenshotResult> {
        self.screen_available.then(|| ScreenshotResult {
            image_data: vec![128; 8 * 8 * 4],
            width: 8,
            height: 8,
        })
    }

    async fn click(&self, x: i32, y: i32) -> bool {
        self.record(format!("click {x} {y}"))
    }

    async fn long_click(&self, x: i32, y: i32, duration: Duration) -> bool {
        self.record(format!("long_click {x} {y} {}ms", duration.as_millis()))
    }

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> bool {
        self.record(format!("swipe {x1} {y1} {x2} {y2} {duration_ms}ms"))
    }

    async fn touch_down(&self, _contact: u32, _x: i32, _y: i32, _pressure: i32) -> bool {
        false
    }

    async fn touch_move(&self, _contact: u32, _x: i32, _y: i32, _pressure: i32) -> bool {
        false
    }

    async fn touch_up(&self, _contact: u32) -> bool {
        false
    }

    async fn press_key(&self, _keycode: i32) -> bool {
        false
    }

    async fn input_text(&self, _text: &str) -> bool {
        false
    }

    async fn start_app(&self, _intent: &str) -> bool {
        false
    }

    async fn stop_app(&self, _intent: &str) -> bool {
        false
    }

    async fn app_back(&self) -> bool {
        false
    }

    async fn find_element_by_text(&self, _text: &str) -> Vec<Rect> {
        Vec::new()
    }
}

pub fn empty_state() -> AppState {
    AppState {
        manager: Arc::new(SessionManager::new("http://127.0.0.1:1")),
        frame_interval: Duration::from_millis(10),
    }
}

pub async fn state_with(mock: Arc<MockDevice>) -> AppState {
    let state = empty_state();
    state.manager.install(Device::from_controller(mock)).await;
    state
}
