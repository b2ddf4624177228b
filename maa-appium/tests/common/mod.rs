#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maa_appium::actions::{CustomActionArg, CustomRecognitionArg};
use maa_appium::{
    AppiumController, DeviceSize, Pipeline, Platform, Rect, Registry, ScreenshotResult,
    TaskContext, TaskDetail,
};
use serde_json::Value;

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn pipeline(value: Value) -> Pipeline {
    match value {
        Value::Object(map) => map,
        other => panic!("pipeline must be an object, got {other}"),
    }
}

/// Controller that records gestures instead of performing them.
#[derive(Default)]
pub struct MockController {
    pub size: DeviceSize,
    /// (text, bounding box) pairs the text lookup answers from.
    pub elements: Vec<(String, Rect)>,
    pub calls: Mutex<Vec<String>>,
    pub back_succeeds: bool,
}

impl MockController {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: DeviceSize::new(width, height),
            back_succeeds: true,
            ..Default::default()
        }
    }

    pub fn with_element(mut self, text: &str, rect: Rect) -> Self {
        self.elements.push((text.to_string(), rect));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl AppiumController for MockController {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn connect(&self) -> bool {
        true
    }

    async fn disconnect(&self) -> bool {
        true
    }

    fn request_uuid(&self) -> String {
        "mock-session".to_string()
    }

    fn device_size(&self) -> DeviceSize {
        self.size
    }

    async fn screencap(&self) -> Option<ScreenshotResult> {
        None
    }

    async fn click(&self, x: i32, y: i32) -> bool {
        self.record(format!("click {x} {y}"));
        true
    }

    async fn long_click(&self, x: i32, y: i32, duration: Duration) -> bool {
        self.record(format!("long_click {x} {y} {}ms", duration.as_millis()));
        true
    }

    async fn swipe(&self, x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> bool {
        self.record(format!("swipe {x1} {y1} {x2} {y2} {duration_ms}ms"));
        true
    }

    async fn touch_down(&self, contact: u32, x: i32, y: i32, _pressure: i32) -> bool {
        self.record(format!("touch_down {contact} {x} {y}"));
        true
    }

    async fn touch_move(&self, contact: u32, x: i32, y: i32, _pressure: i32) -> bool {
        self.record(format!("touch_move {contact} {x} {y}"));
        true
    }

    async fn touch_up(&self, contact: u32) -> bool {
        self.record(format!("touch_up {contact}"));
        true
    }

    async fn press_key(&self, keycode: i32) -> bool {
        self.record(format!("press_key {keycode}"));
        true
    }

    async fn input_text(&self, text: &str) -> bool {
        self.record(format!("input_text {text}"));
        true
    }

    async fn start_app(&self, intent: &str) -> bool {
        self.record(format!("start_app {intent}"));
        true
    }

    async fn stop_app(&self, intent: &str) -> bool {
        self.record(format!("stop_app {intent}"));
        true
    }

    async fn app_back(&self) -> bool {
        self.record("back".to_string());
        self.back_succeeds
    }

    async fn find_element_by_text(&self, text: &str) -> Vec<Rect> {
        self.elements
            .iter()
            .filter(|(t, _)| t.contains(text))
            .map(|(_, r)| *r)
            .collect()
    }
}

type Outcome = dyn Fn(usize, &Pipeline) -> bool + Send + Sync;

/// Context that records every sub-pipeline and answers from a script.
#[derive(Clone)]
pub struct RecordingContext {
    pub runs: Arc<Mutex<Vec<(String, Pipeline)>>>,
    pub clones: Arc<AtomicUsize>,
    outcome: Arc<Outcome>,
}

impl RecordingContext {
    pub fn new(outcome: impl Fn(usize, &Pipeline) -> bool + Send + Sync + 'static) -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
            clones: Arc::new(AtomicUsize::new(0)),
            outcome: Arc::new(outcome),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|_, _| true)
    }

    pub fn runs(&self) -> Vec<(String, Pipeline)> {
        self.runs.lock().unwrap().clone()
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TaskContext for RecordingContext {
    async fn run_task(&self, entry: &str, pipeline: &Pipeline) -> TaskDetail {
        let index = {
            let mut runs = self.runs.lock().unwrap();
            runs.push((entry.to_string(), pipeline.clone()));
            runs.len() - 1
        };
        TaskDetail::new(entry, (self.outcome)(index, pipeline))
    }

    fn clone_context(&self) -> Arc<dyn TaskContext> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        Arc::new(self.clone())
    }
}

/// A very small executor: follows the first `next` of each node, runs
/// `Click`, `Swipe` and custom extensions, and fails on a missed recognition.
#[derive(Clone)]
pub struct MiniExecutor {
    pub registry: Arc<Registry>,
    pub controller: Arc<MockController>,
    pub runs: Arc<Mutex<Vec<(String, Pipeline)>>>,
}

impl MiniExecutor {
    pub fn new(controller: Arc<MockController>) -> Self {
        let registry = Registry::with_defaults(controller.clone());
        Self {
            registry: Arc::new(registry),
            controller,
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn runs(&self) -> Vec<(String, Pipeline)> {
        self.runs.lock().unwrap().clone()
    }
}

fn rect_field(node: &serde_json::Map<String, Value>, key: &str) -> Option<Rect> {
    let values: Vec<i32> = node
        .get(key)?
        .as_array()?
        .iter()
        .map(|v| v.as_i64().map(|n| n as i32))
        .collect::<Option<Vec<_>>>()?;
    (values.len() == 4).then(|| Rect::new(values[0], values[1], values[2], values[3]))
}

fn param_string(node: &serde_json::Map<String, Value>, key: &str) -> String {
    match node.get(key) {
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait::async_trait]
impl TaskContext for MiniExecutor {
    async fn run_task(&self, entry: &str, pipeline: &Pipeline) -> TaskDetail {
        self.runs
            .lock()
            .unwrap()
            .push((entry.to_string(), pipeline.clone()));

        let mut current = Some(entry.to_string());
        let mut steps = 0;
        let mut nodes = Vec::new();
        while let Some(name) = current.take() {
            steps += 1;
            let Some(node) = pipeline.get(&name).and_then(Value::as_object) else {
                return TaskDetail::new(entry, false);
            };
            if steps > 32 {
                return TaskDetail::new(entry, false);
            }
            nodes.push(name.clone());

            let mut hit = Rect::default();
            if node.get("recognition").and_then(Value::as_str) == Some("Custom") {
                let arg = CustomRecognitionArg {
                    node_name: name.clone(),
                    roi: rect_field(node, "roi").unwrap_or_default(),
                    param: param_string(node, "custom_recognition_param"),
                };
                let name = node
                    .get("custom_recognition")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match self.registry.run_recognition(name, self, &arg).await.rect {
                    Some(rect) => hit = rect,
                    None => return TaskDetail::new(entry, false),
                }
            }

            let ok = match node.get("action").and_then(Value::as_str) {
                Some("Click") => {
                    let (x, y) = rect_field(node, "target").unwrap_or(hit).center();
                    self.controller.click(x, y).await
                }
                Some("Swipe") => {
                    let begin = rect_field(node, "begin").unwrap_or_default();
                    let end = rect_field(node, "end").unwrap_or_default();
                    self.controller
                        .swipe(begin.x, begin.y, end.x, end.y, 200)
                        .await
                }
                Some("Custom") => {
                    let arg = CustomActionArg {
                        node_name: name.clone(),
                        rect: hit,
                        param: param_string(node, "custom_action_param"),
                    };
                    let action = node
                        .get("custom_action")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    self.registry.run_action(action, self, &arg).await.success
                }
                _ => true,
            };
            if !ok {
                return TaskDetail::new(entry, false);
            }

            current = node
                .get("next")
                .and_then(Value::as_array)
                .and_then(|next| next.first())
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        TaskDetail {
            entry: entry.to_string(),
            succeeded: true,
            nodes,
        }
    }

    fn clone_context(&self) -> Arc<dyn TaskContext> {
        Arc::new(self.clone())
    }
}
