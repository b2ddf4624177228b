use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use maa_appium::{create_controller, Capabilities, Device, Platform, Rect};
use serde_json::{json, Value};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Requests received by the fake server, as `"METHOD path"` plus body.
#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    fn push(&self, what: &str, body: Value) {
        self.requests.lock().unwrap().push((what.to_string(), body));
    }

    fn bodies(&self, what: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _)| w == what)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

fn png(width: u32, height: u32) -> String {
    let frame = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    let mut bytes = Cursor::new(Vec::new());
    frame
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
}

async fn new_session(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("POST /session", body);
    Json(json!({"value": {"sessionId": "s1", "capabilities": {}}}))
}

async fn window_rect() -> Json<Value> {
    Json(json!({"value": {"x": 0, "y": 0, "width": 1000, "height": 2000}}))
}

async fn screenshot() -> Json<Value> {
    Json(json!({"value": png(100, 200)}))
}

async fn actions(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("POST /actions", body);
    Json(json!({"value": null}))
}

async fn elements(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("POST /elements", body);
    Json(json!({"value": [{(ELEMENT_KEY): "e1"}, {(ELEMENT_KEY): "e2"}]}))
}

async fn element_rect(Path((_, element)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    match element.as_str() {
        "e1" => (
            StatusCode::OK,
            Json(json!({"value": {"x": 10, "y": 20, "width": 30, "height": 40}})),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"value": {
                "error": "stale element reference",
                "message": "element is gone"
            }})),
        ),
    }
}

async fn back() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"value": {"error": "unknown error", "message": "no activity to go back to"}})),
    )
}

async fn delete_session(State(rec): State<Recorded>) -> Json<Value> {
    rec.push("DELETE /session", Value::Null);
    Json(json!({"value": null}))
}

async fn spawn_appium() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/session", post(new_session))
        .route("/session/{id}", delete(delete_session))
        .route("/session/{id}/window/rect", get(window_rect))
        .route("/session/{id}/screenshot", get(screenshot))
        .route("/session/{id}/actions", post(actions))
        .route("/session/{id}/elements", post(elements))
        .route("/session/{id}/element/{element}/rect", get(element_rect))
        .route("/session/{id}/back", post(back))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), recorded)
}

fn capabilities(value: Value) -> Capabilities {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_android_session_lifecycle() {
    let (url, recorded) = spawn_appium().await;
    let caps = capabilities(json!({"appium:deviceName": "emulator-5554"}));

    let device = Device::connect(Platform::Android, caps, &url).await.unwrap();
    assert_eq!(device.session_id(), "s1");
    assert_eq!(device.platform(), Platform::Android);
    assert_eq!(device.screen_size().width, 1000);
    assert_eq!(device.screen_size().height, 2000);

    let created = recorded.bodies("POST /session");
    let always = &created[0]["capabilities"]["alwaysMatch"];
    assert_eq!(always["platformName"], "Android");
    assert_eq!(always["appium:automationName"], "UiAutomator2");
    assert_eq!(always["appium:deviceName"], "emulator-5554");

    assert!(device.close().await);
    assert_eq!(recorded.bodies("DELETE /session").len(), 1);
}

#[tokio::test]
async fn test_gestures_become_pointer_actions() {
    let (url, recorded) = spawn_appium().await;
    let controller = create_controller(Platform::Android, Capabilities::new(), &url)
        .await
        .unwrap();

    assert!(controller.click(5, 6).await);
    assert!(controller.swipe(1, 2, 3, 4, 300).await);
    assert!(controller.long_click(7, 8, Duration::from_millis(1500)).await);
    assert!(controller.touch_down(2, 9, 9, 1).await);

    let sent = recorded.bodies("POST /actions");
    assert_eq!(sent.len(), 4);

    let tap = &sent[0]["actions"][0];
    assert_eq!(tap["id"], "touch");
    assert_eq!(tap["parameters"]["pointerType"], "touch");
    assert_eq!(
        tap["actions"],
        json!([
            {"type": "pointerMove", "duration": 0, "x": 5, "y": 6},
            {"type": "pointerDown", "button": 0},
            {"type": "pause", "duration": 100},
            {"type": "pointerUp", "button": 0}
        ])
    );

    let swipe = &sent[1]["actions"][0]["actions"];
    assert_eq!(swipe[2], json!({"type": "pause", "duration": 300}));
    assert_eq!(swipe[3], json!({"type": "pointerMove", "duration": 0, "x": 3, "y": 4}));

    assert_eq!(sent[2]["actions"][0]["actions"][2]["duration"], 1500);
    assert_eq!(sent[3]["actions"][0]["id"], "finger2");
}

#[tokio::test]
async fn test_screencap_is_scaled_to_device() {
    let (url, _) = spawn_appium().await;
    let device = Device::connect(Platform::Ios, Capabilities::new(), &url)
        .await
        .unwrap();

    let frame = device.screenshot().await.unwrap();
    assert_eq!((frame.width, frame.height), (1000, 2000));
    assert_eq!(frame.image_data.len(), 1000 * 2000 * 4);
    assert!(!frame.to_jpeg(80).unwrap().is_empty());
}

#[tokio::test]
async fn test_text_lookup_skips_stale_elements() {
    let (url, recorded) = spawn_appium().await;
    let controller = create_controller(Platform::Android, Capabilities::new(), &url)
        .await
        .unwrap();

    let rects = controller.find_element_by_text("Buy").await;
    assert_eq!(rects, vec![Rect::new(10, 20, 30, 40)]);

    let query = &recorded.bodies("POST /elements")[0];
    assert_eq!(query["using"], "xpath");
    assert!(query["value"].as_str().unwrap().contains("'Buy'"));
}

#[tokio::test]
async fn test_driver_errors_degrade_to_false() {
    let (url, _) = spawn_appium().await;
    let controller = create_controller(Platform::Android, Capabilities::new(), &url)
        .await
        .unwrap();

    assert!(!controller.app_back().await);
    assert!(!controller.start_app("no-activity").await);
    assert!(!controller.press_key(4).await);
}

#[tokio::test]
async fn test_unreachable_server_fails_to_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = Device::connect(Platform::Android, Capabilities::new(), &format!("http://{addr}")).await;
    assert!(result.is_err());
}
