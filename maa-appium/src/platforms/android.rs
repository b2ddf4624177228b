use serde_json::{json, Value};

use super::{Platform, PlatformBehavior};
use crate::errors::AutomationError;
use crate::types::Capabilities;
use crate::webdriver::{xpath_literal, WebDriverSession};

/// UiAutomator2-backed Android devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Android;

/// Split an `package/activity` intent.
fn split_intent(intent: &str) -> Result<(&str, &str), AutomationError> {
    match intent.split_once('/') {
        Some((package, activity)) if !package.is_empty() && !activity.is_empty() => {
            Ok((package, activity))
        }
        _ => Err(AutomationError::InvalidArgument(format!(
            "expected 'package/activity', got '{intent}'"
        ))),
    }
}

#[async_trait::async_trait]
impl PlatformBehavior for Android {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn prepare_capabilities(&self, capabilities: &mut Capabilities) {
        capabilities
            .entry("appium:automationName")
            .or_insert_with(|| Value::from("UiAutomator2"));
        capabilities
            .entry("platformName")
            .or_insert_with(|| Value::from("Android"));
    }

    async fn start_app(
        &self,
        session: &WebDriverSession,
        intent: &str,
    ) -> Result<(), AutomationError> {
        let (package, activity) = split_intent(intent)?;
        session
            .execute_mobile(
                "startActivity",
                json!({ "intent": format!("{package}/{activity}") }),
            )
            .await
            .map(|_| ())
    }

    async fn stop_app(
        &self,
        session: &WebDriverSession,
        intent: &str,
    ) -> Result<(), AutomationError> {
        let package = intent.split('/').next().unwrap_or(intent);
        session
            .execute_mobile("terminateApp", json!({ "appId": package }))
            .await
            .map(|_| ())
    }

    async fn input_text(
        &self,
        session: &WebDriverSession,
        text: &str,
    ) -> Result<(), AutomationError> {
        let focused = session.active_element().await?;
        session.send_keys(&focused, text).await
    }

    async fn press_key(
        &self,
        session: &WebDriverSession,
        keycode: i32,
    ) -> Result<(), AutomationError> {
        session.press_keycode(keycode).await
    }

    fn text_query(&self, text: &str) -> String {
        let literal = xpath_literal(text);
        format!("//*[contains(@text, {literal}) or contains(@content-desc, {literal})]")
    }
}
