use serde_json::json;
use tracing::debug;

use super::{Platform, PlatformBehavior};
use crate::errors::AutomationError;
use crate::types::Capabilities;
use crate::webdriver::{xpath_literal, WebDriverSession};

const TEXT_FIELDS: &str = "//XCUIElementTypeTextField | //XCUIElementTypeSecureTextField";

/// XCUITest-backed iOS devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ios;

#[async_trait::async_trait]
impl PlatformBehavior for Ios {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn prepare_capabilities(&self, _capabilities: &mut Capabilities) {}

    async fn start_app(
        &self,
        session: &WebDriverSession,
        bundle_id: &str,
    ) -> Result<(), AutomationError> {
        session
            .execute_mobile("launchApp", json!({ "bundleId": bundle_id }))
            .await
            .map(|_| ())
    }

    async fn stop_app(
        &self,
        session: &WebDriverSession,
        bundle_id: &str,
    ) -> Result<(), AutomationError> {
        session
            .execute_mobile("terminateApp", json!({ "bundleId": bundle_id }))
            .await
            .map(|_| ())
    }

    async fn input_text(
        &self,
        session: &WebDriverSession,
        text: &str,
    ) -> Result<(), AutomationError> {
        let fields = session.find_elements("xpath", TEXT_FIELDS).await?;
        let target = match fields.into_iter().next() {
            Some(field) => field,
            None => {
                debug!("No text field on screen, typing into the focused element");
                session.active_element().await?
            }
        };
        session.send_keys(&target, text).await
    }

    async fn press_key(
        &self,
        _session: &WebDriverSession,
        keycode: i32,
    ) -> Result<(), AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "key codes are not available on iOS (keycode {keycode})"
        )))
    }

    fn text_query(&self, text: &str) -> String {
        let literal = xpath_literal(text);
        format!(
            "//*[contains(@label, {literal}) or contains(@name, {literal}) or contains(@value, {literal})]"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_query_quotes_apostrophes() {
        assert_eq!(
            Ios.text_query("It's"),
            "//*[contains(@label, \"It's\") or contains(@name, \"It's\") or contains(@value, \"It's\")]"
        );
    }
}
