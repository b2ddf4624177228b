//! Custom actions and recognitions registered with the executor.
//!
//! The executor calls an extension by name with the box it just recognized
//! and the node's JSON parameter string. Extensions never fail across that
//! boundary: every error is logged and turned into an unsuccessful result so
//! the pipeline can take its failure branch.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AutomationError;
use crate::executor::TaskContext;
use crate::platforms::AppiumController;
use crate::types::Rect;

mod app_back;
mod find_text;
mod for_each;
mod long_press;
mod panel;
mod rec_next;

pub use app_back::AppBack;
pub use find_text::FindText;
pub use for_each::{Aggregation, ForEach, ForEachParam};
pub use long_press::LongPress;
pub use panel::Panel;
pub use rec_next::RecNext;

pub const LONG_PRESS: &str = "LongPress";
pub const REC_NEXT: &str = "RecNext";
pub const RATIO_PANEL: &str = "RatioPanel";
pub const ANCHOR_PANEL: &str = "AnchorPanel";
pub const APP_BACK: &str = "AppBack";
pub const FOR_EACH: &str = "ForEach";
pub const FIND_TEXT: &str = "FindText";

/// Arguments of a custom action invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomActionArg {
    pub node_name: String,
    /// Box of the recognition that triggered the action.
    #[serde(rename = "box")]
    pub rect: Rect,
    /// Raw `custom_action_param` JSON.
    pub param: String,
}

/// Arguments of a custom recognition invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomRecognitionArg {
    pub node_name: String,
    pub roi: Rect,
    /// Raw `custom_recognition_param` JSON.
    pub param: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
}

impl RunResult {
    pub fn success() -> Self {
        Self { success: true }
    }

    pub fn failure() -> Self {
        Self { success: false }
    }

    /// Collapse an internal outcome, logging any error.
    pub fn from_outcome(action: &str, outcome: Result<bool, AutomationError>) -> Self {
        match outcome {
            Ok(success) => Self { success },
            Err(e) => {
                warn!("{} failed: {}", action, e);
                Self::failure()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// `None` when nothing matched.
    #[serde(rename = "box")]
    pub rect: Option<Rect>,
    pub detail: String,
}

impl RecognitionResult {
    pub fn hit(rect: Rect, detail: impl Into<String>) -> Self {
        Self {
            rect: Some(rect),
            detail: detail.into(),
        }
    }

    pub fn miss(detail: impl Into<String>) -> Self {
        Self {
            rect: None,
            detail: detail.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait CustomAction: Send + Sync {
    async fn run(&self, context: &dyn TaskContext, arg: &CustomActionArg) -> RunResult;
}

#[async_trait::async_trait]
pub trait CustomRecognition: Send + Sync {
    async fn analyze(
        &self,
        context: &dyn TaskContext,
        arg: &CustomRecognitionArg,
    ) -> RecognitionResult;
}

/// Decode a parameter string; an empty string reads as `{}`.
pub(crate) fn parse_param<T: DeserializeOwned>(raw: &str) -> Result<T, AutomationError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw)
        .map_err(|e| AutomationError::InvalidParameter(format!("{e} in {raw}")))
}

/// Named extensions for one automation session.
#[derive(Default, Clone)]
pub struct Registry {
    actions: HashMap<String, Arc<dyn CustomAction>>,
    recognitions: HashMap<String, Arc<dyn CustomRecognition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in extension, bound to `controller`.
    pub fn with_defaults(controller: Arc<dyn AppiumController>) -> Self {
        let mut registry = Self::new();
        registry.register_action(LONG_PRESS, LongPress::new(controller.clone()));
        registry.register_action(REC_NEXT, RecNext::new(controller.clone()));
        registry.register_action(RATIO_PANEL, Panel::ratio(controller.clone()));
        registry.register_action(ANCHOR_PANEL, Panel::anchor(controller.clone()));
        registry.register_action(APP_BACK, AppBack::new(controller.clone()));
        registry.register_action(FOR_EACH, ForEach::new());
        registry.register_recognition(FIND_TEXT, FindText::new(controller));
        registry
    }

    pub fn register_action(&mut self, name: &str, action: impl CustomAction + 'static) {
        debug!("Registering custom action {}", name);
        self.actions.insert(name.to_string(), Arc::new(action));
    }

    pub fn register_recognition(
        &mut self,
        name: &str,
        recognition: impl CustomRecognition + 'static,
    ) {
        debug!("Registering custom recognition {}", name);
        self.recognitions
            .insert(name.to_string(), Arc::new(recognition));
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn has_recognition(&self, name: &str) -> bool {
        self.recognitions.contains_key(name)
    }

    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn run_action(
        &self,
        name: &str,
        context: &dyn TaskContext,
        arg: &CustomActionArg,
    ) -> RunResult {
        match self.actions.get(name) {
            Some(action) => action.run(context, arg).await,
            None => {
                warn!("Unknown custom action {} on node {}", name, arg.node_name);
                RunResult::failure()
            }
        }
    }

    pub async fn run_recognition(
        &self,
        name: &str,
        context: &dyn TaskContext,
        arg: &CustomRecognitionArg,
    ) -> RecognitionResult {
        match self.recognitions.get(name) {
            Some(recognition) => recognition.analyze(context, arg).await,
            None => {
                warn!("Unknown custom recognition {} on node {}", name, arg.node_name);
                RecognitionResult::miss(format!("unknown custom recognition {name}"))
            }
        }
    }
}
