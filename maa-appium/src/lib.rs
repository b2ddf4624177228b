//! Mobile UI automation through Appium for a vision-driven pipeline executor
//!
//! This crate provides the device side of the executor: a platform-agnostic
//! controller over an Appium session, and custom actions and recognitions
//! that rewrite pipeline fragments (coordinate placeholders, per-item template
//! expansion, text-based element lookup) before handing them back.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

pub mod actions;
pub mod coordinate;
pub mod errors;
pub mod executor;
pub mod locator;
pub mod pipeline;
pub mod platforms;
pub mod resource;
pub mod types;
pub mod webdriver;

pub use actions::{CustomAction, CustomActionArg, CustomRecognition, CustomRecognitionArg, Registry, RunResult};
pub use coordinate::{Coord, CoordinateResolver, ReferenceFrame, ResolveMode};
pub use errors::AutomationError;
pub use executor::{TaskContext, TaskDetail, Tasker};
pub use locator::TextLocator;
pub use pipeline::{Pipeline, SubstitutionTarget, TreeWalker, ENTRY_NODE};
pub use platforms::{create_controller, AppiumController, Platform};
pub use types::{Capabilities, DeviceSize, Rect, ScreenshotResult};
pub use webdriver::DEFAULT_SERVER_URL;

/// The main entry point for driving one device
#[derive(Clone)]
pub struct Device {
    controller: Arc<dyn AppiumController>,
}

impl Device {
    /// Open an Appium session for `platform`.
    #[instrument(skip(capabilities))]
    pub async fn connect(
        platform: Platform,
        capabilities: Capabilities,
        server_url: &str,
    ) -> Result<Self, AutomationError> {
        let controller = create_controller(platform, capabilities, server_url).await?;
        if !controller.connect().await {
            return Err(AutomationError::SessionNotCreated(format!(
                "{platform} session on {server_url} is not responding"
            )));
        }
        Ok(Self { controller })
    }

    /// Wrap an existing controller.
    pub fn from_controller(controller: Arc<dyn AppiumController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> Arc<dyn AppiumController> {
        self.controller.clone()
    }

    pub fn platform(&self) -> Platform {
        self.controller.platform()
    }

    pub fn session_id(&self) -> String {
        self.controller.request_uuid()
    }

    pub fn screen_size(&self) -> DeviceSize {
        self.controller.device_size()
    }

    pub async fn tap(&self, x: i32, y: i32) -> bool {
        self.controller.click(x, y).await
    }

    pub async fn swipe(&self, from: (i32, i32), to: (i32, i32), duration: Duration) -> bool {
        self.controller
            .swipe(from.0, from.1, to.0, to.1, duration.as_millis() as u64)
            .await
    }

    pub async fn long_press(&self, x: i32, y: i32, duration: Duration) -> bool {
        self.controller.long_click(x, y, duration).await
    }

    pub async fn screenshot(&self) -> Option<ScreenshotResult> {
        self.controller.screencap().await
    }

    /// Locate elements by their text.
    pub fn locator(&self, text: impl Into<String>) -> TextLocator {
        TextLocator::new(self.controller.clone(), text)
    }

    /// Built-in extensions bound to this device.
    pub fn registry(&self) -> Registry {
        Registry::with_defaults(self.controller.clone())
    }

    /// Run `pipeline` from its `Entry` node on `tasker`.
    ///
    /// Loads the resource bundle at `resource_path` (default `./resource`),
    /// binds a fresh registry and this device, then posts the task.
    #[instrument(skip(self, tasker, pipeline))]
    pub async fn run_pipeline(
        &self,
        tasker: &mut dyn Tasker,
        pipeline: &Pipeline,
        resource_path: Option<&Path>,
    ) -> Result<TaskDetail, AutomationError> {
        let resource_path = resource_path.unwrap_or_else(|| Path::new(resource::RESOURCE_DIR));
        tasker.load_resource(resource_path).await?;
        tasker.bind(Arc::new(self.registry()), self.controller.clone())?;

        let detail = tasker.post_task(ENTRY_NODE, pipeline).await?;
        info!(
            "Pipeline from {} {}",
            detail.entry,
            if detail.succeeded { "succeeded" } else { "failed" }
        );
        Ok(detail)
    }

    /// End the driver session.
    pub async fn close(&self) -> bool {
        self.controller.disconnect().await
    }
}
