//! Interface to the external pipeline executor.
//!
//! The executor owns recognition, scheduling and the built-in actions. This
//! crate only needs to re-enter it with a rewritten sub-pipeline and to bind
//! its extension registry and controller to it.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::Registry;
use crate::errors::AutomationError;
use crate::pipeline::Pipeline;
use crate::platforms::AppiumController;

/// Outcome of one task run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDetail {
    pub entry: String,
    pub succeeded: bool,
    /// Names of the nodes that ran, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
}

impl TaskDetail {
    pub fn new(entry: impl Into<String>, succeeded: bool) -> Self {
        Self {
            entry: entry.into(),
            succeeded,
            nodes: Vec::new(),
        }
    }
}

/// Execution context handed to custom extensions.
#[async_trait::async_trait]
pub trait TaskContext: Send + Sync {
    /// Run `pipeline` from `entry`, blocking until the traversal finishes.
    async fn run_task(&self, entry: &str, pipeline: &Pipeline) -> TaskDetail;

    /// An independent context whose recognition state is not shared.
    fn clone_context(&self) -> Arc<dyn TaskContext>;
}

/// Top-level executor handle.
#[async_trait::async_trait]
pub trait Tasker: Send + Sync {
    /// Load a resource bundle (images, models, default pipeline).
    async fn load_resource(&mut self, path: &Path) -> Result<(), AutomationError>;

    /// Attach the extension registry and the device controller.
    fn bind(
        &mut self,
        registry: Arc<Registry>,
        controller: Arc<dyn AppiumController>,
    ) -> Result<(), AutomationError>;

    async fn post_task(
        &self,
        entry: &str,
        pipeline: &Pipeline,
    ) -> Result<TaskDetail, AutomationError>;
}
