use std::sync::Arc;

use super::{CustomAction, CustomActionArg, RunResult};
use crate::executor::TaskContext;
use crate::platforms::AppiumController;

/// Device back navigation.
pub struct AppBack {
    controller: Arc<dyn AppiumController>,
}

impl AppBack {
    pub fn new(controller: Arc<dyn AppiumController>) -> Self {
        Self { controller }
    }
}

#[async_trait::async_trait]
impl CustomAction for AppBack {
    async fn run(&self, _context: &dyn TaskContext, _arg: &CustomActionArg) -> RunResult {
        RunResult {
            success: self.controller.app_back().await,
        }
    }
}
