use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::{parse_param, CustomAction, CustomActionArg, RunResult, LONG_PRESS};
use crate::errors::AutomationError;
use crate::executor::TaskContext;
use crate::platforms::AppiumController;

#[derive(Debug, Deserialize)]
struct LongPressParam {
    /// Seconds.
    #[serde(default = "default_duration")]
    duration: f64,
}

fn default_duration() -> f64 {
    2.0
}

/// Press and hold the top-left corner of the recognized box.
pub struct LongPress {
    controller: Arc<dyn AppiumController>,
}

impl LongPress {
    pub fn new(controller: Arc<dyn AppiumController>) -> Self {
        Self { controller }
    }

    async fn execute(&self, arg: &CustomActionArg) -> Result<bool, AutomationError> {
        let param: LongPressParam = parse_param(&arg.param)?;
        let duration = Duration::try_from_secs_f64(param.duration).map_err(|_| {
            AutomationError::InvalidParameter(format!("bad duration {}", param.duration))
        })?;
        let (x, y) = (arg.rect.x, arg.rect.y);
        info!("Long press at ({}, {}) for {:?}", x, y, duration);
        Ok(self.controller.long_click(x, y, duration).await)
    }
}

#[async_trait::async_trait]
impl CustomAction for LongPress {
    async fn run(&self, _context: &dyn TaskContext, arg: &CustomActionArg) -> RunResult {
        RunResult::from_outcome(LONG_PRESS, self.execute(arg).await)
    }
}
