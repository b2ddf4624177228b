use std::sync::Arc;

use tracing::debug;

use super::{parse_param, CustomAction, CustomActionArg, RunResult, ANCHOR_PANEL, RATIO_PANEL};
use crate::coordinate::{CoordinateResolver, ReferenceFrame, ResolveMode};
use crate::errors::AutomationError;
use crate::executor::TaskContext;
use crate::pipeline::{resolve_coordinates, Pipeline, ENTRY_NODE};
use crate::platforms::AppiumController;

/// Runs the pipeline carried in its parameter after resolving its coordinates.
///
/// `RatioPanel` turns screen fractions into pixels. `AnchorPanel` replaces
/// sentinel codes with quantities of the box that triggered it.
pub struct Panel {
    controller: Arc<dyn AppiumController>,
    mode: ResolveMode,
}

impl Panel {
    pub fn ratio(controller: Arc<dyn AppiumController>) -> Self {
        Self {
            controller,
            mode: ResolveMode::Ratio,
        }
    }

    pub fn anchor(controller: Arc<dyn AppiumController>) -> Self {
        Self {
            controller,
            mode: ResolveMode::Symbolic,
        }
    }

    fn name(&self) -> &'static str {
        match self.mode {
            ResolveMode::Ratio => RATIO_PANEL,
            ResolveMode::Symbolic => ANCHOR_PANEL,
        }
    }

    /// The payload with every coordinate field resolved.
    pub fn resolve(&self, arg: &CustomActionArg) -> Result<Pipeline, AutomationError> {
        let payload: Pipeline = parse_param(&arg.param)?;
        let frame = ReferenceFrame::new(arg.rect, self.controller.device_size());
        let resolver = CoordinateResolver::new(self.mode, frame);
        Ok(resolve_coordinates(&payload, &resolver))
    }

    async fn execute(
        &self,
        context: &dyn TaskContext,
        arg: &CustomActionArg,
    ) -> Result<bool, AutomationError> {
        let pipeline = self.resolve(arg)?;
        debug!("{} resolved pipeline: {}", self.name(), serde_json::Value::Object(pipeline.clone()));
        let detail = context.clone_context().run_task(ENTRY_NODE, &pipeline).await;
        Ok(detail.succeeded)
    }
}

#[async_trait::async_trait]
impl CustomAction for Panel {
    async fn run(&self, context: &dyn TaskContext, arg: &CustomActionArg) -> RunResult {
        RunResult::from_outcome(self.name(), self.execute(context, arg).await)
    }
}
