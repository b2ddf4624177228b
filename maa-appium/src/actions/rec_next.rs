use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{parse_param, CustomAction, CustomActionArg, RunResult, REC_NEXT};
use crate::errors::AutomationError;
use crate::executor::TaskContext;
use crate::pipeline::Pipeline;
use crate::platforms::AppiumController;
use crate::types::{DeviceSize, Rect};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RecNextParam {
    row: bool,
    column: bool,
    expected: Value,
    recognition: String,
    action: String,
    next: Vec<String>,
    padding: i32,
    more: Map<String, Value>,
}

impl Default for RecNextParam {
    fn default() -> Self {
        Self {
            row: true,
            column: false,
            expected: Value::String(String::new()),
            recognition: "OCR".to_string(),
            action: "Click".to_string(),
            next: Vec::new(),
            padding: 0,
            more: Map::new(),
        }
    }
}

impl RecNextParam {
    fn node(&self, roi: [i32; 4]) -> Pipeline {
        let mut node = Map::new();
        node.insert("recognition".into(), json!(self.recognition));
        node.insert("expected".into(), self.expected.clone());
        node.insert("action".into(), json!(self.action));
        node.insert("padding".into(), json!(self.padding));
        node.insert("next".into(), json!(self.next));
        node.insert("roi".into(), json!(roi));
        for (k, v) in &self.more {
            node.insert(k.clone(), v.clone());
        }
        let mut pipeline = Map::new();
        pipeline.insert(REC_NEXT.to_string(), Value::Object(node));
        pipeline
    }
}

/// Scan the row and/or column of the recognized box for a second target.
pub struct RecNext {
    controller: Arc<dyn AppiumController>,
}

/// ROI covering the rest of the box's row.
fn row_roi(rect: Rect, screen: DeviceSize, padding: i32) -> [i32; 4] {
    [rect.x, rect.y, screen.width, rect.h.saturating_add(padding)]
}

/// ROI covering the rest of the box's column.
fn column_roi(rect: Rect, screen: DeviceSize, padding: i32) -> [i32; 4] {
    [rect.x, rect.y, rect.w.saturating_add(padding), screen.height]
}

impl RecNext {
    pub fn new(controller: Arc<dyn AppiumController>) -> Self {
        Self { controller }
    }

    async fn execute(
        &self,
        context: &dyn TaskContext,
        arg: &CustomActionArg,
    ) -> Result<bool, AutomationError> {
        let param: RecNextParam = parse_param(&arg.param)?;
        let screen = self.controller.device_size();
        let scoped = context.clone_context();

        let mut scans = Vec::new();
        if param.row {
            scans.push(("row", row_roi(arg.rect, screen, param.padding)));
        }
        if param.column {
            scans.push(("column", column_roi(arg.rect, screen, param.padding)));
        }

        for (direction, roi) in scans {
            debug!("RecNext scanning {} in {:?}", direction, roi);
            let detail = scoped.run_task(REC_NEXT, &param.node(roi)).await;
            if detail.succeeded {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait::async_trait]
impl CustomAction for RecNext {
    async fn run(&self, context: &dyn TaskContext, arg: &CustomActionArg) -> RunResult {
        RunResult::from_outcome(REC_NEXT, self.execute(context, arg).await)
    }
}
