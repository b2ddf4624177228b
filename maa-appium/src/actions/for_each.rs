use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_param, CustomAction, CustomActionArg, RunResult, FOR_EACH};
use crate::errors::AutomationError;
use crate::executor::TaskContext;
use crate::pipeline::{Pipeline, SubstitutionTarget, ENTRY_NODE};

/// How per-item outcomes combine into the action's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Every item must succeed (`flag: 0`).
    All,
    /// At least one item must succeed (`flag: 1`).
    Any,
}

impl Aggregation {
    pub fn combine(self, outcomes: &[bool]) -> bool {
        match self {
            Aggregation::All => outcomes.iter().fold(true, |acc, ok| acc && *ok),
            Aggregation::Any => outcomes.iter().fold(false, |acc, ok| acc || *ok),
        }
    }
}

impl TryFrom<i64> for Aggregation {
    type Error = AutomationError;

    fn try_from(flag: i64) -> Result<Self, Self::Error> {
        match flag {
            0 => Ok(Aggregation::All),
            1 => Ok(Aggregation::Any),
            other => Err(AutomationError::InvalidParameter(format!(
                "ForEach flag must be 0 or 1, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForEachParam {
    #[serde(rename = "forEachList")]
    pub list: Vec<Value>,
    #[serde(rename = "forEachTarget")]
    pub targets: Vec<SubstitutionTarget>,
    pub pipeline: Pipeline,
    #[serde(default)]
    pub flag: i64,
    #[serde(default = "default_entry")]
    pub entry: String,
}

fn default_entry() -> String {
    ENTRY_NODE.to_string()
}

impl ForEachParam {
    /// The template with `item` written to every target, or the first path
    /// that does not exist in the template.
    pub fn instantiate(&self, item: &Value) -> Result<Pipeline, AutomationError> {
        let mut instance = Value::Object(self.pipeline.clone());
        for target in &self.targets {
            target.write(&mut instance, item.clone())?;
        }
        match instance {
            Value::Object(pipeline) => Ok(pipeline),
            _ => Err(AutomationError::Internal(
                "template stopped being an object".to_string(),
            )),
        }
    }

    fn validate(&self) -> Result<Aggregation, AutomationError> {
        let aggregation = Aggregation::try_from(self.flag)?;
        let mut scratch = Value::Object(self.pipeline.clone());
        for target in &self.targets {
            target.locate_mut(&mut scratch)?;
        }
        Ok(aggregation)
    }
}

/// Re-runs a template pipeline once per list item.
///
/// Items run in list order, each on a fresh copy of the template and in its
/// own cloned context. Every instance is built before the first run, so a bad
/// path fails the action without touching the device.
#[derive(Debug, Default)]
pub struct ForEach;

impl ForEach {
    pub fn new() -> Self {
        Self
    }

    /// The aggregation to apply and the per-item outcomes, in list order.
    pub async fn expand(
        &self,
        context: &dyn TaskContext,
        param: &ForEachParam,
    ) -> Result<(Aggregation, Vec<bool>), AutomationError> {
        let aggregation = param.validate()?;
        let instances = param
            .list
            .iter()
            .map(|item| param.instantiate(item))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = Vec::with_capacity(instances.len());
        for (index, (item, pipeline)) in param.list.iter().zip(instances).enumerate() {
            debug!("ForEach item {} = {}", index, item);
            let detail = context
                .clone_context()
                .run_task(&param.entry, &pipeline)
                .await;
            info!(
                "ForEach item {}/{} ({}) {}",
                index + 1,
                param.list.len(),
                item,
                if detail.succeeded { "succeeded" } else { "failed" }
            );
            outcomes.push(detail.succeeded);
        }
        Ok((aggregation, outcomes))
    }

    async fn execute(
        &self,
        context: &dyn TaskContext,
        arg: &CustomActionArg,
    ) -> Result<bool, AutomationError> {
        let param: ForEachParam = parse_param(&arg.param)?;
        let (aggregation, outcomes) = self.expand(context, &param).await?;
        Ok(aggregation.combine(&outcomes))
    }
}

#[async_trait::async_trait]
impl CustomAction for ForEach {
    async fn run(&self, context: &dyn TaskContext, arg: &CustomActionArg) -> RunResult {
        RunResult::from_outcome(FOR_EACH, self.execute(context, arg).await)
    }
}
