use std::sync::Arc;

use serde::Deserialize;

use super::{
    parse_param, CustomRecognition, CustomRecognitionArg, RecognitionResult,
};
use crate::executor::TaskContext;
use crate::locator::TextLocator;
use crate::platforms::AppiumController;

#[derive(Debug, Deserialize)]
struct FindTextParam {
    text: String,
    #[serde(default)]
    index: i64,
}

/// Recognition by element text, usable wherever OCR or template matching is.
pub struct FindText {
    controller: Arc<dyn AppiumController>,
}

impl FindText {
    pub fn new(controller: Arc<dyn AppiumController>) -> Self {
        Self { controller }
    }
}

#[async_trait::async_trait]
impl CustomRecognition for FindText {
    async fn analyze(
        &self,
        _context: &dyn TaskContext,
        arg: &CustomRecognitionArg,
    ) -> RecognitionResult {
        let param: FindTextParam = match parse_param(&arg.param) {
            Ok(param) => param,
            Err(e) => return RecognitionResult::miss(e.to_string()),
        };

        let locator = TextLocator::new(self.controller.clone(), param.text.as_str())
            .within(arg.roi)
            .nth(param.index);
        match locator.find().await {
            Ok(rect) => RecognitionResult::hit(rect, format!("found {:?}", param.text)),
            Err(e) => RecognitionResult::miss(e.to_string()),
        }
    }
}
