use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::AutomationError;
use crate::platforms::AppiumController;
use crate::types::Rect;

/// Finds on-screen elements by their text instead of by image template.
///
/// Candidates come from the controller's accessibility tree. A candidate is
/// kept when its centre lies inside the region of interest; the survivor at
/// the requested index is the match. Negative indices count from the end.
#[derive(Clone)]
pub struct TextLocator {
    controller: Arc<dyn AppiumController>,
    text: String,
    roi: Option<Rect>,
    index: i64,
}

impl TextLocator {
    pub fn new(controller: Arc<dyn AppiumController>, text: impl Into<String>) -> Self {
        Self {
            controller,
            text: text.into(),
            roi: None,
            index: 0,
        }
    }

    /// Restrict matches to `roi`. An all-zero rectangle means the whole screen.
    pub fn within(mut self, roi: Rect) -> Self {
        self.roi = (!roi.is_unbounded()).then_some(roi);
        self
    }

    pub fn nth(mut self, index: i64) -> Self {
        self.index = index;
        self
    }

    /// Every candidate inside the region, in driver order.
    pub async fn all(&self) -> Vec<Rect> {
        let candidates = self.controller.find_element_by_text(&self.text).await;
        filter_by_roi(candidates, self.roi)
    }

    #[instrument(level = "debug", skip(self), fields(text = %self.text, index = self.index))]
    pub async fn find(&self) -> Result<Rect, AutomationError> {
        let matches = self.all().await;
        debug!("{} candidates for {:?} in {:?}", matches.len(), self.text, self.roi);
        select_nth(&matches, self.index).ok_or_else(|| {
            AutomationError::ElementNotFound(format!(
                "no element #{} with text {:?} among {} matches",
                self.index,
                self.text,
                matches.len()
            ))
        })
    }
}

/// Keep candidates whose centre lies inside `roi`.
pub fn filter_by_roi(candidates: Vec<Rect>, roi: Option<Rect>) -> Vec<Rect> {
    match roi {
        Some(roi) => candidates
            .into_iter()
            .filter(|c| {
                let (cx, cy) = c.center();
                roi.contains(cx, cy)
            })
            .collect(),
        None => candidates,
    }
}

/// Negative indexes count from the end: `-1` is the last element.
pub fn select_nth(matches: &[Rect], index: i64) -> Option<Rect> {
    let len = matches.len() as i64;
    let normalized = if index < 0 { index + len } else { index };
    if (0..len).contains(&normalized) {
        Some(matches[normalized as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Rect> {
        // centres at (5,5), (50,50), (500,500)
        vec![
            Rect::new(0, 0, 10, 10),
            Rect::new(40, 40, 20, 20),
            Rect::new(490, 490, 20, 20),
        ]
    }

    #[test]
    fn test_roi_filter_and_selection() {
        let kept = filter_by_roi(candidates(), Some(Rect::new(0, 0, 100, 100)));
        assert_eq!(kept.len(), 2);
        assert_eq!(select_nth(&kept, 0), Some(Rect::new(0, 0, 10, 10)));
        assert_eq!(select_nth(&kept, -1), Some(Rect::new(40, 40, 20, 20)));
        assert_eq!(select_nth(&kept, 5), None);
        assert_eq!(select_nth(&kept, -3), None);
    }

    #[test]
    fn test_no_roi_keeps_everything() {
        assert_eq!(filter_by_roi(candidates(), None).len(), 3);
        assert_eq!(select_nth(&[], 0), None);
        assert_eq!(select_nth(&[], -1), None);
    }
}
