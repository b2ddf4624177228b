//! Common geometry and capture types shared by the controller and the pipeline engine

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with top-left corner `(x, y)` and size `(w, h)`.
///
/// The executor hands one of these to every custom extension, either as the
/// box of the latest recognition hit or as a region of interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Centre point, rounded toward the top-left corner and clamped to `i32`.
    pub fn center(&self) -> (i32, i32) {
        (self.x.saturating_add(self.w / 2), self.y.saturating_add(self.h / 2))
    }

    /// Inclusive containment test on both edges.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        let (px, py) = (i64::from(px), i64::from(py));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && px <= x + i64::from(self.w) && py >= y && py <= y + i64::from(self.h)
    }

    /// An all-zero rectangle is the executor's "whole screen" region.
    pub fn is_unbounded(&self) -> bool {
        self.x == 0 && self.y == 0 && self.w == 0 && self.h == 0
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

impl From<[i32; 4]> for Rect {
    fn from(v: [i32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

/// Display size of the controlled device, queried once per controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSize {
    pub width: i32,
    pub height: i32,
}

impl DeviceSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Holds the screenshot data
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    /// Raw RGBA pixels
    pub image_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ScreenshotResult {
    /// Encode the frame as JPEG for streaming.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, crate::AutomationError> {
        let rgba = image::RgbaImage::from_raw(self.width, self.height, self.image_data.clone())
            .ok_or_else(|| {
                crate::AutomationError::Image(format!(
                    "buffer does not match {}x{} RGBA frame",
                    self.width, self.height
                ))
            })?;
        let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        rgb.write_with_encoder(encoder)?;
        Ok(out)
    }
}

/// Flat Appium capability mapping (`platformName`, `appium:udid`, ...).
pub type Capabilities = serde_json::Map<String, serde_json::Value>;
