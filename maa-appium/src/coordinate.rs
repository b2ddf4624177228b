//! Resolution of `[x, y, w, h]` coordinate fields into absolute pixels.
//!
//! Pipeline payloads may carry two kinds of placeholders in their coordinate
//! fields: sentinel integers that refer to the recognized box or the screen,
//! and fractions of the screen size. Each convention is its own
//! [`ResolveMode`]; a resolver only ever applies one of them. Raw JSON numbers
//! are decoded into a [`Coord`] first, so a literal pixel value and a sentinel
//! never travel through the resolver as the same type.

use serde_json::Value;

use crate::types::{DeviceSize, Rect};

/// Sentinel for the recognized box's x coordinate.
pub const BOX_X: i64 = 10001;
/// Sentinel for the recognized box's y coordinate.
pub const BOX_Y: i64 = 10002;
/// Sentinel for the recognized box's width.
pub const BOX_WIDTH: i64 = 10003;
/// Sentinel for the recognized box's height.
pub const BOX_HEIGHT: i64 = 10004;
/// Sentinel for the device screen width.
pub const SCREEN_WIDTH: i64 = 20003;
/// Sentinel for the device screen height.
pub const SCREEN_HEIGHT: i64 = 20004;

/// Field names that carry a coordinate 4-tuple, in the order they are resolved.
pub const COORDINATE_FIELDS: [&str; 8] = [
    "target",
    "target_offset",
    "roi",
    "roi_offset",
    "begin",
    "begin_offset",
    "end",
    "end_offset",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Sentinel codes refer to the recognized box or the screen.
    Symbolic,
    /// Values strictly between -1 and 1 (exclusive of 0) are screen fractions.
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxDim {
    X,
    Y,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// x and w (slots 0 and 2) are horizontal, y and h are vertical.
    pub fn of_slot(slot: usize) -> Self {
        if slot % 2 == 0 {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }
}

/// One decoded element of a coordinate 4-tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coord {
    Absolute(i64),
    Ratio(f64, Axis),
    Box(BoxDim),
    NegatedBox(BoxDim),
    Screen(Axis),
    NegatedScreen(Axis),
}

impl Coord {
    /// Decode a raw number sitting in `slot` of a 4-tuple under `mode`.
    pub fn decode(raw: f64, slot: usize, mode: ResolveMode) -> Coord {
        match mode {
            ResolveMode::Ratio => {
                if raw != 0.0 && raw.abs() < 1.0 {
                    Coord::Ratio(raw, Axis::of_slot(slot))
                } else {
                    Coord::Absolute(raw.trunc() as i64)
                }
            }
            ResolveMode::Symbolic => {
                if raw.fract() != 0.0 {
                    return Coord::Absolute(raw.trunc() as i64);
                }
                let code = raw as i64;
                let negated = code < 0;
                // i64::MIN has no positive counterpart and is never a code
                let symbol = match code.checked_abs().unwrap_or(code) {
                    BOX_X => Some(Coord::Box(BoxDim::X)),
                    BOX_Y => Some(Coord::Box(BoxDim::Y)),
                    BOX_WIDTH => Some(Coord::Box(BoxDim::Width)),
                    BOX_HEIGHT => Some(Coord::Box(BoxDim::Height)),
                    SCREEN_WIDTH => Some(Coord::Screen(Axis::Horizontal)),
                    SCREEN_HEIGHT => Some(Coord::Screen(Axis::Vertical)),
                    _ => None,
                };
                match (symbol, negated) {
                    (Some(Coord::Box(dim)), true) => Coord::NegatedBox(dim),
                    (Some(Coord::Screen(axis)), true) => Coord::NegatedScreen(axis),
                    (Some(sym), false) => sym,
                    _ => Coord::Absolute(code),
                }
            }
        }
    }

    pub fn resolve(&self, frame: &ReferenceFrame) -> i64 {
        match *self {
            Coord::Absolute(v) => v,
            Coord::Ratio(fraction, axis) => (fraction * frame.screen(axis) as f64).trunc() as i64,
            Coord::Box(dim) => frame.box_dim(dim),
            Coord::NegatedBox(dim) => -frame.box_dim(dim),
            Coord::Screen(axis) => frame.screen(axis),
            Coord::NegatedScreen(axis) => -frame.screen(axis),
        }
    }
}

/// The quantities placeholders are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferenceFrame {
    pub rect: Rect,
    pub device: DeviceSize,
}

impl ReferenceFrame {
    pub fn new(rect: Rect, device: DeviceSize) -> Self {
        Self { rect, device }
    }

    fn box_dim(&self, dim: BoxDim) -> i64 {
        i64::from(match dim {
            BoxDim::X => self.rect.x,
            BoxDim::Y => self.rect.y,
            BoxDim::Width => self.rect.w,
            BoxDim::Height => self.rect.h,
        })
    }

    fn screen(&self, axis: Axis) -> i64 {
        i64::from(match axis {
            Axis::Horizontal => self.device.width,
            Axis::Vertical => self.device.height,
        })
    }
}

/// Field-name agnostic transform of a coordinate 4-tuple.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateResolver {
    mode: ResolveMode,
    frame: ReferenceFrame,
}

impl CoordinateResolver {
    pub fn new(mode: ResolveMode, frame: ReferenceFrame) -> Self {
        Self { mode, frame }
    }

    /// Ratio resolver; only the device size matters.
    pub fn ratio(device: DeviceSize) -> Self {
        Self::new(ResolveMode::Ratio, ReferenceFrame::new(Rect::default(), device))
    }

    pub fn symbolic(rect: Rect, device: DeviceSize) -> Self {
        Self::new(ResolveMode::Symbolic, ReferenceFrame::new(rect, device))
    }

    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    pub fn resolve_number(&self, raw: f64, slot: usize) -> i64 {
        Coord::decode(raw, slot, self.mode).resolve(&self.frame)
    }

    /// Rewrite `value` in place when it is a 4-element array.
    ///
    /// Anything else, including non-numeric elements, is left verbatim.
    pub fn resolve_field(&self, value: &mut Value) {
        let Value::Array(items) = value else {
            return;
        };
        if items.len() != 4 {
            return;
        }
        for (slot, item) in items.iter_mut().enumerate() {
            let Some(raw) = item.as_f64() else {
                continue;
            };
            match Coord::decode(raw, slot, self.mode) {
                // literals keep their original JSON number
                Coord::Absolute(_) => {}
                coord => *item = Value::from(coord.resolve(&self.frame)),
            }
        }
    }
}
