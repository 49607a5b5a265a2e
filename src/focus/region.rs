use crate::camera::SensorRect;
use serde::{Deserialize, Serialize};

/// Rectangle in preview space, each coordinate in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl NormalizedRect {
    /// Build a rectangle, clamping into the unit square and ordering the edges
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (left, right) = (clamp(left).min(clamp(right)), clamp(left).max(clamp(right)));
        let (top, bottom) = (clamp(top).min(clamp(bottom)), clamp(top).max(clamp(bottom)));
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square of `size` centred on a tap point
    pub fn around(x: f32, y: f32, size: f32) -> Self {
        let half = size / 2.0;
        Self::new(x - half, y - half, x + half, y + half)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

fn rotate_point(x: f32, y: f32, rotation: u32) -> (f32, f32) {
    match rotation % 360 {
        90 => (y, 1.0 - x),
        180 => (1.0 - x, 1.0 - y),
        270 => (1.0 - y, x),
        _ => (x, y),
    }
}

fn unrotate_point(x: f32, y: f32, rotation: u32) -> (f32, f32) {
    match rotation % 360 {
        90 => (1.0 - y, x),
        180 => (1.0 - x, 1.0 - y),
        270 => (y, 1.0 - x),
        _ => (x, y),
    }
}

/// Map a preview-space rectangle onto the sensor active array.
///
/// `rotation` is the rotation orientation of the bound camera; `mirrored`
/// flips horizontally first, as front cameras present a mirrored preview.
pub fn normalized_to_sensor_rect(
    rect: &NormalizedRect,
    rotation: u32,
    mirrored: bool,
    active_array: &SensorRect,
) -> SensorRect {
    let (mut left, mut right) = (rect.left, rect.right);
    if mirrored {
        (left, right) = (1.0 - right, 1.0 - left);
    }

    let (x0, y0) = rotate_point(left, rect.top, rotation);
    let (x1, y1) = rotate_point(right, rect.bottom, rotation);

    let width = active_array.width() as f32;
    let height = active_array.height() as f32;
    let to_x = |v: f32| active_array.left + (v * width).round() as i32;
    let to_y = |v: f32| active_array.top + (v * height).round() as i32;

    SensorRect::new(
        to_x(x0.min(x1)),
        to_y(y0.min(y1)),
        to_x(x0.max(x1)),
        to_y(y0.max(y1)),
    )
}

/// Inverse of [`normalized_to_sensor_rect`], used to draw hardware-reported
/// regions (faces, metering) over the preview
pub fn sensor_to_normalized_rect(
    rect: &SensorRect,
    rotation: u32,
    mirrored: bool,
    active_array: &SensorRect,
) -> NormalizedRect {
    let width = active_array.width().max(1) as f32;
    let height = active_array.height().max(1) as f32;
    let to_unit_x = |v: i32| (v - active_array.left) as f32 / width;
    let to_unit_y = |v: i32| (v - active_array.top) as f32 / height;

    let (x0, y0) = unrotate_point(to_unit_x(rect.left), to_unit_y(rect.top), rotation);
    let (x1, y1) = unrotate_point(to_unit_x(rect.right), to_unit_y(rect.bottom), rotation);

    let (mut left, mut right) = (x0.min(x1), x0.max(x1));
    if mirrored {
        (left, right) = (1.0 - right, 1.0 - left);
    }
    NormalizedRect::new(left, y0.min(y1), right, y0.max(y1))
}
