use crate::params::{FaceDetectMode, SceneMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Direction a lens points relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    Back,
    Front,
    External,
}

/// Image formats a still output can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Jpeg,
    Heic,
    RawSensor,
    Yuv420,
}

impl OutputFormat {
    /// Still formats the pipeline can deliver, in preference order
    pub const STILL_FORMATS: [OutputFormat; 3] =
        [OutputFormat::Jpeg, OutputFormat::Heic, OutputFormat::RawSensor];

    /// File extension used by the default naming policy
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Jpeg => Some("JPEG"),
            OutputFormat::Heic => Some("HEIC"),
            OutputFormat::RawSensor => Some("DNG"),
            OutputFormat::Yuv420 => None,
        }
    }

    /// Whether the hardware hands back an already encoded file
    pub fn is_encoded(&self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Heic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Closed interval reported by the hardware for a tunable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange<T> {
    pub lower: T,
    pub upper: T,
}

impl<T: PartialOrd + Copy> ValueRange<T> {
    pub fn new(lower: T, upper: T) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn clamp(&self, value: T) -> T {
        if value < self.lower {
            self.lower
        } else if value > self.upper {
            self.upper
        } else {
            value
        }
    }
}

/// Rectangle in sensor active-array pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl SensorRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Everything the pipeline needs to know about one camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraCapabilities {
    pub lens_facing: LensFacing,
    /// Clockwise rotation of the sensor relative to the device's natural orientation
    pub sensor_orientation: u32,
    pub active_array: SensorRect,
    pub output_sizes: BTreeMap<OutputFormat, Vec<Size>>,
    pub ae_compensation_range: Option<ValueRange<i32>>,
    /// Diopters; absent or zero on fixed-focus lenses
    pub minimum_focus_distance: Option<f32>,
    pub sensitivity_range: Option<ValueRange<u32>>,
    pub exposure_time_range: Option<ValueRange<u64>>,
    /// Present only when the hardware accepts a zoom ratio control
    pub zoom_ratio_range: Option<ValueRange<f32>>,
    pub ois_available: bool,
    pub flash_available: bool,
    pub scene_modes: Vec<SceneMode>,
    pub face_detect_modes: Vec<FaceDetectMode>,
    pub fps_ranges: Vec<ValueRange<u32>>,
}

impl CameraCapabilities {
    pub fn is_front(&self) -> bool {
        self.lens_facing == LensFacing::Front
    }

    pub fn sensor_aspect_ratio(&self) -> f32 {
        let width = self.active_array.width();
        let height = self.active_array.height();
        if height <= 0 {
            return 0.0;
        }
        width as f32 / height as f32
    }

    /// Focus distance range in diopters, from infinity (0) to the closest focus
    pub fn focal_distance_range(&self) -> Option<ValueRange<f32>> {
        match self.minimum_focus_distance {
            Some(min) if min > 0.0 => Some(ValueRange::new(0.0, min)),
            _ => None,
        }
    }

    pub fn sizes_for(&self, format: OutputFormat) -> &[Size] {
        self.output_sizes
            .get(&format)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Still outputs this camera supports, each with its largest size matching the sensor aspect
    pub fn supported_outputs(&self, aspect_tolerance: f32) -> Vec<OutputItem> {
        let aspect = self.sensor_aspect_ratio();
        OutputFormat::STILL_FORMATS
            .iter()
            .filter_map(|format| {
                let matching = sizes_by_aspect_ratio(self.sizes_for(*format), aspect, aspect_tolerance);
                find_best_size(&matching, None).map(|best_size| OutputItem {
                    format: *format,
                    best_size,
                })
            })
            .collect()
    }

    /// Largest YUV size no wider than `max_width` that matches the sensor aspect
    pub fn choose_preview_size(&self, max_width: u32, aspect_tolerance: f32) -> Option<Size> {
        let matching = sizes_by_aspect_ratio(
            self.sizes_for(OutputFormat::Yuv420),
            self.sensor_aspect_ratio(),
            aspect_tolerance,
        );
        find_best_size(&matching, Some(max_width))
    }

    /// Widest frame-rate range with the highest ceiling
    pub fn find_best_fps_range(&self) -> Option<ValueRange<u32>> {
        self.fps_ranges
            .iter()
            .copied()
            .max_by_key(|range| (range.upper, range.upper.saturating_sub(range.lower)))
    }

    /// Most capable face-detect mode, used when a camera is first bound
    pub fn best_face_detect_mode(&self) -> Option<FaceDetectMode> {
        self.face_detect_modes.last().copied()
    }
}

/// A still format together with the size it will be configured at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    pub format: OutputFormat,
    pub best_size: Size,
}

/// A camera id with its capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct CameraIdentity {
    pub id: String,
    pub capabilities: Arc<CameraCapabilities>,
}

impl CameraIdentity {
    pub fn new(id: impl Into<String>, capabilities: CameraCapabilities) -> Self {
        Self {
            id: id.into(),
            capabilities: Arc::new(capabilities),
        }
    }
}

/// First camera facing `preferred`, falling back to the first camera
pub fn choose_default_camera(
    cameras: &[CameraIdentity],
    preferred: LensFacing,
) -> Option<&CameraIdentity> {
    cameras
        .iter()
        .find(|camera| camera.capabilities.lens_facing == preferred)
        .or_else(|| cameras.first())
}

/// Largest size by area, optionally bounded by width
pub fn find_best_size(sizes: &[Size], max_width: Option<u32>) -> Option<Size> {
    sizes
        .iter()
        .filter(|size| max_width.map_or(true, |max| size.width <= max))
        .copied()
        .max_by_key(Size::area)
}

pub fn sizes_by_aspect_ratio(sizes: &[Size], target: f32, tolerance: f32) -> Vec<Size> {
    sizes
        .iter()
        .filter(|size| (size.aspect_ratio() - target).abs() <= tolerance)
        .copied()
        .collect()
}

/// Rotation that brings sensor output upright for the given display rotation
pub fn rotation_orientation(sensor_orientation: u32, display_rotation: u32, facing: LensFacing) -> u32 {
    let sensor = sensor_orientation % 360;
    let display = display_rotation % 360;
    match facing {
        LensFacing::Front => (sensor + display) % 360,
        _ => (sensor + 360 - display) % 360,
    }
}
