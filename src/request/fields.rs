use crate::camera::{SensorRect, SurfaceKind};
use crate::params::{CaptureParameters, FaceDetectMode, SceneMode};
use serde::{Deserialize, Serialize};

/// Largest weight a metering rectangle may carry
pub const METERING_WEIGHT_MAX: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestTemplate {
    Preview,
    StillCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfMode {
    Off,
    Auto,
    ContinuousPicture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeMode {
    Off,
    On,
    OnAutoFlash,
    OnAlwaysFlash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AwbMode {
    Off,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfTrigger {
    Idle,
    Start,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AePrecaptureTrigger {
    Idle,
    Start,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlashHardwareMode {
    Off,
    Torch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OisMode {
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCorrectionMode {
    TransformMatrix,
}

/// Per-channel white-balance gains in RGGB order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorCorrectionGains {
    pub red: f32,
    pub green_even: f32,
    pub green_odd: f32,
    pub blue: f32,
}

impl ColorCorrectionGains {
    /// Gains for a manual white-balance factor
    pub fn from_factor(factor: f32) -> Self {
        Self {
            red: 0.635 + 0.020_833_3 * factor,
            green_even: 1.0,
            green_odd: 1.0,
            blue: 3.742_039_4 - 0.028_782_9 * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringRectangle {
    pub rect: SensorRect,
    pub weight: u32,
}

/// Key/value settings handed to the hardware for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    #[serde(skip)]
    pub targets: Vec<SurfaceKind>,
    pub tag: Option<String>,
    pub flash_mode: FlashHardwareMode,
    pub af_mode: AfMode,
    pub lens_focus_distance: Option<f32>,
    pub ae_mode: AeMode,
    pub ae_exposure_compensation: Option<i32>,
    pub sensor_sensitivity: Option<u32>,
    pub sensor_exposure_time_ns: Option<u64>,
    pub awb_mode: AwbMode,
    pub color_correction_mode: Option<ColorCorrectionMode>,
    pub color_correction_gains: Option<ColorCorrectionGains>,
    pub scene_mode: Option<SceneMode>,
    pub ois_mode: OisMode,
    pub zoom_ratio: Option<f32>,
    pub face_detect_mode: Option<FaceDetectMode>,
    pub af_regions: Option<Vec<MeteringRectangle>>,
    pub ae_regions: Option<Vec<MeteringRectangle>>,
    pub awb_regions: Option<Vec<MeteringRectangle>>,
    pub af_trigger: Option<AfTrigger>,
    pub ae_precapture_trigger: Option<AePrecaptureTrigger>,
    pub jpeg_orientation: Option<u32>,
}

impl CaptureRequest {
    /// A request with every control left at its automatic setting
    pub fn new(template: RequestTemplate, targets: Vec<SurfaceKind>) -> Self {
        Self {
            template,
            targets,
            tag: None,
            flash_mode: FlashHardwareMode::Off,
            af_mode: AfMode::ContinuousPicture,
            lens_focus_distance: None,
            ae_mode: AeMode::On,
            ae_exposure_compensation: None,
            sensor_sensitivity: None,
            sensor_exposure_time_ns: None,
            awb_mode: AwbMode::Auto,
            color_correction_mode: None,
            color_correction_gains: None,
            scene_mode: None,
            ois_mode: OisMode::Off,
            zoom_ratio: None,
            face_detect_mode: None,
            af_regions: None,
            ae_regions: None,
            awb_regions: None,
            af_trigger: None,
            ae_precapture_trigger: None,
            jpeg_orientation: None,
        }
    }

    pub fn targets_still(&self) -> bool {
        self.targets.contains(&SurfaceKind::StillImage)
    }

    /// Whether the request carries an AF or AE trigger verb
    pub fn has_trigger_verb(&self) -> bool {
        matches!(self.af_trigger, Some(AfTrigger::Start | AfTrigger::Cancel))
            || matches!(
                self.ae_precapture_trigger,
                Some(AePrecaptureTrigger::Start | AePrecaptureTrigger::Cancel)
            )
    }
}

/// Which automatic loops are active, as seen by a UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFlags {
    pub af_auto: bool,
    pub ae_auto: bool,
    pub awb_auto: bool,
}

impl RequestFlags {
    pub fn from_parameters(params: &CaptureParameters) -> Self {
        Self {
            af_auto: params.is_af_auto(),
            ae_auto: params.is_ae_auto(),
            awb_auto: params.is_awb_auto(),
        }
    }

    pub fn from_fields(request: &CaptureRequest) -> Self {
        Self {
            af_auto: request.af_mode != AfMode::Off,
            ae_auto: request.ae_mode != AeMode::Off,
            awb_auto: request.awb_mode == AwbMode::Auto,
        }
    }
}
