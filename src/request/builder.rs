use super::fields::{
    AePrecaptureTrigger, AeMode, AfMode, AfTrigger, AwbMode, CaptureRequest, ColorCorrectionGains,
    ColorCorrectionMode, FlashHardwareMode, MeteringRectangle, OisMode, RequestTemplate,
    METERING_WEIGHT_MAX,
};
use crate::camera::{CameraCapabilities, SurfaceKind};
use crate::focus::{normalized_to_sensor_rect, FocusTrigger};
use crate::params::{CaptureParameters, Control, ExposureControl, FlashMode};
use tracing::trace;

pub const ONE_SECOND_NS: u64 = 1_000_000_000;

/// Longest exposure allowed on preview frames
pub const MAX_PREVIEW_EXPOSURE_NS: u64 = ONE_SECOND_NS / 16;

/// What a request is being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    /// Steady-state repeating preview request
    Preview,
    /// One-shot burst that fires the AF/AE trigger verbs
    PreviewTrigger,
    /// Full-resolution still
    Still,
}

impl RequestPurpose {
    pub fn is_preview(&self) -> bool {
        matches!(self, RequestPurpose::Preview | RequestPurpose::PreviewTrigger)
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, RequestPurpose::PreviewTrigger)
    }

    fn template(&self) -> RequestTemplate {
        match self {
            RequestPurpose::Still => RequestTemplate::StillCapture,
            _ => RequestTemplate::Preview,
        }
    }

    fn targets(&self) -> Vec<SurfaceKind> {
        match self {
            RequestPurpose::Still => vec![SurfaceKind::StillImage],
            _ => vec![SurfaceKind::Preview],
        }
    }
}

/// Camera-derived inputs to request building
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub capabilities: &'a CameraCapabilities,
    /// Rotation orientation used to map focus regions onto the sensor
    pub rotation_orientation: u32,
}

/// Build the hardware request for one frame.
///
/// Pure: the trigger is read, not consumed. The caller marks it consumed once
/// the request carrying it has been accepted by the session.
pub fn build_capture_request(
    params: &CaptureParameters,
    trigger: Option<&FocusTrigger>,
    purpose: RequestPurpose,
    ctx: &RequestContext<'_>,
) -> CaptureRequest {
    let caps = ctx.capabilities;
    let mut request = CaptureRequest::new(purpose.template(), purpose.targets());
    request.tag = trigger.map(|t| t.tag.clone());

    if params.flash_mode == FlashMode::AlwaysOn {
        request.flash_mode = FlashHardwareMode::Torch;
    }

    // AF
    match params.focal_distance {
        Control::Auto => request.af_mode = AfMode::ContinuousPicture,
        Control::Manual(diopters) => {
            request.af_mode = AfMode::Off;
            request.lens_focus_distance = Some(diopters);
        }
    }

    // AE
    match params.exposure {
        ExposureControl::Auto => {
            request.ae_mode = match params.flash_mode {
                FlashMode::On => AeMode::OnAlwaysFlash,
                FlashMode::Auto => AeMode::OnAutoFlash,
                FlashMode::Off | FlashMode::AlwaysOn => AeMode::On,
            };
            request.ae_exposure_compensation = Some(params.ae_compensation);
        }
        ExposureControl::Manual {
            exposure_time_ns,
            iso,
        } => {
            request.ae_mode = AeMode::Off;
            request.sensor_sensitivity = Some(iso);
            request.sensor_exposure_time_ns = Some(if purpose.is_preview() {
                exposure_time_ns.min(MAX_PREVIEW_EXPOSURE_NS)
            } else {
                exposure_time_ns
            });
        }
    }

    // AWB
    match params.white_balance {
        Control::Auto => request.awb_mode = AwbMode::Auto,
        Control::Manual(factor) => {
            request.awb_mode = AwbMode::Off;
            request.color_correction_mode = Some(ColorCorrectionMode::TransformMatrix);
            request.color_correction_gains = Some(ColorCorrectionGains::from_factor(factor));
        }
    }

    request.scene_mode = params.scene_mode;

    request.ois_mode = if params.optical_stabilization && caps.ois_available {
        OisMode::On
    } else {
        OisMode::Off
    };

    if caps.zoom_ratio_range.is_some() {
        request.zoom_ratio = Some(params.zoom_ratio);
    }

    request.face_detect_mode = params.face_detect_mode;

    if let Some(trigger) = trigger {
        apply_trigger(&mut request, trigger, purpose, ctx);
    }

    trace!(
        "Built {:?} request: af={:?} ae={:?} awb={:?} trigger={:?}",
        purpose,
        request.af_mode,
        request.ae_mode,
        request.awb_mode,
        request.af_trigger
    );

    request
}

fn apply_trigger(
    request: &mut CaptureRequest,
    trigger: &FocusTrigger,
    purpose: RequestPurpose,
    ctx: &RequestContext<'_>,
) {
    if trigger.request_focus {
        if let Some(region) = trigger.region {
            let caps = ctx.capabilities;
            let rect = normalized_to_sensor_rect(
                &region,
                ctx.rotation_orientation,
                caps.is_front(),
                &caps.active_array,
            );
            let metering = vec![MeteringRectangle {
                rect,
                weight: METERING_WEIGHT_MAX,
            }];
            request.af_regions = Some(metering.clone());
            request.ae_regions = Some(metering.clone());
            request.awb_regions = Some(metering);
        }
        request.af_mode = AfMode::Auto;
        if purpose.is_trigger() {
            request.af_trigger = Some(AfTrigger::Start);
            request.ae_precapture_trigger = Some(AePrecaptureTrigger::Start);
        }
    } else if trigger.request_cancel {
        request.af_regions = None;
        request.ae_regions = None;
        request.awb_regions = None;
        if purpose.is_trigger() {
            request.af_trigger = Some(AfTrigger::Cancel);
            request.ae_precapture_trigger = Some(AePrecaptureTrigger::Cancel);
        } else {
            request.af_trigger = Some(AfTrigger::Idle);
            request.ae_precapture_trigger = Some(AePrecaptureTrigger::Idle);
        }
    }
}
