mod builder;
mod fields;

pub use builder::{
    build_capture_request, RequestContext, RequestPurpose, MAX_PREVIEW_EXPOSURE_NS,
    ONE_SECOND_NS,
};
pub use fields::{
    AePrecaptureTrigger, AeMode, AfMode, AfTrigger, AwbMode, CaptureRequest,
    ColorCorrectionGains, ColorCorrectionMode, FlashHardwareMode, MeteringRectangle, OisMode,
    RequestFlags, RequestTemplate, METERING_WEIGHT_MAX,
};
