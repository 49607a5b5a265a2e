mod capabilities;
mod device;
mod metadata;
pub mod mock;
#[cfg(test)]
mod tests;

pub use capabilities::{
    choose_default_camera, find_best_size, rotation_orientation, sizes_by_aspect_ratio,
    CameraCapabilities, CameraIdentity, LensFacing, OutputFormat, OutputItem, SensorRect, Size,
    ValueRange,
};
pub use device::{
    CameraDevice, CameraProvider, CaptureSession, ConfiguredSession, OutputSurface,
    ResultCallback, StillImage, StillImageReader, SurfaceKind,
};
pub use metadata::{AeState, AfState, AwbState, CaptureResult};
pub use mock::MockCameraProvider;
