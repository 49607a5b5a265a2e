mod store;
mod types;
#[cfg(test)]
mod tests;

pub use store::ParameterStore;
pub use types::{
    CaptureParameters, Control, ExposureControl, FaceDetectMode, FlashMode, SceneMode,
};
