mod coordinator;
mod sink;
mod state;
mod still;

pub use coordinator::{SessionCoordinator, SessionCoordinatorBuilder};
pub use sink::{
    default_save_file_policy, DngEncoder, ExifOrientation, FileImageSink, ImageSink, RawCapture,
    SaveFilePolicy,
};
pub use state::{LifecycleInputs, SessionState};
pub use still::{build_still_request, jpeg_orientation, CaptureOutcome};
