pub mod analysis;
pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod focus;
pub mod params;
pub mod render;
pub mod request;
pub mod session;

pub use analysis::{AnalysisOutput, AnalysisSettings, AnalysisWorker, FrameAnalyzer, FrameBuffer};
pub use app::{ComponentState, RawcamApp, RunOptions, ShutdownReason};
pub use camera::{CameraProvider, MockCameraProvider};
pub use config::RawcamConfig;
pub use error::{RawcamError, Result};
pub use events::{EventBus, RawcamEvent};
pub use focus::{FocusController, FocusTrigger, NormalizedRect};
pub use params::ParameterStore;
pub use render::{FrameRenderer, RenderInput};
pub use request::{build_capture_request, CaptureRequest, RequestContext, RequestPurpose};
pub use session::{CaptureOutcome, SessionCoordinator, SessionState};
