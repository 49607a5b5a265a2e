use super::capabilities::{CameraIdentity, OutputFormat, Size};
use super::metadata::CaptureResult;
use crate::error::{CameraError, CaptureError, SessionError};
use crate::request::CaptureRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Role of a surface attached to a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    StillImage,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSurface {
    pub kind: SurfaceKind,
    pub format: OutputFormat,
    pub size: Size,
}

/// Receives metadata for every completed frame, repeating or one-shot
pub type ResultCallback = Arc<dyn Fn(CaptureResult) + Send + Sync>;

/// An image delivered by the still reader
#[derive(Debug, Clone, PartialEq)]
pub struct StillImage {
    pub format: OutputFormat,
    pub size: Size,
    pub timestamp_ns: u64,
    pub data: Vec<u8>,
}

/// Enumerates cameras and opens device handles
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Cameras present on the device; enumerated once at startup
    fn cameras(&self) -> Vec<CameraIdentity>;

    async fn open(&self, camera_id: &str) -> Result<Arc<dyn CameraDevice>, CameraError>;
}

/// An open camera device
#[async_trait]
pub trait CameraDevice: Send + Sync {
    fn id(&self) -> &str;

    /// Configure a session against `outputs`. A still reader is returned when
    /// one of the outputs is a still-image surface.
    async fn create_session(
        &self,
        outputs: &[OutputSurface],
        on_result: ResultCallback,
    ) -> Result<ConfiguredSession, SessionError>;

    fn close(&self);
}

pub struct ConfiguredSession {
    pub session: Arc<dyn CaptureSession>,
    pub still_reader: Option<Arc<dyn StillImageReader>>,
}

#[async_trait]
pub trait CaptureSession: Send + Sync {
    /// Replace the steady-state preview request
    async fn set_repeating_request(&self, request: CaptureRequest) -> Result<(), SessionError>;

    /// Submit one-shot requests ahead of the repeating stream
    async fn capture_burst(&self, requests: Vec<CaptureRequest>) -> Result<(), SessionError>;

    /// Submit a single request and wait for its metadata
    async fn capture(&self, request: CaptureRequest) -> Result<CaptureResult, SessionError>;

    fn close(&self);
}

#[async_trait]
pub trait StillImageReader: Send + Sync {
    async fn next_image(&self) -> Result<StillImage, CaptureError>;

    fn close(&self);
}
