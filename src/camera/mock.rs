//! Deterministic in-memory camera backend.
//!
//! Records every request the coordinator issues so tests can assert on
//! ordering, and synthesises capture results and still images on demand.

use super::capabilities::{
    CameraCapabilities, CameraIdentity, LensFacing, OutputFormat, SensorRect, Size, ValueRange,
};
use super::device::{
    CameraDevice, CameraProvider, CaptureSession, ConfiguredSession, OutputSurface,
    ResultCallback, StillImage, StillImageReader, SurfaceKind,
};
use super::metadata::{AeState, AfState, AwbState, CaptureResult};
use crate::error::{CameraError, CaptureError, SessionError};
use crate::params::{FaceDetectMode, SceneMode};
use crate::request::{AeMode, AfMode, CaptureRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// How a request reached the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Repeating,
    Burst,
    Capture,
}

#[derive(Debug, Clone)]
pub struct IssuedRequest {
    pub camera_id: String,
    pub kind: IssueKind,
    pub request: CaptureRequest,
}

#[derive(Default)]
struct MockState {
    issued: Mutex<Vec<IssuedRequest>>,
    lifecycle: Mutex<Vec<String>>,
    fail_next_open: AtomicBool,
    fail_next_configure: AtomicBool,
    fail_next_capture: AtomicBool,
    fail_repeating: AtomicBool,
    flash_required: AtomicBool,
    unsettled_3a: AtomicBool,
    omit_exposure_metadata: AtomicBool,
    frame_number: AtomicU64,
}

impl MockState {
    fn log(&self, entry: String) {
        debug!("mock camera: {}", entry);
        self.lifecycle.lock().push(entry);
    }

    fn synthesize_result(&self, request: &CaptureRequest) -> CaptureResult {
        let frame_number = self.frame_number.fetch_add(1, Ordering::Relaxed);
        let settled = !self.unsettled_3a.load(Ordering::Relaxed);
        let ae_state = match (request.ae_mode, settled) {
            (AeMode::Off, _) => AeState::Inactive,
            (_, false) => AeState::Searching,
            _ if self.flash_required.load(Ordering::Relaxed) => AeState::FlashRequired,
            _ => AeState::Converged,
        };
        let af_state = match (request.af_mode, settled) {
            (AfMode::Off, _) => AfState::Inactive,
            (_, false) => AfState::ActiveScan,
            _ => AfState::FocusedLocked,
        };
        let awb_state = if settled {
            AwbState::Converged
        } else {
            AwbState::Searching
        };

        let omit_exposure = self.omit_exposure_metadata.load(Ordering::Relaxed);
        let (exposure_time_ns, sensitivity) = if omit_exposure {
            (None, None)
        } else {
            (
                request.sensor_exposure_time_ns.or(Some(16_666_666)),
                request.sensor_sensitivity.or(Some(100)),
            )
        };

        CaptureResult {
            tag: request.tag.clone(),
            frame_number,
            timestamp_ns: frame_number * 33_333_333,
            ae_state,
            af_state,
            awb_state,
            exposure_time_ns,
            sensitivity,
            focus_distance: request.lens_focus_distance,
        }
    }
}

/// In-memory [`CameraProvider`] with failure injection
#[derive(Clone)]
pub struct MockCameraProvider {
    cameras: Vec<CameraIdentity>,
    state: Arc<MockState>,
}

impl MockCameraProvider {
    pub fn new(cameras: Vec<CameraIdentity>) -> Self {
        Self {
            cameras,
            state: Arc::new(MockState::default()),
        }
    }

    /// A back camera "0" and a front camera "1"
    pub fn with_default_cameras() -> Self {
        Self::new(vec![
            CameraIdentity::new("0", back_camera_capabilities()),
            CameraIdentity::new("1", front_camera_capabilities()),
        ])
    }

    pub fn issued_requests(&self) -> Vec<IssuedRequest> {
        self.state.issued.lock().clone()
    }

    pub fn clear_issued_requests(&self) {
        self.state.issued.lock().clear();
    }

    /// Open/configure/close history, e.g. `open:0`, `close-reader:0`
    pub fn lifecycle(&self) -> Vec<String> {
        self.state.lifecycle.lock().clone()
    }

    pub fn fail_next_open(&self) {
        self.state.fail_next_open.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_configure(&self) {
        self.state.fail_next_configure.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_capture(&self) {
        self.state.fail_next_capture.store(true, Ordering::SeqCst);
    }

    /// Reject every repeating request until cleared
    pub fn set_fail_repeating(&self, fail: bool) {
        self.state.fail_repeating.store(fail, Ordering::SeqCst);
    }

    pub fn set_flash_required(&self, required: bool) {
        self.state.flash_required.store(required, Ordering::SeqCst);
    }

    /// Report searching 3A states until cleared
    pub fn set_3a_unsettled(&self, unsettled: bool) {
        self.state.unsettled_3a.store(unsettled, Ordering::SeqCst);
    }

    /// Leave exposure time and sensitivity out of capture results
    pub fn set_omit_exposure_metadata(&self, omit: bool) {
        self.state.omit_exposure_metadata.store(omit, Ordering::SeqCst);
    }
}

#[async_trait]
impl CameraProvider for MockCameraProvider {
    fn cameras(&self) -> Vec<CameraIdentity> {
        self.cameras.clone()
    }

    async fn open(&self, camera_id: &str) -> Result<Arc<dyn CameraDevice>, CameraError> {
        if !self.cameras.iter().any(|camera| camera.id == camera_id) {
            return Err(CameraError::NotFound {
                id: camera_id.to_string(),
            });
        }
        if self.state.fail_next_open.swap(false, Ordering::SeqCst) {
            self.state.log(format!("open-failed:{}", camera_id));
            return Err(CameraError::Open {
                id: camera_id.to_string(),
                details: "camera in use by another client".to_string(),
            });
        }
        self.state.log(format!("open:{}", camera_id));
        Ok(Arc::new(MockCameraDevice {
            id: camera_id.to_string(),
            state: self.state.clone(),
        }))
    }
}

struct MockCameraDevice {
    id: String,
    state: Arc<MockState>,
}

#[async_trait]
impl CameraDevice for MockCameraDevice {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_session(
        &self,
        outputs: &[OutputSurface],
        on_result: ResultCallback,
    ) -> Result<ConfiguredSession, SessionError> {
        if self.state.fail_next_configure.swap(false, Ordering::SeqCst) {
            self.state.log(format!("configure-failed:{}", self.id));
            return Err(SessionError::Configuration {
                details: "injected configuration failure".to_string(),
            });
        }
        self.state.log(format!("configure:{}", self.id));

        let still_output = outputs
            .iter()
            .find(|output| output.kind == SurfaceKind::StillImage)
            .copied();
        let (still_tx, reader) = match still_output {
            Some(_) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let reader: Arc<dyn StillImageReader> = Arc::new(MockStillReader {
                    camera_id: self.id.clone(),
                    state: self.state.clone(),
                    receiver: tokio::sync::Mutex::new(rx),
                });
                (Some(tx), Some(reader))
            }
            None => (None, None),
        };

        Ok(ConfiguredSession {
            session: Arc::new(MockCaptureSession {
                camera_id: self.id.clone(),
                state: self.state.clone(),
                on_result,
                still_output,
                still_tx,
                closed: AtomicBool::new(false),
            }),
            still_reader: reader,
        })
    }

    fn close(&self) {
        self.state.log(format!("close-device:{}", self.id));
    }
}

struct MockCaptureSession {
    camera_id: String,
    state: Arc<MockState>,
    on_result: ResultCallback,
    still_output: Option<OutputSurface>,
    still_tx: Option<mpsc::UnboundedSender<StillImage>>,
    closed: AtomicBool,
}

impl MockCaptureSession {
    fn record(&self, kind: IssueKind, request: &CaptureRequest) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.state.issued.lock().push(IssuedRequest {
            camera_id: self.camera_id.clone(),
            kind,
            request: request.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl CaptureSession for MockCaptureSession {
    async fn set_repeating_request(&self, request: CaptureRequest) -> Result<(), SessionError> {
        if self.state.fail_repeating.load(Ordering::SeqCst) {
            return Err(SessionError::RequestRejected {
                details: "injected repeating failure".to_string(),
            });
        }
        self.record(IssueKind::Repeating, &request)?;
        (self.on_result)(self.state.synthesize_result(&request));
        Ok(())
    }

    async fn capture_burst(&self, requests: Vec<CaptureRequest>) -> Result<(), SessionError> {
        for request in &requests {
            self.record(IssueKind::Burst, request)?;
        }
        for request in &requests {
            (self.on_result)(self.state.synthesize_result(request));
        }
        Ok(())
    }

    async fn capture(&self, request: CaptureRequest) -> Result<CaptureResult, SessionError> {
        if self.state.fail_next_capture.swap(false, Ordering::SeqCst) {
            return Err(SessionError::RequestRejected {
                details: "injected capture failure".to_string(),
            });
        }
        self.record(IssueKind::Capture, &request)?;
        let result = self.state.synthesize_result(&request);

        if let (true, Some(output), Some(tx)) =
            (request.targets_still(), self.still_output, &self.still_tx)
        {
            let image = StillImage {
                format: output.format,
                size: output.size,
                timestamp_ns: result.timestamp_ns,
                data: mock_payload(output.format, request.jpeg_orientation),
            };
            // Receiver gone means the reader was closed; the awaiting side reports it
            let _ = tx.send(image);
        }

        (self.on_result)(result.clone());
        Ok(result)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.state.log(format!("close-session:{}", self.camera_id));
    }
}

struct MockStillReader {
    camera_id: String,
    state: Arc<MockState>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<StillImage>>,
}

#[async_trait]
impl StillImageReader for MockStillReader {
    async fn next_image(&self) -> Result<StillImage, CaptureError> {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or(CaptureError::ImageUnavailable)
    }

    fn close(&self) {
        if let Ok(mut receiver) = self.receiver.try_lock() {
            receiver.close();
        }
        self.state.log(format!("close-reader:{}", self.camera_id));
    }
}

fn mock_payload(format: OutputFormat, orientation: Option<u32>) -> Vec<u8> {
    match format {
        OutputFormat::Jpeg => {
            let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1];
            data.extend_from_slice(&orientation.unwrap_or(0).to_be_bytes());
            data.extend_from_slice(&[0xFF, 0xD9]);
            data
        }
        OutputFormat::Heic => b"\0\0\0\x18ftypheic".to_vec(),
        OutputFormat::RawSensor | OutputFormat::Yuv420 => vec![0x10; 64],
    }
}

/// 4:3 back camera with OIS, zoom and a focus motor
pub fn back_camera_capabilities() -> CameraCapabilities {
    let mut output_sizes = BTreeMap::new();
    output_sizes.insert(
        OutputFormat::Jpeg,
        vec![Size::new(4000, 3000), Size::new(3840, 2160), Size::new(1920, 1440)],
    );
    output_sizes.insert(OutputFormat::RawSensor, vec![Size::new(4000, 3000)]);
    output_sizes.insert(
        OutputFormat::Yuv420,
        vec![
            Size::new(1920, 1440),
            Size::new(1280, 960),
            Size::new(1280, 720),
            Size::new(640, 480),
        ],
    );

    CameraCapabilities {
        lens_facing: LensFacing::Back,
        sensor_orientation: 90,
        active_array: SensorRect::new(0, 0, 4000, 3000),
        output_sizes,
        ae_compensation_range: Some(ValueRange::new(-24, 24)),
        minimum_focus_distance: Some(10.0),
        sensitivity_range: Some(ValueRange::new(50, 6400)),
        exposure_time_range: Some(ValueRange::new(13_000, 1_000_000_000)),
        zoom_ratio_range: Some(ValueRange::new(0.6, 10.0)),
        ois_available: true,
        flash_available: true,
        scene_modes: vec![SceneMode::Night, SceneMode::Portrait, SceneMode::Hdr],
        face_detect_modes: vec![
            FaceDetectMode::Off,
            FaceDetectMode::Simple,
            FaceDetectMode::Full,
        ],
        fps_ranges: vec![ValueRange::new(15, 30), ValueRange::new(30, 30), ValueRange::new(7, 30)],
    }
}

/// Fixed-focus front camera without OIS or a zoom control
pub fn front_camera_capabilities() -> CameraCapabilities {
    let mut output_sizes = BTreeMap::new();
    output_sizes.insert(OutputFormat::Jpeg, vec![Size::new(3264, 2448)]);
    output_sizes.insert(
        OutputFormat::Yuv420,
        vec![Size::new(1280, 960), Size::new(640, 480)],
    );

    CameraCapabilities {
        lens_facing: LensFacing::Front,
        sensor_orientation: 270,
        active_array: SensorRect::new(0, 0, 3264, 2448),
        output_sizes,
        ae_compensation_range: Some(ValueRange::new(-12, 12)),
        minimum_focus_distance: None,
        sensitivity_range: Some(ValueRange::new(100, 3200)),
        exposure_time_range: Some(ValueRange::new(20_000, 500_000_000)),
        zoom_ratio_range: None,
        ois_available: false,
        flash_available: false,
        scene_modes: vec![SceneMode::Portrait],
        face_detect_modes: vec![FaceDetectMode::Off, FaceDetectMode::Simple],
        fps_ranges: vec![ValueRange::new(15, 30)],
    }
}
