use super::sink::{default_save_file_policy, FileImageSink, ImageSink, SaveFilePolicy};
use super::state::{LifecycleInputs, SessionState};
use crate::camera::{
    choose_default_camera, rotation_orientation, CameraDevice, CameraIdentity, CameraProvider,
    CaptureResult, CaptureSession, OutputFormat, OutputItem, OutputSurface, ResultCallback, Size,
    StillImageReader, SurfaceKind,
};
use crate::config::RawcamConfig;
use crate::error::{CameraError, Result};
use crate::events::{EventBus, RawcamEvent};
use crate::focus::{FocusController, FocusTrigger, NormalizedRect, Orientation};
use crate::params::{FlashMode, ParameterStore};
use crate::request::{build_capture_request, RequestContext, RequestPurpose};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Sole owner of the hardware session.
///
/// Every input (lifecycle, parameters, focus triggers) lands in a latest-value
/// cell; [`reconcile`](Self::reconcile) reads the current snapshot of all of
/// them and brings the hardware in line, reopening only what changed.
pub struct SessionCoordinator {
    pub(super) config: RawcamConfig,
    provider: Arc<dyn CameraProvider>,
    pub(super) params: Arc<ParameterStore>,
    pub(super) focus: Arc<FocusController>,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) sink: Arc<dyn ImageSink>,
    pub(super) save_file: SaveFilePolicy,
    cameras: RwLock<Vec<CameraIdentity>>,
    inputs: watch::Sender<LifecycleInputs>,
    state: watch::Sender<SessionState>,
    pub(super) results: Arc<watch::Sender<Option<CaptureResult>>>,
    pub(super) hardware: Mutex<Hardware>,
    pub(super) capture_lock: Mutex<()>,
}

#[derive(Default)]
pub(super) struct Hardware {
    pub(super) camera: Option<CameraIdentity>,
    pub(super) device: Option<Arc<dyn CameraDevice>>,
    pub(super) session: Option<ActiveSession>,
    pub(super) rotation_orientation: u32,
}

pub(super) struct ActiveSession {
    pub(super) session: Arc<dyn CaptureSession>,
    pub(super) still_reader: Option<Arc<dyn StillImageReader>>,
    pub(super) output: Option<OutputItem>,
    pub(super) preview_size: Option<Size>,
}

impl SessionCoordinator {
    pub fn builder(provider: Arc<dyn CameraProvider>) -> SessionCoordinatorBuilder {
        SessionCoordinatorBuilder::new(provider)
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn focus(&self) -> &Arc<FocusController> {
        &self.focus
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Cameras still known to be present
    pub fn cameras(&self) -> Vec<CameraIdentity> {
        self.cameras.read().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn inputs(&self) -> LifecycleInputs {
        self.inputs.borrow().clone()
    }

    pub fn set_permission_granted(&self, granted: bool) {
        self.update_inputs(|inputs| inputs.permission_granted = granted);
    }

    pub fn set_resumed(&self, resumed: bool) {
        self.update_inputs(|inputs| inputs.resumed = resumed);
    }

    pub fn set_output_format(&self, format: Option<OutputFormat>) {
        self.update_inputs(|inputs| inputs.output_format = format);
    }

    pub fn set_preview_surface(&self, available: bool) {
        self.update_inputs(|inputs| inputs.preview_surface = available);
    }

    pub fn set_display_rotation(&self, degrees: u32) {
        self.update_inputs(|inputs| inputs.display_rotation = degrees % 360);
    }

    /// Switch to another enumerated camera
    pub fn select_camera(&self, camera_id: &str) -> Result<()> {
        if !self.cameras.read().iter().any(|camera| camera.id == camera_id) {
            return Err(CameraError::NotFound {
                id: camera_id.to_string(),
            }
            .into());
        }
        let id = camera_id.to_string();
        self.update_inputs(|inputs| inputs.selected_camera = Some(id));
        self.event_bus.publish(RawcamEvent::CameraSelected {
            camera_id: camera_id.to_string(),
        });
        Ok(())
    }

    /// Rotation orientation of the bound camera for the current display rotation
    pub async fn rotation_orientation(&self) -> u32 {
        self.hardware.lock().await.rotation_orientation
    }

    /// Rotation orientation and horizontal mirroring of the bound camera's
    /// preview, `None` while no camera is open
    pub async fn preview_orientation(&self) -> Option<(u32, bool)> {
        let hw = self.hardware.lock().await;
        hw.camera
            .as_ref()
            .map(|camera| (hw.rotation_orientation, camera.capabilities.is_front()))
    }

    /// Most recent metadata from the hardware
    pub fn latest_result(&self) -> Option<CaptureResult> {
        self.results.borrow().clone()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Option<CaptureResult>> {
        self.results.subscribe()
    }

    /// Record metadata delivered outside a session callback
    pub fn record_result(&self, result: CaptureResult) {
        self.results.send_replace(Some(result));
    }

    /// Whether the next still will fire the flash
    pub fn flash_required(&self) -> bool {
        match self.params.snapshot().flash_mode {
            FlashMode::On | FlashMode::AlwaysOn => true,
            FlashMode::Auto => self
                .results
                .borrow()
                .as_ref()
                .map_or(false, CaptureResult::flash_required),
            FlashMode::Off => false,
        }
    }

    /// Tap-to-focus on a preview-space region, or a full-frame sweep for `None`
    pub fn request_focus_at(&self, region: Option<NormalizedRect>) -> FocusTrigger {
        self.focus.request_focus(region, Instant::now())
    }

    pub fn cancel_focus(&self) -> FocusTrigger {
        self.focus.request_cancel()
    }

    /// Feed an attitude sample; cancels focus when the device moved away
    pub fn on_orientation(&self, orientation: Orientation) -> bool {
        let cancelled = self.focus.observe_orientation(orientation, Instant::now());
        if cancelled {
            self.event_bus.publish(RawcamEvent::FocusAutoCancelled {
                timestamp: SystemTime::now(),
            });
        }
        cancelled
    }

    /// Bring hardware in line with the current inputs and re-issue the
    /// repeating request
    pub async fn reconcile(&self) -> Result<()> {
        let inputs = self.inputs();
        let mut hw = self.hardware.lock().await;

        let camera_id = match inputs.selected_camera.as_deref() {
            Some(id) if inputs.wants_open() => id.to_string(),
            _ => {
                if hw.device.is_some() {
                    info!("Closing camera: permission, resume or selection withdrawn");
                    self.close_hardware(&mut hw);
                }
                self.set_state(SessionState::Closed);
                return Ok(());
            }
        };

        let identity = match self.find_camera(&camera_id) {
            Some(identity) => identity,
            None => {
                self.close_hardware(&mut hw);
                self.set_state(SessionState::Closed);
                return Err(CameraError::NotFound { id: camera_id }.into());
            }
        };

        if hw.camera.as_ref().map(|camera| camera.id.as_str()) != Some(camera_id.as_str()) {
            self.close_hardware(&mut hw);
            self.open_camera(&mut hw, identity.clone()).await?;
        }

        let caps = &identity.capabilities;
        hw.rotation_orientation = rotation_orientation(
            caps.sensor_orientation,
            inputs.display_rotation,
            caps.lens_facing,
        );

        let tolerance = self.config.camera.aspect_tolerance;
        let outputs = caps.supported_outputs(tolerance);
        let output = inputs
            .output_format
            .and_then(|format| outputs.iter().find(|item| item.format == format).copied())
            .or_else(|| outputs.first().copied());
        let preview_size = if inputs.preview_surface {
            caps.choose_preview_size(self.config.camera.preview_max_width, tolerance)
        } else {
            None
        };

        let needs_session = match &hw.session {
            None => true,
            Some(active) => active.output != output || active.preview_size != preview_size,
        };
        if needs_session {
            self.configure_session(&mut hw, &camera_id, output, preview_size)
                .await?;
        }

        self.set_state(SessionState::Streaming {
            camera_id: camera_id.clone(),
        });
        self.issue_requests(&hw).await;
        Ok(())
    }

    /// Run the event-driven loop until `token` is cancelled
    pub fn spawn(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut params_rx = self.params.subscribe();
        let mut trigger_rx = self.focus.subscribe();
        let mut inputs_rx = self.inputs.subscribe();

        tokio::spawn(async move {
            info!("Session coordinator started");
            loop {
                if let Err(e) = coordinator.reconcile().await {
                    warn!("Session reconcile failed, retrying on next change: {}", e);
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = params_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = trigger_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = inputs_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            coordinator.close().await;
            info!("Session coordinator stopped");
        })
    }

    /// Close reader, session and device
    pub async fn close(&self) {
        let mut hw = self.hardware.lock().await;
        self.close_hardware(&mut hw);
        self.set_state(SessionState::Closed);
    }

    /// The hardware reported `camera_id` as gone
    pub async fn on_disconnected(&self, camera_id: &str) -> Result<()> {
        warn!("Camera {} disconnected", camera_id);
        {
            let mut hw = self.hardware.lock().await;
            if hw.camera.as_ref().map(|camera| camera.id.as_str()) == Some(camera_id) {
                self.close_hardware(&mut hw);
                self.set_state(SessionState::Closed);
            }
        }

        self.cameras.write().retain(|camera| camera.id != camera_id);
        self.event_bus.publish(RawcamEvent::CameraDisconnected {
            camera_id: camera_id.to_string(),
            timestamp: SystemTime::now(),
        });

        if self.inputs().selected_camera.as_deref() != Some(camera_id) {
            return Ok(());
        }

        let replacement = {
            let cameras = self.cameras.read();
            choose_default_camera(&cameras, self.config.camera.preferred_facing)
                .map(|camera| camera.id.clone())
        };
        let selected = replacement.clone();
        self.update_inputs(|inputs| inputs.selected_camera = selected);

        match replacement {
            Some(id) => {
                info!("Reselected camera {} after disconnect", id);
                self.event_bus
                    .publish(RawcamEvent::CameraSelected { camera_id: id });
                Ok(())
            }
            None => {
                let err = CameraError::NoCameraAvailable;
                self.event_bus.publish(RawcamEvent::SystemError {
                    component: "session".to_string(),
                    error: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    async fn open_camera(&self, hw: &mut Hardware, identity: CameraIdentity) -> Result<()> {
        self.set_state(SessionState::Opening {
            camera_id: identity.id.clone(),
        });
        info!("Opening camera {}", identity.id);

        let device = match self.provider.open(&identity.id).await {
            Ok(device) => device,
            Err(e) => {
                error!("Failed to open camera {}: {}", identity.id, e);
                self.set_state(SessionState::Closed);
                self.event_bus.publish(RawcamEvent::SystemError {
                    component: "camera".to_string(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.params.apply_capabilities(identity.capabilities.clone());
        self.event_bus.publish(RawcamEvent::CameraOpened {
            camera_id: identity.id.clone(),
            timestamp: SystemTime::now(),
        });
        hw.device = Some(device);
        hw.camera = Some(identity);
        Ok(())
    }

    async fn configure_session(
        &self,
        hw: &mut Hardware,
        camera_id: &str,
        output: Option<OutputItem>,
        preview_size: Option<Size>,
    ) -> Result<()> {
        close_session(hw);
        self.set_state(SessionState::Opening {
            camera_id: camera_id.to_string(),
        });

        let Some(device) = hw.device.clone() else {
            return Err(CameraError::Disconnected {
                id: camera_id.to_string(),
            }
            .into());
        };

        let mut surfaces = Vec::with_capacity(2);
        if let Some(item) = output {
            surfaces.push(OutputSurface {
                kind: SurfaceKind::StillImage,
                format: item.format,
                size: item.best_size,
            });
        }
        if let Some(size) = preview_size {
            surfaces.push(OutputSurface {
                kind: SurfaceKind::Preview,
                format: OutputFormat::Yuv420,
                size,
            });
        }

        let results = Arc::clone(&self.results);
        let on_result: ResultCallback = Arc::new(move |result| {
            results.send_replace(Some(result));
        });

        let configured = match device.create_session(&surfaces, on_result).await {
            Ok(configured) => configured,
            Err(e) => {
                error!("Capture session configuration failed on camera {}: {}", camera_id, e);
                self.event_bus.publish(RawcamEvent::SystemError {
                    component: "session".to_string(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        info!(
            "Session configured on camera {} (still {:?}, preview {:?})",
            camera_id, output, preview_size
        );
        self.event_bus.publish(RawcamEvent::SessionConfigured {
            camera_id: camera_id.to_string(),
            output_format: output.map(|item| item.format),
            preview_size: preview_size.map_or((0, 0), |size| (size.width, size.height)),
        });

        hw.session = Some(ActiveSession {
            session: configured.session,
            still_reader: configured.still_reader,
            output,
            preview_size,
        });
        Ok(())
    }

    /// Issue the repeating request, then the trigger burst when one is pending
    async fn issue_requests(&self, hw: &Hardware) {
        let (Some(active), Some(camera)) = (hw.session.as_ref(), hw.camera.as_ref()) else {
            return;
        };
        if active.preview_size.is_none() {
            debug!("No preview surface, repeating request not issued");
            return;
        }

        let params = self.params.snapshot();
        let trigger = self.focus.current();
        let ctx = RequestContext {
            capabilities: &camera.capabilities,
            rotation_orientation: hw.rotation_orientation,
        };

        let repeating =
            build_capture_request(&params, trigger.as_ref(), RequestPurpose::Preview, &ctx);
        if let Err(e) = active.session.set_repeating_request(repeating).await {
            error!("Repeating request rejected on camera {}: {}", camera.id, e);
            return;
        }
        self.event_bus.publish(RawcamEvent::RepeatingRequestIssued {
            camera_id: camera.id.clone(),
        });

        let Some(trigger) = trigger.filter(FocusTrigger::is_pending) else {
            return;
        };
        let burst =
            build_capture_request(&params, Some(&trigger), RequestPurpose::PreviewTrigger, &ctx);
        match active.session.capture_burst(vec![burst]).await {
            Ok(()) => {
                if self.focus.consume(trigger.generation) {
                    self.event_bus.publish(RawcamEvent::FocusTriggerIssued {
                        camera_id: camera.id.clone(),
                        tag: trigger.tag.clone(),
                        cancel: trigger.request_cancel,
                    });
                }
            }
            Err(e) => error!("Trigger burst rejected on camera {}: {}", camera.id, e),
        }
    }

    fn close_hardware(&self, hw: &mut Hardware) {
        close_session(hw);
        if let Some(device) = hw.device.take() {
            device.close();
        }
        if let Some(camera) = hw.camera.take() {
            info!("Camera {} closed", camera.id);
            self.event_bus.publish(RawcamEvent::CameraClosed {
                camera_id: camera.id,
            });
        }
        self.results.send_replace(None);
    }

    fn find_camera(&self, camera_id: &str) -> Option<CameraIdentity> {
        self.cameras
            .read()
            .iter()
            .find(|camera| camera.id == camera_id)
            .cloned()
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!("Session state {:?} -> {:?}", current, state);
            *current = state;
            true
        });
    }

    fn update_inputs<F>(&self, modify: F)
    where
        F: FnOnce(&mut LifecycleInputs),
    {
        self.inputs.send_if_modified(|inputs| {
            let before = inputs.clone();
            modify(inputs);
            *inputs != before
        });
    }
}

/// Reader first, so no delivery lands on a closed session's surface
fn close_session(hw: &mut Hardware) {
    if let Some(active) = hw.session.take() {
        if let Some(reader) = active.still_reader {
            reader.close();
        }
        active.session.close();
    }
}

pub struct SessionCoordinatorBuilder {
    provider: Arc<dyn CameraProvider>,
    config: RawcamConfig,
    params: Option<Arc<ParameterStore>>,
    focus: Option<Arc<FocusController>>,
    event_bus: Option<Arc<EventBus>>,
    sink: Option<Arc<dyn ImageSink>>,
    save_file: Option<SaveFilePolicy>,
}

impl SessionCoordinatorBuilder {
    pub fn new(provider: Arc<dyn CameraProvider>) -> Self {
        Self {
            provider,
            config: RawcamConfig::default(),
            params: None,
            focus: None,
            event_bus: None,
            sink: None,
            save_file: None,
        }
    }

    pub fn with_config(mut self, config: RawcamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_parameters(mut self, params: Arc<ParameterStore>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_focus(mut self, focus: Arc<FocusController>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ImageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_save_file_policy(mut self, policy: SaveFilePolicy) -> Self {
        self.save_file = Some(policy);
        self
    }

    pub fn build(self) -> SessionCoordinator {
        let config = self.config;
        let cameras = self.provider.cameras();
        let selected = choose_default_camera(&cameras, config.camera.preferred_facing)
            .map(|camera| camera.id.clone());
        info!(
            "Session coordinator enumerated {} camera(s), default {:?}",
            cameras.len(),
            selected
        );

        let (inputs, _) = watch::channel(LifecycleInputs {
            selected_camera: selected,
            output_format: config.camera.output_format,
            display_rotation: config.camera.display_rotation,
            ..LifecycleInputs::default()
        });
        let (state, _) = watch::channel(SessionState::Closed);
        let (results, _) = watch::channel(None);

        SessionCoordinator {
            params: self
                .params
                .unwrap_or_else(|| Arc::new(ParameterStore::new())),
            focus: self
                .focus
                .unwrap_or_else(|| Arc::new(FocusController::new(&config.focus))),
            event_bus: self
                .event_bus
                .unwrap_or_else(|| Arc::new(EventBus::new(config.system.event_bus_capacity))),
            sink: self.sink.unwrap_or_else(|| Arc::new(FileImageSink::new())),
            save_file: self.save_file.unwrap_or_else(|| {
                default_save_file_policy(&config.capture.path, config.capture.file_prefix.clone())
            }),
            provider: self.provider,
            cameras: RwLock::new(cameras),
            inputs,
            state,
            results: Arc::new(results),
            hardware: Mutex::new(Hardware::default()),
            capture_lock: Mutex::new(()),
            config,
        }
    }
}
