use super::types::{ComponentState, RunOptions, ShutdownReason};
use crate::analysis::{AnalysisSettings, AnalysisWorker};
use crate::camera::CameraProvider;
use crate::config::RawcamConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::params::ParameterStore;
use crate::render::FrameRenderer;
use crate::session::SessionCoordinator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub(super) type ShutdownSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

/// Wires the session coordinator, the analysis worker and a synthetic frame
/// source together and manages their lifecycle
pub struct RawcamApp {
    pub(super) config: RawcamConfig,
    pub(super) options: RunOptions,
    pub(super) event_bus: Arc<EventBus>,

    // Components
    pub(super) coordinator: Arc<SessionCoordinator>,
    pub(super) worker: Arc<AnalysisWorker>,
    pub(super) renderer: Option<Arc<dyn FrameRenderer>>,
    pub(super) render_filter: Option<String>,
    pub(super) session_task: Option<JoinHandle<()>>,
    pub(super) analysis_task: Option<JoinHandle<()>>,
    pub(super) render_task: Option<JoinHandle<()>>,
    pub(super) source_task: Option<JoinHandle<()>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: ShutdownSender,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl RawcamApp {
    /// Create the application against a camera backend
    pub async fn new(
        config: RawcamConfig,
        provider: Arc<dyn CameraProvider>,
        options: RunOptions,
    ) -> Result<Self> {
        config.validate()?;

        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let coordinator = Arc::new(
            SessionCoordinator::builder(provider)
                .with_config(config.clone())
                .with_parameters(Arc::new(ParameterStore::new()))
                .with_event_bus(Arc::clone(&event_bus))
                .build(),
        );
        info!(
            "Session coordinator ready with {} camera(s)",
            coordinator.cameras().len()
        );

        let worker = Arc::new(AnalysisWorker::new(
            AnalysisSettings::from(&config.analysis),
            Duration::from_millis(config.analysis.frame_rate_window_ms),
        ));

        Ok(Self {
            config,
            options,
            event_bus,
            coordinator,
            worker,
            renderer: None,
            render_filter: None,
            session_task: None,
            analysis_task: None,
            render_task: None,
            source_task: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Forward analysed frames to a renderer once started
    pub fn with_renderer(
        mut self,
        renderer: Arc<dyn FrameRenderer>,
        filter: Option<String>,
    ) -> Self {
        self.renderer = Some(renderer);
        self.render_filter = filter;
        self
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    pub fn analysis_worker(&self) -> &Arc<AnalysisWorker> {
        &self.worker
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn config(&self) -> &RawcamConfig {
        &self.config
    }
}
