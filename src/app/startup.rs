use super::forwarder::spawn_render_forwarder;
use super::source::spawn_frame_source;
use super::{ComponentState, RawcamApp};
use crate::error::{RawcamError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub(super) const COMPONENTS: [&str; 4] = ["session", "analysis", "render", "frame_source"];

impl RawcamApp {
    /// Initialize all system components
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing rawcam components");

        let mut states = self.component_states.lock().await;
        for component in COMPONENTS {
            states.insert(component.to_string(), ComponentState::Stopped);
        }
        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start all system components
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting rawcam pipeline");

        // Session first: the coordinator opens the default camera once the
        // host grants permission and resumes
        self.set_component_state("session", ComponentState::Starting)
            .await;
        self.session_task = Some(self.coordinator.spawn(self.cancellation_token.clone()));
        self.coordinator.set_permission_granted(true);
        self.coordinator.set_resumed(true);

        let mut state = self.coordinator.subscribe_state();
        let streaming = matches!(
            tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| s.is_streaming()))
                .await,
            Ok(Ok(_))
        );
        if !streaming {
            self.set_component_state("session", ComponentState::Failed)
                .await;
            error!("Camera failed to start streaming");
            return Err(RawcamError::component(
                "session",
                "camera did not start streaming",
            ));
        }
        self.set_component_state("session", ComponentState::Running)
            .await;
        info!(
            "Session streaming on camera {:?}",
            self.coordinator.state().camera_id()
        );

        self.set_component_state("analysis", ComponentState::Starting)
            .await;
        self.analysis_task = Some(self.worker.spawn(self.cancellation_token.clone()));
        self.set_component_state("analysis", ComponentState::Running)
            .await;
        info!("Frame analysis worker started");

        match self.renderer.clone() {
            Some(renderer) => {
                self.set_component_state("render", ComponentState::Starting)
                    .await;
                self.render_task = Some(spawn_render_forwarder(
                    Arc::clone(&self.coordinator),
                    Arc::clone(&self.worker),
                    renderer,
                    self.render_filter.clone(),
                    self.cancellation_token.clone(),
                ));
                self.set_component_state("render", ComponentState::Running)
                    .await;
            }
            None => debug!("No renderer attached, analysis output is not forwarded"),
        }

        self.set_component_state("frame_source", ComponentState::Starting)
            .await;
        self.source_task = Some(spawn_frame_source(
            self.options.clone(),
            Arc::clone(&self.coordinator),
            Arc::clone(&self.worker),
            Arc::clone(&self.shutdown_sender),
            self.cancellation_token.clone(),
        ));
        self.set_component_state("frame_source", ComponentState::Running)
            .await;

        info!("rawcam pipeline started successfully");
        Ok(())
    }
}
