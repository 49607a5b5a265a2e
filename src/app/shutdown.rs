use super::startup::COMPONENTS;
use super::{ComponentState, RawcamApp};
use crate::error::{RawcamError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl RawcamApp {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Cancel all background tasks
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        // Stop components in reverse start order
        for component in COMPONENTS.iter().rev() {
            if let Err(e) = self.stop_component(component).await {
                error!("Error stopping {}: {}", component, e);
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    /// Wait for a component's task to wind down
    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let (task, limit) = match component {
            // The coordinator closes reader, session and device on its way out
            "session" => (self.session_task.take(), Duration::from_secs(10)),
            "analysis" => (self.analysis_task.take(), Duration::from_secs(5)),
            "render" => (self.render_task.take(), Duration::from_secs(5)),
            "frame_source" => (self.source_task.take(), Duration::from_secs(5)),
            _ => (None, Duration::ZERO),
        };

        let Some(task) = task else {
            self.set_component_state(component, ComponentState::Stopped)
                .await;
            return Ok(());
        };

        match timeout(limit, task).await {
            Ok(Ok(())) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component task failed: {}", component, e);
                Err(RawcamError::component(component.to_string(), e.to_string()))
            }
            Err(_) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component stop timeout", component);
                Err(RawcamError::System {
                    message: format!("{} component stop timeout", component),
                })
            }
        }
    }
}
