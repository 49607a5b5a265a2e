use super::{ComponentState, RawcamApp, ShutdownReason};
use std::collections::HashMap;
use tracing::{debug, warn};

impl RawcamApp {
    /// Update component state
    pub async fn set_component_state(&self, component: &str, state: ComponentState) {
        let mut states = self.component_states.lock().await;
        states.insert(component.to_string(), state.clone());
        debug!("Component '{}' state changed to: {:?}", component, state);
    }

    /// Get component state
    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        let states = self.component_states.lock().await;
        states.get(component).cloned()
    }

    /// Get all component states
    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        let states = self.component_states.lock().await;
        states.clone()
    }

    /// Ask the run loop to stop; only the first request counts
    pub async fn request_shutdown(&self, reason: ShutdownReason) {
        request_shutdown(&self.shutdown_sender, reason).await;
    }
}

pub(super) async fn request_shutdown(
    sender: &super::orchestrator::ShutdownSender,
    reason: ShutdownReason,
) {
    match sender.lock().await.take() {
        Some(sender) => {
            let _ = sender.send(reason);
        }
        None => warn!("Shutdown already requested, ignoring {:?}", reason),
    }
}
