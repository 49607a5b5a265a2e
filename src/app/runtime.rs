use super::state::request_shutdown;
use super::{RawcamApp, ShutdownReason};
use crate::error::{RawcamError, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

impl RawcamApp {
    /// Run until a signal arrives or the frame budget is spent
    pub async fn run(&mut self) -> Result<i32> {
        info!("rawcam is running");

        let shutdown_receiver =
            self.shutdown_receiver
                .take()
                .ok_or_else(|| RawcamError::System {
                    message: "Shutdown receiver already taken".to_string(),
                })?;

        self.setup_signal_handlers();

        let shutdown_reason = shutdown_receiver.await.map_err(|_| RawcamError::System {
            message: "Shutdown channel closed unexpectedly".to_string(),
        })?;

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let mut exit_code = self.shutdown().await?;
        if matches!(shutdown_reason, ShutdownReason::Error(_)) {
            exit_code = 1;
        }

        info!("rawcam shutdown complete");
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self) {
        // SIGTERM - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender = Arc::clone(&self.shutdown_sender);
            tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            request_shutdown(
                                &shutdown_sender,
                                ShutdownReason::Signal("SIGTERM".to_string()),
                            )
                            .await;
                        }
                    }
                    Err(e) => error!("Failed to register SIGTERM handler: {}", e),
                }
            });
        }

        // SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender = Arc::clone(&self.shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_shutdown(
                    &shutdown_sender,
                    ShutdownReason::Signal("SIGINT".to_string()),
                )
                .await;
            }
        });
    }
}
