use crate::analysis::AnalysisWorker;
use crate::render::{FrameRenderer, RenderInput};
use crate::session::SessionCoordinator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

/// Hand every new analysis result to the renderer together with the vertex
/// layout of the bound camera
pub(super) fn spawn_render_forwarder(
    coordinator: Arc<SessionCoordinator>,
    worker: Arc<AnalysisWorker>,
    renderer: Arc<dyn FrameRenderer>,
    filter: Option<String>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Render forwarder started (filter {:?})", filter);
        let mut outputs = worker.subscribe();
        let mut rendered = 0u64;
        let mut failures = 0u64;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                changed = outputs.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let Some(output) = outputs.borrow_and_update().clone() else {
                continue;
            };
            let Some((rotation, mirrored)) = coordinator.preview_orientation().await else {
                trace!("No camera bound, frame {} not rendered", output.sequence);
                continue;
            };

            let input = RenderInput::from_analysis(&output, rotation, mirrored, filter.clone());
            match renderer.render(input).await {
                Ok(()) => rendered += 1,
                Err(e) => {
                    failures += 1;
                    warn!("Renderer rejected frame {}: {}", output.sequence, e);
                }
            }
        }

        info!(
            "Render forwarder stopped after {} frame(s), {} failure(s)",
            rendered, failures
        );
    })
}
