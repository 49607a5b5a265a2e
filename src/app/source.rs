use super::orchestrator::ShutdownSender;
use super::state::request_shutdown;
use super::types::{RunOptions, ShutdownReason};
use crate::analysis::{AnalysisWorker, FrameBuffer};
use crate::error::AnalysisError;
use crate::focus::{NormalizedRect, Orientation};
use crate::session::SessionCoordinator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A moving luma ramp with a clipped block in the middle, so histogram,
/// zebra and peaking all have something to show
pub fn synthetic_frame(width: u32, height: u32, index: u64) -> Result<FrameBuffer, AnalysisError> {
    let shift = (index * 4 % width.max(1) as u64) as u32;
    let (bx0, bx1) = (width / 3, 2 * width / 3);
    let (by0, by1) = (height / 3, 2 * height / 3);

    let mut luma = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let value = if (bx0..bx1).contains(&x) && (by0..by1).contains(&y) {
                255
            } else {
                ((x + shift) % width * 230 / width.max(1)) as u8
            };
            luma.push(value);
        }
    }

    FrameBuffer::from_luma(width, height, index * 33_333_333, luma)
}

pub(super) fn spawn_frame_source(
    options: RunOptions,
    coordinator: Arc<SessionCoordinator>,
    worker: Arc<AnalysisWorker>,
    shutdown: ShutdownSender,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Synthetic frame source started ({}x{}, budget {:?})",
            options.frame_size.0, options.frame_size.1, options.frames
        );
        let mut interval = tokio::time::interval(options.frame_interval);
        let mut index = 0u64;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let (width, height) = options.frame_size;
            match synthetic_frame(width, height, index) {
                Ok(frame) => worker.submit(frame),
                Err(e) => {
                    error!("Cannot build synthetic frame: {}", e);
                    request_shutdown(&shutdown, ShutdownReason::Error(e.to_string())).await;
                    break;
                }
            }
            coordinator.on_orientation(Orientation::new(0.0, 0.0, index as f32 * 0.01));
            index += 1;

            if index % 30 == 0 {
                if let Some(output) = worker.latest() {
                    debug!(
                        "Frame {}: analysis at {:.1} fps, histogram peak {:?}",
                        output.sequence,
                        worker.frame_rate(),
                        output.histogram.as_ref().map(|h| h.peak())
                    );
                }
            }

            let Some(budget) = options.frames else {
                continue;
            };
            if index == (budget / 2).max(1) {
                coordinator.request_focus_at(Some(NormalizedRect::around(0.5, 0.5, 0.2)));
            }
            if index >= budget {
                if options.capture {
                    match coordinator.capture(None, None).await {
                        Ok(outcome) => info!("Still capture finished: {:?}", outcome),
                        Err(e) => error!("Still capture failed: {}", e),
                    }
                }
                info!("Frame budget of {} exhausted", budget);
                request_shutdown(&shutdown, ShutdownReason::Completed).await;
                break;
            }
        }

        if index == 0 {
            warn!("Frame source stopped before producing a frame");
        }
        info!("Synthetic frame source stopped after {} frame(s)", index);
    })
}
