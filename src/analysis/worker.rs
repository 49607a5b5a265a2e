use super::frame::FrameBuffer;
use super::pipeline::{AnalysisOutput, AnalysisSettings, FrameAnalyzer};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Frames-per-second over a sliding accounting window
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    window: Duration,
    window_start: Option<Instant>,
    frames_in_window: u32,
    fps: f32,
    pub frames_processed: u64,
    pub analysis_errors: u64,
}

impl FrameRateMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames_in_window: 0,
            fps: 0.0,
            frames_processed: 0,
            analysis_errors: 0,
        }
    }

    pub fn record_frame(&mut self, now: Instant) {
        self.frames_processed += 1;
        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;

        let elapsed = now.duration_since(start);
        if elapsed >= self.window {
            self.fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
            self.window_start = Some(now);
            self.frames_in_window = 0;
        }
    }

    pub fn record_error(&mut self) {
        self.analysis_errors += 1;
    }

    /// Rate measured over the last complete window
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Stop accounting; the next frame opens a fresh window
    pub fn suspend(&mut self) {
        self.window_start = None;
        self.frames_in_window = 0;
        self.fps = 0.0;
    }
}

/// Runs [`FrameAnalyzer`] off the async executor with latest-value input:
/// frames submitted while one is being analysed replace each other and only
/// the newest is picked up next.
pub struct AnalysisWorker {
    input: watch::Sender<Option<Arc<FrameBuffer>>>,
    output: watch::Sender<Option<Arc<AnalysisOutput>>>,
    settings: watch::Sender<AnalysisSettings>,
    paused: watch::Sender<bool>,
    meter: Arc<Mutex<FrameRateMeter>>,
}

impl AnalysisWorker {
    pub fn new(settings: AnalysisSettings, frame_rate_window: Duration) -> Self {
        let (input, _) = watch::channel(None);
        let (output, _) = watch::channel(None);
        let (settings, _) = watch::channel(settings);
        let (paused, _) = watch::channel(false);
        Self {
            input,
            output,
            settings,
            paused,
            meter: Arc::new(Mutex::new(FrameRateMeter::new(frame_rate_window))),
        }
    }

    /// Hand over the newest frame, replacing one not yet picked up
    pub fn submit(&self, frame: FrameBuffer) {
        self.input.send_replace(Some(Arc::new(frame)));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AnalysisOutput>>> {
        self.output.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<AnalysisOutput>> {
        self.output.borrow().clone()
    }

    pub fn settings(&self) -> AnalysisSettings {
        *self.settings.borrow()
    }

    pub fn set_settings(&self, settings: AnalysisSettings) {
        self.settings.send_if_modified(|current| {
            let changed = *current != settings;
            *current = settings;
            changed
        });
    }

    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn frame_rate(&self) -> f32 {
        self.meter.lock().fps()
    }

    pub fn frames_processed(&self) -> u64 {
        self.meter.lock().frames_processed
    }

    pub fn spawn(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let worker = Arc::clone(self);
        let mut input_rx = self.input.subscribe();
        let mut paused_rx = self.paused.subscribe();

        tokio::spawn(async move {
            info!("Frame analysis worker started");
            let mut analyzer = Some(FrameAnalyzer::new(worker.settings()));

            loop {
                let paused = *paused_rx.borrow_and_update();
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = paused_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if *paused_rx.borrow() {
                            debug!("Frame analysis paused");
                            worker.meter.lock().suspend();
                        } else {
                            debug!("Frame analysis resumed");
                        }
                        continue;
                    }
                    changed = input_rx.changed(), if !paused => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let Some(frame) = input_rx.borrow_and_update().clone() else {
                    continue;
                };

                let mut current = analyzer
                    .take()
                    .unwrap_or_else(|| FrameAnalyzer::new(worker.settings()));
                current.set_settings(worker.settings());

                match tokio::task::spawn_blocking(move || {
                    let result = current.analyze(frame);
                    (current, result)
                })
                .await
                {
                    Ok((returned, Ok(output))) => {
                        analyzer = Some(returned);
                        worker.meter.lock().record_frame(Instant::now());
                        worker.output.send_replace(Some(Arc::new(output)));
                    }
                    Ok((returned, Err(e))) => {
                        analyzer = Some(returned);
                        worker.meter.lock().record_error();
                        warn!("Frame analysis failed: {}", e);
                    }
                    Err(e) => {
                        worker.meter.lock().record_error();
                        error!("Frame analysis task panicked: {}", e);
                    }
                }
            }

            info!("Frame analysis worker stopped");
        })
    }
}
