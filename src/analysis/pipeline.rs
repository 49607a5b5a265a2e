use super::frame::FrameBuffer;
use super::histogram::Histogram;
use super::overlay::combine;
use super::peaking::focus_peaking;
use super::zebra::ZebraPattern;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use image::RgbaImage;
use std::sync::Arc;
use tracing::trace;

/// Which analyses run, and their thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub histogram: bool,
    pub zebra: bool,
    pub focus_peaking: bool,
    pub zebra_threshold: u8,
    pub zebra_stripe_width: u32,
    pub peaking_threshold: u8,
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            histogram: config.histogram,
            zebra: config.zebra,
            focus_peaking: config.focus_peaking,
            zebra_threshold: config.zebra_threshold,
            zebra_stripe_width: config.zebra_stripe_width,
            peaking_threshold: config.peaking_threshold,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

/// Everything derived from one frame
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub sequence: u64,
    pub frame: Arc<FrameBuffer>,
    pub histogram: Option<Histogram>,
    /// Zebra and peaking combined, alpha pre-multiplied
    pub overlay: Option<RgbaImage>,
}

/// Synchronous per-frame analysis. Every mask is recomputed from scratch.
#[derive(Debug)]
pub struct FrameAnalyzer {
    settings: AnalysisSettings,
    zebra: ZebraPattern,
    processed: u64,
}

impl FrameAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            zebra: ZebraPattern::new(settings.zebra_threshold, settings.zebra_stripe_width),
            settings,
            processed: 0,
        }
    }

    pub fn settings(&self) -> AnalysisSettings {
        self.settings
    }

    /// Swap settings; the zebra pattern restarts only when its shape changed
    pub fn set_settings(&mut self, settings: AnalysisSettings) {
        if settings.zebra_threshold != self.settings.zebra_threshold
            || settings.zebra_stripe_width != self.settings.zebra_stripe_width
        {
            self.zebra = ZebraPattern::new(settings.zebra_threshold, settings.zebra_stripe_width);
        }
        self.settings = settings;
    }

    pub fn frames_processed(&self) -> u64 {
        self.processed
    }

    pub fn zebra_offset(&self) -> u32 {
        self.zebra.offset()
    }

    pub fn analyze(&mut self, frame: Arc<FrameBuffer>) -> Result<AnalysisOutput, AnalysisError> {
        let settings = self.settings;
        let needs_luma = settings.histogram || settings.zebra || settings.focus_peaking;
        let luma = if needs_luma { Some(frame.luma()?) } else { None };

        let histogram = match (&luma, settings.histogram) {
            (Some(luma), true) => Some(Histogram::from_luma(luma)),
            _ => None,
        };
        let zebra = match (&luma, settings.zebra) {
            (Some(luma), true) => Some(self.zebra.render(luma)),
            _ => None,
        };
        let peaking = match (&luma, settings.focus_peaking) {
            (Some(luma), true) => Some(focus_peaking(luma, settings.peaking_threshold)),
            _ => None,
        };

        self.processed += 1;
        trace!(
            "Analyzed frame {} ({}x{}): histogram={} zebra={} peaking={}",
            self.processed,
            frame.width,
            frame.height,
            histogram.is_some(),
            zebra.is_some(),
            peaking.is_some()
        );

        Ok(AnalysisOutput {
            sequence: self.processed,
            frame,
            histogram,
            overlay: combine(zebra, peaking),
        })
    }
}
