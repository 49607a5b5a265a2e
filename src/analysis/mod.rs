mod frame;
mod histogram;
mod overlay;
mod peaking;
mod pipeline;
mod worker;
mod zebra;
#[cfg(test)]
mod tests;

pub use frame::{FrameBuffer, Plane};
pub use histogram::{Histogram, HISTOGRAM_BINS};
pub use overlay::{combine, composite, premultiply_alpha};
pub use peaking::{focus_peaking, gradient_magnitude};
pub use pipeline::{AnalysisOutput, AnalysisSettings, FrameAnalyzer};
pub use worker::{AnalysisWorker, FrameRateMeter};
pub use zebra::{ZebraPattern, ZEBRA_COLOR};
