mod forwarder;
mod orchestrator;
mod runtime;
mod shutdown;
mod source;
mod startup;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::RawcamApp;
pub use source::synthetic_frame;
pub use types::{ComponentState, RunOptions, ShutdownReason};
