//! Armonica Engine - block-driven analyzer processing context.
//!
//! This crate ties the measurement core together for a real-time host:
//! an [`AnalyzerEngine`] owns the ring buffer, THD analyzer, channel
//! registry, and telemetry staging for one analyzer instance, and is
//! driven through an explicit `prepare` / `process` / `reset` lifecycle
//! by the host's block callback. There are no timers or background
//! threads inside the engine; every operation completes synchronously
//! within the calling block.
//!
//! Two operating [`Mode`]s exist:
//!
//! - **ChannelStrip**: analyze the local signal and stage one encoded
//!   telemetry frame per analysis for the outbound transport.
//! - **MasterBrain**: additionally accept inbound frames via
//!   [`AnalyzerEngine::receive`] and fold them into the channel registry.
//!
//! Switching modes never clears the registry; stale values persist until
//! overwritten or explicitly reset.

mod engine;

pub use engine::{ANALYSIS_WINDOW, AnalyzerEngine, Mode};

// The types a host needs alongside the engine.
pub use armonica_analysis::AnalysisResult;
pub use armonica_registry::{AggregateThd, ChannelRegistry, ChannelState};
pub use armonica_telemetry::{FRAME_LEN, TelemetryMessage};
