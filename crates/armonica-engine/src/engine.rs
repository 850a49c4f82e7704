//! Analyzer processing context.

use armonica_analysis::{AnalysisResult, AnalysisRingBuffer, ThdAnalyzer};
use armonica_registry::{AggregateThd, CHANNEL_COUNT, ChannelRegistry, aggregate_thd};
use armonica_telemetry::{FRAME_LEN, TelemetryMessage};
use tracing::trace;

/// Default analysis window length in samples. Must be a power of two;
/// 32768 is the other observed production configuration.
pub const ANALYSIS_WINDOW: usize = 8192;

/// Maximum number of outbound frames staged between transport flushes.
/// One frame is produced per block at most, so this only matters when the
/// host skips flushes; excess frames are dropped rather than reallocating.
const OUTBOUND_FRAMES: usize = 16;

/// Operating mode of an analyzer instance.
///
/// Selected by external configuration only; the engine never transitions
/// on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Analyze the local channel and report measurements outbound.
    ChannelStrip,
    /// Aggregate measurements reported by channel-strip instances.
    MasterBrain,
}

/// Per-instance processing context.
///
/// Owns all per-stream state: the rolling sample ring, analyzer scratch,
/// channel registry, and outbound telemetry staging. All buffers are
/// sized in [`AnalyzerEngine::new`] / [`AnalyzerEngine::prepare`]; the
/// per-block [`AnalyzerEngine::process`] path allocates nothing, performs
/// no I/O, and takes no locks.
pub struct AnalyzerEngine {
    mode: Mode,
    channel_id: u8,
    sample_rate: f32,
    max_block_size: usize,
    analyzer: ThdAnalyzer,
    ring: AnalysisRingBuffer,
    window: Vec<f32>,
    registry: ChannelRegistry,
    last_analysis: AnalysisResult,
    peak_level: f32,
    outbound: Vec<u8>,
}

impl AnalyzerEngine {
    /// Create an engine with the default analysis window.
    pub fn new(mode: Mode, channel_id: u8) -> Self {
        Self::with_fft_size(mode, channel_id, ANALYSIS_WINDOW)
    }

    /// Create an engine with an explicit analysis window length.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size` is not a power of two.
    pub fn with_fft_size(mode: Mode, channel_id: u8, fft_size: usize) -> Self {
        Self {
            mode,
            channel_id,
            sample_rate: 0.0,
            max_block_size: 0,
            analyzer: ThdAnalyzer::new(fft_size),
            ring: AnalysisRingBuffer::new(fft_size),
            window: vec![0.0; fft_size],
            registry: ChannelRegistry::new(CHANNEL_COUNT),
            last_analysis: AnalysisResult::default(),
            peak_level: 0.0,
            outbound: Vec::new(),
        }
    }

    /// Operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch operating mode. The registry is deliberately left intact;
    /// stale values persist until overwritten or reset.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// The channel id stamped on outbound telemetry.
    pub fn channel_id(&self) -> u8 {
        self.channel_id
    }

    /// Set the channel id stamped on outbound telemetry.
    pub fn set_channel_id(&mut self, channel_id: u8) {
        self.channel_id = channel_id;
    }

    /// Analysis window length in samples.
    pub fn fft_size(&self) -> usize {
        self.analyzer.fft_size()
    }

    /// Sample rate configured by the last `prepare`, 0 before that.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Configure for a new stream. Sizes the outbound staging and clears
    /// all prior stream state; must be called before [`Self::process`].
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.reset();
        self.outbound.reserve_exact(OUTBOUND_FRAMES * FRAME_LEN);
    }

    /// Process one host block of mono samples.
    ///
    /// Samples accumulate in the rolling window; once it has filled, every
    /// block triggers one analysis of the latest full window. In
    /// ChannelStrip mode each analysis also mirrors the result into local
    /// slot 0 and stages one encoded frame for [`Self::drain_outbound`].
    ///
    /// Calling before `prepare` (or with an unprepared sample rate) is a
    /// no-op rather than an error.
    pub fn process(&mut self, block: &[f32]) {
        if self.sample_rate <= 0.0 || block.is_empty() {
            return;
        }
        debug_assert!(
            block.len() <= self.max_block_size,
            "block exceeds the size negotiated in prepare"
        );

        for &sample in block {
            let magnitude = sample.abs();
            if magnitude > self.peak_level {
                self.peak_level = magnitude;
            }
        }

        self.ring.push(block);
        if !self.ring.is_full() {
            return;
        }

        self.ring.read_ordered_into(&mut self.window);
        self.last_analysis = self.analyzer.analyze(&self.window, self.sample_rate);

        if self.mode == Mode::ChannelStrip {
            let message = self.message_from_last_analysis();

            // Mirror into local slot 0 so this instance's own display is
            // consistent with what the master will show.
            self.registry.apply_message(&TelemetryMessage {
                channel_id: 0,
                ..message
            });

            self.stage_outbound(&message);
        }

        // Peak restarts after every analysis so each report carries the
        // peak observed since the previous one.
        self.peak_level = 0.0;
    }

    /// Accept one inbound transport frame (MasterBrain mode only).
    ///
    /// Malformed frames and out-of-range channel ids are dropped silently;
    /// processing of subsequent frames is unaffected.
    pub fn receive(&mut self, bytes: &[u8]) {
        if self.mode != Mode::MasterBrain {
            return;
        }

        match TelemetryMessage::decode(bytes) {
            Ok(message) => {
                if !self.registry.apply_message(&message) {
                    trace!(
                        channel_id = message.channel_id,
                        "telemetry for unknown channel slot dropped"
                    );
                }
            }
            Err(err) => trace!(%err, "malformed telemetry frame dropped"),
        }
    }

    /// Hand staged outbound frames to the transport and clear the stage.
    /// Intended to be called once per block after `process`.
    pub fn drain_outbound(&mut self, mut send: impl FnMut(&[u8])) {
        for frame in self.outbound.chunks_exact(FRAME_LEN) {
            send(frame);
        }
        self.outbound.clear();
    }

    /// Number of staged outbound frames.
    pub fn outbound_len(&self) -> usize {
        self.outbound.len() / FRAME_LEN
    }

    /// Result of the most recent analysis, default before the window
    /// first fills.
    pub fn last_analysis(&self) -> &AnalysisResult {
        &self.last_analysis
    }

    /// The channel registry this instance maintains.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Set a channel's mute flag. Out-of-range ids are ignored.
    pub fn set_muted(&mut self, channel: usize, muted: bool) -> bool {
        self.registry.set_muted(channel, muted)
    }

    /// Set a channel's solo flag. Out-of-range ids are ignored.
    pub fn set_soloed(&mut self, channel: usize, soloed: bool) -> bool {
        self.registry.set_soloed(channel, soloed)
    }

    /// Master-side aggregate over the registry's non-muted channels.
    pub fn aggregate(&self) -> AggregateThd {
        aggregate_thd(&self.registry)
    }

    /// Zero all per-stream state: ring, scratch, staging, peak tracker,
    /// and registry measurements. Mute/solo flags and the configured mode
    /// and channel id survive.
    pub fn reset(&mut self) {
        self.ring.reset();
        self.window.fill(0.0);
        self.last_analysis = AnalysisResult::default();
        self.peak_level = 0.0;
        self.outbound.clear();
        self.registry.reset_measurements();
    }

    fn message_from_last_analysis(&self) -> TelemetryMessage {
        TelemetryMessage {
            channel_id: self.channel_id,
            thd: self.last_analysis.thd_percent,
            thd_n: self.last_analysis.thd_n_percent,
            level: self.last_analysis.level_rms,
            peak_level: self.peak_level,
            harmonics: self.last_analysis.harmonics,
        }
    }

    fn stage_outbound(&mut self, message: &TelemetryMessage) {
        if self.outbound.len() >= OUTBOUND_FRAMES * FRAME_LEN {
            trace!("outbound staging full, dropping telemetry frame");
            return;
        }
        self.outbound.extend_from_slice(&message.encode());
    }
}
