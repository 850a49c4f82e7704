//! Per-channel measurement state and master-side aggregation.
//!
//! A [`ChannelRegistry`] is a fixed table of channel slots created once at
//! startup. Slots are addressed by a validated index: lookups outside the
//! table fail closed with `None`, and telemetry carrying an out-of-range
//! channel id is silently discarded rather than indexed. The registry is
//! owned exclusively by its hosting instance; all cross-instance traffic
//! goes through the [`armonica_telemetry`] wire format.
//!
//! Measurement fields follow a last-writer-wins discipline per slot, so
//! interleaved updates across channels never corrupt each other. Mute and
//! solo flags belong to the user and survive measurement resets.

use armonica_telemetry::TelemetryMessage;

/// Number of channel slots in the reference configuration. The registry
/// accepts any count at construction; this is the default.
pub const CHANNEL_COUNT: usize = 8;

/// Number of harmonic magnitudes tracked per channel (H2 through H8).
pub const NUM_HARMONICS: usize = armonica_telemetry::NUM_HARMONICS;

/// Display palette assigned to slots at startup. Opaque to the core; the
/// UI layer interprets the tokens.
const DEFAULT_COLORS: [u32; 8] = [
    0xef4444, 0xf97316, 0xeab308, 0x22c55e, 0x06b6d4, 0x60a5fa, 0xa855f7, 0xec4899,
];

/// Latest known measurements and user toggles for one channel slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    channel_id: usize,
    /// Display name. The core treats this as opaque.
    pub name: String,
    /// Display color token. Opaque to the core.
    pub color: u32,
    /// Last reported THD in percent.
    pub thd: f32,
    /// Last reported THD+N in percent.
    pub thd_n: f32,
    /// Last reported RMS level, linear.
    pub level: f32,
    /// Last reported peak level, linear.
    pub peak_level: f32,
    /// Last reported harmonic magnitudes H2..H8.
    pub harmonics: [f32; NUM_HARMONICS],
    /// User mute toggle. Muted channels are excluded from aggregation.
    pub muted: bool,
    /// User solo toggle.
    pub soloed: bool,
}

impl ChannelState {
    fn new(channel_id: usize) -> Self {
        Self {
            channel_id,
            name: format!("CH {}", channel_id + 1),
            color: DEFAULT_COLORS[channel_id % DEFAULT_COLORS.len()],
            thd: 0.0,
            thd_n: 0.0,
            level: 0.0,
            peak_level: 0.0,
            harmonics: [0.0; NUM_HARMONICS],
            muted: false,
            soloed: false,
        }
    }

    /// Slot index, fixed at creation.
    pub fn channel_id(&self) -> usize {
        self.channel_id
    }

    fn clear_measurements(&mut self) {
        self.thd = 0.0;
        self.thd_n = 0.0;
        self.level = 0.0;
        self.peak_level = 0.0;
        self.harmonics = [0.0; NUM_HARMONICS];
    }
}

/// Fixed table of channel slots behind index-validated lookups.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    slots: Vec<ChannelState>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(CHANNEL_COUNT)
    }
}

impl ChannelRegistry {
    /// Create a registry with `channel_count` default slots.
    pub fn new(channel_count: usize) -> Self {
        Self {
            slots: (0..channel_count).map(ChannelState::new).collect(),
        }
    }

    /// Number of channel slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the registry has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look up a slot by index. Out-of-range ids return `None`.
    pub fn channel(&self, id: usize) -> Option<&ChannelState> {
        self.slots.get(id)
    }

    /// Mutable slot lookup. Out-of-range ids return `None`.
    pub fn channel_mut(&mut self, id: usize) -> Option<&mut ChannelState> {
        self.slots.get_mut(id)
    }

    /// All slots in fixed index order.
    pub fn channels(&self) -> &[ChannelState] {
        &self.slots
    }

    /// Overwrite one slot's measurements from a decoded telemetry message.
    ///
    /// Messages addressing a slot outside the table are discarded; the
    /// return value reports whether a slot was written.
    pub fn apply_message(&mut self, message: &TelemetryMessage) -> bool {
        let Some(slot) = self.slots.get_mut(message.channel_id as usize) else {
            return false;
        };

        slot.thd = message.thd;
        slot.thd_n = message.thd_n;
        slot.level = message.level;
        slot.peak_level = message.peak_level;
        slot.harmonics = message.harmonics;
        true
    }

    /// Set a channel's mute flag. Out-of-range ids are ignored.
    pub fn set_muted(&mut self, id: usize, muted: bool) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.muted = muted;
                true
            }
            None => false,
        }
    }

    /// Set a channel's solo flag. Out-of-range ids are ignored.
    pub fn set_soloed(&mut self, id: usize, soloed: bool) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.soloed = soloed;
                true
            }
            None => false,
        }
    }

    /// Zero all measurement fields, preserving names, colors, and the
    /// user's mute/solo toggles. Called on stream reset so a restarted
    /// stream never observes stale data.
    pub fn reset_measurements(&mut self) {
        for slot in &mut self.slots {
            slot.clear_measurements();
        }
    }
}

/// Master-side summary across non-muted channels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateThd {
    /// Quadratic mean of per-channel THD, percent.
    pub thd: f32,
    /// Quadratic mean of per-channel THD+N, percent.
    pub thd_n: f32,
    /// Name of the channel with the highest raw THD, `None` when every
    /// channel is muted.
    pub worst_channel: Option<String>,
}

/// Combine per-channel distortion into one figure by root-sum-of-squares.
///
/// Muted channels are excluded. The worst channel is picked on raw THD
/// with a first-maximum tie-break in slot order; with every channel muted
/// the result is all zero with no worst channel.
pub fn aggregate_thd(registry: &ChannelRegistry) -> AggregateThd {
    let mut thd_sum = 0.0f32;
    let mut thd_n_sum = 0.0f32;
    let mut count = 0usize;
    let mut worst: Option<&ChannelState> = None;

    for channel in registry.channels() {
        if channel.muted {
            continue;
        }

        thd_sum += channel.thd * channel.thd;
        thd_n_sum += channel.thd_n * channel.thd_n;
        count += 1;

        if worst.is_none_or(|w| channel.thd > w.thd) {
            worst = Some(channel);
        }
    }

    if count == 0 {
        return AggregateThd::default();
    }

    AggregateThd {
        thd: (thd_sum / count as f32).sqrt(),
        thd_n: (thd_n_sum / count as f32).sqrt(),
        worst_channel: worst.map(|c| c.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(channel_id: u8, thd: f32) -> TelemetryMessage {
        TelemetryMessage {
            channel_id,
            thd,
            thd_n: thd * 1.5,
            level: 0.5,
            peak_level: 0.8,
            harmonics: [thd * 0.1; NUM_HARMONICS],
        }
    }

    #[test]
    fn registry_starts_with_default_slots() {
        let registry = ChannelRegistry::default();
        assert_eq!(registry.len(), CHANNEL_COUNT);

        for (i, channel) in registry.channels().iter().enumerate() {
            assert_eq!(channel.channel_id(), i);
            assert_eq!(channel.thd, 0.0);
            assert_eq!(channel.harmonics, [0.0; NUM_HARMONICS]);
            assert!(!channel.muted);
            assert!(!channel.soloed);
        }
    }

    #[test]
    fn lookup_fails_closed() {
        let mut registry = ChannelRegistry::new(4);
        assert!(registry.channel(3).is_some());
        assert!(registry.channel(4).is_none());
        assert!(registry.channel_mut(100).is_none());
    }

    #[test]
    fn apply_message_overwrites_slot() {
        let mut registry = ChannelRegistry::default();
        assert!(registry.apply_message(&message(2, 1.5)));

        let channel = registry.channel(2).unwrap();
        assert_eq!(channel.thd, 1.5);
        assert_eq!(channel.thd_n, 2.25);
        assert_eq!(channel.level, 0.5);
        assert_eq!(channel.peak_level, 0.8);

        // Last writer wins.
        assert!(registry.apply_message(&message(2, 0.3)));
        assert_eq!(registry.channel(2).unwrap().thd, 0.3);
    }

    #[test]
    fn out_of_range_channel_id_is_discarded() {
        let mut registry = ChannelRegistry::default();
        let before = registry.channels().to_vec();

        assert!(!registry.apply_message(&message(250, 9.0)));
        assert!(!registry.apply_message(&message(CHANNEL_COUNT as u8, 9.0)));
        assert_eq!(registry.channels(), &before[..]);
    }

    #[test]
    fn mute_solo_toggles_are_bounds_checked() {
        let mut registry = ChannelRegistry::default();
        assert!(registry.set_muted(1, true));
        assert!(registry.set_soloed(2, true));
        assert!(!registry.set_muted(99, true));

        assert!(registry.channel(1).unwrap().muted);
        assert!(registry.channel(2).unwrap().soloed);
    }

    #[test]
    fn reset_preserves_identity_and_toggles() {
        let mut registry = ChannelRegistry::default();
        registry.apply_message(&message(0, 2.0));
        registry.set_muted(0, true);
        registry.set_soloed(3, true);
        let name = registry.channel(0).unwrap().name.clone();

        registry.reset_measurements();

        let channel = registry.channel(0).unwrap();
        assert_eq!(channel.thd, 0.0);
        assert_eq!(channel.level, 0.0);
        assert_eq!(channel.harmonics, [0.0; NUM_HARMONICS]);
        assert_eq!(channel.name, name);
        assert!(channel.muted);
        assert!(registry.channel(3).unwrap().soloed);
    }

    #[test]
    fn aggregate_is_quadratic_mean() {
        let mut registry = ChannelRegistry::new(3);
        for (i, thd) in [0.1f32, 0.2, 0.3].iter().enumerate() {
            registry.apply_message(&message(i as u8, *thd));
        }

        let aggregate = aggregate_thd(&registry);
        let expected = ((0.01f32 + 0.04 + 0.09) / 3.0).sqrt();
        assert!(
            (aggregate.thd - expected).abs() < 1e-6,
            "got {}, expected {expected}",
            aggregate.thd
        );
        assert_eq!(aggregate.worst_channel.as_deref(), Some("CH 3"));
    }

    #[test]
    fn muting_excludes_channel_from_aggregate() {
        let mut registry = ChannelRegistry::new(3);
        for (i, thd) in [0.1f32, 0.2, 0.3].iter().enumerate() {
            registry.apply_message(&message(i as u8, *thd));
        }
        registry.set_muted(2, true);

        let aggregate = aggregate_thd(&registry);
        let expected = ((0.01f32 + 0.04) / 2.0).sqrt();
        assert!(
            (aggregate.thd - expected).abs() < 1e-6,
            "got {}, expected {expected}",
            aggregate.thd
        );
        assert_eq!(aggregate.worst_channel.as_deref(), Some("CH 2"));
    }

    #[test]
    fn all_muted_aggregates_to_zero() {
        let mut registry = ChannelRegistry::new(2);
        registry.apply_message(&message(0, 1.0));
        registry.apply_message(&message(1, 2.0));
        registry.set_muted(0, true);
        registry.set_muted(1, true);

        assert_eq!(aggregate_thd(&registry), AggregateThd::default());
    }

    #[test]
    fn worst_channel_tie_breaks_on_first_slot() {
        let mut registry = ChannelRegistry::new(3);
        registry.apply_message(&message(0, 0.5));
        registry.apply_message(&message(1, 0.5));
        registry.apply_message(&message(2, 0.2));

        let aggregate = aggregate_thd(&registry);
        assert_eq!(aggregate.worst_channel.as_deref(), Some("CH 1"));
    }
}
