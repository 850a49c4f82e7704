//! Persisted settings for armonica analyzer instances.
//!
//! Hosts restore three things at stream start and write them back on
//! explicit user action: the operating mode, the instance's channel id,
//! and the per-channel mute/solo toggles. Everything else in the analyzer
//! is runtime state and is never persisted.
//!
//! # TOML Format
//!
//! ```toml
//! mode = "channel-strip"
//! channel_id = 2
//!
//! [[channels]]
//! muted = false
//! soloed = false
//!
//! [[channels]]
//! muted = true
//! soloed = false
//! ```

mod error;

pub use error::ConfigError;

use armonica_engine::{AnalyzerEngine, Mode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Operating mode as persisted in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    /// Per-channel analyzer reporting to a master.
    #[default]
    ChannelStrip,
    /// Aggregating master instance.
    MasterBrain,
}

impl From<ModeSetting> for Mode {
    fn from(setting: ModeSetting) -> Self {
        match setting {
            ModeSetting::ChannelStrip => Mode::ChannelStrip,
            ModeSetting::MasterBrain => Mode::MasterBrain,
        }
    }
}

impl From<Mode> for ModeSetting {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::ChannelStrip => ModeSetting::ChannelStrip,
            Mode::MasterBrain => ModeSetting::MasterBrain,
        }
    }
}

/// Per-channel user toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelFlags {
    /// Exclude this channel from aggregation.
    #[serde(default)]
    pub muted: bool,
    /// Solo this channel.
    #[serde(default)]
    pub soloed: bool,
}

/// Settings persisted per analyzer instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Operating mode.
    #[serde(default)]
    pub mode: ModeSetting,

    /// Channel id stamped on outbound telemetry.
    #[serde(default)]
    pub channel_id: u8,

    /// Per-channel mute/solo toggles, in slot order. Missing entries
    /// default to unmuted/unsoloed; surplus entries are ignored.
    #[serde(default)]
    pub channels: Vec<ChannelFlags>,
}

impl AnalyzerSettings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save settings to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Check the channel id against a slot count.
    pub fn validate(&self, channel_count: usize) -> Result<(), ConfigError> {
        if (self.channel_id as usize) < channel_count {
            Ok(())
        } else {
            Err(ConfigError::InvalidChannelId {
                id: self.channel_id,
                channel_count,
            })
        }
    }

    /// Push these settings into an engine: mode, channel id, and the
    /// mute/solo toggles for the slots both sides know about.
    pub fn apply_to(&self, engine: &mut AnalyzerEngine) {
        engine.set_mode(self.mode.into());
        engine.set_channel_id(self.channel_id);
        for (i, flags) in self.channels.iter().enumerate() {
            engine.set_muted(i, flags.muted);
            engine.set_soloed(i, flags.soloed);
        }
    }

    /// Capture mode, channel id, and toggles from a running engine.
    pub fn from_engine(engine: &AnalyzerEngine) -> Self {
        Self {
            mode: engine.mode().into(),
            channel_id: engine.channel_id(),
            channels: engine
                .registry()
                .channels()
                .iter()
                .map(|c| ChannelFlags {
                    muted: c.muted,
                    soloed: c.soloed,
                })
                .collect(),
        }
    }
}
