//! Wire codec for cross-instance measurement telemetry.
//!
//! Each analyzer instance reports its channel's measurements to a single
//! aggregating master over an ordered, reliable byte-message transport.
//! One report travels as one fixed-length frame:
//!
//! ```text
//! byte 0      0xF0        frame start marker
//! byte 1      0x7D        application identifier
//! byte 2      0x01        message type (THD telemetry)
//! byte 3      channel id  unsigned 8-bit
//! bytes 4-7   thd         f32, little-endian
//! bytes 8-11  thd_n       f32
//! bytes 12-15 level       f32
//! bytes 16-19 peak_level  f32
//! bytes 20-47 harmonics   7 × f32, H2 first
//! byte 48     0xF7        frame end marker
//! ```
//!
//! Floats are always little-endian, independent of the host platform, so
//! producer and consumer agree by construction. Encoding is infallible and
//! allocation-free; decoding reports malformed frames through
//! [`DecodeError`] and never panics or partially populates a message. Both
//! directions are pure functions with no shared state, safe to call from
//! the audio-processing context.
//!
//! The codec deliberately does not range-check the channel id: the logical
//! range depends on the receiver's slot count, so validation belongs to
//! the registry consuming the message.

use thiserror::Error;

/// Frame start marker, transport-defined.
pub const FRAME_START: u8 = 0xF0;

/// Frame end marker, transport-defined.
pub const FRAME_END: u8 = 0xF7;

/// Application identifier carried in every frame.
pub const APPLICATION_ID: u8 = 0x7D;

/// Message-type identifier for THD telemetry.
pub const MESSAGE_TYPE_THD: u8 = 0x01;

/// Number of harmonic magnitudes carried per frame (H2 through H8).
pub const NUM_HARMONICS: usize = 7;

/// Total encoded frame length in bytes: three identifier bytes, the
/// channel id, eleven floats, and the end marker.
pub const FRAME_LEN: usize = 4 + 4 * (4 + NUM_HARMONICS) + 1;

/// One channel's measurement report as carried on the wire.
///
/// Pure data with no identity beyond its fields; decoded messages are
/// consumed into registry state immediately on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryMessage {
    /// Reporting channel slot. Logical range is `0..channel_count`, but
    /// the codec transports the full 8-bit range unchecked.
    pub channel_id: u8,
    /// Total harmonic distortion in percent.
    pub thd: f32,
    /// THD plus noise in percent.
    pub thd_n: f32,
    /// RMS level, linear.
    pub level: f32,
    /// Peak level since the previous report, linear.
    pub peak_level: f32,
    /// Harmonic magnitudes H2..H8, in order.
    pub harmonics: [f32; NUM_HARMONICS],
}

/// Why an inbound frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer shorter than the fixed frame length.
    #[error("frame too short: {len} bytes, need {FRAME_LEN}")]
    TooShort {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// Start or end marker missing, so this is not a telemetry frame.
    #[error("missing frame markers")]
    BadFraming,

    /// Application or message-type identifier mismatch.
    #[error("unrecognized identifiers {application:#04x}/{message_type:#04x}")]
    BadIdentifiers {
        /// Application identifier found at byte 1.
        application: u8,
        /// Message-type identifier found at byte 2.
        message_type: u8,
    },
}

impl TelemetryMessage {
    /// Encode into a fixed-length frame.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = FRAME_START;
        frame[1] = APPLICATION_ID;
        frame[2] = MESSAGE_TYPE_THD;
        frame[3] = self.channel_id;

        let mut pos = 4;
        for value in [self.thd, self.thd_n, self.level, self.peak_level]
            .into_iter()
            .chain(self.harmonics)
        {
            frame[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
            pos += 4;
        }

        frame[FRAME_LEN - 1] = FRAME_END;
        frame
    }

    /// Decode a frame received from the transport.
    ///
    /// Bytes beyond the fixed frame length are ignored, so transports that
    /// deliver padded buffers still decode. Failure leaves no partial
    /// state behind.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < FRAME_LEN {
            return Err(DecodeError::TooShort { len: bytes.len() });
        }
        if bytes[0] != FRAME_START || bytes[FRAME_LEN - 1] != FRAME_END {
            return Err(DecodeError::BadFraming);
        }
        if bytes[1] != APPLICATION_ID || bytes[2] != MESSAGE_TYPE_THD {
            return Err(DecodeError::BadIdentifiers {
                application: bytes[1],
                message_type: bytes[2],
            });
        }

        let mut harmonics = [0.0f32; NUM_HARMONICS];
        for (i, slot) in harmonics.iter_mut().enumerate() {
            *slot = read_f32(bytes, 20 + 4 * i);
        }

        Ok(Self {
            channel_id: bytes[3],
            thd: read_f32(bytes, 4),
            thd_n: read_f32(bytes, 8),
            level: read_f32(bytes, 12),
            peak_level: read_f32(bytes, 16),
            harmonics,
        })
    }
}

/// Read a little-endian f32 at `pos`. Caller guarantees `pos + 4` is in
/// bounds (decode validates the length up front).
fn read_f32(bytes: &[u8], pos: usize) -> f32 {
    f32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}
