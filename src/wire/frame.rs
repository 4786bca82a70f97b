//! Wire frame layout.
//!
//! Every frame has the same byte length for a given format; occupancy is
//! declared by the two count bytes and unused slots are filled with
//! padding. All integers are big-endian.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ u32  frame_timestamp_ms                                 │
//! │ [u16 sequence]              (Sequenced format only)     │
//! │ u8   inertial_count         (0..=20)                    │
//! │ 20 × { u16 delta_ms, i16 ax ay az, i16 gx gy gz }       │
//! │ u8   ranging_count          (0..=8)                     │
//! │ 8  × { u16 delta_ms, u16 distance_mm, u16 signal_rate } │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::sensor::types::{InertialSample, RangeSample};
use serde::{Deserialize, Serialize};

/// Inertial slots per frame.
pub const INERTIAL_SLOTS: usize = 20;

/// Ranging slots per frame.
pub const RANGING_SLOTS: usize = 8;

/// Bytes per inertial slot: u16 delta + six i16 axes.
pub const INERTIAL_SLOT_BYTES: usize = 14;

/// Bytes per ranging slot: u16 delta + u16 distance + u16 signal rate.
pub const RANGING_SLOT_BYTES: usize = 6;

/// Frame length of the base format.
pub const FRAME_LEN_FIXED: usize =
    4 + 1 + INERTIAL_SLOTS * INERTIAL_SLOT_BYTES + 1 + RANGING_SLOTS * RANGING_SLOT_BYTES;

/// Frame length of the sequenced format (u16 id after the timestamp).
pub const FRAME_LEN_SEQUENCED: usize = FRAME_LEN_FIXED + 2;

/// Which of the two wire formats a deployment speaks.
///
/// The format is fixed per deployment by configuration; the two are never
/// auto-negotiated on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Base format, no sequencing.
    Fixed,
    /// Adds a wrapping u16 sequence id for loss detection.
    Sequenced,
}

impl WireFormat {
    /// Expected datagram length for this format.
    pub fn frame_len(self) -> usize {
        match self {
            WireFormat::Fixed => FRAME_LEN_FIXED,
            WireFormat::Sequenced => FRAME_LEN_SEQUENCED,
        }
    }
}

/// Per-sample timestamp offset, saturated to the field width.
///
/// A sample older than 65535 ms keeps the maximum delta rather than
/// wrapping; its reconstructed timestamp is then too recent, which is the
/// accepted failure mode for a backlog that large.
pub fn saturating_delta(frame_ms: u32, sample_ms: u32) -> u16 {
    let delta = frame_ms.saturating_sub(sample_ms);
    u16::try_from(delta).unwrap_or(u16::MAX)
}

/// A decoded frame: absolute timestamps reconstructed, raw sensor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame timestamp on the device monotonic clock
    pub timestamp_ms: u32,
    /// Sequence id, present only in the Sequenced format
    pub sequence: Option<u16>,
    pub inertial: Vec<InertialSample>,
    pub ranging: Vec<RangeSample>,
}
