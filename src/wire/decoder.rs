//! Host-side frame validation and deserialization.
//!
//! A datagram either decodes completely or is rejected with a typed error;
//! there is no partial parse. Rejection is a counted, non-fatal outcome on
//! a best-effort link.

use crate::sensor::types::{InertialSample, RangeSample, DISTANCE_SLOT_EMPTY};
use crate::wire::frame::{
    Frame, WireFormat, INERTIAL_SLOTS, INERTIAL_SLOT_BYTES, RANGING_SLOTS, RANGING_SLOT_BYTES,
};
use thiserror::Error;

/// Reasons a datagram fails to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("frame length {actual} does not match expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("inertial count {0} exceeds {INERTIAL_SLOTS} slots")]
    InertialCount(u8),

    #[error("ranging count {0} exceeds {RANGING_SLOTS} slots")]
    RangingCount(u8),
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Decode one datagram of the configured wire format.
///
/// Absolute sample timestamps are reconstructed as
/// `frame_timestamp − delta`. Ranging slots carrying the slot-empty
/// sentinel are padding and are not surfaced as samples; no-target
/// readings are kept, since "no target" is a valid measurement outcome.
pub fn decode_frame(buf: &[u8], format: WireFormat) -> Result<Frame, WireError> {
    let expected = format.frame_len();
    if buf.len() != expected {
        return Err(WireError::Length {
            expected,
            actual: buf.len(),
        });
    }

    let timestamp_ms = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let (sequence, mut offset) = match format {
        WireFormat::Fixed => (None, 4),
        WireFormat::Sequenced => (Some(read_u16(buf, 4)), 6),
    };

    let inertial_count = buf[offset];
    offset += 1;
    if usize::from(inertial_count) > INERTIAL_SLOTS {
        return Err(WireError::InertialCount(inertial_count));
    }

    let mut inertial = Vec::with_capacity(usize::from(inertial_count));
    for i in 0..usize::from(inertial_count) {
        let base = offset + i * INERTIAL_SLOT_BYTES;
        let delta = read_u16(buf, base);
        inertial.push(InertialSample {
            timestamp_ms: timestamp_ms.saturating_sub(u32::from(delta)),
            ax: read_i16(buf, base + 2),
            ay: read_i16(buf, base + 4),
            az: read_i16(buf, base + 6),
            gx: read_i16(buf, base + 8),
            gy: read_i16(buf, base + 10),
            gz: read_i16(buf, base + 12),
        });
    }
    offset += INERTIAL_SLOTS * INERTIAL_SLOT_BYTES;

    let ranging_count = buf[offset];
    offset += 1;
    if usize::from(ranging_count) > RANGING_SLOTS {
        return Err(WireError::RangingCount(ranging_count));
    }

    let mut ranging = Vec::with_capacity(usize::from(ranging_count));
    for i in 0..usize::from(ranging_count) {
        let base = offset + i * RANGING_SLOT_BYTES;
        let delta = read_u16(buf, base);
        let distance_mm = read_u16(buf, base + 2);
        if distance_mm == DISTANCE_SLOT_EMPTY {
            continue;
        }
        ranging.push(RangeSample {
            timestamp_ms: timestamp_ms.saturating_sub(u32::from(delta)),
            distance_mm,
            signal_rate: read_u16(buf, base + 4),
        });
    }

    Ok(Frame {
        timestamp_ms,
        sequence,
        inertial,
        ranging,
    })
}
