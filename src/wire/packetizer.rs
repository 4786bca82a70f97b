//! Device-side frame builder.
//!
//! Samples are staged in per-sensor FIFOs between send ticks. Each tick
//! consumes up to one frame's worth (oldest first) and serializes the fixed
//! layout; anything beyond slot capacity stays staged for the next tick
//! rather than being discarded, so sustained overload shows up as a growing
//! backlog instead of silent loss.

use crate::sensor::types::{InertialSample, RangeSample, DISTANCE_SLOT_EMPTY};
use crate::wire::frame::{
    saturating_delta, WireFormat, INERTIAL_SLOTS, RANGING_SLOTS,
};
use std::collections::VecDeque;

/// Builds one fixed-size frame per send tick from staged samples.
pub struct Packetizer {
    format: WireFormat,
    inertial: VecDeque<InertialSample>,
    ranging: VecDeque<RangeSample>,
    next_sequence: u16,
}

impl Packetizer {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            inertial: VecDeque::new(),
            ranging: VecDeque::new(),
            next_sequence: 0,
        }
    }

    /// Stage an inertial sample for a later send tick.
    pub fn push_inertial(&mut self, sample: InertialSample) {
        self.inertial.push_back(sample);
    }

    /// Stage a ranging sample for a later send tick.
    pub fn push_ranging(&mut self, sample: RangeSample) {
        self.ranging.push_back(sample);
    }

    /// Staged samples not yet sent: (inertial, ranging).
    pub fn backlog(&self) -> (usize, usize) {
        (self.inertial.len(), self.ranging.len())
    }

    /// Serialize one frame at the given tick time, consuming up to
    /// [`INERTIAL_SLOTS`] inertial and [`RANGING_SLOTS`] ranging samples
    /// oldest-first. The output length is constant for the configured
    /// format regardless of occupancy.
    pub fn build_frame(&mut self, frame_timestamp_ms: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.format.frame_len());
        buf.extend_from_slice(&frame_timestamp_ms.to_be_bytes());

        if self.format == WireFormat::Sequenced {
            buf.extend_from_slice(&self.next_sequence.to_be_bytes());
            self.next_sequence = self.next_sequence.wrapping_add(1);
        }

        let inertial_count = self.inertial.len().min(INERTIAL_SLOTS);
        buf.push(inertial_count as u8);
        for _ in 0..inertial_count {
            // staged FIFOs guarantee oldest-first here
            let s = match self.inertial.pop_front() {
                Some(s) => s,
                None => break,
            };
            buf.extend_from_slice(&saturating_delta(frame_timestamp_ms, s.timestamp_ms).to_be_bytes());
            buf.extend_from_slice(&s.ax.to_be_bytes());
            buf.extend_from_slice(&s.ay.to_be_bytes());
            buf.extend_from_slice(&s.az.to_be_bytes());
            buf.extend_from_slice(&s.gx.to_be_bytes());
            buf.extend_from_slice(&s.gy.to_be_bytes());
            buf.extend_from_slice(&s.gz.to_be_bytes());
        }
        for _ in inertial_count..INERTIAL_SLOTS {
            buf.extend_from_slice(&[0u8; 14]);
        }

        let ranging_count = self.ranging.len().min(RANGING_SLOTS);
        buf.push(ranging_count as u8);
        for _ in 0..ranging_count {
            let s = match self.ranging.pop_front() {
                Some(s) => s,
                None => break,
            };
            buf.extend_from_slice(&saturating_delta(frame_timestamp_ms, s.timestamp_ms).to_be_bytes());
            buf.extend_from_slice(&s.distance_mm.to_be_bytes());
            buf.extend_from_slice(&s.signal_rate.to_be_bytes());
        }
        for _ in ranging_count..RANGING_SLOTS {
            // slot-empty sentinel so padding can never read as a measurement
            buf.extend_from_slice(&0u16.to_be_bytes());
            buf.extend_from_slice(&DISTANCE_SLOT_EMPTY.to_be_bytes());
            buf.extend_from_slice(&0u16.to_be_bytes());
        }

        debug_assert_eq!(buf.len(), self.format.frame_len());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::frame::{FRAME_LEN_FIXED, FRAME_LEN_SEQUENCED, RANGING_SLOT_BYTES};

    fn inertial(ts: u32) -> InertialSample {
        InertialSample {
            timestamp_ms: ts,
            ax: 1,
            ay: 2,
            az: 3,
            gx: 4,
            gy: 5,
            gz: 6,
        }
    }

    fn ranging(ts: u32) -> RangeSample {
        RangeSample {
            timestamp_ms: ts,
            distance_mm: 400,
            signal_rate: 900,
        }
    }

    #[test]
    fn test_empty_frame_has_fixed_length() {
        let mut p = Packetizer::new(WireFormat::Fixed);
        let frame = p.build_frame(1000);
        assert_eq!(frame.len(), FRAME_LEN_FIXED);
        assert_eq!(frame[4], 0); // inertial count
        assert_eq!(frame[4 + 1 + 20 * 14], 0); // ranging count
    }

    #[test]
    fn test_over_capacity_samples_stay_staged() {
        let mut p = Packetizer::new(WireFormat::Fixed);
        for ts in 0..25 {
            p.push_inertial(inertial(ts));
        }
        for ts in 0..10 {
            p.push_ranging(ranging(ts));
        }

        let frame = p.build_frame(1000);
        assert_eq!(frame.len(), FRAME_LEN_FIXED);
        assert_eq!(frame[4], 20);
        assert_eq!(p.backlog(), (5, 2));

        // Next tick drains the remainder, oldest first
        let frame = p.build_frame(1100);
        assert_eq!(frame[4], 5);
        assert_eq!(p.backlog(), (0, 0));
        // First slot of the second frame is the 21st sample (ts=20)
        let delta = u16::from_be_bytes([frame[5], frame[6]]);
        assert_eq!(delta, 1100 - 20);
    }

    #[test]
    fn test_delta_saturation_on_the_wire() {
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_inertial(inertial(0));
        let frame = p.build_frame(100_000);
        let delta = u16::from_be_bytes([frame[5], frame[6]]);
        assert_eq!(delta, 65535);
    }

    #[test]
    fn test_ranging_padding_carries_slot_empty_sentinel() {
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_ranging(ranging(500));
        let frame = p.build_frame(1000);
        let base = 4 + 1 + 20 * 14 + 1;
        // slot 0 is real data
        let d0 = u16::from_be_bytes([frame[base + 2], frame[base + 3]]);
        assert_eq!(d0, 400);
        // slot 1 is padding
        let pad = base + RANGING_SLOT_BYTES;
        let d1 = u16::from_be_bytes([frame[pad + 2], frame[pad + 3]]);
        assert_eq!(d1, DISTANCE_SLOT_EMPTY);
    }

    #[test]
    fn test_sequence_increments_and_wraps() {
        let mut p = Packetizer::new(WireFormat::Sequenced);
        let f0 = p.build_frame(10);
        let f1 = p.build_frame(20);
        assert_eq!(f0.len(), FRAME_LEN_SEQUENCED);
        assert_eq!(u16::from_be_bytes([f0[4], f0[5]]), 0);
        assert_eq!(u16::from_be_bytes([f1[4], f1[5]]), 1);

        p.next_sequence = u16::MAX;
        let f2 = p.build_frame(30);
        assert_eq!(u16::from_be_bytes([f2[4], f2[5]]), u16::MAX);
        let f3 = p.build_frame(40);
        assert_eq!(u16::from_be_bytes([f3[4], f3[5]]), 0);
    }
}
