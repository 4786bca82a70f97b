//! Time-ordered merge of the two sensor streams.
//!
//! Each decoded frame appends to a per-sensor FIFO; the FIFOs persist
//! across frames, so ordering survives frame loss and uneven cadences.
//! `pop` always yields the earliest pending sample, with a fixed tie-break
//! (inertial before ranging) so a replayed capture classifies identically.

use crate::sensor::types::{InertialSample, RangeSample, Sample};
use crate::wire::Frame;
use std::collections::VecDeque;

/// Merges the inertial and ranging sub-sequences into one global ordering.
#[derive(Debug, Default)]
pub struct SampleMerge {
    inertial: VecDeque<InertialSample>,
    ranging: VecDeque<RangeSample>,
}

impl SampleMerge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded frame's samples to the per-sensor FIFOs.
    pub fn extend(&mut self, frame: &Frame) {
        self.inertial.extend(frame.inertial.iter().copied());
        self.ranging.extend(frame.ranging.iter().copied());
    }

    /// Pop the earliest pending sample across both FIFOs.
    pub fn pop(&mut self) -> Option<Sample> {
        match (self.inertial.front(), self.ranging.front()) {
            (Some(i), Some(r)) => {
                if i.timestamp_ms <= r.timestamp_ms {
                    self.inertial.pop_front().map(Sample::Inertial)
                } else {
                    self.ranging.pop_front().map(Sample::Range)
                }
            }
            (Some(_), None) => self.inertial.pop_front().map(Sample::Inertial),
            (None, Some(_)) => self.ranging.pop_front().map(Sample::Range),
            (None, None) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inertial.is_empty() && self.ranging.is_empty()
    }

    /// Pending samples: (inertial, ranging).
    pub fn len(&self) -> (usize, usize) {
        (self.inertial.len(), self.ranging.len())
    }

    /// Discard all pending samples (session reset).
    pub fn clear(&mut self) {
        self.inertial.clear();
        self.ranging.clear();
    }
}
