//! Lock-free SPSC ring at the sampler interrupt / main loop boundary.
//!
//! The periodic sampler runs in a context that must never block or
//! allocate, so it writes into a fixed-capacity ring and counts overruns
//! instead of waiting. The main loop owns the consumer half and drains it
//! into the packetizer between send ticks.

use crate::sensor::types::InertialSample;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Consumer half handed to the main device loop.
pub type InertialConsumer = HeapConsumer<InertialSample>;

/// Producer half of the sampler boundary.
///
/// `push` never blocks; when the ring is full the sample is discarded and
/// counted, which keeps the sampler context allocation-free and bounded.
pub struct InertialTap {
    producer: HeapProducer<InertialSample>,
    overruns: u64,
}

impl InertialTap {
    /// Append a sample. Returns false (and counts an overrun) if the ring
    /// is full.
    pub fn push(&mut self, sample: InertialSample) -> bool {
        match self.producer.push(sample) {
            Ok(()) => true,
            Err(_) => {
                self.overruns += 1;
                false
            }
        }
    }

    /// Number of samples discarded because the ring was full.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Free slots remaining.
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Create a sampler boundary with the given fixed capacity.
pub fn inertial_ring(capacity: usize) -> (InertialTap, InertialConsumer) {
    let rb = HeapRb::<InertialSample>::new(capacity);
    let (producer, consumer) = rb.split();
    (
        InertialTap {
            producer,
            overruns: 0,
        },
        consumer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u32) -> InertialSample {
        InertialSample {
            timestamp_ms: ts,
            ax: 0,
            ay: 0,
            az: 0,
            gx: 0,
            gy: 0,
            gz: 0,
        }
    }

    #[test]
    fn test_fifo_order() {
        let (mut tap, mut consumer) = inertial_ring(8);
        for ts in 0..5 {
            assert!(tap.push(sample(ts)));
        }
        for ts in 0..5 {
            assert_eq!(consumer.pop().map(|s| s.timestamp_ms), Some(ts));
        }
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn test_overrun_counting() {
        let (mut tap, mut consumer) = inertial_ring(4);
        for ts in 0..4 {
            assert!(tap.push(sample(ts)));
        }
        assert!(!tap.push(sample(4)));
        assert!(!tap.push(sample(5)));
        assert_eq!(tap.overruns(), 2);

        // Draining frees capacity again
        assert!(consumer.pop().is_some());
        assert!(tap.push(sample(6)));
        assert_eq!(tap.overruns(), 2);
    }
}
