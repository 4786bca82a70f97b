//! Host ingestion: datagram receive thread and the session processor.
//!
//! The receive thread blocks on the socket with a bounded timeout and
//! performs a non-blocking enqueue into a bounded channel; when the queue
//! is full the frame is dropped and counted, trading completeness for
//! throughput. A single [`SessionProcessor`] owns the merge and classifier
//! state, so no locking is needed past the channel.

use crate::config::ClassifierParams;
use crate::core::{SampleMerge, ShotClassifier, ShotEvent, ShotStatistics};
use crate::telemetry::SharedLinkStats;
use crate::wire::{decode_frame, WireFormat};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Largest datagram the receiver accepts; generously above both frame
/// formats so oversized garbage is still read and rejected whole.
const RECV_BUF_LEN: usize = 2048;

/// How long the receive thread blocks before re-checking the running flag.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors starting or running the receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("already running")]
    AlreadyRunning,

    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// Receives datagrams on a background thread and queues them for the
/// processor.
pub struct FrameReceiver {
    bind_addr: String,
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
    stats: SharedLinkStats,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FrameReceiver {
    /// Create a receiver with a bounded ingestion queue of `queue_depth`.
    pub fn new(bind_addr: String, queue_depth: usize, stats: SharedLinkStats) -> Self {
        let (sender, receiver) = bounded(queue_depth);
        Self {
            bind_addr,
            sender,
            receiver,
            stats,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Bind the socket and start the receive thread.
    pub fn start(&mut self) -> Result<(), ReceiverError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(ReceiverError::AlreadyRunning);
        }

        let socket = UdpSocket::bind(&self.bind_addr).map_err(|source| ReceiverError::Bind {
            addr: self.bind_addr.clone(),
            source,
        })?;
        if let Err(e) = socket.set_read_timeout(Some(SOCKET_TIMEOUT)) {
            warn!("could not set socket timeout: {e}");
        }

        self.running.store(true, Ordering::SeqCst);
        let sender = self.sender.clone();
        let stats = self.stats.clone();
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; RECV_BUF_LEN];
            while running.load(Ordering::SeqCst) {
                match socket.recv_from(&mut buf) {
                    Ok((len, _addr)) => {
                        stats.record_frame_received();
                        match sender.try_send(buf[..len].to_vec()) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                stats.record_frame_dropped();
                            }
                            Err(TrySendError::Disconnected(_)) => break,
                        }
                    }
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        // idle link; loop to re-check the running flag
                    }
                    Err(e) => {
                        warn!("receive error: {e}");
                    }
                }
            }
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop the receive thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue end the processor drains.
    pub fn frames(&self) -> &Receiver<Vec<u8>> {
        &self.receiver
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Single-writer pipeline stage: decode, merge, classify, tally.
///
/// Decoding and classification are pure functions of (datagram, state), so
/// a captured datagram sequence replays to identical events.
pub struct SessionProcessor {
    format: WireFormat,
    merge: SampleMerge,
    classifier: ShotClassifier,
    shot_stats: ShotStatistics,
    stats: SharedLinkStats,
    last_sequence: Option<u16>,
}

impl SessionProcessor {
    pub fn new(
        format: WireFormat,
        params: ClassifierParams,
        stats: SharedLinkStats,
    ) -> Result<Self, crate::config::ConfigError> {
        Ok(Self {
            format,
            merge: SampleMerge::new(),
            classifier: ShotClassifier::new(params)?,
            shot_stats: ShotStatistics::new(),
            stats,
            last_sequence: None,
        })
    }

    /// Ingest one datagram and return any shots that resolved.
    ///
    /// Malformed datagrams are counted and skipped; they never tear down
    /// the session.
    pub fn ingest_datagram(&mut self, datagram: &[u8]) -> Vec<ShotEvent> {
        let frame = match decode_frame(datagram, self.format) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.record_frame_rejected();
                warn!("rejected frame: {e}");
                return Vec::new();
            }
        };

        if let Some(seq) = frame.sequence {
            if let Some(prev) = self.last_sequence {
                let missing = seq.wrapping_sub(prev.wrapping_add(1));
                // a half-window jump backwards is a reordered frame, not loss
                if missing != 0 && missing < u16::MAX / 2 {
                    self.stats.record_sequence_gap(u64::from(missing));
                }
            }
            self.last_sequence = Some(seq);
        }

        self.stats
            .record_samples(frame.inertial.len() as u64, frame.ranging.len() as u64);
        self.merge.extend(&frame);

        let mut events = Vec::new();
        while let Some(sample) = self.merge.pop() {
            if let Some(event) = self.classifier.process(&sample) {
                self.shot_stats.record(&event);
                self.stats.record_shot();
                events.push(event);
            }
        }
        events
    }

    /// Session tally so far.
    pub fn shot_stats(&self) -> ShotStatistics {
        self.shot_stats
    }

    /// Reset classifier and merge state for a new session. Link counters
    /// are left running.
    pub fn reset(&mut self) {
        self.merge.clear();
        self.classifier.reset();
        self.shot_stats = ShotStatistics::new();
        self.last_sequence = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::{InertialSample, RangeSample};
    use crate::telemetry::LinkStats;
    use crate::wire::Packetizer;

    fn processor(format: WireFormat) -> SessionProcessor {
        SessionProcessor::new(format, ClassifierParams::default(), LinkStats::shared()).unwrap()
    }

    fn impact(ts: u32) -> InertialSample {
        InertialSample {
            timestamp_ms: ts,
            ax: 11_000,
            ay: 0,
            az: 0,
            gx: 0,
            gy: 0,
            gz: 0,
        }
    }

    fn basket(ts: u32) -> RangeSample {
        RangeSample {
            timestamp_ms: ts,
            distance_mm: 200,
            signal_rate: 1500,
        }
    }

    #[test]
    fn test_bank_shot_through_the_wire() {
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_inertial(impact(1_000));
        p.push_ranging(basket(1_100));
        let datagram = p.build_frame(1_200);

        let mut proc = processor(WireFormat::Fixed);
        let events = proc.ingest_datagram(&datagram);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].impact_time, Some(1.0));
        assert_eq!(events[0].basket_time, Some(1.1));
        assert_eq!(proc.shot_stats().makes, 1);
    }

    #[test]
    fn test_malformed_datagram_counted_not_fatal() {
        let stats = LinkStats::shared();
        let mut proc =
            SessionProcessor::new(WireFormat::Fixed, ClassifierParams::default(), stats.clone())
                .unwrap();
        assert!(proc.ingest_datagram(&[1, 2, 3]).is_empty());
        assert_eq!(stats.snapshot().frames_rejected, 1);

        // the session still works afterwards
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_ranging(basket(5_000));
        let events = proc.ingest_datagram(&p.build_frame(5_100));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_sequence_gap_accounting() {
        let stats = LinkStats::shared();
        let mut proc = SessionProcessor::new(
            WireFormat::Sequenced,
            ClassifierParams::default(),
            stats.clone(),
        )
        .unwrap();

        let mut p = Packetizer::new(WireFormat::Sequenced);
        let f0 = p.build_frame(100);
        let _lost1 = p.build_frame(200);
        let _lost2 = p.build_frame(300);
        let f3 = p.build_frame(400);

        proc.ingest_datagram(&f0);
        proc.ingest_datagram(&f3);
        assert_eq!(stats.snapshot().sequence_gaps, 2);

        // no false positives on contiguous delivery
        let f4 = p.build_frame(500);
        proc.ingest_datagram(&f4);
        assert_eq!(stats.snapshot().sequence_gaps, 2);

        // a late reordered frame is not loss
        proc.ingest_datagram(&f0);
        assert_eq!(stats.snapshot().sequence_gaps, 2);
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut proc = processor(WireFormat::Fixed);
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_inertial(impact(1_000));
        proc.ingest_datagram(&p.build_frame(1_050));

        proc.reset();
        // a basket right after reset is a swish, not a bank
        let mut p = Packetizer::new(WireFormat::Fixed);
        p.push_ranging(basket(1_100));
        let events = proc.ingest_datagram(&p.build_frame(1_150));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].impact_time, None);
        assert_eq!(proc.shot_stats().makes, 1);
        assert_eq!(proc.shot_stats().misses, 0);
    }
}
