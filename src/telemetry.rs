//! Link and pipeline counters.
//!
//! Tracks what the best-effort link actually delivered: frames received,
//! frames dropped at the ingestion queue, frames rejected by the decoder,
//! and sequence gaps. Counters are atomic so the receive thread and the
//! processor can share one instance without locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct LinkStats {
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    frames_rejected: AtomicU64,
    sequence_gaps: AtomicU64,
    inertial_samples: AtomicU64,
    ranging_samples: AtomicU64,
    shots_classified: AtomicU64,
    session_start: DateTime<Utc>,
}

/// Shared handle used across threads.
pub type SharedLinkStats = Arc<LinkStats>;

impl LinkStats {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            sequence_gaps: AtomicU64::new(0),
            inertial_samples: AtomicU64::new(0),
            ranging_samples: AtomicU64::new(0),
            shots_classified: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn shared() -> SharedLinkStats {
        Arc::new(Self::new())
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame arrived but the ingestion queue was full.
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame failed validation in the decoder.
    pub fn record_frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// `missing` sequence ids skipped between consecutive frames.
    pub fn record_sequence_gap(&self, missing: u64) {
        self.sequence_gaps.fetch_add(missing, Ordering::Relaxed);
    }

    pub fn record_samples(&self, inertial: u64, ranging: u64) {
        self.inertial_samples.fetch_add(inertial, Ordering::Relaxed);
        self.ranging_samples.fetch_add(ranging, Ordering::Relaxed);
    }

    pub fn record_shot(&self) {
        self.shots_classified.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            sequence_gaps: self.sequence_gaps.load(Ordering::Relaxed),
            inertial_samples: self.inertial_samples.load(Ordering::Relaxed),
            ranging_samples: self.ranging_samples.load(Ordering::Relaxed),
            shots_classified: self.shots_classified.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Multi-line summary for end-of-session display.
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Session statistics:\n\
             - Frames received: {}\n\
             - Frames dropped (queue full): {}\n\
             - Frames rejected (malformed): {}\n\
             - Sequence gaps: {}\n\
             - Inertial samples: {}\n\
             - Ranging samples: {}\n\
             - Shots classified: {}",
            s.frames_received,
            s.frames_dropped,
            s.frames_rejected,
            s.sequence_gaps,
            s.inertial_samples,
            s.ranging_samples,
            s.shots_classified
        )
    }
}

impl Default for LinkStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of [`LinkStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkStatsSnapshot {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub frames_rejected: u64,
    pub sequence_gaps: u64,
    pub inertial_samples: u64,
    pub ranging_samples: u64,
    pub shots_classified: u64,
    pub session_start: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = LinkStats::new();
        stats.record_frame_received();
        stats.record_frame_received();
        stats.record_frame_dropped();
        stats.record_frame_rejected();
        stats.record_sequence_gap(3);
        stats.record_samples(20, 2);
        stats.record_shot();

        let s = stats.snapshot();
        assert_eq!(s.frames_received, 2);
        assert_eq!(s.frames_dropped, 1);
        assert_eq!(s.frames_rejected, 1);
        assert_eq!(s.sequence_gaps, 3);
        assert_eq!(s.inertial_samples, 20);
        assert_eq!(s.ranging_samples, 2);
        assert_eq!(s.shots_classified, 1);
    }

    #[test]
    fn test_summary_mentions_drops() {
        let stats = LinkStats::new();
        stats.record_frame_dropped();
        assert!(stats.summary().contains("dropped (queue full): 1"));
    }
}
