//! Ranging sensor staleness watchdog.
//!
//! The ranging part occasionally wedges and stops raising data-ready; the
//! only reliable recovery is a full power cycle through its shutdown line
//! followed by re-applying the operating configuration. The monitor tracks
//! time since the last valid sample on the device clock and drives that
//! recovery sequence. While a reset is in flight no samples are produced,
//! so the host sees a hole in the ranging sub-sequence rather than
//! fabricated readings.

use crate::device::timing::RangingConfig;
use thiserror::Error;
use tracing::{info, warn};

/// Low-level failure reported by a ranging device implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DeviceError(pub String);

/// Hardware control surface the watchdog drives during recovery.
pub trait RangingControl {
    /// Toggle the shutdown line: power the sensor core down and back up.
    fn power_cycle(&mut self) -> Result<(), DeviceError>;

    /// Re-apply distance mode, timing budget and measurement period.
    fn apply_config(&mut self, config: &RangingConfig) -> Result<(), DeviceError>;

    /// Restart continuous ranging.
    fn resume(&mut self) -> Result<(), DeviceError>;
}

/// Watchdog error: recovery itself failed and the caller must decide.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("ranging reset failed during {stage}: {source}")]
    ResetFailed {
        stage: &'static str,
        source: DeviceError,
    },
}

/// Tracks ranging liveness and performs hardware recovery on expiry.
pub struct HealthMonitor {
    timeout_ms: u32,
    config: RangingConfig,
    last_sample_ms: u32,
    resets: u32,
}

impl HealthMonitor {
    /// `timeout_ms` is the staleness bound on the device clock; `now_ms`
    /// seeds the timer so a freshly started sensor is not immediately
    /// considered stale.
    pub fn new(timeout_ms: u32, config: RangingConfig, now_ms: u32) -> Self {
        Self {
            timeout_ms,
            config,
            last_sample_ms: now_ms,
            resets: 0,
        }
    }

    /// Feed the timer on every valid ranging sample.
    pub fn note_sample(&mut self, now_ms: u32) {
        self.last_sample_ms = now_ms;
    }

    /// Whether the sensor has been silent past the timeout.
    pub fn is_stale(&self, now_ms: u32) -> bool {
        now_ms.saturating_sub(self.last_sample_ms) >= self.timeout_ms
    }

    /// Number of recoveries performed this session.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Check staleness and recover if needed. Returns `Ok(true)` when a
    /// reset sequence ran. A failing stage escalates immediately; the
    /// timer is only re-armed by a successful recovery, so the caller
    /// controls whether and when to try again.
    pub fn poll<C: RangingControl>(
        &mut self,
        now_ms: u32,
        device: &mut C,
    ) -> Result<bool, HealthError> {
        if !self.is_stale(now_ms) {
            return Ok(false);
        }

        warn!(
            silent_ms = now_ms.saturating_sub(self.last_sample_ms),
            "ranging sensor stale, power-cycling"
        );

        device
            .power_cycle()
            .map_err(|source| HealthError::ResetFailed {
                stage: "power cycle",
                source,
            })?;
        device
            .apply_config(&self.config)
            .map_err(|source| HealthError::ResetFailed {
                stage: "configuration",
                source,
            })?;
        device.resume().map_err(|source| HealthError::ResetFailed {
            stage: "resume",
            source,
        })?;

        self.last_sample_ms = now_ms;
        self.resets += 1;
        info!(resets = self.resets, "ranging sensor recovered");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the recovery call order; optionally fails one stage.
    struct MockControl {
        calls: Vec<&'static str>,
        fail_stage: Option<&'static str>,
    }

    impl MockControl {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                fail_stage: None,
            }
        }

        fn failing(stage: &'static str) -> Self {
            Self {
                calls: Vec::new(),
                fail_stage: Some(stage),
            }
        }

        fn call(&mut self, name: &'static str) -> Result<(), DeviceError> {
            self.calls.push(name);
            if self.fail_stage == Some(name) {
                Err(DeviceError(format!("{name} nak")))
            } else {
                Ok(())
            }
        }
    }

    impl RangingControl for MockControl {
        fn power_cycle(&mut self) -> Result<(), DeviceError> {
            self.call("power_cycle")
        }
        fn apply_config(&mut self, _config: &RangingConfig) -> Result<(), DeviceError> {
            self.call("apply_config")
        }
        fn resume(&mut self) -> Result<(), DeviceError> {
            self.call("resume")
        }
    }

    fn monitor() -> HealthMonitor {
        HealthMonitor::new(120, RangingConfig::default(), 0)
    }

    #[test]
    fn test_fresh_sensor_not_reset() {
        let mut m = monitor();
        let mut device = MockControl::new();
        assert!(!m.poll(100, &mut device).unwrap());
        assert!(device.calls.is_empty());
    }

    #[test]
    fn test_samples_feed_the_timer() {
        let mut m = monitor();
        let mut device = MockControl::new();
        m.note_sample(100);
        m.note_sample(200);
        assert!(!m.poll(300, &mut device).unwrap());
        assert!(m.poll(320, &mut device).unwrap());
    }

    #[test]
    fn test_stale_sensor_runs_sequence_in_order() {
        let mut m = monitor();
        let mut device = MockControl::new();
        assert!(m.poll(150, &mut device).unwrap());
        assert_eq!(device.calls, ["power_cycle", "apply_config", "resume"]);
        assert_eq!(m.resets(), 1);

        // timer re-armed by the recovery
        assert!(!m.poll(200, &mut device).unwrap());
    }

    #[test]
    fn test_failed_stage_escalates() {
        let mut m = monitor();
        let mut device = MockControl::failing("apply_config");
        let err = m.poll(150, &mut device).unwrap_err();
        match err {
            HealthError::ResetFailed { stage, .. } => assert_eq!(stage, "configuration"),
        }
        // resume never ran after the failure
        assert_eq!(device.calls, ["power_cycle", "apply_config"]);
        assert_eq!(m.resets(), 0);
        // timer not re-armed: the caller decides on the next attempt
        assert!(m.is_stale(160));
    }
}
