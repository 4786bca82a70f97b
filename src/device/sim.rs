//! Simulated sensor sources.
//!
//! Deterministic stand-ins for the real parts, used by the `simulate`
//! subcommand and the watchdog tests. Output is a pure function of the
//! device clock: a gentle oscillation at rest, plus an optional synthetic
//! shot (impact spike followed by a basket-range reading) on a fixed
//! period so a host under test sees real events.

use crate::device::health::{DeviceError, RangingControl};
use crate::device::timing::RangingConfig;
use crate::sensor::types::{InertialSample, RangeSample, ACCEL_LSB_PER_G};
use std::f64::consts::TAU;

/// Offset of the synthetic basket reading after the synthetic impact.
const SHOT_BASKET_LAG_MS: u32 = 100;

/// Simulated six-axis inertial sensor.
pub struct SimulatedImu {
    sample_period_ms: u32,
    /// Synthetic shot period; 0 disables shot injection
    shot_period_ms: u32,
}

impl SimulatedImu {
    pub fn new(sample_period_ms: u32, shot_period_ms: u32) -> Self {
        Self {
            sample_period_ms,
            shot_period_ms,
        }
    }

    /// Reading at the given device time.
    pub fn sample(&self, now_ms: u32) -> InertialSample {
        let t = f64::from(now_ms) / 1000.0;

        // ~1 g resting oscillation
        let mut ax = (ACCEL_LSB_PER_G * (TAU * t).sin()) as i16;
        let ay = (ACCEL_LSB_PER_G * (TAU * t).cos()) as i16;
        let az = (ACCEL_LSB_PER_G * (TAU * 0.5 * t).sin()) as i16;

        if self.shot_period_ms > 0 && now_ms % self.shot_period_ms < self.sample_period_ms {
            // rim strike: one sample well above the impact threshold
            ax = (5.5 * ACCEL_LSB_PER_G) as i16;
        }

        InertialSample {
            timestamp_ms: now_ms,
            ax,
            ay,
            az,
            gx: (16.384 * (TAU * 0.5 * t).cos()) as i16,
            gy: (16.384 * (TAU * t).sin()) as i16,
            gz: (16.384 * (TAU * t).cos()) as i16,
        }
    }
}

/// Simulated time-of-flight ranging sensor with a data-ready gate and the
/// hardware control surface the watchdog drives.
pub struct SimulatedRanging {
    config: RangingConfig,
    shot_period_ms: u32,
    last_read_ms: u32,
    ranging: bool,
}

impl SimulatedRanging {
    pub fn new(config: RangingConfig, shot_period_ms: u32) -> Self {
        Self {
            config,
            shot_period_ms,
            last_read_ms: 0,
            ranging: true,
        }
    }

    /// Non-blocking data-ready check, true once per measurement period.
    pub fn data_ready(&self, now_ms: u32) -> bool {
        self.ranging
            && now_ms.saturating_sub(self.last_read_ms)
                >= u32::from(self.config.inter_measurement_ms)
    }

    /// Read the pending measurement and clear data-ready.
    pub fn read(&mut self, now_ms: u32) -> RangeSample {
        self.last_read_ms = now_ms;

        if self.shot_period_ms > 0 {
            let phase = now_ms % self.shot_period_ms;
            let window = u32::from(self.config.inter_measurement_ms);
            if (SHOT_BASKET_LAG_MS..SHOT_BASKET_LAG_MS + window).contains(&phase) {
                // ball through the net: close target, strong return
                return RangeSample {
                    timestamp_ms: now_ms,
                    distance_mm: 200,
                    signal_rate: 1500,
                };
            }
        }

        // empty hoop: slow oscillation around the backboard distance
        let t = f64::from(now_ms) / 1000.0;
        let distance = 500.0 + 500.0 * (TAU * 0.5 * t).sin();
        RangeSample {
            timestamp_ms: now_ms,
            distance_mm: (distance as u16).clamp(50, 4000),
            signal_rate: 600,
        }
    }
}

impl RangingControl for SimulatedRanging {
    fn power_cycle(&mut self) -> Result<(), DeviceError> {
        self.ranging = false;
        Ok(())
    }

    fn apply_config(&mut self, config: &RangingConfig) -> Result<(), DeviceError> {
        self.config = *config;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.ranging = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_imu_stays_under_impact_threshold() {
        let imu = SimulatedImu::new(5, 0);
        for now in (0..2_000).step_by(5) {
            assert!(imu.sample(now).accel_magnitude_g() < 4.0);
        }
    }

    #[test]
    fn test_shot_injection_spikes_once_per_period() {
        let imu = SimulatedImu::new(5, 1_000);
        let spikes = (0..3_000)
            .step_by(5)
            .filter(|&now| imu.sample(now).accel_magnitude_g() > 4.0)
            .count();
        assert_eq!(spikes, 3);
    }

    #[test]
    fn test_data_ready_respects_period() {
        let mut ranging = SimulatedRanging::new(RangingConfig::default(), 0);
        assert!(!ranging.data_ready(10));
        assert!(ranging.data_ready(40));
        ranging.read(40);
        assert!(!ranging.data_ready(60));
        assert!(ranging.data_ready(80));
    }

    #[test]
    fn test_basket_reading_follows_impact() {
        let mut ranging = SimulatedRanging::new(RangingConfig::default(), 1_000);
        let s = ranging.read(1_120);
        assert_eq!(s.distance_mm, 200);
        assert_eq!(s.signal_rate, 1500);

        // outside the basket window the return is the weak ambient one
        let s = ranging.read(1_500);
        assert_eq!(s.signal_rate, 600);
    }

    #[test]
    fn test_power_cycle_halts_data_ready() {
        let mut ranging = SimulatedRanging::new(RangingConfig::default(), 0);
        ranging.power_cycle().unwrap();
        assert!(!ranging.data_ready(10_000));
        ranging.resume().unwrap();
        assert!(ranging.data_ready(10_000));
    }
}
