//! Sample types for the two sensor streams.
//!
//! Samples carry raw integer readings exactly as they travel on the wire;
//! conversion to physical units happens through accessors using the fixed
//! full-scale factors of the deployed sensor configuration.

use serde::{Deserialize, Serialize};

/// Accelerometer sensitivity in LSB per g for the ±16 g full-scale range.
pub const ACCEL_LSB_PER_G: f64 = 2048.0;

/// Gyroscope sensitivity in LSB per °/s for the ±2000 °/s full-scale range.
pub const GYRO_LSB_PER_DPS: f64 = 16.384;

/// Ranging sentinel: measurement completed but no target acquired.
pub const DISTANCE_NO_TARGET: u16 = 0xFFFF;

/// Ranging sentinel: frame slot carries no sample (padding).
pub const DISTANCE_SLOT_EMPTY: u16 = 0xFFFE;

/// Sensor class tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Inertial,
    Ranging,
}

/// One six-axis inertial reading, raw units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Device monotonic clock, milliseconds
    pub timestamp_ms: u32,
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,
}

impl InertialSample {
    /// Acceleration per axis in g.
    pub fn accel_g(&self) -> [f64; 3] {
        [
            f64::from(self.ax) / ACCEL_LSB_PER_G,
            f64::from(self.ay) / ACCEL_LSB_PER_G,
            f64::from(self.az) / ACCEL_LSB_PER_G,
        ]
    }

    /// Angular velocity per axis in °/s.
    pub fn gyro_dps(&self) -> [f64; 3] {
        [
            f64::from(self.gx) / GYRO_LSB_PER_DPS,
            f64::from(self.gy) / GYRO_LSB_PER_DPS,
            f64::from(self.gz) / GYRO_LSB_PER_DPS,
        ]
    }

    /// Euclidean norm of the three acceleration axes, in g.
    pub fn accel_magnitude_g(&self) -> f64 {
        let [x, y, z] = self.accel_g();
        (x * x + y * y + z * z).sqrt()
    }
}

/// One time-of-flight ranging reading.
///
/// `distance_mm` may be the no-target sentinel; that is a valid empty
/// state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSample {
    /// Device monotonic clock, milliseconds
    pub timestamp_ms: u32,
    /// Distance in millimeters, or a sentinel value
    pub distance_mm: u16,
    /// Return signal rate reported by the sensor
    pub signal_rate: u16,
}

impl RangeSample {
    /// Whether the measurement completed without acquiring a target.
    pub fn is_no_target(&self) -> bool {
        self.distance_mm == DISTANCE_NO_TARGET
    }

    /// Measured distance, if a target was acquired.
    pub fn target_mm(&self) -> Option<u16> {
        match self.distance_mm {
            DISTANCE_NO_TARGET | DISTANCE_SLOT_EMPTY => None,
            mm => Some(mm),
        }
    }
}

/// Unified sample type for the merged stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sample {
    Inertial(InertialSample),
    Range(RangeSample),
}

impl Sample {
    pub fn timestamp_ms(&self) -> u32 {
        match self {
            Sample::Inertial(s) => s.timestamp_ms,
            Sample::Range(s) => s.timestamp_ms,
        }
    }

    pub fn kind(&self) -> SensorKind {
        match self {
            Sample::Inertial(_) => SensorKind::Inertial,
            Sample::Range(_) => SensorKind::Ranging,
        }
    }

    /// Timestamp in seconds, the classifier's time base.
    pub fn time_s(&self) -> f64 {
        f64::from(self.timestamp_ms()) / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_scale_conversion() {
        let s = InertialSample {
            timestamp_ms: 0,
            ax: 2048,
            ay: 0,
            az: 0,
            gx: 0,
            gy: 0,
            gz: 0,
        };
        let [x, y, z] = s.accel_g();
        assert!((x - 1.0).abs() < 1e-9);
        assert_eq!(y, 0.0);
        assert_eq!(z, 0.0);
    }

    #[test]
    fn test_accel_magnitude() {
        // 3-4-0 triangle in raw units scales to a 5/2048 g norm times 2048
        let s = InertialSample {
            timestamp_ms: 0,
            ax: 3 * 2048,
            ay: 4 * 2048,
            az: 0,
            gx: 0,
            gy: 0,
            gz: 0,
        };
        assert!((s.accel_magnitude_g() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_gyro_scale_conversion() {
        let s = InertialSample {
            timestamp_ms: 0,
            ax: 0,
            ay: 0,
            az: 0,
            gx: 16384,
            gy: 0,
            gz: 0,
        };
        assert!((s.gyro_dps()[0] - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_range_sentinels() {
        let no_target = RangeSample {
            timestamp_ms: 0,
            distance_mm: DISTANCE_NO_TARGET,
            signal_rate: 0,
        };
        assert!(no_target.is_no_target());
        assert_eq!(no_target.target_mm(), None);

        let padding = RangeSample {
            timestamp_ms: 0,
            distance_mm: DISTANCE_SLOT_EMPTY,
            signal_rate: 0,
        };
        assert!(!padding.is_no_target());
        assert_eq!(padding.target_mm(), None);

        let valid = RangeSample {
            timestamp_ms: 0,
            distance_mm: 320,
            signal_rate: 1500,
        };
        assert_eq!(valid.target_mm(), Some(320));
    }

    #[test]
    fn test_sample_accessors() {
        let s = Sample::Range(RangeSample {
            timestamp_ms: 1500,
            distance_mm: 200,
            signal_rate: 1200,
        });
        assert_eq!(s.timestamp_ms(), 1500);
        assert_eq!(s.kind(), SensorKind::Ranging);
        assert!((s.time_s() - 1.5).abs() < 1e-9);
    }
}
