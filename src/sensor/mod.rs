//! Sensor sample model and the sampler-side SPSC boundary.

pub mod ring;
pub mod types;

pub use ring::{inertial_ring, InertialConsumer, InertialTap};
pub use types::{
    InertialSample, RangeSample, Sample, SensorKind, ACCEL_LSB_PER_G, DISTANCE_NO_TARGET,
    DISTANCE_SLOT_EMPTY, GYRO_LSB_PER_DPS,
};
