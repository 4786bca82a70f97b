//! Device-side concerns: ranging sensor health, timing calibration and
//! simulated sources for bench runs.

pub mod health;
pub mod sim;
pub mod timing;

pub use health::{DeviceError, HealthError, HealthMonitor, RangingControl};
pub use sim::{SimulatedImu, SimulatedRanging};
pub use timing::{timeout_macro_periods, DistanceMode, RangingConfig, TimingError};
