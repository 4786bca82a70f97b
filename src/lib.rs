//! Rimsense - dual-sensor shot detection for an instrumented hoop.
//!
//! A rim-mounted pod samples a six-axis inertial sensor at high rate and a
//! time-of-flight ranging sensor under the net at a lower rate, packs both
//! into fixed-size frames and fires them at a host over best-effort
//! datagrams. The host reconstructs timestamps, merges the two streams
//! into one time-ordered sequence and classifies shots as makes or misses.
//!
//! # Architecture
//!
//! ```text
//!  device side                          host side
//! ┌─────────────────────────┐          ┌────────────────────────────────┐
//! │ sampler ──▶ SPSC ring   │          │ UDP thread ──▶ bounded queue   │
//! │               │         │   UDP    │                    │           │
//! │ ranging ──▶ Packetizer ─┼─────────▶│ decode ─▶ merge ─▶ classifier  │
//! │               ▲         │ frames   │                    │           │
//! │ HealthMonitor ┘         │          │              ShotEvents, stats │
//! └─────────────────────────┘          └────────────────────────────────┘
//! ```
//!
//! Decode and classify are pure functions of (input, state): a captured
//! datagram sequence replays to the same events on every run.

pub mod config;
pub mod core;
pub mod device;
pub mod receiver;
pub mod sensor;
pub mod telemetry;
pub mod wire;

// Re-export key types at crate root for convenience
pub use config::{ClassifierParams, Config, ConfigError};
pub use core::{
    BasketType, Classification, ClassifierState, SampleMerge, ShotClassifier, ShotEvent,
    ShotStatistics,
};
pub use device::{
    DeviceError, DistanceMode, HealthError, HealthMonitor, RangingConfig, RangingControl,
    SimulatedImu, SimulatedRanging,
};
pub use receiver::{FrameReceiver, ReceiverError, SessionProcessor};
pub use sensor::{InertialSample, RangeSample, Sample, SensorKind};
pub use telemetry::{LinkStats, LinkStatsSnapshot, SharedLinkStats};
pub use wire::{decode_frame, Frame, Packetizer, WireError, WireFormat};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
