//! Host-side core: sample merge, shot classification, session statistics.

pub mod classifier;
pub mod merge;
pub mod stats;

pub use classifier::{BasketType, Classification, ClassifierState, ShotClassifier, ShotEvent};
pub use merge::SampleMerge;
pub use stats::ShotStatistics;
