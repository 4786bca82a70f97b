//! Shot classification state machine.
//!
//! Consumes the merged sample stream and correlates inertial impacts with
//! ranging basket readings. All timing decisions use sample timestamps,
//! never the wall clock, so a replayed capture produces the same events.
//!
//! ```text
//!           impact > threshold
//!   IDLE ──────────────────────▶ IMPACT_DETECTED
//!     │                            │ basket in window: emit MAKE (BANK)
//!     │ basket, no prior impact:   │ window elapses:   emit MISS
//!     │ emit MAKE (SWISH)          ▼
//!     └───────────────────────▶ BLACKOUT ──(blackout elapses)──▶ IDLE
//! ```

use crate::config::{ClassifierParams, ConfigError};
use crate::sensor::types::{RangeSample, Sample};
use serde::{Deserialize, Serialize};

/// Final verdict for one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Make,
    Miss,
}

/// How a made shot entered the basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BasketType {
    /// Clean make with no preceding rim/board impact
    Swish,
    /// Make following an impact within the correlation window
    Bank,
}

/// One classified shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    /// Impact time in seconds, if an impact preceded the verdict
    pub impact_time: Option<f64>,
    /// Basket-reading time in seconds, for makes
    pub basket_time: Option<f64>,
    pub classification: Classification,
    pub basket_type: Option<BasketType>,
    pub confidence: f64,
}

/// Classifier state, session-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    /// Waiting for an impact or a clean basket reading
    Idle,
    /// Impact seen, awaiting a basket reading within the window
    ImpactDetected,
    /// Shot resolved; ignoring rim rattle until the window elapses
    Blackout,
}

/// Correlates impacts and basket readings into shot events.
pub struct ShotClassifier {
    params: ClassifierParams,
    state: ClassifierState,
    state_entry_time: Option<f64>,
    pending_impact_time: Option<f64>,
}

impl ShotClassifier {
    /// Create a classifier, rejecting invalid thresholds up front.
    pub fn new(params: ClassifierParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            state: ClassifierState::Idle,
            state_entry_time: None,
            pending_impact_time: None,
        })
    }

    /// Current state, for observability.
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Reset for a new session. Pending impacts and blackout are cleared.
    pub fn reset(&mut self) {
        self.state = ClassifierState::Idle;
        self.state_entry_time = None;
        self.pending_impact_time = None;
    }

    /// Feed one merged sample; returns a shot event when one resolves.
    pub fn process(&mut self, sample: &Sample) -> Option<ShotEvent> {
        let ts = sample.time_s();

        // Blackout releases on sample time, and the releasing sample is
        // then processed normally from IDLE.
        if self.state == ClassifierState::Blackout {
            if let Some(entry) = self.state_entry_time {
                if ts >= entry + self.params.blackout_window_s {
                    self.state = ClassifierState::Idle;
                    self.state_entry_time = None;
                }
            }
        }

        match self.state {
            ClassifierState::Idle => match sample {
                Sample::Inertial(s)
                    if s.accel_magnitude_g() > self.params.impact_threshold_g =>
                {
                    self.state = ClassifierState::ImpactDetected;
                    self.state_entry_time = Some(ts);
                    self.pending_impact_time = Some(ts);
                    None
                }
                Sample::Range(s) if self.is_basket(s) => {
                    self.enter_blackout(ts);
                    Some(ShotEvent {
                        impact_time: None,
                        basket_time: Some(ts),
                        classification: Classification::Make,
                        basket_type: Some(BasketType::Swish),
                        confidence: 0.85,
                    })
                }
                _ => None,
            },

            ClassifierState::ImpactDetected => {
                let impact = match self.pending_impact_time {
                    Some(t) => t,
                    None => return None,
                };
                let since_impact = ts - impact;

                // The window check runs first: a basket reading arriving
                // after the window resolves the pending shot as a miss.
                if since_impact > self.params.max_time_after_impact_s {
                    self.enter_blackout(ts);
                    Some(ShotEvent {
                        impact_time: Some(impact),
                        basket_time: None,
                        classification: Classification::Miss,
                        basket_type: None,
                        confidence: 0.85,
                    })
                } else if let Sample::Range(s) = sample {
                    if self.is_basket(s) {
                        self.enter_blackout(ts);
                        Some(ShotEvent {
                            impact_time: Some(impact),
                            basket_time: Some(ts),
                            classification: Classification::Make,
                            basket_type: Some(BasketType::Bank),
                            confidence: 0.95,
                        })
                    } else {
                        None
                    }
                } else {
                    None
                }
            }

            ClassifierState::Blackout => None,
        }
    }

    /// A reading counts as a basket when a target was acquired close
    /// enough with a strong enough return. No-target and padding
    /// sentinels never qualify.
    fn is_basket(&self, s: &RangeSample) -> bool {
        s.target_mm().is_some_and(|mm| {
            mm < self.params.distance_threshold_mm
                && s.signal_rate > self.params.signal_rate_threshold
        })
    }

    fn enter_blackout(&mut self, ts: f64) {
        self.state = ClassifierState::Blackout;
        self.state_entry_time = Some(ts);
        self.pending_impact_time = None;
    }
}
