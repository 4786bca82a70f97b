//! Running shot statistics for a session.

use crate::core::classifier::{Classification, ShotEvent};
use serde::{Deserialize, Serialize};

/// Makes/misses tally with shooting percentage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShotStatistics {
    pub makes: u32,
    pub misses: u32,
}

impl ShotStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one classified shot.
    pub fn record(&mut self, event: &ShotEvent) {
        match event.classification {
            Classification::Make => self.makes += 1,
            Classification::Miss => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.makes + self.misses
    }

    /// Shooting percentage, 0.0 when no shots have resolved.
    pub fn percentage(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            f64::from(self.makes) / f64::from(self.total()) * 100.0
        }
    }

    /// One-line summary for display.
    pub fn summary(&self) -> String {
        format!(
            "{} made / {} missed ({:.1}%)",
            self.makes,
            self.misses,
            self.percentage()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::BasketType;

    fn event(classification: Classification) -> ShotEvent {
        ShotEvent {
            impact_time: None,
            basket_time: Some(1.0),
            classification,
            basket_type: Some(BasketType::Swish),
            confidence: 0.85,
        }
    }

    #[test]
    fn test_percentage() {
        let mut stats = ShotStatistics::new();
        assert_eq!(stats.percentage(), 0.0);

        stats.record(&event(Classification::Make));
        stats.record(&event(Classification::Make));
        stats.record(&event(Classification::Miss));
        assert_eq!(stats.total(), 3);
        assert!((stats.percentage() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_summary_format() {
        let mut stats = ShotStatistics::new();
        stats.record(&event(Classification::Make));
        assert_eq!(stats.summary(), "1 made / 0 missed (100.0%)");
    }
}
