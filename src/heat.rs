/*!
 * Classification of per cell activity into three heat levels.
 */

use strum::{Display, EnumString};

/**
 * How intense the recent sighting activity in a cell is.
 *
 * Stored in the hotspot table as its display text.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum HeatLevel {
    Low,
    Medium,
    High,
}

/**
 * The count and recency thresholds that drive classification.
 *
 * The defaults are the deployed values. The rules are checked in order and the first match
 * wins: a burst of at least `high_min_count` reports all landing within `high_max_hours` of the
 * oldest one is High; a small handful within `low_max_hours` is Low; everything else is Medium.
 * Note the Medium bucket therefore covers both "many reports, none recent" and "no recent
 * pattern at all" - that is the behavior the product shipped with, left as is.
 */
#[derive(Debug, Clone, Copy)]
pub struct HeatThresholds {
    pub high_min_count: i64,
    pub high_max_hours: f64,
    pub low_max_count: i64,
    pub low_max_hours: f64,
}

impl Default for HeatThresholds {
    fn default() -> Self {
        HeatThresholds {
            high_min_count: 5,
            high_max_hours: 1.0,
            low_max_count: 4,
            low_max_hours: 4.0,
        }
    }
}

impl HeatThresholds {
    /// Classify a cell from its report count and the age in hours of its oldest report.
    ///
    /// Never called with a zero count; a cell with no reports is never aggregated.
    pub fn classify(&self, report_count: i64, hours_since_oldest: f64) -> HeatLevel {
        if report_count >= self.high_min_count && hours_since_oldest <= self.high_max_hours {
            HeatLevel::High
        } else if report_count >= 1
            && report_count <= self.low_max_count
            && hours_since_oldest <= self.low_max_hours
        {
            HeatLevel::Low
        } else {
            HeatLevel::Medium
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_classification_boundaries() {
        let thresholds = HeatThresholds::default();

        assert_eq!(thresholds.classify(5, 1.0), HeatLevel::High);
        assert_eq!(thresholds.classify(5, 1.01), HeatLevel::Medium);
        assert_eq!(thresholds.classify(4, 1.0), HeatLevel::Low);
        assert_eq!(thresholds.classify(1, 4.0), HeatLevel::Low);
        assert_eq!(thresholds.classify(1, 4.01), HeatLevel::Medium);
    }

    #[test]
    fn test_high_rule_checked_before_low() {
        let thresholds = HeatThresholds::default();

        // Within the Low recency band but the count pushes it past the High gate.
        assert_eq!(thresholds.classify(6, 0.5), HeatLevel::High);
        // Same count outside the High recency band falls through to Medium, not Low.
        assert_eq!(thresholds.classify(6, 2.0), HeatLevel::Medium);
    }

    #[test]
    fn test_heat_level_round_trips_as_text() {
        for level in [HeatLevel::Low, HeatLevel::Medium, HeatLevel::High] {
            let text = level.to_string();
            assert_eq!(HeatLevel::from_str(&text).unwrap(), level);
        }
    }
}
