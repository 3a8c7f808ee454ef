//! Project completion statistics.

use serde::Serialize;

/// Sample counts for one project, as produced by the aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SampleCounts {
    pub total: i64,
    pub annotated: i64,
    pub available: i64,
}

impl SampleCounts {
    /// Percentage of samples marked annotated, rounded to two decimals.
    ///
    /// Returns `0.0` for a project without samples.
    pub fn completion_rate(&self) -> f64 {
        completion_rate(self.annotated, self.total)
    }
}

/// `round(annotated / total * 100, 2)`, or `0.0` when `total` is not positive.
pub fn completion_rate(annotated: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = annotated as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_is_zero() {
        assert_eq!(completion_rate(0, 0), 0.0);
    }

    #[test]
    fn half_annotated_is_fifty() {
        let counts = SampleCounts {
            total: 2,
            annotated: 1,
            available: 2,
        };
        assert_eq!(counts.completion_rate(), 50.0);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        assert_eq!(completion_rate(1, 3), 33.33);
        assert_eq!(completion_rate(2, 3), 66.67);
    }

    #[test]
    fn fully_annotated_is_hundred() {
        assert_eq!(completion_rate(7, 7), 100.0);
    }

    #[test]
    fn small_fraction_rounds() {
        // 1 / 7 = 14.2857...
        assert_eq!(completion_rate(1, 7), 14.29);
    }
}
