//! Validation run context
//!
//! Everything a rule or the scorer needs beyond the snapshot itself is carried
//! here and passed in explicitly. Two runs with equal `ValidationRun` values
//! over equal snapshots produce equal statistics and scores.

use chrono::{Days, NaiveDate};
use cine_common::config::ValidationSettings;
use uuid::Uuid;

use crate::scorer::ScoreWeights;

/// Parameters of one validation pass
#[derive(Debug, Clone)]
pub struct ValidationRun {
    /// Correlates log lines and report of one pass
    pub run_id: Uuid,
    /// "Today" for date-based rules
    pub reference_date: NaiveDate,
    /// Screenings later than reference_date + far_future_days are suspicious
    pub far_future_days: u32,
    /// Examples quoted per report entry
    pub example_limit: usize,
    /// Skip rules declared expensive
    pub quick: bool,
    pub weights: ScoreWeights,
}

impl ValidationRun {
    pub fn new(reference_date: NaiveDate, settings: &ValidationSettings) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            reference_date,
            far_future_days: settings.far_future_days,
            example_limit: settings.example_limit,
            quick: false,
            weights: ScoreWeights::from_settings(settings),
        }
    }

    /// Run with compiled default settings
    pub fn with_defaults(reference_date: NaiveDate) -> Self {
        Self::new(reference_date, &ValidationSettings::default())
    }

    pub fn quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    /// Last date still considered plausible for a screening
    pub fn far_future_cutoff(&self) -> NaiveDate {
        self.reference_date
            .checked_add_days(Days::new(u64::from(self.far_future_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_far_future_cutoff() {
        let run = ValidationRun::with_defaults(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(
            run.far_future_cutoff(),
            NaiveDate::from_ymd_opt(2026, 11, 17).unwrap()
        );
    }

    #[test]
    fn test_settings_flow_into_run() {
        let settings = ValidationSettings {
            far_future_days: 90,
            example_limit: 5,
            ..Default::default()
        };
        let run = ValidationRun::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), &settings);
        assert_eq!(run.far_future_days, 90);
        assert_eq!(run.example_limit, 5);
        assert!(!run.quick);
        assert!(run.quick(true).quick);
    }
}
