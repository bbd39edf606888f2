//! Quality scorer
//!
//! Converts the statistics table into a 0-100 score:
//!
//! ```text
//! score = 100 - Σ penalty(rule)        over distinct triggered rules
//! score = min(score, critical_cap)     if any critical rule triggered
//! score = max(score, 0)
//! ```
//!
//! Penalties are per triggered rule, never per affected row. The
//! `incomplete_rules` row costs at least the sum of the penalties of the rules
//! that failed, and a failed critical rule applies the cap, so a rule failing
//! never scores better than the same rule triggering.

use cine_common::config::ValidationSettings;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::classify::Statistics;
use crate::rules::{Severity, INCOMPLETE_RULES};

const PERFECT_SCORE: u32 = 100;

/// Score penalty weights
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreWeights {
    /// Highest score reachable while a critical rule is triggered
    pub critical_cap: u32,
    pub critical_penalty: u32,
    pub warning_penalty: u32,
    pub info_penalty: u32,
    /// Overrides the severity penalty for the named rules
    pub rule_penalties: BTreeMap<String, u32>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::from_settings(&ValidationSettings::default())
    }
}

impl ScoreWeights {
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self {
            critical_cap: settings.critical_score_cap,
            critical_penalty: settings.critical_penalty,
            warning_penalty: settings.warning_penalty,
            info_penalty: settings.info_penalty,
            rule_penalties: settings.effective_rule_penalties(),
        }
    }

    /// Points lost when `rule_id` triggers
    pub fn penalty_for(&self, rule_id: &str, severity: Severity) -> u32 {
        if let Some(penalty) = self.rule_penalties.get(rule_id) {
            return *penalty;
        }
        match severity {
            Severity::Critical => self.critical_penalty,
            Severity::Warning => self.warning_penalty,
            Severity::Info => self.info_penalty,
        }
    }
}

/// Penalty for the rules that could not complete
fn incomplete_penalty(statistics: &Statistics, weights: &ScoreWeights) -> u32 {
    let failed: u32 = statistics
        .failed_rules()
        .iter()
        .map(|(rule_id, severity)| weights.penalty_for(rule_id, *severity))
        .fold(0, u32::saturating_add);

    weights
        .penalty_for(INCOMPLETE_RULES, Severity::Warning)
        .max(failed)
}

/// Compute the quality score for one pass
pub fn score(statistics: &Statistics, weights: &ScoreWeights) -> u8 {
    let mut penalty: u32 = 0;
    let mut critical = false;

    for row in statistics.triggered() {
        let points = if row.rule_id == INCOMPLETE_RULES {
            incomplete_penalty(statistics, weights)
        } else {
            weights.penalty_for(row.rule_id, row.severity)
        };
        debug!("Score: {} ({}) costs {} point(s)", row.rule_id, row.severity, points);
        penalty = penalty.saturating_add(points);
        critical |= row.severity == Severity::Critical;
    }

    critical |= statistics
        .failed_rules()
        .iter()
        .any(|(_, severity)| *severity == Severity::Critical);

    let mut score = PERFECT_SCORE.saturating_sub(penalty);
    if critical {
        score = score.min(weights.critical_cap);
    }

    // u8 holds any value <= 100
    score.min(PERFECT_SCORE) as u8
}
