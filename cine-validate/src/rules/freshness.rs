//! Date-based screening rules
//!
//! Dates are stored as text. A date that does not parse as YYYY-MM-DD makes
//! the rule fail with `RuleError::MalformedRecord` rather than skip the row.

use chrono::NaiveDate;
use cine_common::db::Screening;

use super::integrity::screening_ref;
use super::Violation;
use crate::error::RuleError;
use crate::run::ValidationRun;
use crate::snapshot::Snapshot;

pub fn parse_screening_date(screening: &Screening) -> Result<NaiveDate, RuleError> {
    NaiveDate::parse_from_str(screening.date.trim(), "%Y-%m-%d").map_err(|e| {
        RuleError::MalformedRecord {
            entity: "screening",
            id: screening.id.to_string(),
            reason: format!("date '{}': {}", screening.date, e),
        }
    })
}

fn screenings_where(
    snapshot: &Snapshot,
    description: &str,
    predicate: impl Fn(NaiveDate) -> bool,
) -> Result<Vec<Violation>, RuleError> {
    let mut affected = Vec::new();
    for screening in &snapshot.screenings {
        if predicate(parse_screening_date(screening)?) {
            affected.push(screening_ref(screening));
        }
    }
    Ok(Violation::aggregate(affected, description))
}

/// Screenings dated strictly before the reference date
pub fn old_screenings(
    snapshot: &Snapshot,
    run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let description = format!("screenings dated before {}", run.reference_date);
    screenings_where(snapshot, &description, |date| date < run.reference_date)
}

/// Screenings scheduled past the configured horizon
pub fn far_future_screenings(
    snapshot: &Snapshot,
    run: &ValidationRun,
) -> Result<Vec<Violation>, RuleError> {
    let cutoff = run.far_future_cutoff();
    let description = format!(
        "screenings scheduled more than {} days ahead (after {})",
        run.far_future_days, cutoff
    );
    screenings_where(snapshot, &description, |date| date > cutoff)
}
