//! cine-validate library - showtime data validation and reporting
//!
//! One pass: load a snapshot, run the rule table, classify findings, score,
//! build the report. The clean action is a separate call made after the
//! report exists.

use tracing::info;

pub mod classify;
pub mod clean;
pub mod db;
pub mod error;
pub mod report;
pub mod rules;
pub mod run;
pub mod scorer;
pub mod snapshot;
pub mod store;

pub use clean::{clean, CleanOutcome};
pub use error::{CleanError, LoadError, RuleError};
pub use report::ValidationReport;
pub use run::ValidationRun;
pub use store::{DataStore, SqliteStore};

/// Run one validation pass over the store
///
/// Only loading can fail; rule failures are reported inside the report.
pub async fn validate(
    store: &dyn DataStore,
    run: &ValidationRun,
) -> Result<ValidationReport, LoadError> {
    info!(
        "Validation {} (reference date {}{})",
        run.run_id,
        run.reference_date,
        if run.quick { ", quick" } else { "" }
    );

    let snapshot = snapshot::load_snapshot(store).await?;
    let outcome = rules::run_rules(rules::RULES, &snapshot, run);
    let skipped = outcome.skipped.clone();
    let classification = classify::classify(rules::RULES, &outcome, run.example_limit);
    let score = scorer::score(&classification.statistics, &run.weights);

    info!(
        "Validation complete: {} problem(s), score {}/100",
        classification.finding_count, score
    );

    Ok(report::build_report(
        rules::RULES,
        run,
        snapshot.totals(),
        classification,
        skipped,
        score,
    ))
}
