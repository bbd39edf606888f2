//! Clean action
//!
//! Deletes the records behind triggered cleanable rules. Runs after the report
//! is built and is not coupled to the read pass: each rule is cleaned on its
//! own and a failure on one rule does not stop the others.
//!
//! Screenings are deleted by the identifiers the rule flagged, so a clean
//! removes exactly what the report counted.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::CleanError;
use crate::report::ValidationReport;
use crate::rules::{find_rule, CleanTarget, EntityKind, EntityRef};
use crate::store::DataStore;

/// Result of cleaning one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanOutcome {
    pub rule_id: &'static str,
    pub deleted: u64,
    /// Set when the delete failed; nothing is known to have been removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn screening_ids(rule_id: &'static str, entities: &[EntityRef]) -> Result<Vec<i64>, CleanError> {
    entities
        .iter()
        .filter(|entity| entity.kind == EntityKind::Screening)
        .map(|entity| {
            entity.id.parse::<i64>().map_err(|_| CleanError::FlaggedId {
                rule: rule_id,
                id: entity.id.clone(),
            })
        })
        .collect()
}

async fn clean_target(
    store: &dyn DataStore,
    rule_id: &'static str,
    target: CleanTarget,
    flagged: &[EntityRef],
) -> Result<u64, CleanError> {
    let result = match target {
        CleanTarget::FlaggedScreenings => {
            let ids = screening_ids(rule_id, flagged)?;
            let deleted = store.delete_screenings(&ids).await;
            if let Ok(count) = &deleted {
                if *count != ids.len() as u64 {
                    warn!(
                        "{}: {} screening(s) flagged, {} deleted (removed since the snapshot)",
                        rule_id,
                        ids.len(),
                        count
                    );
                }
            }
            deleted
        }
        CleanTarget::BrokenDirectorLinks => store.delete_broken_director_links().await,
        CleanTarget::BrokenLanguageLinks => store.delete_broken_language_links().await,
    };
    result.map_err(|source| CleanError::Delete {
        rule: rule_id,
        source,
    })
}

/// Clean every cleanable rule the report shows as triggered
pub async fn clean(store: &dyn DataStore, report: &ValidationReport) -> Vec<CleanOutcome> {
    let mut outcomes = Vec::new();

    for row in report.statistics.triggered() {
        let Some(target) = find_rule(row.rule_id).and_then(|rule| rule.clean) else {
            continue;
        };
        let flagged = report
            .flagged
            .get(row.rule_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let outcome = match clean_target(store, row.rule_id, target, flagged).await {
            Ok(deleted) => {
                info!("Cleaned {}: {} record(s) deleted", row.rule_id, deleted);
                CleanOutcome {
                    rule_id: row.rule_id,
                    deleted,
                    error: None,
                }
            }
            Err(e) => {
                error!("{}", e);
                CleanOutcome {
                    rule_id: row.rule_id,
                    deleted: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    if outcomes.is_empty() {
        info!("Nothing to clean");
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::report::build_report;
    use crate::rules::{Finding, RuleOutcome, Severity, RULES};
    use crate::run::ValidationRun;
    use crate::snapshot::EntityTotals;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use cine_common::db::{
        Cinema, Circuit, Director, Language, Movie, MovieDirector, MovieLanguage, Screening,
    };
    use std::sync::Mutex;

    /// Store whose director-link delete fails
    #[derive(Default)]
    struct FlakyStore {
        deleted_screenings: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl DataStore for FlakyStore {
        async fn fetch_movies(&self) -> cine_common::Result<Vec<Movie>> {
            Ok(Vec::new())
        }
        async fn fetch_directors(&self) -> cine_common::Result<Vec<Director>> {
            Ok(Vec::new())
        }
        async fn fetch_movie_directors(&self) -> cine_common::Result<Vec<MovieDirector>> {
            Ok(Vec::new())
        }
        async fn fetch_languages(&self) -> cine_common::Result<Vec<Language>> {
            Ok(Vec::new())
        }
        async fn fetch_movie_languages(&self) -> cine_common::Result<Vec<MovieLanguage>> {
            Ok(Vec::new())
        }
        async fn fetch_circuits(&self) -> cine_common::Result<Vec<Circuit>> {
            Ok(Vec::new())
        }
        async fn fetch_cinemas(&self) -> cine_common::Result<Vec<Cinema>> {
            Ok(Vec::new())
        }
        async fn fetch_screenings(&self) -> cine_common::Result<Vec<Screening>> {
            Ok(Vec::new())
        }
        async fn delete_screenings(&self, ids: &[i64]) -> cine_common::Result<u64> {
            self.deleted_screenings.lock().unwrap().extend_from_slice(ids);
            Ok(ids.len() as u64)
        }
        async fn delete_broken_director_links(&self) -> cine_common::Result<u64> {
            Err(cine_common::Error::Database(sqlx::Error::PoolClosed))
        }
        async fn delete_broken_language_links(&self) -> cine_common::Result<u64> {
            Ok(0)
        }
    }

    fn run() -> ValidationRun {
        ValidationRun::with_defaults(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn aggregate(
        rule_id: &'static str,
        severity: Severity,
        kind: EntityKind,
        ids: &[&str],
    ) -> Finding {
        Finding {
            rule_id,
            severity,
            message: format!("{} records", ids.len()),
            entities: ids.iter().map(|id| EntityRef::new(kind, id, "flagged")).collect(),
            count: Some(ids.len() as u64),
        }
    }

    fn report(findings: Vec<Finding>) -> ValidationReport {
        let run = run();
        let outcome = RuleOutcome {
            findings,
            ..Default::default()
        };
        let classification = classify(RULES, &outcome, run.example_limit);
        build_report(RULES, &run, EntityTotals::default(), classification, Vec::new(), 100)
    }

    #[tokio::test]
    async fn test_failure_on_one_rule_does_not_stop_others() {
        let report = report(vec![
            aggregate("broken_director_links", Severity::Critical, EntityKind::MovieDirectorLink, &["1:9"]),
            aggregate("old_screenings", Severity::Warning, EntityKind::Screening, &["3", "4", "7"]),
            aggregate("movies_without_poster", Severity::Info, EntityKind::Movie, &["2"]),
        ]);
        let store = FlakyStore::default();

        let outcomes = clean(&store, &report).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].rule_id, "broken_director_links");
        assert_eq!(outcomes[0].deleted, 0);
        assert!(outcomes[0].error.as_deref().unwrap().contains("broken_director_links"));

        assert_eq!(
            outcomes[1],
            CleanOutcome {
                rule_id: "old_screenings",
                deleted: 3,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn test_deletes_exactly_the_flagged_screenings() {
        // More entities than examples shown in the report
        let report = report(vec![aggregate(
            "old_screenings",
            Severity::Warning,
            EntityKind::Screening,
            &["11", "12", "13", "14", "15"],
        )]);
        let store = FlakyStore::default();

        let outcomes = clean(&store, &report).await;

        assert_eq!(outcomes[0].deleted, 5);
        assert_eq!(*store.deleted_screenings.lock().unwrap(), vec![11, 12, 13, 14, 15]);
    }

    #[tokio::test]
    async fn test_non_numeric_flagged_id_is_reported() {
        let report = report(vec![aggregate(
            "old_screenings",
            Severity::Warning,
            EntityKind::Screening,
            &["12", "twelve"],
        )]);
        let store = FlakyStore::default();

        let outcomes = clean(&store, &report).await;

        assert_eq!(outcomes[0].deleted, 0);
        assert!(outcomes[0].error.as_deref().unwrap().contains("twelve"));
        assert!(store.deleted_screenings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untriggered_rules_are_not_cleaned() {
        let report = report(Vec::new());
        let store = FlakyStore::default();

        assert!(clean(&store, &report).await.is_empty());
        assert!(store.deleted_screenings.lock().unwrap().is_empty());
    }
}
