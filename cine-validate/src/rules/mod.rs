//! Rule engine
//!
//! Rules are declared in [`RULES`] as descriptors: identifier, severity,
//! aggregation mode and a pure evaluation function over the snapshot. The
//! engine stamps the descriptor's identity onto whatever a rule reports, so a
//! rule function only describes violations.
//!
//! Declaration order is the order of the statistics table.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::RuleError;
use crate::run::ValidationRun;
use crate::snapshot::Snapshot;

pub mod completeness;
pub mod freshness;
pub mod integrity;

/// Identifier of the meta rule counting rules that could not complete
pub const INCOMPLETE_RULES: &str = "incomplete_rules";

/// Finding classification, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule reports its violations; fixed per rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// One finding per violating record
    PerRecord,
    /// One finding per set of records sharing a uniqueness key
    PerGroup,
    /// At most one finding carrying the number of violating records
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Movie,
    Director,
    Circuit,
    Cinema,
    Screening,
    MovieDirectorLink,
    MovieLanguageLink,
}

/// Reference to an entity affected by a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
    /// Human-readable name used in report examples
    pub label: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl ToString, label: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.to_string(),
            label: label.into(),
        }
    }
}

/// What a rule function reports; the engine turns it into a [`Finding`]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub message: String,
    pub entities: Vec<EntityRef>,
    pub count: Option<u64>,
}

impl Violation {
    /// A single violating record
    pub fn record(message: impl Into<String>, entity: EntityRef) -> Self {
        Self {
            message: message.into(),
            entities: vec![entity],
            count: None,
        }
    }

    /// A set of records sharing a key that should be unique
    pub fn group(message: impl Into<String>, entities: Vec<EntityRef>) -> Self {
        Self {
            message: message.into(),
            entities,
            count: None,
        }
    }

    /// All violating records of an aggregate rule, or nothing when there are none
    pub fn aggregate(entities: Vec<EntityRef>, description: &str) -> Vec<Self> {
        if entities.is_empty() {
            return Vec::new();
        }
        let count = entities.len() as u64;
        vec![Self {
            message: format!("{} {}", count, description),
            entities,
            count: Some(count),
        }]
    }
}

/// A single detected anomaly from one rule in one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub message: String,
    pub entities: Vec<EntityRef>,
    /// Present only on aggregate findings
    pub count: Option<u64>,
}

impl Finding {
    /// Contribution of this finding to its rule's statistics count
    pub fn weight(&self) -> u64 {
        self.count.unwrap_or(1)
    }
}

/// Records a rule's violations can be deleted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanTarget {
    /// Exactly the screenings the rule flagged, by identifier
    FlaggedScreenings,
    BrokenDirectorLinks,
    BrokenLanguageLinks,
}

pub type RuleFn = fn(&Snapshot, &ValidationRun) -> Result<Vec<Violation>, RuleError>;

/// Declarative description of one rule
pub struct RuleDescriptor {
    pub id: &'static str,
    pub severity: Severity,
    pub aggregation: Aggregation,
    /// Plural noun phrase used when several findings are summarised
    pub summary: &'static str,
    /// Suggested action when the rule triggers
    pub recommendation: Option<&'static str>,
    pub clean: Option<CleanTarget>,
    /// Skipped in quick mode
    pub expensive: bool,
    pub evaluate: RuleFn,
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("aggregation", &self.aggregation)
            .finish_non_exhaustive()
    }
}

impl RuleDescriptor {
    /// Evaluate the rule and stamp its identity on each violation
    pub fn run(&self, snapshot: &Snapshot, run: &ValidationRun) -> Result<Vec<Finding>, RuleError> {
        let violations = (self.evaluate)(snapshot, run)?;
        Ok(violations
            .into_iter()
            .map(|v| Finding {
                rule_id: self.id,
                severity: self.severity,
                message: v.message,
                entities: v.entities,
                count: match self.aggregation {
                    Aggregation::Aggregate => v.count,
                    Aggregation::PerRecord | Aggregation::PerGroup => None,
                },
            })
            .collect())
    }
}

/// All rules, in report order
pub static RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "orphaned_movie_refs",
        severity: Severity::Critical,
        aggregation: Aggregation::PerRecord,
        summary: "screenings referencing a missing movie",
        recommendation: Some("Re-import the referenced movies or delete their screenings"),
        clean: None,
        expensive: false,
        evaluate: integrity::orphaned_movie_refs,
    },
    RuleDescriptor {
        id: "orphaned_cinema_refs",
        severity: Severity::Critical,
        aggregation: Aggregation::PerRecord,
        summary: "screenings referencing a missing cinema",
        recommendation: Some("Re-import the referenced cinemas or delete their screenings"),
        clean: None,
        expensive: false,
        evaluate: integrity::orphaned_cinema_refs,
    },
    RuleDescriptor {
        id: "invalid_circuit_refs",
        severity: Severity::Critical,
        aggregation: Aggregation::PerRecord,
        summary: "cinemas referencing a missing circuit",
        recommendation: Some("Refresh circuits from the provider and re-link their cinemas"),
        clean: None,
        expensive: false,
        evaluate: integrity::invalid_circuit_refs,
    },
    RuleDescriptor {
        id: "duplicate_movies",
        severity: Severity::Critical,
        aggregation: Aggregation::PerGroup,
        summary: "movies stored under several identifiers",
        recommendation: Some("Merge duplicate movies and repoint their screenings"),
        clean: None,
        expensive: false,
        evaluate: integrity::duplicate_movies,
    },
    RuleDescriptor {
        id: "duplicate_screenings",
        severity: Severity::Critical,
        aggregation: Aggregation::PerGroup,
        summary: "screenings recorded more than once",
        recommendation: Some("Deduplicate screenings on (movie, cinema, date, time)"),
        clean: None,
        expensive: true,
        evaluate: integrity::duplicate_screenings,
    },
    RuleDescriptor {
        id: "duplicate_directors",
        severity: Severity::Critical,
        aggregation: Aggregation::PerGroup,
        summary: "directors stored under several identifiers",
        recommendation: Some("Merge duplicate directors and repoint their movie links"),
        clean: None,
        expensive: false,
        evaluate: integrity::duplicate_directors,
    },
    RuleDescriptor {
        id: "broken_director_links",
        severity: Severity::Critical,
        aggregation: Aggregation::Aggregate,
        summary: "movie-director links to a missing movie or director",
        recommendation: Some("Run with --clean to delete broken movie-director links"),
        clean: Some(CleanTarget::BrokenDirectorLinks),
        expensive: false,
        evaluate: integrity::broken_director_links,
    },
    RuleDescriptor {
        id: "broken_language_links",
        severity: Severity::Critical,
        aggregation: Aggregation::Aggregate,
        summary: "movie-language links to a missing movie or language",
        recommendation: Some("Run with --clean to delete broken movie-language links"),
        clean: Some(CleanTarget::BrokenLanguageLinks),
        expensive: false,
        evaluate: integrity::broken_language_links,
    },
    RuleDescriptor {
        id: "cinemas_without_address",
        severity: Severity::Warning,
        aggregation: Aggregation::Aggregate,
        summary: "cinemas without address",
        recommendation: Some("Complete cinema addresses from the provider's theater pages"),
        clean: None,
        expensive: false,
        evaluate: completeness::cinemas_without_address,
    },
    RuleDescriptor {
        id: "cinemas_without_zipcode",
        severity: Severity::Warning,
        aggregation: Aggregation::Aggregate,
        summary: "cinemas without postal code",
        recommendation: Some("Complete cinema postal codes from the provider's theater pages"),
        clean: None,
        expensive: false,
        evaluate: completeness::cinemas_without_zipcode,
    },
    RuleDescriptor {
        id: "unused_cinemas",
        severity: Severity::Warning,
        aggregation: Aggregation::Aggregate,
        summary: "cinemas without any screening",
        recommendation: Some("Check whether cinemas without screenings have closed"),
        clean: None,
        expensive: false,
        evaluate: completeness::unused_cinemas,
    },
    RuleDescriptor {
        id: "old_screenings",
        severity: Severity::Warning,
        aggregation: Aggregation::Aggregate,
        summary: "screenings dated before the reference date",
        recommendation: Some("Run with --clean to delete past screenings"),
        clean: Some(CleanTarget::FlaggedScreenings),
        expensive: false,
        evaluate: freshness::old_screenings,
    },
    RuleDescriptor {
        id: "far_future_screenings",
        severity: Severity::Warning,
        aggregation: Aggregation::Aggregate,
        summary: "screenings beyond the scheduling horizon",
        recommendation: Some("Inspect far-future screenings for corrupted dates"),
        clean: None,
        expensive: false,
        evaluate: freshness::far_future_screenings,
    },
    RuleDescriptor {
        id: "empty_circuits",
        severity: Severity::Info,
        aggregation: Aggregation::Aggregate,
        summary: "circuits without cinemas",
        recommendation: None,
        clean: None,
        expensive: false,
        evaluate: completeness::empty_circuits,
    },
    RuleDescriptor {
        id: "movies_without_directors",
        severity: Severity::Info,
        aggregation: Aggregation::Aggregate,
        summary: "movies without directors",
        recommendation: None,
        clean: None,
        expensive: false,
        evaluate: completeness::movies_without_directors,
    },
    RuleDescriptor {
        id: "movies_without_languages",
        severity: Severity::Info,
        aggregation: Aggregation::Aggregate,
        summary: "movies without language information",
        recommendation: None,
        clean: None,
        expensive: false,
        evaluate: completeness::movies_without_languages,
    },
    RuleDescriptor {
        id: "movies_without_synopsis",
        severity: Severity::Info,
        aggregation: Aggregation::Aggregate,
        summary: "movies without synopsis",
        recommendation: None,
        clean: None,
        expensive: false,
        evaluate: completeness::movies_without_synopsis,
    },
    RuleDescriptor {
        id: "movies_without_poster",
        severity: Severity::Info,
        aggregation: Aggregation::Aggregate,
        summary: "movies without poster",
        recommendation: None,
        clean: None,
        expensive: false,
        evaluate: completeness::movies_without_poster,
    },
];

/// Look up a declared rule by identifier
pub fn find_rule(id: &str) -> Option<&'static RuleDescriptor> {
    RULES.iter().find(|rule| rule.id == id)
}

/// A rule that raised instead of completing
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    pub rule_id: &'static str,
    pub error: RuleError,
}

/// Everything produced by one pass of the engine
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    /// Findings in rule declaration order, meta-findings last
    pub findings: Vec<Finding>,
    pub failures: Vec<RuleFailure>,
    /// Rules not evaluated (quick mode)
    pub skipped: Vec<&'static str>,
}

/// Run every rule against the snapshot
///
/// A rule returning [`RuleError`] contributes no findings; a warning-level
/// meta-finding under [`INCOMPLETE_RULES`] records it and the pass continues.
pub fn run_rules(rules: &[RuleDescriptor], snapshot: &Snapshot, run: &ValidationRun) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    for rule in rules {
        if run.quick && rule.expensive {
            debug!("Skipping {} (quick mode)", rule.id);
            outcome.skipped.push(rule.id);
            continue;
        }

        match rule.run(snapshot, run) {
            Ok(findings) => {
                debug!("Rule {}: {} finding(s)", rule.id, findings.len());
                outcome.findings.extend(findings);
            }
            Err(error) => {
                warn!("Rule {} could not complete: {}", rule.id, error);
                outcome.failures.push(RuleFailure {
                    rule_id: rule.id,
                    error,
                });
            }
        }
    }

    for failure in &outcome.failures {
        outcome.findings.push(Finding {
            rule_id: INCOMPLETE_RULES,
            severity: Severity::Warning,
            message: format!("rule {} could not complete: {}", failure.rule_id, failure.error),
            entities: Vec::new(),
            count: None,
        });
    }

    info!(
        "Rules evaluated: {} finding(s), {} failed, {} skipped",
        outcome.findings.len(),
        outcome.failures.len(),
        outcome.skipped.len()
    );

    outcome
}
