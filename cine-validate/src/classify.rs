//! Classifier & aggregator
//!
//! Groups findings by rule, producing the statistics table (every declared
//! rule, zero counts included, in declaration order) and one display entry per
//! triggered rule, grouped by severity.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::rules::{EntityRef, Finding, RuleDescriptor, RuleOutcome, Severity, INCOMPLETE_RULES};

/// One row of the statistics table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatRow {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub count: u64,
}

/// Rule → count, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Statistics {
    rows: Vec<StatRow>,
    /// Rules that raised instead of completing, with their declared severity
    #[serde(skip)]
    failed: Vec<(&'static str, Severity)>,
}

impl Statistics {
    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn get(&self, rule_id: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|row| row.rule_id == rule_id)
            .map(|row| row.count)
    }

    /// Rows with a non-zero count
    pub fn triggered(&self) -> impl Iterator<Item = &StatRow> {
        self.rows.iter().filter(|row| row.count > 0)
    }

    pub fn has_critical(&self) -> bool {
        self.triggered().any(|row| row.severity == Severity::Critical)
    }

    pub fn failed_rules(&self) -> &[(&'static str, Severity)] {
        &self.failed
    }

    pub fn with_failed_rules(mut self, failed: Vec<(&'static str, Severity)>) -> Self {
        self.failed = failed;
        self
    }
}

impl FromIterator<StatRow> for Statistics {
    fn from_iter<I: IntoIterator<Item = StatRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
            failed: Vec::new(),
        }
    }
}

/// Display entry for one triggered rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedFinding {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub message: String,
    pub count: u64,
    /// Labels of up to `example_limit` affected entities
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub statistics: Statistics,
    pub by_severity: BTreeMap<Severity, Vec<ClassifiedFinding>>,
    /// Every entity flagged by a triggered cleanable rule
    pub flagged: BTreeMap<&'static str, Vec<EntityRef>>,
    /// Number of findings emitted by rules, before grouping
    pub finding_count: usize,
}

impl Classification {
    pub fn entries(&self, severity: Severity) -> &[ClassifiedFinding] {
        self.by_severity
            .get(&severity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn summarise(
    rule_id: &'static str,
    severity: Severity,
    summary: &str,
    findings: &[&Finding],
    example_limit: usize,
) -> ClassifiedFinding {
    let count: u64 = findings.iter().map(|f| f.weight()).sum();

    let message = match findings {
        [single] => single.message.clone(),
        _ if rule_id == INCOMPLETE_RULES => findings
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => format!("{} {}", count, summary),
    };

    let mut examples: Vec<String> = Vec::new();
    for entity in findings.iter().flat_map(|f| f.entities.iter()) {
        if examples.len() >= example_limit {
            break;
        }
        if !examples.contains(&entity.label) {
            examples.push(entity.label.clone());
        }
    }

    ClassifiedFinding {
        rule_id,
        severity,
        message,
        count,
        examples,
    }
}

/// Group the engine outcome by rule
pub fn classify(
    rules: &[RuleDescriptor],
    outcome: &RuleOutcome,
    example_limit: usize,
) -> Classification {
    let mut grouped: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for finding in &outcome.findings {
        grouped.entry(finding.rule_id).or_default().push(finding);
    }

    let flagged: BTreeMap<&'static str, Vec<EntityRef>> = rules
        .iter()
        .filter(|rule| rule.clean.is_some())
        .filter_map(|rule| {
            let findings = grouped.get(rule.id)?;
            let entities: Vec<EntityRef> = findings
                .iter()
                .flat_map(|f| f.entities.iter().cloned())
                .collect();
            Some((rule.id, entities))
        })
        .collect();

    let failed: Vec<(&'static str, Severity)> = outcome
        .failures
        .iter()
        .filter_map(|failure| {
            rules
                .iter()
                .find(|rule| rule.id == failure.rule_id)
                .map(|rule| (rule.id, rule.severity))
        })
        .collect();

    let mut statistics = Vec::with_capacity(rules.len() + 1);
    let mut by_severity: BTreeMap<Severity, Vec<ClassifiedFinding>> = BTreeMap::new();

    let declared = rules
        .iter()
        .map(|rule| (rule.id, rule.severity, rule.summary))
        .chain(std::iter::once((
            INCOMPLETE_RULES,
            Severity::Warning,
            "rules could not complete",
        )));

    for (rule_id, severity, summary) in declared {
        let findings = grouped.remove(rule_id).unwrap_or_default();
        let count = if rule_id == INCOMPLETE_RULES {
            findings.len() as u64
        } else {
            findings.iter().map(|f| f.weight()).sum()
        };

        statistics.push(StatRow {
            rule_id,
            severity,
            count,
        });

        if !findings.is_empty() {
            by_severity
                .entry(severity)
                .or_default()
                .push(summarise(rule_id, severity, summary, &findings, example_limit));
        }
    }

    Classification {
        statistics: statistics
            .into_iter()
            .collect::<Statistics>()
            .with_failed_rules(failed),
        by_severity,
        flagged,
        finding_count: outcome.findings.len(),
    }
}
