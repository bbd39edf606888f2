//! Report builder
//!
//! Assembles totals, statistics, classified findings, score and
//! recommendations into a [`ValidationReport`], renderable as text for a
//! terminal or as JSON for tooling.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::classify::{Classification, ClassifiedFinding, Statistics};
use crate::clean::CleanOutcome;
use crate::rules::{EntityRef, RuleDescriptor, Severity, INCOMPLETE_RULES};
use crate::run::ValidationRun;
use crate::snapshot::EntityTotals;

const RULE_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 30;
/// Informational entries printed before the remainder is elided
const INFO_DISPLAY_LIMIT: usize = 10;

const INCOMPLETE_RULES_RECOMMENDATION: &str =
    "Inspect the records rejected by rules that could not complete";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Findings emitted by the pass, meta-findings included
    pub total_problems: usize,
    pub critical_found: bool,
    pub score: u8,
    pub recommendations: Vec<String>,
}

/// Outcome of one validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub reference_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub quick: bool,
    pub totals: EntityTotals,
    pub statistics: Statistics,
    pub critical: Vec<ClassifiedFinding>,
    pub warnings: Vec<ClassifiedFinding>,
    pub informational: Vec<ClassifiedFinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_rules: Vec<&'static str>,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<CleanOutcome>,
    /// Entities behind each triggered cleanable rule; the clean action deletes these
    #[serde(skip)]
    pub flagged: BTreeMap<&'static str, Vec<EntityRef>>,
}

/// One suggested action per triggered warning or critical rule, in rule order
fn recommendations(rules: &[RuleDescriptor], statistics: &Statistics) -> Vec<String> {
    statistics
        .triggered()
        .filter(|row| row.severity != Severity::Info)
        .filter_map(|row| {
            if row.rule_id == INCOMPLETE_RULES {
                return Some(INCOMPLETE_RULES_RECOMMENDATION.to_string());
            }
            let rule = rules.iter().find(|rule| rule.id == row.rule_id)?;
            rule.recommendation
                .map(|text| format!("{} ({} {})", text, row.count, rule.summary))
        })
        .collect()
}

pub fn build_report(
    rules: &[RuleDescriptor],
    run: &ValidationRun,
    totals: EntityTotals,
    classification: Classification,
    skipped_rules: Vec<&'static str>,
    score: u8,
) -> ValidationReport {
    let summary = ReportSummary {
        total_problems: classification.finding_count,
        critical_found: classification.statistics.has_critical(),
        score,
        recommendations: recommendations(rules, &classification.statistics),
    };

    let Classification {
        statistics,
        mut by_severity,
        flagged,
        ..
    } = classification;

    ValidationReport {
        run_id: run.run_id,
        reference_date: run.reference_date,
        generated_at: Utc::now(),
        quick: run.quick,
        totals,
        statistics,
        critical: by_severity.remove(&Severity::Critical).unwrap_or_default(),
        warnings: by_severity.remove(&Severity::Warning).unwrap_or_default(),
        informational: by_severity.remove(&Severity::Info).unwrap_or_default(),
        skipped_rules,
        summary,
        cleanup: Vec::new(),
        flagged,
    }
}

fn stat_line(out: &mut String, key: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{:.<40} {:>10}", key, value);
}

fn finding_line(out: &mut String, finding: &ClassifiedFinding) {
    let _ = write!(out, "[{}] {}", finding.rule_id, finding.message);
    if !finding.examples.is_empty() {
        let _ = write!(out, ", e.g.: {}", finding.examples.join(", "));
    }
    out.push('\n');
}

fn findings_section(out: &mut String, title: &str, findings: &[ClassifiedFinding], limit: usize) {
    if findings.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({})", title, findings.len());
    let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
    for finding in findings.iter().take(limit) {
        finding_line(out, finding);
    }
    if findings.len() > limit {
        let _ = writeln!(out, "... and {} more", findings.len() - limit);
    }
    out.push('\n');
}

impl ValidationReport {
    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(RULE_WIDTH);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "CINEMA DATA VALIDATION REPORT");
        let _ = writeln!(out, "Reference date: {}", self.reference_date);
        let _ = writeln!(out, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Run: {}", self.run_id);
        let _ = writeln!(out, "{}", rule);
        out.push('\n');

        let _ = writeln!(out, "📈 STATISTICS");
        let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
        stat_line(&mut out, "movies", self.totals.movies);
        stat_line(&mut out, "directors", self.totals.directors);
        stat_line(&mut out, "circuits", self.totals.circuits);
        stat_line(&mut out, "cinemas", self.totals.cinemas);
        stat_line(&mut out, "cinemas_with_screenings", self.totals.cinemas_with_screenings);
        stat_line(&mut out, "screenings", self.totals.screenings);
        for row in self.statistics.rows() {
            if self.skipped_rules.contains(&row.rule_id) {
                stat_line(&mut out, row.rule_id, "skipped");
            } else {
                stat_line(&mut out, row.rule_id, row.count);
            }
        }
        out.push('\n');

        findings_section(&mut out, "❌ CRITICAL", &self.critical, usize::MAX);
        findings_section(&mut out, "⚠️  WARNINGS", &self.warnings, usize::MAX);
        findings_section(&mut out, "ℹ️  INFORMATION", &self.informational, INFO_DISPLAY_LIMIT);

        if !self.skipped_rules.is_empty() {
            let _ = writeln!(out, "Skipped (quick mode): {}", self.skipped_rules.join(", "));
            out.push('\n');
        }

        let _ = writeln!(out, "SUMMARY AND RECOMMENDATIONS");
        let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
        if self.summary.critical_found {
            let _ = writeln!(
                out,
                "❌ {} critical rule(s) triggered, action required",
                self.critical.len()
            );
        } else {
            let _ = writeln!(out, "✅ No critical issue");
        }
        for recommendation in &self.summary.recommendations {
            let _ = writeln!(out, "   → {}", recommendation);
        }
        if self.summary.total_problems == 0 {
            let _ = writeln!(out, "✅ Every check passed");
        } else {
            let _ = writeln!(out, "\nTotal: {} problems detected", self.summary.total_problems);
        }
        let _ = writeln!(out, "\n📊 Data quality score: {}/100", self.summary.score);

        if !self.cleanup.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "🧹 CLEANUP");
            let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
            for outcome in &self.cleanup {
                match &outcome.error {
                    None => {
                        let _ = writeln!(out, "[{}] deleted {} record(s)", outcome.rule_id, outcome.deleted);
                    }
                    Some(error) => {
                        let _ = writeln!(out, "[{}] not cleaned: {}", outcome.rule_id, error);
                    }
                }
            }
        }

        out
    }

    /// Machine-readable report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Critical rules triggered, by identifier
    pub fn critical_rules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.critical.iter().map(|finding| finding.rule_id)
    }
}
