//! Error types for cine-validate
//!
//! Three failure domains with different recovery rules:
//! - `LoadError` aborts the run before any rule executes.
//! - `RuleError` is contained to the rule that raised it.
//! - `CleanError` is reported per cleaned rule after the report is built.

use thiserror::Error;

/// The snapshot could not be read
#[derive(Error, Debug)]
pub enum LoadError {
    /// Database file missing or connection refused
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    /// Connection could not be established
    #[error("Failed to connect to data store: {0}")]
    Connect(#[from] sqlx::Error),

    /// A required collection could not be fetched in full
    #[error("Failed to load {collection}: {source}")]
    Collection {
        collection: &'static str,
        #[source]
        source: cine_common::Error,
    },
}

/// A rule met data it cannot evaluate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("malformed {entity} {id}: {reason}")]
    MalformedRecord {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

/// A clean action failed for one rule
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Failed to clean {rule}: {source}")]
    Delete {
        rule: &'static str,
        #[source]
        source: cine_common::Error,
    },

    /// A flagged entity identifier does not name a stored row
    #[error("Cannot clean {rule}: flagged id '{id}' is not a row identifier")]
    FlaggedId { rule: &'static str, id: String },
}
