//! Unified error types for the odds processor.

use thiserror::Error;

/// Unified error type for the odds processor.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Message-level parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Batch persistence error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Startup connectivity error.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Broker protocol error.
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message-level failures: the whole message is aborted, nothing from it is
/// processed.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The payload is not syntactically valid JSON.
    #[error("invalid json payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The top-level `content.response` path is absent.
    #[error("payload has no content.response array")]
    MissingResponse,
}

/// Entry-level failures: the one match entry is skipped and logged, siblings
/// in the same message continue.
#[derive(Error, Debug)]
pub enum EntryError {
    /// A required field is absent from the entry.
    #[error("missing field: {field}")]
    FieldMissing {
        /// Dotted path of the absent field.
        field: &'static str,
    },

    /// A team id has no entry in the team registry.
    #[error("unknown team id: {team_id}")]
    UnknownTeam {
        /// The unresolvable team id.
        team_id: i64,
    },

    /// The entry carried no usable "Final Score" odds.
    #[error("no final score odds in entry")]
    ZeroOdds,

    /// The odds could not be normalized.
    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}

/// Failures of the odds-normalization algorithm.
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// A score string did not parse as `"H-A"` with integer goal counts.
    #[error("malformed score string: {score:?}")]
    MalformedScore {
        /// The offending score string.
        score: String,
    },

    /// The summed implied probabilities were zero; nothing to normalize.
    #[error("total implied probability is zero")]
    ZeroTotalProbability,
}

/// Batch-level persistence failures. The transaction is rolled back in full
/// before this propagates.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Startup-fatal connectivity failures: the process cannot run without a
/// reachable broker and store.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The broker could not be reached.
    #[error("broker unreachable at {url}: {reason}")]
    Broker {
        /// Broker URL that failed.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The database could not be reached after retries.
    #[error("database unreachable after {attempts} attempts: {reason}")]
    Database {
        /// Number of connection attempts made.
        attempts: u32,
        /// Reason for the final failure.
        reason: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ProcessorError>;
