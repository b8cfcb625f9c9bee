//! Error types for sparkify_dwh.
//!
//! All errors that can occur while resetting, loading or transforming the
//! warehouse are represented by [`DwhError`]. Errors are propagated via
//! `Result<T, DwhError>` up to the process boundary; nothing is retried and
//! nothing is recovered locally.
//!
//! # Error Classification
//!
//! Errors are classified into five categories that mirror how far a run got:
//! - **Config**: the configuration file is missing, malformed or invalid.
//!   Raised before any connection is opened.
//! - **Connection**: the warehouse could not be reached or rejected the
//!   credentials. Raised before any statement runs.
//! - **Execution**: a DDL/DML/COPY statement failed, or a JSONPaths mapping
//!   document is unusable. Aborts the remaining statements of the stage.
//! - **Data**: a source record could not be decoded during a client-side
//!   load. Aborts the whole staging load (zero error tolerance).
//! - **Internal**: bugs.

use std::fmt;

/// Primary error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DwhError {
    // ── Config errors: fatal at startup ─────────────────────────────────
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or is missing a section/key.
    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A configuration value is present but unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // ── Connection errors: fatal before any statement ───────────────────
    /// The warehouse connection could not be established.
    #[error("cannot connect to warehouse at {endpoint}: {}", describe_pg_error(.source))]
    Connection {
        endpoint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    // ── Execution errors: abort the remaining stage ─────────────────────
    /// A statement failed while executing or committing.
    #[error("stage '{stage}' failed at {label}: {}", describe_pg_error(.source))]
    Statement {
        stage: &'static str,
        label: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A JSONPaths mapping document is malformed or does not fit the table.
    #[error("invalid JSON mapping for {table}: {reason}")]
    Mapping { table: String, reason: String },

    // ── Data errors: abort the staging load ─────────────────────────────
    /// A source record could not be decoded into a staging row.
    #[error("cannot load {table} from {location} (record {record}): {reason}")]
    LoadData {
        table: String,
        location: String,
        record: u64,
        reason: String,
    },

    /// A source file or directory could not be read.
    #[error("cannot read source {location}: {source}")]
    SourceIo {
        location: String,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors: should not happen ──────────────────────────────
    /// An unexpected internal error. Indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of error kind for logging and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwhErrorKind {
    Config,
    Connection,
    Execution,
    Data,
    Internal,
}

impl fmt::Display for DwhErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DwhErrorKind::Config => write!(f, "CONFIG"),
            DwhErrorKind::Connection => write!(f, "CONNECTION"),
            DwhErrorKind::Execution => write!(f, "EXECUTION"),
            DwhErrorKind::Data => write!(f, "DATA"),
            DwhErrorKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl DwhError {
    /// Classify the error.
    pub fn kind(&self) -> DwhErrorKind {
        match self {
            DwhError::ConfigRead { .. }
            | DwhError::ConfigParse { .. }
            | DwhError::InvalidConfig(_) => DwhErrorKind::Config,

            DwhError::Connection { .. } => DwhErrorKind::Connection,

            DwhError::Statement { .. } | DwhError::Mapping { .. } => DwhErrorKind::Execution,

            DwhError::LoadData { .. } | DwhError::SourceIo { .. } => DwhErrorKind::Data,

            DwhError::Internal(_) => DwhErrorKind::Internal,
        }
    }

    /// Whether the error happened before any statement reached the warehouse.
    ///
    /// When true the warehouse is untouched by this run.
    pub fn before_first_statement(&self) -> bool {
        matches!(self.kind(), DwhErrorKind::Config | DwhErrorKind::Connection)
    }

    /// The SQLSTATE reported by the server, if the error came from one.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            DwhError::Connection { source, .. } | DwhError::Statement { source, .. } => {
                source.code().map(|c| c.code())
            }
            _ => None,
        }
    }
}

/// Render a driver error with the server's SQLSTATE, message and detail.
///
/// `tokio_postgres::Error`'s own `Display` only says "db error" for server
/// errors, which hides the reason a statement failed.
pub fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut msg = format!("{} [{}]", db.message(), db.code().code());
            if let Some(detail) = db.detail() {
                msg.push_str(": ");
                msg.push_str(detail);
            }
            msg
        }
        None => err.to_string(),
    }
}

/// Result alias used throughout the crate.
pub type DwhResult<T> = Result<T, DwhError>;
