//! Bulk loader: fills the two staging tables from JSON sources.
//!
//! Each staging table is loaded by exactly one bulk step:
//!
//! - `staging_events` from the event log, decoded with an explicit JSONPaths
//!   mapping document and epoch-millisecond timestamps;
//! - `staging_songs` from song metadata, decoded by matching object keys to
//!   column names.
//!
//! On Redshift the step is a server-side `COPY ... FROM 's3://...'`
//! authorised by the configured IAM role. On Postgres the same load is
//! performed client side (see [`crate::staging`]). Both paths apply
//! `TRUNCATECOLUMNS BLANKSASNULL EMPTYASNULL` and set no error tolerance, so
//! a single undecodable record aborts the whole step. Loaded row counts are
//! reported but not validated.

use std::fmt;

use crate::config::{self, Dialect, DwhConfig};
use crate::error::DwhResult;
use crate::schema::{STAGING_EVENTS, STAGING_SONGS, TableDef};
use crate::warehouse::{Stage, StageReport, Step, Warehouse};

/// How timestamp columns are encoded in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `YYYY-MM-DD HH:MI:SS` strings.
    Default,
    /// Integer (or integral float) milliseconds since the Unix epoch.
    EpochMillisecs,
}

/// Format options shared by the server-side and client-side load paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub time_format: TimeFormat,
    /// Truncate VARCHAR values to the column width instead of failing.
    pub truncate_columns: bool,
    /// Load whitespace-only strings as NULL.
    pub blanks_as_null: bool,
    /// Load empty strings as NULL.
    pub empty_as_null: bool,
}

impl LoadOptions {
    /// Options for the event log.
    pub const EVENTS: LoadOptions = LoadOptions {
        time_format: TimeFormat::EpochMillisecs,
        truncate_columns: true,
        blanks_as_null: true,
        empty_as_null: true,
    };

    /// Options for song metadata.
    pub const SONGS: LoadOptions = LoadOptions {
        time_format: TimeFormat::Default,
        truncate_columns: true,
        blanks_as_null: true,
        empty_as_null: true,
    };

    /// Trailing Redshift `COPY` format clauses.
    fn redshift_clauses(&self) -> Vec<String> {
        let mut clauses = Vec::new();
        if self.time_format == TimeFormat::EpochMillisecs {
            clauses.push("TIMEFORMAT AS 'epochmillisecs'".to_string());
        }
        let flags: Vec<&str> = [
            (self.truncate_columns, "TRUNCATECOLUMNS"),
            (self.blanks_as_null, "BLANKSASNULL"),
            (self.empty_as_null, "EMPTYASNULL"),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
        .collect();
        if !flags.is_empty() {
            clauses.push(flags.join(" "));
        }
        clauses
    }
}

/// How JSON objects map onto staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonMapping {
    /// Object keys equal the (lower-case) column names.
    Auto,
    /// Object keys equal the column names, compared case-insensitively.
    AutoIgnoreCase,
    /// A JSONPaths document at this location, one path per column.
    Paths(String),
}

impl JsonMapping {
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            config::JSON_AUTO => JsonMapping::Auto,
            config::JSON_AUTO_IGNORECASE => JsonMapping::AutoIgnoreCase,
            _ => JsonMapping::Paths(value.trim().to_string()),
        }
    }
}

impl fmt::Display for JsonMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonMapping::Auto => f.write_str(config::JSON_AUTO),
            JsonMapping::AutoIgnoreCase => f.write_str(config::JSON_AUTO_IGNORECASE),
            JsonMapping::Paths(location) => write!(f, "jsonpaths {location}"),
        }
    }
}

/// Everything needed to bulk-load one staging table.
#[derive(Debug, Clone)]
pub struct StagingLoad {
    pub table: &'static TableDef,
    /// Source location as configured (`s3://…`, a path, or `file://…`).
    pub source: String,
    pub mapping: JsonMapping,
    pub options: LoadOptions,
}

/// The two staging loads, events first.
pub fn staging_loads(config: &DwhConfig) -> [StagingLoad; 2] {
    [
        StagingLoad {
            table: &STAGING_EVENTS,
            source: config.s3.log_data.clone(),
            mapping: JsonMapping::from_config(&config.s3.log_jsonpath),
            options: LoadOptions::EVENTS,
        },
        StagingLoad {
            table: &STAGING_SONGS,
            source: config.s3.song_data.clone(),
            mapping: JsonMapping::from_config(&config.s3.song_jsonpath),
            options: LoadOptions::SONGS,
        },
    ]
}

/// Quote a value as a SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render the Redshift `COPY` statement for one staging load.
pub fn copy_sql(load: &StagingLoad, config: &DwhConfig) -> String {
    let json_arg = match &load.mapping {
        JsonMapping::Auto => quote_literal(config::JSON_AUTO),
        JsonMapping::AutoIgnoreCase => quote_literal(config::JSON_AUTO_IGNORECASE),
        JsonMapping::Paths(location) => quote_literal(location),
    };

    let mut lines = vec![
        format!("COPY {}", load.table.name),
        format!("FROM {}", quote_literal(&load.source)),
        format!("JSON {json_arg}"),
        format!(
            "CREDENTIALS {}",
            quote_literal(&format!("aws_iam_role={}", config.iam_role.arn))
        ),
        format!("COMPUPDATE OFF REGION {}", quote_literal(&config.general.region)),
    ];
    lines.extend(load.options.redshift_clauses());
    lines.join("\n")
}

/// The load stage's steps for the configured dialect.
pub fn load_steps(config: &DwhConfig) -> Vec<Step> {
    staging_loads(config)
        .into_iter()
        .map(|load| {
            let label = format!("COPY {}", load.table.name);
            match config.general.dialect {
                Dialect::Redshift => Step::sql(label, copy_sql(&load, config)),
                Dialect::Postgres => Step::copy_local(label, load),
            }
        })
        .collect()
}

/// Bulk-load both staging tables.
pub async fn load_staging(wh: &mut Warehouse, config: &DwhConfig) -> DwhResult<StageReport> {
    wh.run_stage(Stage::LoadStaging, load_steps(config)).await
}
