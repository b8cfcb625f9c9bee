//! Client-side staging load for warehouses that cannot read object storage.
//!
//! Sources are read from the local filesystem, every JSON object is decoded
//! into one staging row with the same rules the warehouse `COPY` applies,
//! and rows are streamed to the server through a single binary
//! `COPY <table> (<columns>) FROM STDIN`. The first record that cannot be
//! decoded aborts the copy, so a failed step loads nothing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use futures_util::pin_mut;
use serde_json::{Map, Value};
use tokio_postgres::Transaction;
use tokio_postgres::binary_copy::BinaryCopyInWriter;
use tokio_postgres::types::{ToSql, Type};
use tracing::{debug, info};

use crate::config;
use crate::error::{DwhError, DwhResult};
use crate::jsonpaths::{self, JsonPath};
use crate::loader::{JsonMapping, LoadOptions, StagingLoad, TimeFormat};
use crate::schema::{ColumnDef, ColumnType, TableDef};
use crate::warehouse::{Stage, statement_error};

/// Redshift's default VARCHAR width in bytes; longer values are truncated
/// when `TRUNCATECOLUMNS` is set.
pub const VARCHAR_WIDTH: usize = 256;

/// A decoded staging value with its column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(Option<String>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Timestamp(Option<NaiveDateTime>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Text(v) => v.is_none(),
            Cell::Int(v) => v.is_none(),
            Cell::BigInt(v) => v.is_none(),
            Cell::Float(v) => v.is_none(),
            Cell::Timestamp(v) => v.is_none(),
        }
    }

    fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            Cell::Text(v) => v,
            Cell::Int(v) => v,
            Cell::BigInt(v) => v,
            Cell::Float(v) => v,
            Cell::Timestamp(v) => v,
        }
    }

    fn null_of(ty: ColumnType) -> Option<Cell> {
        match ty {
            ColumnType::Varchar => Some(Cell::Text(None)),
            ColumnType::Integer => Some(Cell::Int(None)),
            ColumnType::BigInt => Some(Cell::BigInt(None)),
            ColumnType::Float => Some(Cell::Float(None)),
            ColumnType::Timestamp => Some(Cell::Timestamp(None)),
            ColumnType::Numeric => None,
        }
    }
}

/// Wire type for a column in a binary copy.
fn wire_type(column: &ColumnDef) -> Option<Type> {
    match column.ty {
        ColumnType::Varchar => Some(Type::VARCHAR),
        ColumnType::Integer => Some(Type::INT4),
        ColumnType::BigInt => Some(Type::INT8),
        ColumnType::Float => Some(Type::FLOAT8),
        ColumnType::Timestamp => Some(Type::TIMESTAMP),
        // Binary NUMERIC needs a decimal type; no staging table uses it.
        ColumnType::Numeric => None,
    }
}

/// The `COPY ... FROM STDIN` command for a table.
pub fn copy_in_sql(table: &TableDef) -> String {
    format!(
        "COPY {} ({}) FROM STDIN (FORMAT binary)",
        table.name,
        table.column_names().join(", ")
    )
}

/// List the JSON files under a source location, in path order.
///
/// A file is returned as-is; a directory is walked recursively for `*.json`.
pub fn source_files(root: &Path) -> DwhResult<Vec<PathBuf>> {
    let io_err = |path: &Path, source| DwhError::SourceIo {
        location: path.display().to_string(),
        source,
    };

    let meta = std::fs::metadata(root).map_err(|e| io_err(root, e))?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let path = entry.map_err(|e| io_err(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// How a record's fields are located.
#[derive(Debug, Clone)]
enum Extractor {
    Auto { ignore_case: bool },
    Paths(Vec<JsonPath>),
}

/// Turns JSON records into staging rows for one table.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    table: &'static TableDef,
    extractor: Extractor,
    options: LoadOptions,
}

impl RecordDecoder {
    /// Decoder with automatic key matching.
    pub fn auto(table: &'static TableDef, ignore_case: bool, options: LoadOptions) -> Self {
        Self {
            table,
            extractor: Extractor::Auto { ignore_case },
            options,
        }
    }

    /// Decoder driven by a JSONPaths document. The path count must equal the
    /// table's column count.
    pub fn with_paths(
        table: &'static TableDef,
        document: &str,
        options: LoadOptions,
    ) -> DwhResult<Self> {
        let mapping_err = |reason: String| DwhError::Mapping {
            table: table.name.to_string(),
            reason,
        };
        let paths = jsonpaths::parse_document(document).map_err(mapping_err)?;
        if paths.len() != table.columns.len() {
            return Err(mapping_err(format!(
                "{} paths for {} columns",
                paths.len(),
                table.columns.len()
            )));
        }
        Ok(Self {
            table,
            extractor: Extractor::Paths(paths),
            options,
        })
    }

    /// Build the decoder for a load, reading the JSONPaths document if any.
    pub async fn for_load(load: &StagingLoad) -> DwhResult<Self> {
        match &load.mapping {
            JsonMapping::Auto => Ok(Self::auto(load.table, false, load.options)),
            JsonMapping::AutoIgnoreCase => Ok(Self::auto(load.table, true, load.options)),
            JsonMapping::Paths(location) => {
                let path = config::local_path(location);
                let document =
                    tokio::fs::read_to_string(&path)
                        .await
                        .map_err(|source| DwhError::SourceIo {
                            location: path.display().to_string(),
                            source,
                        })?;
                Self::with_paths(load.table, &document, load.options)
            }
        }
    }

    /// Decode one record into a row, or explain why it cannot be loaded.
    pub fn decode(&self, record: &Value) -> Result<Vec<Cell>, String> {
        let object = record
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", json_kind(record)))?;

        self.table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = match &self.extractor {
                    Extractor::Auto { ignore_case } => {
                        lookup_key(object, column.name, *ignore_case)
                    }
                    Extractor::Paths(paths) => paths[idx].eval(record),
                };
                coerce(column, value, &self.options)
                    .map_err(|reason| format!("column {}: {reason}", column.name))
            })
            .collect()
    }
}

fn lookup_key<'a>(
    object: &'a Map<String, Value>,
    column: &str,
    ignore_case: bool,
) -> Option<&'a Value> {
    if ignore_case {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    } else {
        object.get(&column.to_ascii_lowercase())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert one JSON value into a typed cell for `column`.
pub fn coerce(
    column: &ColumnDef,
    value: Option<&Value>,
    options: &LoadOptions,
) -> Result<Cell, String> {
    let null = Cell::null_of(column.ty)
        .ok_or_else(|| format!("{} columns cannot be loaded client side", column.ty.as_sql()))?;
    let value = match value {
        None | Some(Value::Null) => return Ok(null),
        Some(v) => v,
    };

    // Empty and blank strings become NULL for non-character columns too;
    // they carry no value to convert.
    if let Value::String(s) = value {
        let empty = s.is_empty();
        let blank = !empty && s.trim().is_empty();
        if column.ty != ColumnType::Varchar && (empty || blank) {
            return Ok(null);
        }
        if (empty && options.empty_as_null) || (blank && options.blanks_as_null) {
            return Ok(null);
        }
    }

    match column.ty {
        ColumnType::Varchar => {
            let mut text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            if text.len() > VARCHAR_WIDTH {
                if !options.truncate_columns {
                    return Err(format!(
                        "value is {} bytes, longer than VARCHAR({VARCHAR_WIDTH})",
                        text.len()
                    ));
                }
                truncate_bytes(&mut text, VARCHAR_WIDTH);
            }
            Ok(Cell::Text(Some(text)))
        }
        ColumnType::Integer => {
            let n = integral(value)?;
            i32::try_from(n)
                .map(|v| Cell::Int(Some(v)))
                .map_err(|_| format!("{n} does not fit in INTEGER"))
        }
        ColumnType::BigInt => integral(value).map(|v| Cell::BigInt(Some(v))),
        ColumnType::Float => float(value).map(|v| Cell::Float(Some(v))),
        ColumnType::Timestamp => {
            timestamp(value, options.time_format).map(|v| Cell::Timestamp(Some(v)))
        }
        ColumnType::Numeric => Ok(null),
    }
}

fn integral(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(v)
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                    _ => Err(format!("expected an integer, got {n}")),
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected an integer, got \"{s}\"")),
        other => Err(format!("expected an integer, got {}", json_kind(other))),
    }
}

fn float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("expected a number, got {n}")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("expected a number, got \"{s}\"")),
        other => Err(format!("expected a number, got {}", json_kind(other))),
    }
}

/// Fractional milliseconds are truncated. NaN, infinities and values outside
/// `i64` are rejected rather than saturated.
fn whole_millis(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

fn timestamp(value: &Value, format: TimeFormat) -> Result<NaiveDateTime, String> {
    match format {
        TimeFormat::EpochMillisecs => {
            let millis = match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().and_then(whole_millis))
                    .ok_or_else(|| format!("expected epoch milliseconds, got {n}"))?,
                Value::String(s) => {
                    let text = s.trim();
                    text.parse::<i64>()
                        .ok()
                        .or_else(|| text.parse::<f64>().ok().and_then(whole_millis))
                        .ok_or_else(|| format!("expected epoch milliseconds, got \"{s}\""))?
                }
                other => {
                    return Err(format!(
                        "expected epoch milliseconds, got {}",
                        json_kind(other)
                    ));
                }
            };
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| format!("epoch milliseconds {millis} out of range"))
        }
        TimeFormat::Default => {
            let text = value
                .as_str()
                .ok_or_else(|| format!("expected a timestamp string, got {}", json_kind(value)))?
                .trim();
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .ok_or_else(|| format!("expected YYYY-MM-DD HH:MI:SS, got \"{text}\""))
        }
    }
}

/// Cut a string to at most `max` bytes without splitting a character.
fn truncate_bytes(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

/// Stream every record under `load.source` into `load.table`.
///
/// Returns the number of rows the server reports as copied.
pub async fn copy_local(
    tx: &Transaction<'_>,
    stage: Stage,
    label: &str,
    load: &StagingLoad,
) -> DwhResult<u64> {
    let root = config::local_path(&load.source);
    let files = source_files(&root)?;
    let decoder = RecordDecoder::for_load(load).await?;
    let types = load
        .table
        .columns
        .iter()
        .map(|c| {
            wire_type(c).ok_or_else(|| {
                DwhError::Internal(format!(
                    "{}.{} has no binary copy type",
                    load.table.name, c.name
                ))
            })
        })
        .collect::<DwhResult<Vec<Type>>>()?;

    info!(
        table = load.table.name,
        source = %root.display(),
        files = files.len(),
        mapping = %load.mapping,
        "client-side load"
    );

    let sink = tx
        .copy_in(copy_in_sql(load.table).as_str())
        .await
        .map_err(|source| statement_error(stage, label, source))?;
    let writer = BinaryCopyInWriter::new(sink, &types);
    pin_mut!(writer);

    for file in &files {
        let location = file.display().to_string();
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|source| DwhError::SourceIo {
                location: location.clone(),
                source,
            })?;

        let mut record_no = 0u64;
        for record in serde_json::Deserializer::from_slice(&bytes).into_iter::<Value>() {
            record_no += 1;
            let load_err = |reason: String| DwhError::LoadData {
                table: load.table.name.to_string(),
                location: location.clone(),
                record: record_no,
                reason,
            };
            let record = record.map_err(|e| load_err(format!("malformed JSON: {e}")))?;
            let row = decoder.decode(&record).map_err(load_err)?;
            let params: Vec<&(dyn ToSql + Sync)> = row.iter().map(Cell::as_sql).collect();
            writer
                .as_mut()
                .write(&params)
                .await
                .map_err(|source| statement_error(stage, label, source))?;
        }
        debug!(
            table = load.table.name,
            file = %location,
            records = record_no,
            "source file streamed"
        );
    }

    writer
        .finish()
        .await
        .map_err(|source| statement_error(stage, label, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{STAGING_EVENTS, STAGING_SONGS};
    use serde_json::json;

    const EVENTS_PATHS: &str = r#"{"jsonpaths": [
        "$['artist']", "$['auth']", "$['firstName']", "$['gender']",
        "$['itemInSession']", "$['lastName']", "$['length']", "$['level']",
        "$['location']", "$['method']", "$['page']", "$['registration']",
        "$['sessionId']", "$['song']", "$['status']", "$['ts']",
        "$['userAgent']", "$['userId']"
    ]}"#;

    fn event() -> Value {
        json!({
            "artist": "Des'ree", "auth": "Logged In", "firstName": "Kaylee",
            "gender": "F", "itemInSession": 1, "lastName": "Summers",
            "length": 246.30812, "level": "free",
            "location": "Phoenix-Mesa-Scottsdale, AZ", "method": "PUT",
            "page": "NextSong", "registration": 1540344794796.0,
            "sessionId": 139, "song": "You Gotta Be", "status": 200,
            "ts": 1541106106796_i64, "userAgent": "Mozilla/5.0", "userId": "8"
        })
    }

    fn column(table: &TableDef, name: &str) -> ColumnDef {
        *table.columns.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_decode_event_with_paths() {
        let decoder =
            RecordDecoder::with_paths(&STAGING_EVENTS, EVENTS_PATHS, LoadOptions::EVENTS).unwrap();
        let row = decoder.decode(&event()).unwrap();
        assert_eq!(row.len(), 18);
        assert_eq!(row[0], Cell::Text(Some("Des'ree".into())));
        assert_eq!(row[4], Cell::Int(Some(1)));
        assert_eq!(row[6], Cell::Float(Some(246.30812)));
        let ts = DateTime::from_timestamp_millis(1_541_106_106_796).unwrap().naive_utc();
        assert_eq!(row[15], Cell::Timestamp(Some(ts)));
        assert_eq!(row[17], Cell::Text(Some("8".into())));
    }

    #[test]
    fn test_missing_and_empty_fields_load_null() {
        let decoder =
            RecordDecoder::with_paths(&STAGING_EVENTS, EVENTS_PATHS, LoadOptions::EVENTS).unwrap();
        let mut record = event();
        record["userId"] = json!("");
        record["artist"] = json!("   ");
        record.as_object_mut().unwrap().remove("song");
        record["length"] = Value::Null;
        let row = decoder.decode(&record).unwrap();
        assert!(row[17].is_null(), "empty string");
        assert!(row[0].is_null(), "blank string");
        assert!(row[13].is_null(), "missing key");
        assert!(row[6].is_null(), "json null");
    }

    #[test]
    fn test_path_count_must_match_columns() {
        let err = RecordDecoder::with_paths(
            &STAGING_EVENTS,
            r#"{"jsonpaths": ["$['artist']"]}"#,
            LoadOptions::EVENTS,
        )
        .unwrap_err();
        assert!(err.to_string().contains("1 paths for 18 columns"), "{err}");
    }

    #[test]
    fn test_decode_song_auto() {
        let decoder = RecordDecoder::auto(&STAGING_SONGS, false, LoadOptions::SONGS);
        let record = json!({
            "num_songs": 1, "artist_id": "ARJIE2Y1187B994AB7", "artist_latitude": null,
            "artist_longitude": null, "artist_location": "", "artist_name": "Line Renaud",
            "song_id": "SOUPIRU12A6D4FA1E1", "title": "Der Kleine Dompfaff",
            "duration": 152.92036, "year": 0
        });
        let row = decoder.decode(&record).unwrap();
        assert_eq!(row[1], Cell::Text(Some("ARJIE2Y1187B994AB7".into())));
        assert!(row[2].is_null());
        assert!(row[4].is_null(), "empty location loads as NULL");
        assert_eq!(row[8], Cell::Float(Some(152.92036)));
        assert_eq!(row[9], Cell::Int(Some(0)));
    }

    #[test]
    fn test_auto_is_case_sensitive_unless_ignorecase() {
        let record = json!({"Song_ID": "S1"});
        let strict = RecordDecoder::auto(&STAGING_SONGS, false, LoadOptions::SONGS);
        assert!(strict.decode(&record).unwrap()[6].is_null());
        let relaxed = RecordDecoder::auto(&STAGING_SONGS, true, LoadOptions::SONGS);
        assert_eq!(relaxed.decode(&record).unwrap()[6], Cell::Text(Some("S1".into())));
    }

    #[test]
    fn test_non_object_record_rejected() {
        let decoder = RecordDecoder::auto(&STAGING_SONGS, false, LoadOptions::SONGS);
        let err = decoder.decode(&json!([1, 2])).unwrap_err();
        assert_eq!(err, "expected a JSON object, got an array");
    }

    #[test]
    fn test_bad_value_names_column() {
        let decoder = RecordDecoder::auto(&STAGING_SONGS, false, LoadOptions::SONGS);
        let err = decoder.decode(&json!({"year": "nineteen"})).unwrap_err();
        assert_eq!(err, "column year: expected an integer, got \"nineteen\"");
    }

    #[test]
    fn test_coerce_numbers_into_text_and_ints() {
        let user_id = column(&STAGING_EVENTS, "userId");
        assert_eq!(
            coerce(&user_id, Some(&json!(26)), &LoadOptions::EVENTS).unwrap(),
            Cell::Text(Some("26".into()))
        );
        let session = column(&STAGING_EVENTS, "sessionId");
        assert_eq!(
            coerce(&session, Some(&json!("583")), &LoadOptions::EVENTS).unwrap(),
            Cell::Int(Some(583))
        );
        assert_eq!(
            coerce(&session, Some(&json!(12.0)), &LoadOptions::EVENTS).unwrap(),
            Cell::Int(Some(12))
        );
        assert!(coerce(&session, Some(&json!(12.5)), &LoadOptions::EVENTS).is_err());
        assert!(coerce(&session, Some(&json!(4_000_000_000_i64)), &LoadOptions::EVENTS).is_err());
        assert!(coerce(&session, Some(&json!("")), &LoadOptions::EVENTS).unwrap().is_null());
    }

    #[test]
    fn test_epoch_millis_accepts_float_and_string() {
        let ts = column(&STAGING_EVENTS, "ts");
        let expected = DateTime::from_timestamp_millis(1_677_678_300_000).unwrap().naive_utc();
        for value in [
            json!(1_677_678_300_000_i64),
            json!(1_677_678_300_000.0),
            json!("1677678300000"),
        ] {
            assert_eq!(
                coerce(&ts, Some(&value), &LoadOptions::EVENTS).unwrap(),
                Cell::Timestamp(Some(expected))
            );
        }
        assert_eq!(expected.to_string(), "2023-03-01 13:45:00");
        assert!(coerce(&ts, Some(&json!(true)), &LoadOptions::EVENTS).is_err());
    }

    #[test]
    fn test_epoch_millis_rejects_non_finite_and_out_of_range() {
        let ts = column(&STAGING_EVENTS, "ts");
        for value in [
            json!("NaN"),
            json!("inf"),
            json!("-infinity"),
            json!("1e300"),
            json!(1e300),
        ] {
            let err = coerce(&ts, Some(&value), &LoadOptions::EVENTS).unwrap_err();
            assert!(err.starts_with("expected epoch milliseconds"), "{value}: {err}");
        }
    }

    #[test]
    fn test_default_time_format() {
        let ts = column(&STAGING_EVENTS, "ts");
        let cell = coerce(&ts, Some(&json!("2023-03-01 13:45:00")), &LoadOptions::SONGS).unwrap();
        assert_eq!(
            cell,
            Cell::Timestamp(
                NaiveDateTime::parse_from_str("2023-03-01 13:45:00", "%Y-%m-%d %H:%M:%S").ok()
            )
        );
        assert!(coerce(&ts, Some(&json!(1_677_678_300_000_i64)), &LoadOptions::SONGS).is_err());
    }

    #[test]
    fn test_truncate_columns() {
        let title = column(&STAGING_SONGS, "title");
        let long = "é".repeat(200); // 400 bytes
        match coerce(&title, Some(&json!(long)), &LoadOptions::SONGS).unwrap() {
            Cell::Text(Some(s)) => {
                assert_eq!(s.len(), VARCHAR_WIDTH);
                assert!(s.chars().all(|c| c == 'é'));
            }
            other => panic!("unexpected cell {other:?}"),
        }

        let strict = LoadOptions {
            truncate_columns: false,
            ..LoadOptions::SONGS
        };
        assert!(coerce(&title, Some(&json!("x".repeat(300))), &strict).is_err());
    }

    #[test]
    fn test_truncate_bytes_respects_char_boundary() {
        let mut s = String::from("aé");
        truncate_bytes(&mut s, 2);
        assert_eq!(s, "a");
    }

    #[test]
    fn test_copy_in_sql() {
        assert_eq!(
            copy_in_sql(&STAGING_SONGS),
            "COPY staging_songs (num_songs, artist_id, artist_latitude, artist_longitude, \
             artist_location, artist_name, song_id, title, duration, year) FROM STDIN (FORMAT binary)"
        );
    }

    #[test]
    fn test_source_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("A").join("B");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("TRB.json"), "{}").unwrap();
        std::fs::write(dir.path().join("TRA.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let files = source_files(dir.path()).unwrap();
        assert_eq!(files, vec![nested.join("TRB.json"), dir.path().join("TRA.json")]);

        let single = source_files(&dir.path().join("TRA.json")).unwrap();
        assert_eq!(single.len(), 1);

        assert!(matches!(
            source_files(&dir.path().join("missing")),
            Err(DwhError::SourceIo { .. })
        ));
    }
}
