//! Schema manager: table definitions and the drop/create stages.
//!
//! The seven warehouse tables are described once as typed [`TableDef`]s and
//! rendered to DDL per [`Dialect`]. None of the tables carries a foreign key,
//! so drops and creates run in a fixed order without dependency handling.
//!
//! Redshift treats `PRIMARY KEY` as an informational constraint and never
//! enforces it. The Postgres rendering therefore omits key constraints so the
//! dimension and fact tables accept exactly the same rows on both engines.

use crate::config::Dialect;
use crate::error::DwhResult;
use crate::warehouse::{Stage, StageReport, Step, Warehouse};

/// Column data types used by the warehouse tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar,
    Integer,
    BigInt,
    Float,
    Numeric,
    Timestamp,
}

impl ColumnType {
    /// SQL type name. Identical in both dialects.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// One column of a warehouse table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub not_null: bool,
    /// Auto-incrementing surrogate key starting at 0.
    pub identity: bool,
    /// Redshift `SORTKEY`.
    pub sort_key: bool,
    /// Redshift `DISTKEY`.
    pub dist_key: bool,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        not_null: false,
        identity: false,
        sort_key: false,
        dist_key: false,
    }
}

impl ColumnDef {
    const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    const fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    const fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    fn render(&self, dialect: Dialect) -> String {
        let mut out = format!("{:<16} {}", self.name, self.ty.as_sql());
        if self.identity {
            out.push_str(match dialect {
                Dialect::Redshift => " IDENTITY(0,1)",
                Dialect::Postgres => " GENERATED BY DEFAULT AS IDENTITY (START WITH 0 MINVALUE 0)",
            });
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if dialect == Dialect::Redshift {
            if self.sort_key {
                out.push_str(" SORTKEY");
            }
            if self.dist_key {
                out.push_str(" DISTKEY");
            }
        }
        out
    }
}

/// What a table is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// Raw landing zone, bulk-loaded from JSON and rebuilt every run.
    Staging,
    Fact,
    Dimension,
}

/// A warehouse table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub role: TableRole,
    pub columns: &'static [ColumnDef],
    /// Informational primary key (Redshift only).
    pub primary_key: Option<&'static str>,
    /// Redshift `DISTSTYLE ALL`: a full copy of the table on every node.
    pub diststyle_all: bool,
}

impl TableDef {
    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// `DROP TABLE IF EXISTS` for this table.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table in the given dialect.
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect();
        if let (Dialect::Redshift, Some(pk)) = (dialect, self.primary_key) {
            lines.push(format!("    PRIMARY KEY ({pk})"));
        }

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.name,
            lines.join(",\n")
        );
        if dialect == Dialect::Redshift && self.diststyle_all {
            sql.push_str(" DISTSTYLE ALL");
        }
        sql
    }
}

use ColumnType::{BigInt, Float, Integer, Numeric, Timestamp, Varchar};

// ── Staging tables ─────────────────────────────────────────────────────────

/// One row per raw log event. Column order is the order of the JSONPaths
/// mapping document for the event log.
pub const STAGING_EVENTS: TableDef = TableDef {
    name: "staging_events",
    role: TableRole::Staging,
    columns: &[
        col("artist", Varchar),
        col("auth", Varchar),
        col("firstName", Varchar),
        col("gender", Varchar),
        col("itemInSession", Integer),
        col("lastName", Varchar),
        col("length", Float),
        col("level", Varchar),
        col("location", Varchar),
        col("method", Varchar),
        col("page", Varchar),
        col("registration", Timestamp),
        col("sessionId", Integer),
        col("song", Varchar),
        col("status", Integer),
        col("ts", Timestamp),
        col("userAgent", Varchar),
        col("userId", Varchar),
    ],
    primary_key: None,
    diststyle_all: false,
};

/// One row per song metadata record.
pub const STAGING_SONGS: TableDef = TableDef {
    name: "staging_songs",
    role: TableRole::Staging,
    columns: &[
        col("num_songs", Integer),
        col("artist_id", Varchar),
        col("artist_latitude", Float),
        col("artist_longitude", Float),
        col("artist_location", Varchar),
        col("artist_name", Varchar),
        col("song_id", Varchar),
        col("title", Varchar),
        col("duration", Float),
        col("year", Integer),
    ],
    primary_key: None,
    diststyle_all: false,
};

// ── Analytics tables ───────────────────────────────────────────────────────

/// Fact table: one row per NextSong play. Sorted by start_time and
/// distributed by song_id so fact-to-song joins stay node-local.
pub const SONGPLAYS: TableDef = TableDef {
    name: "songplays",
    role: TableRole::Fact,
    columns: &[
        col("songplay_id", BigInt).identity().not_null(),
        col("start_time", Integer).not_null().sort_key(),
        col("user_id", Varchar).not_null(),
        col("level", Varchar),
        col("song_id", Varchar).dist_key(),
        col("artist_id", Varchar),
        col("session_id", Integer),
        col("location", Varchar),
        col("user_agent", Varchar),
    ],
    primary_key: Some("songplay_id"),
    diststyle_all: false,
};

pub const USERS: TableDef = TableDef {
    name: "users",
    role: TableRole::Dimension,
    columns: &[
        col("user_id", Varchar).not_null().sort_key(),
        col("first_name", Varchar).not_null(),
        col("last_name", Varchar).not_null(),
        col("gender", Varchar),
        col("level", Varchar),
    ],
    primary_key: Some("user_id"),
    diststyle_all: true,
};

pub const SONGS: TableDef = TableDef {
    name: "songs",
    role: TableRole::Dimension,
    columns: &[
        col("song_id", Varchar).not_null().sort_key().dist_key(),
        col("title", Varchar).not_null(),
        col("artist_id", Varchar).not_null(),
        col("year", Integer),
        col("duration", Numeric).not_null(),
    ],
    primary_key: Some("song_id"),
    diststyle_all: false,
};

pub const ARTISTS: TableDef = TableDef {
    name: "artists",
    role: TableRole::Dimension,
    columns: &[
        col("artist_id", Varchar),
        col("name", Varchar).not_null(),
        col("location", Varchar),
        col("latitude", Float),
        col("longitude", Float),
    ],
    primary_key: Some("artist_id"),
    diststyle_all: true,
};

/// Hour buckets keyed by the integer `YYYYMMDDHH` start_time.
pub const TIME: TableDef = TableDef {
    name: "time",
    role: TableRole::Dimension,
    columns: &[
        col("start_time", Integer).not_null(),
        col("hour", Integer).not_null(),
        col("day", Integer).not_null(),
        col("week", Integer).not_null(),
        col("month", Integer).not_null(),
        col("year", Integer).not_null(),
        col("weekday", Integer).not_null(),
    ],
    primary_key: Some("start_time"),
    diststyle_all: true,
};

/// All tables in drop/create order.
pub const TABLES: [&TableDef; 7] = [
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &SONGPLAYS,
    &USERS,
    &SONGS,
    &ARTISTS,
    &TIME,
];

/// Look up a table definition by name.
pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}

/// One `DROP TABLE IF EXISTS` step per table.
pub fn drop_steps() -> Vec<Step> {
    TABLES
        .iter()
        .map(|t| Step::sql(format!("DROP {}", t.name), t.drop_sql()))
        .collect()
}

/// One `CREATE TABLE IF NOT EXISTS` step per table.
pub fn create_steps(dialect: Dialect) -> Vec<Step> {
    TABLES
        .iter()
        .map(|t| Step::sql(format!("CREATE {}", t.name), t.create_sql(dialect)))
        .collect()
}

/// Drop then recreate every table. Destroys all previously loaded data.
pub async fn reset_schema(wh: &mut Warehouse) -> DwhResult<Vec<StageReport>> {
    let dropped = wh.run_stage(Stage::DropTables, drop_steps()).await?;
    let created = wh
        .run_stage(Stage::CreateTables, create_steps(wh.dialect()))
        .await?;
    Ok(vec![dropped, created])
}
