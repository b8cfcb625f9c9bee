//! Transform engine: fills the fact and dimension tables from staging.
//!
//! Five `INSERT ... SELECT` statements run in a fixed order: songplays,
//! users, songs, artists, time. The statement text is the same for both
//! dialects.
//!
//! The `start_time` key is the event timestamp truncated to the hour and
//! rendered as the integer `YYYYMMDDHH`. songplays and time both splice in
//! the expression from `start_time_key!` so the fact rows always join to
//! their hour bucket.
//!
//! Dimension inserts are guarded with `NOT IN (SELECT ... FROM <dim>)` and
//! are therefore append-only: a key already present is never inserted again
//! and never updated. songplays and time carry no guard, and a second run
//! over the same staging data appends the same rows again.

use crate::error::DwhResult;
use crate::warehouse::{Stage, StageReport, Step, Warehouse};

/// Hour-granularity integer key derived from a timestamp column.
macro_rules! start_time_key {
    ($ts:literal) => {
        concat!("TO_CHAR(", $ts, ", 'YYYYMMDDHH24')::INTEGER")
    };
}

/// One row per NextSong event with a user and a timestamp. Events with no
/// matching song keep NULL song_id and artist_id.
pub const SONGPLAYS_INSERT: &str = concat!(
    "\
INSERT INTO songplays (
    start_time,
    user_id,
    level,
    song_id,
    artist_id,
    session_id,
    location,
    user_agent
)
SELECT
    ",
    start_time_key!("se.ts"),
    " AS start_time,
    se.userId                               AS user_id,
    se.level,
    ss.song_id,
    ss.artist_id,
    se.sessionId                            AS session_id,
    se.location,
    se.userAgent                            AS user_agent
FROM staging_events se
LEFT OUTER JOIN staging_songs ss
    ON  se.artist = ss.artist_name
    AND se.song   = ss.title
    AND se.length = ss.duration
WHERE se.page = 'NextSong'
  AND se.userId IS NOT NULL
  AND se.ts IS NOT NULL"
);

pub const USERS_INSERT: &str = "\
INSERT INTO users (
    user_id,
    first_name,
    last_name,
    gender,
    level
)
SELECT DISTINCT
    userId,
    firstName,
    lastName,
    gender,
    level
FROM staging_events
WHERE page = 'NextSong'
  AND userId IS NOT NULL
  AND userId NOT IN (SELECT DISTINCT user_id FROM users)";

pub const SONGS_INSERT: &str = "\
INSERT INTO songs (
    song_id,
    title,
    artist_id,
    year,
    duration
)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs
WHERE song_id NOT IN (SELECT DISTINCT song_id FROM songs)";

pub const ARTISTS_INSERT: &str = "\
INSERT INTO artists (
    artist_id,
    name,
    location,
    latitude,
    longitude
)
SELECT DISTINCT
    artist_id,
    artist_name      AS name,
    artist_location  AS location,
    artist_latitude  AS latitude,
    artist_longitude AS longitude
FROM staging_songs
WHERE artist_id NOT IN (SELECT DISTINCT artist_id FROM artists)";

/// Every event timestamp, whatever the page, becomes an hour bucket.
/// Weekday counts from Sunday = 0.
pub const TIME_INSERT: &str = concat!(
    "\
INSERT INTO time (
    start_time,
    hour,
    day,
    week,
    month,
    year,
    weekday
)
SELECT DISTINCT
    ",
    start_time_key!("ts"),
    " AS start_time,
    EXTRACT(hour  FROM ts)               AS hour,
    EXTRACT(day   FROM ts)               AS day,
    EXTRACT(week  FROM ts)               AS week,
    EXTRACT(month FROM ts)               AS month,
    EXTRACT(year  FROM ts)               AS year,
    EXTRACT(dow   FROM ts)               AS weekday
FROM staging_events
WHERE ts IS NOT NULL"
);

/// The five inserts in execution order, as `(table, statement)`.
pub const INSERTS: [(&str, &str); 5] = [
    ("songplays", SONGPLAYS_INSERT),
    ("users", USERS_INSERT),
    ("songs", SONGS_INSERT),
    ("artists", ARTISTS_INSERT),
    ("time", TIME_INSERT),
];

pub fn insert_steps() -> Vec<Step> {
    INSERTS
        .iter()
        .map(|(table, sql)| Step::sql(format!("INSERT {table}"), *sql))
        .collect()
}

/// Run the five inserts against the current staging contents.
pub async fn populate_warehouse(wh: &mut Warehouse) -> DwhResult<StageReport> {
    wh.run_stage(Stage::InsertTables, insert_steps()).await
}
