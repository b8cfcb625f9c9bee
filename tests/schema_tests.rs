//! Integration tests for the drop/create stages.
//!
//! These tests run the schema manager against a real PostgreSQL container
//! using the postgres dialect and verify the resulting catalog.

mod common;

use common::TestDb;
use sparkify_dwh::schema::{self, TABLES, reset_schema};
use sparkify_dwh::warehouse::{Stage, Warehouse};

fn pg_type(ty: schema::ColumnType) -> &'static str {
    match ty {
        schema::ColumnType::Varchar => "character varying",
        schema::ColumnType::Integer => "integer",
        schema::ColumnType::BigInt => "bigint",
        schema::ColumnType::Float => "double precision",
        schema::ColumnType::Numeric => "numeric",
        schema::ColumnType::Timestamp => "timestamp without time zone",
    }
}

// ── Drop ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_drop_on_empty_database_succeeds() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    let report = wh.run_stage(Stage::DropTables, schema::drop_steps()).await.unwrap();
    wh.close().await;

    assert_eq!(report.steps.len(), 7);
    assert_eq!(report.total_rows(), 0);
    for table in TABLES {
        assert!(!db.table_exists(table.name).await);
    }
}

#[tokio::test]
async fn test_drop_twice_is_idempotent() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    reset_schema(&mut wh).await.unwrap();
    db.execute("INSERT INTO users VALUES ('1', 'Ava', 'Lee', 'F', 'free')").await;

    wh.run_stage(Stage::DropTables, schema::drop_steps()).await.unwrap();
    wh.run_stage(Stage::DropTables, schema::drop_steps()).await.unwrap();
    wh.close().await;

    for table in TABLES {
        assert!(!db.table_exists(table.name).await, "{} should be gone", table.name);
    }
}

// ── Create ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reset_creates_seven_empty_tables() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    let reports = reset_schema(&mut wh).await.unwrap();
    wh.close().await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].stage, Stage::DropTables);
    assert_eq!(reports[1].stage, Stage::CreateTables);

    let tables: i64 = db
        .query_scalar("SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'")
        .await;
    assert_eq!(tables, 7);

    for table in TABLES {
        assert_eq!(db.count(table.name).await, 0, "{} should be empty", table.name);
    }
}

#[tokio::test]
async fn test_created_columns_match_definitions() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    reset_schema(&mut wh).await.unwrap();
    wh.close().await;

    for table in TABLES {
        let columns: Vec<(String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table.name)
        .fetch_all(&db.pool)
        .await
        .unwrap();

        let expected: Vec<(String, String)> = table
            .columns
            .iter()
            .map(|c| (c.name.to_lowercase(), pg_type(c.ty).to_string()))
            .collect();
        assert_eq!(columns, expected, "columns of {}", table.name);
    }
}

#[tokio::test]
async fn test_reset_destroys_loaded_rows() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    reset_schema(&mut wh).await.unwrap();
    db.execute("INSERT INTO songs VALUES ('SID1', 'S', 'AID1', 1999, 200.0)").await;
    assert_eq!(db.count("songs").await, 1);

    reset_schema(&mut wh).await.unwrap();
    wh.close().await;
    assert_eq!(db.count("songs").await, 0);
}

#[tokio::test]
async fn test_songplay_identity_starts_at_zero() {
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    reset_schema(&mut wh).await.unwrap();
    wh.close().await;

    db.execute("INSERT INTO songplays (start_time, user_id) VALUES (2023030113, '10'), (2023030114, '10')")
        .await;
    let ids: Vec<i64> = sqlx::query_scalar("SELECT songplay_id FROM songplays ORDER BY songplay_id")
        .fetch_all(&db.pool)
        .await
        .unwrap();
    assert_eq!(ids, vec![0, 1]);
}

#[tokio::test]
async fn test_dimension_keys_are_not_enforced() {
    // Redshift primary keys are informational; the postgres rendering keeps
    // that behaviour so duplicate keys are accepted.
    let db = TestDb::new().await;
    let cfg = db.fixture_config();

    let mut wh = Warehouse::connect(&cfg).await.unwrap();
    reset_schema(&mut wh).await.unwrap();
    wh.close().await;

    db.execute("INSERT INTO time VALUES (2023030113, 13, 1, 9, 3, 2023, 3)").await;
    db.execute("INSERT INTO time VALUES (2023030113, 13, 1, 9, 3, 2023, 3)").await;
    assert_eq!(db.count("time").await, 2);
}
