//! sparkify_dwh: batch ETL for the Sparkify star-schema warehouse.
//!
//! Raw JSON event logs and song metadata are bulk-loaded into two staging
//! tables, then reshaped with set-based SQL into one fact table (songplays)
//! and four dimension tables (users, songs, artists, time).
//!
//! # Stages
//!
//! | stage | module | statements |
//! |---|---|---|
//! | drop / create | [`schema`] | 7 `DROP TABLE IF EXISTS`, 7 `CREATE TABLE IF NOT EXISTS` |
//! | load staging | [`loader`], [`staging`] | 2 bulk `COPY` |
//! | insert tables | [`transform`] | 5 `INSERT ... SELECT` |
//!
//! Every stage runs over one connection held by a [`warehouse::Warehouse`];
//! [`pipeline`] sequences the stages for each entry point.
//!
//! # Dialects
//!
//! Production targets Amazon Redshift, which reads the sources straight from
//! S3. The same pipeline runs against PostgreSQL for local development: DDL
//! is rendered without Redshift layout hints and the staging load is done
//! client side from local files.

pub mod config;
pub mod error;
pub mod jsonpaths;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod staging;
pub mod transform;
pub mod warehouse;
