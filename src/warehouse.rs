//! Warehouse connection and the stage executor.
//!
//! A [`Warehouse`] owns the single connection used for a whole run. Every
//! stage is a list of [`Step`]s executed strictly in order; each step is
//! either a SQL statement sent over the simple-query protocol or a
//! client-side bulk load streamed through `COPY ... FROM STDIN`.
//!
//! Commit granularity follows [`StageMode`]: by default each step runs in its
//! own transaction committed immediately, so a failure leaves the earlier
//! steps of the stage applied. In `per_stage` mode the whole stage shares one
//! transaction that is rolled back when any step fails.

use std::fmt;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, Transaction};
use tracing::{debug, error, info, warn};

use crate::config::{Dialect, DwhConfig, StageMode};
use crate::error::{DwhError, DwhResult, describe_pg_error};
use crate::loader::StagingLoad;
use crate::staging;

/// The four stages of a full pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DropTables,
    CreateTables,
    LoadStaging,
    InsertTables,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DropTables => "drop_tables",
            Stage::CreateTables => "create_tables",
            Stage::LoadStaging => "load_staging",
            Stage::InsertTables => "insert_tables",
        }
    }

    /// Progress marker printed when the stage starts.
    pub fn marker(&self) -> &'static str {
        match self {
            Stage::DropTables => "start drop tables",
            Stage::CreateTables => "start create tables",
            Stage::LoadStaging => "start load staging tables",
            Stage::InsertTables => "start insert tables",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step does.
#[derive(Debug, Clone)]
pub enum Action {
    /// Run one SQL statement.
    Execute(String),
    /// Decode local JSON sources and stream them into a staging table.
    CopyLocal(StagingLoad),
}

/// One unit of work inside a stage.
#[derive(Debug, Clone)]
pub struct Step {
    /// Short human label, e.g. `INSERT songplays`.
    pub label: String,
    pub action: Action,
}

impl Step {
    pub fn sql(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: Action::Execute(sql.into()),
        }
    }

    pub fn copy_local(label: impl Into<String>, load: StagingLoad) -> Self {
        Self {
            label: label.into(),
            action: Action::CopyLocal(load),
        }
    }

    /// Text shown by `plan`: the statement, or the client-side COPY command
    /// preceded by a comment naming its source.
    pub fn describe(&self) -> String {
        match &self.action {
            Action::Execute(sql) => sql.clone(),
            Action::CopyLocal(load) => format!(
                "-- client-side load from {} ({})\n{}",
                load.source,
                load.mapping,
                staging::copy_in_sql(load.table)
            ),
        }
    }
}

/// Outcome of one committed step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub label: String,
    /// Rows affected as reported by the server (0 for DDL).
    pub rows: u64,
    pub elapsed_ms: f64,
}

/// Outcome of one stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub steps: Vec<StepReport>,
}

impl StageReport {
    pub fn total_rows(&self) -> u64 {
        self.steps.iter().map(|s| s.rows).sum()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.steps.iter().map(|s| s.elapsed_ms).sum()
    }

    /// Rows reported by the step with the given label.
    pub fn rows_for(&self, label: &str) -> Option<u64> {
        self.steps.iter().find(|s| s.label == label).map(|s| s.rows)
    }
}

/// An open warehouse connection plus the settings that shape execution.
pub struct Warehouse {
    client: Client,
    driver: JoinHandle<()>,
    endpoint: String,
    dialect: Dialect,
    stage_mode: StageMode,
}

impl Warehouse {
    /// Open the connection described by `config.cluster`.
    pub async fn connect(config: &DwhConfig) -> DwhResult<Self> {
        let endpoint = config.cluster.endpoint();
        let (client, connection) = config
            .cluster
            .pg_config()
            .connect(NoTls)
            .await
            .map_err(|source| DwhError::Connection {
                endpoint: endpoint.clone(),
                source,
            })?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %describe_pg_error(&e), "warehouse connection closed with error");
            }
        });

        info!(
            endpoint = %endpoint,
            dialect = %config.general.dialect,
            stage_mode = config.general.stage_mode.as_str(),
            "connected to warehouse"
        );

        Ok(Self {
            client,
            driver,
            endpoint,
            dialect: config.general.dialect,
            stage_mode: config.general.stage_mode,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn stage_mode(&self) -> StageMode {
        self.stage_mode
    }

    /// Execute every step of a stage in order.
    ///
    /// The first failing step aborts the stage. In per-statement mode the
    /// steps before it stay committed; in per-stage mode nothing is.
    pub async fn run_stage(&mut self, stage: Stage, steps: Vec<Step>) -> DwhResult<StageReport> {
        info!(stage = stage.as_str(), "{}", stage.marker());
        let mut reports = Vec::with_capacity(steps.len());

        match self.stage_mode {
            StageMode::PerStatement => {
                for step in &steps {
                    let tx = self
                        .client
                        .transaction()
                        .await
                        .map_err(|source| statement_error(stage, &step.label, source))?;
                    let report = execute_step(&tx, stage, step).await?;
                    tx.commit()
                        .await
                        .map_err(|source| statement_error(stage, &step.label, source))?;
                    log_step(stage, &report);
                    reports.push(report);
                }
            }
            StageMode::PerStage => {
                let tx = self
                    .client
                    .transaction()
                    .await
                    .map_err(|source| statement_error(stage, "BEGIN", source))?;
                for step in &steps {
                    let report = execute_step(&tx, stage, step).await?;
                    log_step(stage, &report);
                    reports.push(report);
                }
                tx.commit()
                    .await
                    .map_err(|source| statement_error(stage, "COMMIT", source))?;
            }
        }

        let report = StageReport {
            stage,
            steps: reports,
        };
        info!(
            stage = stage.as_str(),
            statements = report.steps.len(),
            rows = report.total_rows(),
            elapsed_ms = report.elapsed_ms(),
            "stage committed"
        );
        Ok(report)
    }

    /// Close the connection and wait for the driver task to finish.
    pub async fn close(self) {
        let Warehouse {
            client,
            driver,
            endpoint,
            ..
        } = self;
        drop(client);
        if let Err(e) = driver.await {
            warn!(endpoint = %endpoint, error = %e, "connection task did not shut down cleanly");
        }
        debug!(endpoint = %endpoint, "warehouse connection closed");
    }
}

async fn execute_step(tx: &Transaction<'_>, stage: Stage, step: &Step) -> DwhResult<StepReport> {
    let t0 = Instant::now();
    let rows = match &step.action {
        Action::Execute(sql) => {
            debug!(stage = stage.as_str(), step = %step.label, sql = %sql, "executing statement");
            let messages = tx
                .simple_query(sql)
                .await
                .map_err(|source| statement_error(stage, &step.label, source))?;
            rows_affected(&messages)
        }
        Action::CopyLocal(load) => staging::copy_local(tx, stage, &step.label, load).await?,
    };
    Ok(StepReport {
        label: step.label.clone(),
        rows,
        elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Sum of the row counts in every `CommandComplete` message.
fn rows_affected(messages: &[SimpleQueryMessage]) -> u64 {
    messages
        .iter()
        .map(|m| match m {
            SimpleQueryMessage::CommandComplete(n) => *n,
            _ => 0,
        })
        .sum()
}

fn log_step(stage: Stage, report: &StepReport) {
    info!(
        stage = stage.as_str(),
        step = %report.label,
        rows = report.rows,
        elapsed_ms = report.elapsed_ms,
        "statement done"
    );
}

pub(crate) fn statement_error(
    stage: Stage,
    label: &str,
    source: tokio_postgres::Error,
) -> DwhError {
    DwhError::Statement {
        stage: stage.as_str(),
        label: label.to_string(),
        source,
    }
}
