//! Driver entry points.
//!
//! Each entry point opens one warehouse connection, runs its stages in
//! order and closes the connection. `run` sequences the reset, the load and
//! the transform explicitly so callers never depend on invoking two programs
//! in the right order.
//!
//! Errors propagate unchanged; the connection is dropped with the error.

use std::fmt;

use clap::ValueEnum;
use tracing::info;

use crate::config::DwhConfig;
use crate::error::DwhResult;
use crate::loader::{load_staging, load_steps};
use crate::schema::{create_steps, drop_steps, reset_schema};
use crate::transform::{insert_steps, populate_warehouse};
use crate::warehouse::{Stage, StageReport, Step, Warehouse};

/// A runnable slice of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// Drop and recreate every table.
    CreateTables,
    /// Load staging, then populate the fact and dimension tables.
    Etl,
    /// Reset, load and populate in one connection.
    Run,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::CreateTables => "create-tables",
            Phase::Etl => "etl",
            Phase::Run => "run",
        }
    }

    /// Stages executed by this phase, in order.
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Phase::CreateTables => &[Stage::DropTables, Stage::CreateTables],
            Phase::Etl => &[Stage::LoadStaging, Stage::InsertTables],
            Phase::Run => &[
                Stage::DropTables,
                Stage::CreateTables,
                Stage::LoadStaging,
                Stage::InsertTables,
            ],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a phase: every committed stage in order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub phase: Phase,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn total_rows(&self) -> u64 {
        self.stages.iter().map(StageReport::total_rows).sum()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.stages.iter().map(StageReport::elapsed_ms).sum()
    }

    fn log_summary(&self) {
        for stage in &self.stages {
            for step in &stage.steps {
                info!(
                    stage = stage.stage.as_str(),
                    step = %step.label,
                    rows = step.rows,
                    elapsed_ms = step.elapsed_ms,
                    "summary"
                );
            }
        }
        info!(
            phase = self.phase.as_str(),
            stages = self.stages.len(),
            rows = self.total_rows(),
            elapsed_ms = self.elapsed_ms(),
            "phase complete"
        );
    }
}

/// Drop and recreate every table.
pub async fn create_tables(config: &DwhConfig) -> DwhResult<RunReport> {
    let mut wh = Warehouse::connect(config).await?;
    let stages = reset_schema(&mut wh).await?;
    wh.close().await;
    finish(Phase::CreateTables, stages)
}

/// Load both staging tables, then populate the analytics tables.
pub async fn etl(config: &DwhConfig) -> DwhResult<RunReport> {
    let mut wh = Warehouse::connect(config).await?;
    let loaded = load_staging(&mut wh, config).await?;
    let inserted = populate_warehouse(&mut wh).await?;
    wh.close().await;
    finish(Phase::Etl, vec![loaded, inserted])
}

/// Reset, load and populate over one connection.
pub async fn run(config: &DwhConfig) -> DwhResult<RunReport> {
    let mut wh = Warehouse::connect(config).await?;
    let mut stages = reset_schema(&mut wh).await?;
    stages.push(load_staging(&mut wh, config).await?);
    stages.push(populate_warehouse(&mut wh).await?);
    wh.close().await;
    finish(Phase::Run, stages)
}

/// Execute a phase by name.
pub async fn execute(config: &DwhConfig, phase: Phase) -> DwhResult<RunReport> {
    match phase {
        Phase::CreateTables => create_tables(config).await,
        Phase::Etl => etl(config).await,
        Phase::Run => run(config).await,
    }
}

fn finish(phase: Phase, stages: Vec<StageReport>) -> DwhResult<RunReport> {
    let report = RunReport { phase, stages };
    report.log_summary();
    Ok(report)
}

/// The steps a phase would execute, without connecting.
pub fn plan(config: &DwhConfig, phase: Phase) -> Vec<(Stage, Vec<Step>)> {
    phase
        .stages()
        .iter()
        .map(|&stage| {
            let steps = match stage {
                Stage::DropTables => drop_steps(),
                Stage::CreateTables => create_steps(config.general.dialect),
                Stage::LoadStaging => load_steps(config),
                Stage::InsertTables => insert_steps(),
            };
            (stage, steps)
        })
        .collect()
}

/// Render a plan as an SQL script with stage and step comments.
pub fn render_plan(plan: &[(Stage, Vec<Step>)]) -> String {
    let mut out = String::new();
    for (stage, steps) in plan {
        out.push_str(&format!("-- ── {} ──\n", stage.marker()));
        for step in steps {
            out.push_str(&format!("-- {}\n{};\n\n", step.label, step.describe()));
        }
    }
    out
}
