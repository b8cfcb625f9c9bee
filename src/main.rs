//! `sparkify-dwh`: reset, load and populate the Sparkify warehouse.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sparkify_dwh::config::{CONFIG_ENV_VAR, DwhConfig};
use sparkify_dwh::error::DwhResult;
use sparkify_dwh::pipeline::{self, Phase};

#[derive(Parser, Debug)]
#[command(name = "sparkify-dwh", version, about = "Star-schema warehouse ETL")]
struct Cli {
    /// Path to the TOML config file (default: dwh.toml)
    #[arg(long, short = 'c', global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate all seven tables. Destroys loaded data.
    CreateTables,
    /// Load the staging tables and populate the fact and dimension tables.
    Etl,
    /// Reset, load and populate in one run.
    Run,
    /// Print the statements a phase would execute without connecting.
    Plan {
        #[arg(value_enum)]
        phase: Phase,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SPARKIFY_DWH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "sparkify_dwh=debug,info"
        } else {
            "sparkify_dwh=info,warn"
        })
    });

    let format = env::var("SPARKIFY_DWH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn dispatch(cli: Cli) -> DwhResult<()> {
    let path = DwhConfig::resolve_path(cli.config.as_deref());
    let config = DwhConfig::load(&path)?;
    info!(
        config = %path.display(),
        dialect = %config.general.dialect,
        "configuration loaded"
    );

    let phase = match cli.command {
        Command::CreateTables => Phase::CreateTables,
        Command::Etl => Phase::Etl,
        Command::Run => Phase::Run,
        Command::Plan { phase } => {
            print!("{}", pipeline::render_plan(&pipeline::plan(&config, phase)));
            return Ok(());
        }
    };
    pipeline::execute(&config, phase).await.map(|_| ())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(
                kind = %e.kind(),
                sqlstate = e.sqlstate().unwrap_or(""),
                untouched = e.before_first_statement(),
                "{e}"
            );
            ExitCode::FAILURE
        }
    }
}
