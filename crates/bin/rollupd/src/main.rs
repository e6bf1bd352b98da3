//! # rollupd: rollup job runner
//!
//! Composition root for the backend side. Each invocation runs exactly one
//! rollup and exits.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Run [`RollupService::run`] once on a current-thread runtime
//! - Print the [`JobReport`] as JSON on stdout and map it to the exit code
//!
//! ## Dependency rule
//! This is the wiring layer for the backend side. No domain logic belongs here.

mod config;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use sensorlink_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteRollupRepository, SqliteSummaryRepository,
};
use sensorlink_app::services::rollup_service::{JobReport, JobStatus, RollupService};
use sensorlink_domain::error::SensorLinkError;
use sensorlink_domain::time::now;

use crate::config::Config;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("rollupd: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.filter);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(%err, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let report = match runtime.block_on(execute(&config)) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(%err, "rollup failed");
            JobReport::failed(&err)
        }
    };

    tracing::info!(
        status = report.status_code,
        message = %report.message,
        "rollup finished"
    );
    match serde_json::to_string(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::error!(%err, "failed to encode report"),
    }

    if report.status == JobStatus::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn execute(config: &Config) -> Result<JobReport, SensorLinkError> {
    let db = DatabaseConfig::new(config.database_url()).build().await?;
    let pool = db.pool().clone();

    let service = RollupService::new(
        SqliteSummaryRepository::new(pool.clone()),
        SqliteRollupRepository::new(pool),
        config.device_id()?,
        config.rollup_window()?,
    );

    service.run(now()).await
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
