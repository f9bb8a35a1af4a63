use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use energy_reporter::{
    config::ReporterConfig,
    models::time_window::TimeWindow,
    pipeline::{ReportPipeline, Trigger, render_readings},
    scheduler::DailyScheduler,
    server,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to a TOML config file. Environment variables are used when omitted.
    #[arg(short, long, env = "ENERGY_REPORTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web form and run the daily scheduled report
    Serve {
        /// Do not start the daily timer
        #[arg(long)]
        no_schedule: bool,
    },
    /// Run the scheduled report once
    Report,
    /// Run a manual report for today's readings
    Collect {
        /// End date recorded with the run (e.g. "2024-03-09")
        #[arg(long)]
        date_to: String,
        /// Print the values instead of submitting them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ReporterConfig::from_path(path),
        None => ReporterConfig::from_env(),
    }
    .context("loading configuration")?;
    let pipeline = Arc::new(ReportPipeline::from_config(&config)?);

    match cli.command {
        Commands::Serve { no_schedule } => {
            let scheduler = if no_schedule {
                None
            } else {
                let scheduler = DailyScheduler::new(pipeline.clone(), config.report_time)
                    .start()
                    .await
                    .context("starting scheduler")?;
                Some(scheduler)
            };

            if !config.enable_web {
                info!("web surface disabled, every request will get a 404");
            }
            let app = server::router(pipeline, config.enable_web);
            server::serve(config.bind_addr, app, async {
                tokio::signal::ctrl_c().await.ok();
            })
            .await
            .context("http server")?;

            if let Some(mut scheduler) = scheduler {
                scheduler.shutdown().await.context("stopping scheduler")?;
            }
        }
        Commands::Report => {
            let summary = pipeline.run(Trigger::Scheduled).await?;
            println!("OKAY! ({} fields, sink answered {})", summary.receipt.fields, summary.receipt.status);
        }
        Commands::Collect { date_to, dry_run } => {
            let trigger = Trigger::manual(Some(&date_to))?;
            if dry_run {
                let window = TimeWindow::today(pipeline.timezone());
                let readings = pipeline.readings_for_window(&window).await?;
                print!("{}", render_readings(&readings));
                for r in &readings {
                    println!("{}={}", r.destination_field_id, r.kwh);
                }
            } else {
                let summary = pipeline.run(trigger).await?;
                print!("{}", summary.to_text());
            }
        }
    }

    Ok(())
}
