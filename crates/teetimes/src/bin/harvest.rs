use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teetimes::adapter::chromium::ChromiumSession;
use teetimes::{adapter_for, HarvestConfig, HarvestJob, Orchestrator, SqliteTeeTimeStore};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "teetimes-harvest", about = "Harvest tee-time availability into SQLite")]
struct Args {
    /// Path to the JSON harvest config
    #[arg(short, long)]
    config: PathBuf,
    /// Override the number of days for every course
    #[arg(short, long)]
    days: Option<u32>,
    /// Only harvest these course ids (repeatable)
    #[arg(long = "course")]
    courses: Vec<String>,
    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("teetimes=info")),
        )
        .init();

    let args = Args::parse();
    let config = HarvestConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    if let Some(unknown) = args
        .courses
        .iter()
        .find(|id| !config.courses.iter().any(|b| &b.course.id == *id))
    {
        anyhow::bail!("course '{unknown}' is not in the config");
    }
    if args.days == Some(0) {
        anyhow::bail!("--days must be at least 1");
    }

    let store = Arc::new(
        SqliteTeeTimeStore::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?,
    );
    let session = ChromiumSession::launch(args.headful)
        .await
        .context("failed to launch browser")?;

    let mut jobs = Vec::new();
    for binding in &config.courses {
        if !args.courses.is_empty() && !args.courses.contains(&binding.course.id) {
            continue;
        }
        let driver = session
            .new_driver()
            .await
            .with_context(|| format!("failed to open a tab for {}", binding.course.id))?;
        jobs.push(HarvestJob {
            course: binding.course.clone(),
            adapter: Box::new(adapter_for(&binding.course, Box::new(driver), config.timeouts)),
            requested_days: args.days.unwrap_or_else(|| config.days_for(binding)),
        });
    }
    info!(courses = jobs.len(), db = %config.database_path.display(), "Starting harvest");

    let orchestrator = Orchestrator::new(store, config.harvest_settings());
    let report = orchestrator.run(jobs).await;
    session.close().await;

    println!("{report}");

    let aborted = report.aborted_courses().count();
    if aborted > 0 {
        warn!(aborted, "Some courses were aborted");
        std::process::exit(1);
    }
    Ok(())
}
