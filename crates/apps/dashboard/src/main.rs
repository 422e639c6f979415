mod config;
mod health;
mod sink;

use std::sync::Arc;

use catalog::{HttpViewProvider, ViewProvider};
use clap::Parser;
use engine::EngineSettings;
use streaming::HttpDataProvider;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;
use crate::sink::LogSink;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless host for the view rendering engine")]
struct Args {
    /// API base URL (default: $DASHBOARD_API_URL or http://127.0.0.1:5003/api)
    #[arg(long)]
    api: Option<String>,

    /// Print the view catalog and exit
    #[arg(long)]
    list: bool,

    /// View to render (default: $DASHBOARD_VIEW)
    #[arg(long)]
    view: Option<String>,

    /// Seconds between health polls
    #[arg(long)]
    health_interval: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = real_main(Args::parse()).await {
        error!("{err}");
        eprintln!("dashboard: {err}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = HostConfig::from_env(args.api, args.view, args.health_interval);
    let client = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()?;
    let views = Arc::new(HttpViewProvider::with_client(&cfg.api_url, client.clone()));

    if args.list {
        for (id, summary) in views.list_views().await? {
            println!("{id}\t{}\t{}", summary.name, summary.description);
        }
        return Ok(());
    }

    let Some(view) = cfg.view.clone() else {
        return Err("no view given; pass --view or set DASHBOARD_VIEW".into());
    };

    let data = Arc::new(HttpDataProvider::with_client(&cfg.api_url, client.clone()));
    let (handle, engine_task) = engine::spawn(
        views,
        data,
        Box::new(LogSink::new()),
        EngineSettings::default(),
    );
    let health = tokio::spawn(health::run(client, cfg.api_url.clone(), cfg.health_interval));

    info!(api = %cfg.api_url, view = %view, "dashboard starting");
    handle.select_view(view.as_str()).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    health.abort();
    let snapshot = handle.snapshot().await?;
    info!(
        status = ?snapshot.status,
        epoch = %snapshot.epoch,
        refreshes = snapshot.metrics.counter("refresh.ticks"),
        skipped = snapshot.metrics.counter("refresh.skipped"),
        stale = snapshot.metrics.counter("fetch.stale"),
        fetch_tasks = ?snapshot.metrics.gauge("fetch.tasks"),
        events_dropped = snapshot.events_dropped,
        "final state"
    );
    for (name, timing) in &snapshot.metrics.timings {
        info!(
            metric = *name,
            count = timing.count,
            mean_ms = timing.mean_ms().unwrap_or(0),
            max_ms = timing.max_ms,
            "timing"
        );
    }
    handle.teardown().await?;
    drop(handle);
    engine_task.await?;
    Ok(())
}
