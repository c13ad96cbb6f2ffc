use std::{path::PathBuf, time::Duration};

use clap::Parser;
use gerrit_check::{
    app_init::{AppComponents, initialize_app},
    config::{GerritCheckConfig, default_config_path, load_config, save_config},
    event::TrackerEvent,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Watch a Gerrit project for reviews waiting on you and changes ready to submit
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Gerrit base URL, e.g. https://review.example.org
    #[arg(long)]
    server: Option<String>,

    /// Project to watch
    #[arg(long)]
    project: Option<String>,

    /// Gerrit username
    #[arg(long)]
    username: Option<String>,

    /// Seconds between the end of one poll and the start of the next
    #[arg(long)]
    interval: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging and raw response dumps
    #[arg(long)]
    debug: bool,

    /// Exit after the first completed poll
    #[arg(long)]
    once: bool,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save: bool,
}

impl Cli {
    fn apply(&self, config: &mut GerritCheckConfig) {
        if let Some(server) = &self.server {
            config.server = server.as_str().into();
        }
        if let Some(project) = &self.project {
            config.project = project.as_str().into();
        }
        if let Some(username) = &self.username {
            config.username = username.as_str().into();
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)?;
    cli.apply(&mut config);

    if cli.save {
        save_config(&config_path, &config)?;
    }

    let app = initialize_app(config, cli.debug)?;
    run(app, cli.once).await;

    Ok(())
}

async fn run(app: AppComponents, once: bool) {
    let AppComponents { tracker, tracker_config, mut notices, _log_guard } = app;
    let mut events = tracker.subscribe();

    if tracker.configure_with(tracker_config).await.is_err() {
        warn!("Tracker stopped before it could be configured");
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let completed = matches!(event, TrackerEvent::Updated(_));
                    notices.apply(&event);
                    while let Some(notice) = notices.pop_notice() {
                        println!("{notice}");
                    }
                    // a configuration that cannot be polled never completes a cycle
                    let rejected = matches!(event, TrackerEvent::AppError(_));
                    if once && (completed || rejected) {
                        break;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dropped tracker events");
                },
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            },
        }
    }

    tracker.shutdown();
    if tokio::time::timeout(Duration::from_secs(1), tracker.stopped())
        .await
        .is_err()
    {
        warn!("Poller did not stop in time");
    }
}
