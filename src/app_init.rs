use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{ClientConfig, GerritApi, PollingConfig, TrackerConfig},
    config::GerritCheckConfig,
    logging::{LoggingConfig, init_logging},
    notice_service::NoticeService,
    result::{Result, TrackerError},
    tracker::Tracker,
};

pub struct AppComponents {
    pub tracker: Tracker,
    pub tracker_config: TrackerConfig,
    pub notices: NoticeService,
    pub _log_guard: Option<WorkerGuard>,
}

/// Set up logging and start an idle tracker; must run inside a Tokio runtime
pub fn initialize_app(config: GerritCheckConfig, debug: bool) -> Result<AppComponents> {
    let log_guard = initialize_logging(&config, debug)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gerrit-check starting up");

    let polling = PollingConfig::from(&config);
    polling.validate()?;

    let client_config = ClientConfig::from(&config).with_debug_logging(config.log_responses || debug);
    let api = Arc::new(GerritApi::new(client_config)?);
    let tracker = Tracker::spawn(api, polling);

    Ok(AppComponents {
        tracker,
        tracker_config: TrackerConfig::from(&config),
        notices: NoticeService::new(),
        _log_guard: log_guard,
    })
}

fn initialize_logging(config: &GerritCheckConfig, debug: bool) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_env();

    // Override with config if specified
    if let Some(log_level) = &config.log_level {
        logging_config = logging_config.with_filter(log_level.to_lowercase());
    }

    if debug {
        logging_config = logging_config.with_filter("debug");
    }

    init_logging(logging_config).map_err(|e| {
        TrackerError::GeneralError(format!("Failed to initialize logging: {e}").into())
    })
}
