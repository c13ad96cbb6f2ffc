//! Background polling of the review server
//!
//! The poller alternates between two states. While idle it waits for the
//! timer, a refresh request or a new configuration. While polling it waits
//! for both halves of the cycle to join; refresh requests that arrive in the
//! meantime are dropped and configurations are held back until the join.
//! The timer is rearmed from the moment a poll completes.

use tokio::{
    sync::{broadcast, mpsc, watch},
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    config::{PollingConfig, TrackerConfig},
    error::ClientError,
    service::{PollResults, ReviewService},
};
use crate::{
    dispatcher::Dispatcher,
    domain::{PollOutcome, QueryKind, TrackerSnapshot, UpdateStatus},
    event::{TrackerEvent, UpdateReport},
    result::TrackerError,
    stores::ReviewStore,
};

/// Requests accepted by a running poller
#[derive(Debug, Clone)]
pub enum PollerCommand {
    /// Poll now, unless a poll is already in flight
    Refresh,
    /// Replace the tracked server/project/user, reset counts and poll
    Configure(TrackerConfig),
}

/// Latest state published by the poller
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub snapshot: TrackerSnapshot,
    pub status: UpdateStatus,
}

enum Step {
    Timer,
    Joined(Result<PollResults, JoinError>),
    Command(Option<PollerCommand>),
    Shutdown,
}

/// Background poller for Gerrit changes
#[derive(Debug)]
pub struct ReviewPoller {
    service: ReviewService,
    config: PollingConfig,
    tracker_config: Option<TrackerConfig>,
    store: ReviewStore,
    events: broadcast::Sender<TrackerEvent>,
    state: watch::Sender<TrackerState>,
    commands: mpsc::Receiver<PollerCommand>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
    in_flight: Option<JoinHandle<PollResults>>,
    queued_config: Option<TrackerConfig>,
    next_poll: Option<Instant>,
}

impl ReviewPoller {
    /// Create a new poller; nothing is polled until a configuration arrives
    pub fn new(
        service: ReviewService,
        config: PollingConfig,
        events: broadcast::Sender<TrackerEvent>,
        state: watch::Sender<TrackerState>,
        commands: mpsc::Receiver<PollerCommand>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            service,
            config,
            tracker_config: None,
            store: ReviewStore::new(),
            events,
            state,
            commands,
            shutdown_tx,
            shutdown_rx,
            in_flight: None,
            queued_config: None,
            next_poll: None,
        }
    }

    /// Get a shutdown sender for external shutdown control
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run until shut down or until every command sender is gone
    #[instrument(skip(self), fields(interval = ?self.config.interval))]
    pub async fn run(mut self) {
        info!("Starting Gerrit poller");

        loop {
            let idle = self.in_flight.is_none();
            let step = tokio::select! {
                joined = join_in_flight(&mut self.in_flight) => Step::Joined(joined),
                _ = sleep_until_armed(self.next_poll), if idle => Step::Timer,
                command = self.commands.recv() => Step::Command(command),
                _ = self.shutdown_rx.recv() => Step::Shutdown,
            };

            match step {
                Step::Timer => {
                    debug!("Poll timer fired");
                    self.next_poll = None;
                    self.begin_poll();
                },
                Step::Joined(joined) => {
                    self.in_flight = None;
                    self.complete_poll(joined);
                    if let Some(config) = self.queued_config.take() {
                        self.apply_config(config);
                        self.begin_poll();
                    }
                },
                Step::Command(Some(PollerCommand::Refresh)) => {
                    if self.in_flight.is_some() {
                        debug!("Poll already in flight, dropping refresh request");
                    } else {
                        self.begin_poll();
                    }
                },
                Step::Command(Some(PollerCommand::Configure(config))) => {
                    if self.in_flight.is_some() {
                        info!("Poll in flight, deferring reconfiguration until it completes");
                        self.queued_config = Some(config);
                    } else {
                        self.apply_config(config);
                        self.begin_poll();
                    }
                },
                Step::Command(None) | Step::Shutdown => break,
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        info!("Gerrit poller stopped");
    }

    fn apply_config(&mut self, config: TrackerConfig) {
        info!(
            server = %config.server,
            project = %config.project,
            username = %config.username,
            "Applying tracker configuration"
        );
        if let Err(e) = config.validate() {
            self.events
                .dispatch(TrackerEvent::AppError(TrackerError::from(&e)));
        }
        self.tracker_config = Some(config);
        self.store.reset();
        self.state.send_replace(TrackerState::default());
    }

    /// Start a poll cycle, or rearm the timer if the configuration cannot be polled
    fn begin_poll(&mut self) {
        let Some(config) = self.tracker_config.clone() else {
            debug!("No tracker configuration yet, skipping poll");
            return;
        };

        if let Err(e) = config.validate() {
            warn!(error = %e, "Invalid tracker configuration, skipping poll");
            self.rearm();
            return;
        }

        self.state
            .send_modify(|state| state.status = UpdateStatus::started());

        let service = self.service.clone();
        self.in_flight = Some(tokio::spawn(async move {
            service.fetch_all(&config).await
        }));
    }

    /// Join point: diff, replace the snapshot, publish, rearm
    fn complete_poll(&mut self, joined: Result<PollResults, JoinError>) {
        let results = joined.unwrap_or_else(|e| {
            error!(error = %e, "Poll task failed");
            let lost = |kind| PollOutcome::failed(kind, ClientError::config("poll task failed"));
            PollResults {
                pending: lost(QueryKind::Pending),
                submittable: lost(QueryKind::Submittable),
            }
        });

        for outcome in [&results.pending, &results.submittable] {
            if let Some(e) = outcome.error() {
                self.events
                    .dispatch(TrackerEvent::QueryFailed(outcome.kind, TrackerError::from(e)));
            }
        }

        let status = self
            .store
            .apply(&results.pending, &results.submittable);
        let snapshot = self.store.snapshot().clone();
        let report = UpdateReport::new(status, &snapshot);

        info!(
            pending_count = report.pending_count,
            submittable_count = report.submittable_count,
            has_new_pending = status.has_new_pending,
            has_new_submittable = status.has_new_submittable,
            "Poll completed"
        );

        self.state.send_replace(TrackerState { snapshot, status });
        self.events.dispatch(report.into());
        self.rearm();
    }

    fn rearm(&mut self) {
        self.next_poll = Some(Instant::now() + self.config.interval);
    }
}

async fn join_in_flight(
    in_flight: &mut Option<JoinHandle<PollResults>>,
) -> Result<PollResults, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_armed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawn a poller as a background task
pub fn spawn_poller(poller: ReviewPoller) -> (broadcast::Sender<()>, JoinHandle<()>) {
    let shutdown_sender = poller.shutdown_sender();
    let handle = tokio::spawn(poller.run());
    (shutdown_sender, handle)
}
