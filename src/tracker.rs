//! Public entry point: configure, refresh and observe the review tracker

use std::sync::Arc;

use compact_str::CompactString;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, instrument};

use crate::{
    client::{
        PollingConfig, ReviewService, TrackerConfig, Transport,
        poller::{PollerCommand, ReviewPoller, TrackerState, spawn_poller},
    },
    domain::{TrackerSnapshot, UpdateStatus},
    event::TrackerEvent,
    result::{Result, TrackerError},
};

const COMMAND_CAPACITY: usize = 16;
const EVENT_CAPACITY: usize = 64;

/// Handle to a running poller
///
/// Must be created inside a Tokio runtime. Dropping every handle stops the
/// poller once its current cycle has been joined or aborted.
#[derive(Debug)]
pub struct Tracker {
    commands: mpsc::Sender<PollerCommand>,
    events: broadcast::Sender<TrackerEvent>,
    state: watch::Receiver<TrackerState>,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl Tracker {
    /// Start an idle tracker; polling begins with the first [`Tracker::configure`]
    pub fn spawn(transport: Arc<dyn Transport>, polling: PollingConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, state) = watch::channel(TrackerState::default());
        let (commands, commands_rx) = mpsc::channel(COMMAND_CAPACITY);

        let poller = ReviewPoller::new(
            ReviewService::new(transport),
            polling,
            events.clone(),
            state_tx,
            commands_rx,
        );
        let (shutdown_tx, task) = spawn_poller(poller);

        Self { commands, events, state, shutdown_tx, task }
    }

    /// Track a new server/project/user, reset the counts and poll immediately
    ///
    /// An incomplete configuration is accepted here; the poller reports it once
    /// as a [`TrackerEvent::AppError`] and skips every poll until reconfigured.
    #[instrument(skip_all)]
    pub async fn configure(
        &self,
        server: impl Into<CompactString>,
        project: impl Into<CompactString>,
        username: impl Into<CompactString>,
    ) -> Result<()> {
        self.configure_with(TrackerConfig::new(server, project, username))
            .await
    }

    pub async fn configure_with(&self, config: TrackerConfig) -> Result<()> {
        self.commands
            .send(PollerCommand::Configure(config))
            .await
            .map_err(|_| TrackerError::Stopped)
    }

    /// Ask for a poll now; ignored while a poll is in flight
    pub fn refresh(&self) -> Result<()> {
        match self.commands.try_send(PollerCommand::Refresh) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Command queue full, dropping refresh request");
                Ok(())
            },
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TrackerError::Stopped),
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Counts as of the last completed poll
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state.borrow().snapshot.clone()
    }

    /// Status of the current or last poll cycle
    pub fn status(&self) -> UpdateStatus {
        self.state.borrow().status
    }

    pub fn is_polling(&self) -> bool {
        self.status().in_progress
    }

    /// Send shutdown signal to stop polling
    pub fn shutdown(&self) {
        debug!("Sending shutdown signal to Gerrit poller");
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for the poller task to end
    pub async fn stopped(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        let _ = task.await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::client::ClientError;

    #[derive(Debug)]
    struct StaticTransport;

    #[async_trait]
    impl Transport for StaticTransport {
        async fn get(&self, url: &str) -> crate::client::Result<String> {
            if url.contains("reviewer%3A") {
                Ok(r#")]}'
[{"_number": 5, "submittable": false, "revisions": {"r1": {}}}]"#
                    .into())
            } else {
                Err(ClientError::Timeout)
            }
        }
    }

    fn tracker() -> Tracker {
        Tracker::spawn(
            Arc::new(StaticTransport),
            PollingConfig { interval: Duration::from_secs(300) },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn configure_polls_and_publishes() {
        let tracker = tracker();
        let mut events = tracker.subscribe();

        tracker
            .configure("https://review.example.org", "core", "jdoe")
            .await
            .unwrap();

        let mut failed = None;
        let report = loop {
            match events.recv().await.unwrap() {
                TrackerEvent::QueryFailed(kind, e) => failed = Some((kind, e)),
                TrackerEvent::Updated(report) => break report,
                TrackerEvent::AppError(e) => panic!("unexpected error: {e}"),
            }
        };

        assert!(matches!(
            failed,
            Some((crate::domain::QueryKind::Submittable, TrackerError::Timeout))
        ));
        assert!(report.status.has_new_pending);
        assert!(!report.status.has_new_submittable);
        assert_eq!(tracker.snapshot().pending_count, 1);
        assert!(!tracker.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_tracker_rejects_commands() {
        let tracker = tracker();
        tracker.shutdown();

        let commands = tracker.commands.clone();
        tracker.stopped().await;

        assert!(commands.is_closed());
    }
}
