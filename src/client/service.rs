//! Poll cycle orchestration: both queries in flight, one join

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, instrument, warn};

use super::{
    api::Transport,
    config::{ChangeQuery, TrackerConfig},
    decode::decode_changes,
    error::{ClientError, Result},
};
use crate::{
    domain::{ChangeRecord, PollOutcome, QueryKind, UpdateStatus},
    stores::ReviewStore,
};

/// Outcomes of both halves of one poll cycle
#[derive(Debug)]
pub struct PollResults {
    pub pending: PollOutcome,
    pub submittable: PollOutcome,
}

/// Issues the change queries of a poll cycle against a [`Transport`]
#[derive(Debug, Clone)]
pub struct ReviewService {
    transport: Arc<dyn Transport>,
}

impl ReviewService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch and decode a single change query
    #[instrument(skip(self, config), fields(kind = %query.kind))]
    pub async fn fetch_changes(
        &self,
        config: &TrackerConfig,
        query: &ChangeQuery,
    ) -> Result<Vec<ChangeRecord>> {
        let url = query.url(config)?;
        let body = self.transport.get(url.as_str()).await?;
        let changes = decode_changes(url.as_str(), &body)?;
        debug!(change_count = changes.len(), "Successfully fetched changes");
        Ok(changes)
    }

    /// Run both queries concurrently and wait until each has completed
    ///
    /// Each half reports through a shared channel; the join happens once both
    /// completion flags are set, whichever order they arrive in. A half whose
    /// task dies without reporting is recorded as failed.
    #[instrument(skip_all, fields(project = %config.project, username = %config.username))]
    pub async fn fetch_all(&self, config: &TrackerConfig) -> PollResults {
        info!("Fetching changes from Gerrit");

        let (tx, mut rx) = mpsc::channel(2);
        for kind in [QueryKind::Pending, QueryKind::Submittable] {
            let service = self.clone();
            let config = config.clone();
            let tx = tx.clone();
            tokio::spawn(
                async move {
                    let result = service
                        .fetch_changes(&config, &config.query(kind))
                        .await;
                    let _ = tx.send(PollOutcome::new(kind, result)).await;
                }
                .in_current_span(),
            );
        }
        drop(tx);

        let mut progress = UpdateStatus::started();
        let mut pending = None;
        let mut submittable = None;

        while !progress.update_complete() {
            let Some(outcome) = rx.recv().await else {
                break;
            };

            if let Some(e) = outcome.error() {
                warn!(kind = %outcome.kind, error = %e, "Failed to fetch changes");
            }

            progress.mark_complete(outcome.kind);
            match outcome.kind {
                QueryKind::Pending => pending = Some(outcome),
                QueryKind::Submittable => submittable = Some(outcome),
            }
        }

        PollResults {
            pending: pending.unwrap_or_else(|| Self::lost(QueryKind::Pending)),
            submittable: submittable.unwrap_or_else(|| Self::lost(QueryKind::Submittable)),
        }
    }

    /// One full poll cycle: fetch both halves, then diff into `store`
    pub async fn run_poll(&self, config: &TrackerConfig, store: &mut ReviewStore) -> UpdateStatus {
        let results = self.fetch_all(config).await;
        store.apply(&results.pending, &results.submittable)
    }

    fn lost(kind: QueryKind) -> PollOutcome {
        warn!(kind = %kind, "Fetch task ended without reporting");
        PollOutcome::failed(kind, ClientError::config("fetch task ended without a result"))
    }
}
