use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::{PollOutcome, QueryKind, TrackerSnapshot, UpdateStatus};

/// Owns the snapshot carried from one poll cycle to the next
#[derive(Debug, Default)]
pub struct ReviewStore {
    snapshot: TrackerSnapshot,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: TrackerSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &TrackerSnapshot {
        &self.snapshot
    }

    /// Forget everything seen so far
    pub fn reset(&mut self) {
        self.snapshot = TrackerSnapshot::default();
    }

    /// Diff a completed poll cycle against the stored snapshot and replace it
    #[instrument(skip_all, fields(
        pending_ok = pending.succeeded(),
        submittable_ok = submittable.succeeded(),
    ))]
    pub fn apply(&mut self, pending: &PollOutcome, submittable: &PollOutcome) -> UpdateStatus {
        let (snapshot, status) = diff(&self.snapshot, pending, submittable);
        debug!(
            pending_count = snapshot.pending_count,
            submittable_count = snapshot.submittable_count,
            has_new_pending = status.has_new_pending,
            has_new_submittable = status.has_new_submittable,
            "Applied poll results"
        );
        self.snapshot = snapshot;
        status
    }
}

/// Compute the next snapshot and what is new relative to `prior`
///
/// A failed half keeps the prior values for its counters and reports no news.
/// After a successful pending fetch, `pending_revisions` holds exactly the ids
/// of that result, so changes that were merged or abandoned are pruned.
pub fn diff(
    prior: &TrackerSnapshot,
    pending: &PollOutcome,
    submittable: &PollOutcome,
) -> (TrackerSnapshot, UpdateStatus) {
    debug_assert_eq!(pending.kind, QueryKind::Pending);
    debug_assert_eq!(submittable.kind, QueryKind::Submittable);

    let mut next = prior.clone();
    let mut status = UpdateStatus::default();
    status.mark_complete(pending.kind);
    status.mark_complete(submittable.kind);

    if let Some(records) = submittable.records() {
        let count = records.iter().filter(|r| r.is_submittable).count();
        status.has_new_submittable = count != prior.submittable_count;
        next.submittable_count = count;
    }

    if let Some(records) = pending.records() {
        let mut revisions = HashMap::with_capacity(records.len());
        let mut count = 0;

        for record in records.iter().filter(|r| !r.is_submittable) {
            count += 1;
            let seen = prior
                .pending_revisions
                .get(&record.id)
                .copied()
                .unwrap_or(0);
            if seen != record.revision_count {
                status.has_new_pending = true;
            }
            revisions.insert(record.id.clone(), record.revision_count);
        }

        // an item leaving while another enters still grows the count
        status.has_new_pending |= count > prior.pending_count;
        next.pending_count = count;
        next.pending_revisions = revisions;
    }

    (next, status)
}
