use crate::{
    domain::{QueryKind, TrackerSnapshot, UpdateStatus},
    result::TrackerError,
};

/// Everything the tracker publishes to its subscribers
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Non-query failure, e.g. a configuration that cannot be polled
    AppError(TrackerError),
    /// One half of a poll cycle failed; the other half may still report news
    QueryFailed(QueryKind, TrackerError),
    /// A poll cycle completed
    Updated(UpdateReport),
}

/// Published once per completed poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub status: UpdateStatus,
    pub pending_count: usize,
    pub submittable_count: usize,
}

impl UpdateReport {
    pub fn new(status: UpdateStatus, snapshot: &TrackerSnapshot) -> Self {
        Self {
            status,
            pending_count: snapshot.pending_count,
            submittable_count: snapshot.submittable_count,
        }
    }
}

impl From<UpdateReport> for TrackerEvent {
    fn from(report: UpdateReport) -> Self {
        TrackerEvent::Updated(report)
    }
}
