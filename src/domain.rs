use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    client::{ClientError, Result},
    id::ChangeId,
};

/// Which of the two per-cycle queries a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Open changes the user is asked to review
    Pending,
    /// Open changes the user owns
    Submittable,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Pending => "pending",
            QueryKind::Submittable => "submittable",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change entry as returned by `GET /changes/`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDto {
    #[serde(rename = "_number")]
    pub number: ChangeId,
    /// Only reported when the query asks for `SUBMITTABLE`
    #[serde(default)]
    pub submittable: bool,
    /// Keyed by patch set sha, only present with `ALL_REVISIONS`/`CURRENT_REVISION`
    #[serde(default)]
    pub revisions: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: ChangeId,
    pub is_submittable: bool,
    pub revision_count: usize,
}

impl From<ChangeDto> for ChangeRecord {
    fn from(dto: ChangeDto) -> Self {
        Self {
            id: dto.number,
            is_submittable: dto.submittable,
            revision_count: dto.revisions.map(|r| r.len()).unwrap_or(0),
        }
    }
}

/// Counts retained between polls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub pending_count: usize,
    pub submittable_count: usize,
    pub pending_revisions: HashMap<ChangeId, usize>,
}

/// What changed in the last completed poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStatus {
    pub has_new_pending: bool,
    pub has_new_submittable: bool,
    pub in_progress: bool,
    pending_complete: bool,
    submittable_complete: bool,
}

impl UpdateStatus {
    /// Status of a cycle whose queries have just been issued
    pub fn started() -> Self {
        Self { in_progress: true, ..Default::default() }
    }

    /// Status of a cycle whose halves have both reported
    pub fn completed(has_new_pending: bool, has_new_submittable: bool) -> Self {
        Self {
            has_new_pending,
            has_new_submittable,
            in_progress: false,
            pending_complete: true,
            submittable_complete: true,
        }
    }

    pub fn mark_complete(&mut self, kind: QueryKind) {
        match kind {
            QueryKind::Pending => self.pending_complete = true,
            QueryKind::Submittable => self.submittable_complete = true,
        }
    }

    pub fn is_complete(&self, kind: QueryKind) -> bool {
        match kind {
            QueryKind::Pending => self.pending_complete,
            QueryKind::Submittable => self.submittable_complete,
        }
    }

    /// Both halves of the cycle have reported, successfully or not
    pub fn update_complete(&self) -> bool {
        self.pending_complete && self.submittable_complete
    }

    pub fn has_news(&self) -> bool {
        self.has_new_pending || self.has_new_submittable
    }
}

/// Result of one of the two queries in a poll cycle
#[derive(Debug)]
pub struct PollOutcome {
    pub kind: QueryKind,
    pub result: Result<Vec<ChangeRecord>>,
}

impl PollOutcome {
    pub fn new(kind: QueryKind, result: Result<Vec<ChangeRecord>>) -> Self {
        Self { kind, result }
    }

    pub fn failed(kind: QueryKind, error: ClientError) -> Self {
        Self { kind, result: Err(error) }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn records(&self) -> Option<&[ChangeRecord]> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.result.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_revision_keys() {
        let dto: ChangeDto = serde_json::from_str(
            r#"{"_number": 7, "submittable": false, "revisions": {"abc": {}, "def": {}}}"#,
        )
        .unwrap();
        let record = ChangeRecord::from(dto);
        assert_eq!(record.id, ChangeId::new("7"));
        assert!(!record.is_submittable);
        assert_eq!(record.revision_count, 2);
    }

    #[test]
    fn missing_optional_fields_default() {
        let dto: ChangeDto = serde_json::from_str(r#"{"_number": 9}"#).unwrap();
        let record = ChangeRecord::from(dto);
        assert!(!record.is_submittable);
        assert_eq!(record.revision_count, 0);
    }

    #[test]
    fn status_completes_only_after_both_halves() {
        let mut status = UpdateStatus::started();
        assert!(status.in_progress);
        assert!(!status.update_complete());

        status.mark_complete(QueryKind::Submittable);
        assert!(status.is_complete(QueryKind::Submittable));
        assert!(!status.update_complete());

        status.mark_complete(QueryKind::Pending);
        assert!(status.update_complete());
    }
}
