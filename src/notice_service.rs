use std::{collections::VecDeque, fmt};

use compact_str::{CompactString, ToCompactString};

use crate::{domain::QueryKind, event::TrackerEvent, result::TrackerError};

/// Turns tracker events into user-facing notices and a tray indicator
#[derive(Debug)]
pub struct NoticeService {
    info_notices: VecDeque<Notice>,
    error_notices: VecDeque<Notice>,
    most_recent: Option<Notice>,
    indicator: TrayIndicator,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: NoticeMessage,
}

#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Which icon a tray front end should show
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum TrayIndicator {
    #[default]
    Default,
    Pending,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoticeMessage {
    ReadyToSubmit(usize),
    PendingReviews(usize),
    QueryFailed(QueryKind, CompactString),
    ConfigError(CompactString),
    GeneralMessage(CompactString),
}

fn commit_word(count: usize) -> &'static str {
    if count > 1 { "commits" } else { "commit" }
}

impl NoticeMessage {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeMessage::ReadyToSubmit(_) => "Ready to submit",
            NoticeMessage::PendingReviews(_) => "Pending Reviews",
            NoticeMessage::QueryFailed(_, _) => "Query failed",
            NoticeMessage::ConfigError(_) => "Configuration",
            NoticeMessage::GeneralMessage(_) => "Gerrit",
        }
    }

    pub fn body(&self) -> CompactString {
        match self {
            NoticeMessage::ReadyToSubmit(n) => {
                format!("{n} {} ready to submit", commit_word(*n)).into()
            },
            NoticeMessage::PendingReviews(n) => {
                format!("{n} {} to review", commit_word(*n)).into()
            },
            NoticeMessage::QueryFailed(kind, message) => {
                format!("Fetching {kind} changes failed: {message}").into()
            },
            NoticeMessage::ConfigError(message) | NoticeMessage::GeneralMessage(message) => {
                message.clone()
            },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.message.title(), self.message.body())
    }
}

impl Default for NoticeService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeService {
    pub fn new() -> Self {
        Self {
            info_notices: VecDeque::new(),
            error_notices: VecDeque::new(),
            most_recent: None,
            indicator: TrayIndicator::Default,
        }
    }

    pub fn apply(&mut self, event: &TrackerEvent) {
        match event {
            TrackerEvent::Updated(report) => {
                if report.status.has_new_submittable {
                    self.indicator = TrayIndicator::Ready;
                    self.push_notice(
                        NoticeLevel::Info,
                        NoticeMessage::ReadyToSubmit(report.submittable_count),
                    );
                } else if report.status.has_new_pending {
                    self.indicator = TrayIndicator::Pending;
                    self.push_notice(
                        NoticeLevel::Info,
                        NoticeMessage::PendingReviews(report.pending_count),
                    );
                } else if report.pending_count == 0 && report.submittable_count == 0 {
                    self.indicator = TrayIndicator::Default;
                }
            },
            TrackerEvent::QueryFailed(kind, e) => self.push_notice(
                NoticeLevel::Error,
                NoticeMessage::QueryFailed(*kind, e.to_compact_string()),
            ),
            TrackerEvent::AppError(e) => {
                let message = match e {
                    TrackerError::ConfigValidationError { field, message } => {
                        NoticeMessage::ConfigError(format!("Invalid {field}: {message}").into())
                    },
                    TrackerError::ConfigLoadError { path, message } => NoticeMessage::ConfigError(
                        format!("Failed to load config from {}: {}", path.display(), message)
                            .into(),
                    ),
                    TrackerError::ConfigSaveError { path, message } => NoticeMessage::ConfigError(
                        format!("Failed to save config to {}: {}", path.display(), message).into(),
                    ),
                    other => NoticeMessage::GeneralMessage(other.to_compact_string()),
                };
                self.push_notice(NoticeLevel::Error, message);
            },
        }
    }

    pub fn indicator(&self) -> TrayIndicator {
        self.indicator
    }

    pub fn has_error(&self) -> bool {
        !self.error_notices.is_empty()
    }

    pub fn last_notification(&self) -> Option<&Notice> {
        self.most_recent.as_ref()
    }

    pub fn pop_notice(&mut self) -> Option<Notice> {
        let notice = self
            .error_notices
            .pop_front()
            .or_else(|| self.info_notices.pop_front());

        if notice.is_some() {
            self.most_recent = notice.clone();
        }

        notice
    }

    pub fn push_notice(&mut self, level: NoticeLevel, message: NoticeMessage) {
        let notice = Notice { level, message };

        match level {
            NoticeLevel::Info => self.info_notices.push_back(notice),
            NoticeLevel::Error => self.error_notices.push_back(notice),
        }
    }
}
