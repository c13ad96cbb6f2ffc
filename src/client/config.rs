//! Configuration management for the Gerrit client

use std::{path::PathBuf, time::Duration};

use compact_str::{CompactString, format_compact};
use url::Url;

use super::error::{ClientError, Result};
use crate::{
    config::{GerritCheckConfig, default_response_log_dir},
    domain::QueryKind,
};

/// Which server, project and user to track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Gerrit base URL, e.g. `https://review.example.org`
    pub server: CompactString,
    pub project: CompactString,
    pub username: CompactString,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request configuration
    pub request: RequestConfig,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// Polling interval configuration
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Idle gap between the end of one poll and the start of the next
    pub interval: Duration,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Request timeout
    pub timeout: Duration,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Write raw response bodies to `log_directory`
    pub log_responses: bool,
    /// Directory for storing debug logs
    pub log_directory: Option<PathBuf>,
}

/// Query parameters for `GET /changes/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeQuery {
    pub kind: QueryKind,
    pub project: CompactString,
    pub username: CompactString,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(300) }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: default_response_log_dir(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new(
        server: impl Into<CompactString>,
        project: impl Into<CompactString>,
        username: impl Into<CompactString>,
    ) -> Self {
        Self {
            server: server.into(),
            project: project.into(),
            username: username.into(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(ClientError::config_validation("server", "Server cannot be empty"));
        }

        if self.project.trim().is_empty() {
            return Err(ClientError::config_validation("project", "Project cannot be empty"));
        }

        if self.username.trim().is_empty() {
            return Err(ClientError::config_validation("username", "Username cannot be empty"));
        }

        if !self.server.starts_with("http://") && !self.server.starts_with("https://") {
            return Err(ClientError::config_validation(
                "server",
                "Server must start with http:// or https://",
            ));
        }

        if Url::parse(&self.server).is_err() {
            return Err(ClientError::config_validation(
                "server",
                "Server is not a valid URL format",
            ));
        }

        Ok(())
    }

    /// Base address every change query is appended to
    pub fn changes_endpoint(&self) -> CompactString {
        format_compact!("{}/changes/", self.server.trim_end_matches('/'))
    }

    /// Changes awaiting review by the configured user
    pub fn pending_query(&self) -> ChangeQuery {
        ChangeQuery::new(QueryKind::Pending, self.project.clone(), self.username.clone())
    }

    /// Changes owned by the configured user
    pub fn submittable_query(&self) -> ChangeQuery {
        ChangeQuery::new(QueryKind::Submittable, self.project.clone(), self.username.clone())
    }

    pub fn query(&self, kind: QueryKind) -> ChangeQuery {
        match kind {
            QueryKind::Pending => self.pending_query(),
            QueryKind::Submittable => self.submittable_query(),
        }
    }
}

impl ChangeQuery {
    pub fn new(kind: QueryKind, project: CompactString, username: CompactString) -> Self {
        Self { kind, project, username }
    }

    /// Value of the `q` parameter, before encoding
    pub fn search(&self) -> CompactString {
        let role = match self.kind {
            QueryKind::Pending => "reviewer",
            QueryKind::Submittable => "owner",
        };
        format_compact!("status:open project:{} {role}:{}", self.project, self.username)
    }

    /// `o` options requested alongside the search
    pub fn options(&self) -> &'static [&'static str] {
        match self.kind {
            QueryKind::Pending => &["ALL_REVISIONS", "SUBMITTABLE"],
            QueryKind::Submittable => &["SUBMITTABLE"],
        }
    }

    /// Full request URL against the given tracker configuration
    ///
    /// Project and username are form-encoded, so `+`, `&` or `#` in either
    /// reach the server unchanged.
    pub fn url(&self, config: &TrackerConfig) -> Result<Url> {
        let endpoint = config.changes_endpoint();
        let mut url = Url::parse(&endpoint)
            .map_err(|_| ClientError::InvalidUrl { url: endpoint.clone() })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &self.search());
            for option in self.options() {
                pairs.append_pair("o", option);
            }
        }

        Ok(url)
    }
}

impl From<&GerritCheckConfig> for TrackerConfig {
    fn from(config: &GerritCheckConfig) -> Self {
        Self::new(
            config.server.clone(),
            config.project.clone(),
            config.username.clone(),
        )
    }
}

impl From<&GerritCheckConfig> for PollingConfig {
    fn from(config: &GerritCheckConfig) -> Self {
        Self { interval: Duration::from_secs(config.poll_interval_secs) }
    }
}

impl From<&GerritCheckConfig> for ClientConfig {
    fn from(config: &GerritCheckConfig) -> Self {
        Self::default()
            .with_request(RequestConfig {
                timeout: Duration::from_secs(config.request_timeout_secs),
            })
            .with_debug_logging(config.log_responses)
    }
}

impl PollingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ClientError::config_validation(
                "poll_interval_secs",
                "Poll interval must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "timeout",
                "Timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Enable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}
