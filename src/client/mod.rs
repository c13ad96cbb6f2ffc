//! Gerrit client modules
//!
//! The transport, decoder and query builder are leaves; the service joins
//! both queries of a poll cycle and the poller schedules the cycles.

pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod poller;
pub mod service;

// Re-export main types for convenience
pub use api::{GerritApi, Transport};
pub use config::{ChangeQuery, ClientConfig, PollingConfig, TrackerConfig};
pub use error::{ClientError, Result};
pub use poller::ReviewPoller;
pub use service::ReviewService;
