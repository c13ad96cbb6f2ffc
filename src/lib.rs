//! Gerrit review tracker
//!
//! Polls a Gerrit server for changes awaiting the user's review and for the
//! user's own changes that became submittable, and publishes what changed
//! since the previous poll.

pub mod app_init;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod event;
pub mod id;
pub mod logging;
pub mod notice_service;
pub mod result;
pub mod stores;
pub mod tracker;

pub use client::{GerritApi, PollingConfig, TrackerConfig, Transport};
pub use domain::{ChangeRecord, TrackerSnapshot, UpdateStatus};
pub use event::{TrackerEvent, UpdateReport};
pub use tracker::Tracker;
