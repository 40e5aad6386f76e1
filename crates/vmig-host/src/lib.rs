//! Video hosting REST API client.
//!
//! This crate provides:
//! - The [`HostingApi`] capability consumed by the transfer engine
//! - A reqwest implementation against the hosting REST API
//! - tus 1.0.0 offset probing and chunk append
//! - Retry with exponential backoff and request metrics

pub mod api;
pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod tus;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

#[cfg(test)]
mod client_tests;

pub use api::{CreateSessionRequest, HostingApi, SessionGrant};
pub use client::{HostClient, HostConfig};
pub use error::{HostError, HostResult};
pub use retry::RetryConfig;
