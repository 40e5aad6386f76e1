//! Resumable transfer engine.
//!
//! This crate provides:
//! - [`TransferClient`]: chunked, offset-confirmed uploads over [`HostingApi`]
//! - [`ReadinessWaiter`]: bounded polling until the remote finishes processing
//!
//! Both are generic over the hosting capability so they can be driven by the
//! HTTP client in production and by an in-memory host in tests.
//!
//! [`HostingApi`]: vmig_host::HostingApi

pub mod client;
pub mod error;
pub mod readiness;

pub use client::{TransferClient, TransferConfig, DEFAULT_CHUNK_SIZE};
pub use error::{TransferError, TransferResult};
pub use readiness::{ReadinessWaiter, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
