//! Bounded polling for post-transfer processing.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use vmig_host::HostingApi;
use vmig_models::ResourceStatus;

use crate::error::{TransferError, TransferResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Polls a resource until the remote reports it usable.
pub struct ReadinessWaiter<A> {
    api: Arc<A>,
}

impl<A> Clone for ReadinessWaiter<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: HostingApi> ReadinessWaiter<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Poll at most `max_attempts` times, sleeping `poll_interval` between
    /// polls but not after the last one.
    ///
    /// Unknown states are treated like processing.
    pub async fn wait_until_ready(
        &self,
        resource_uri: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> TransferResult<()> {
        for attempt in 1..=max_attempts {
            match self.api.resource_status(resource_uri).await? {
                ResourceStatus::Ready => {
                    debug!(resource_uri = %resource_uri, attempt, "Resource ready");
                    return Ok(());
                }
                ResourceStatus::Error => {
                    return Err(TransferError::RemoteProcessing(resource_uri.to_string()));
                }
                status => {
                    debug!(
                        resource_uri = %resource_uri,
                        attempt,
                        max_attempts,
                        status = %status,
                        "Resource not ready yet"
                    );
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(poll_interval).await;
            }
        }

        Err(TransferError::ReadinessTimeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use vmig_host::fake::FakeHost;

    use super::*;

    const FAST: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_ready_after_processing() {
        let host = Arc::new(FakeHost::new());
        host.queue_statuses([
            ResourceStatus::Processing,
            ResourceStatus::Unknown("queued".into()),
            ResourceStatus::Ready,
        ]);

        let waiter = ReadinessWaiter::new(Arc::clone(&host));
        tokio_test::assert_ok!(waiter.wait_until_ready("/videos/1", FAST, 10).await);
        assert_eq!(host.status_polls(), 3);
    }

    #[tokio::test]
    async fn test_timeout_polls_exactly_max_attempts() {
        let host = Arc::new(FakeHost::new());
        host.repeat_status(ResourceStatus::Processing, 100);

        let waiter = ReadinessWaiter::new(Arc::clone(&host));
        let result = waiter.wait_until_ready("/videos/1", FAST, 4).await;

        assert!(matches!(
            result,
            Err(TransferError::ReadinessTimeout { attempts: 4 })
        ));
        assert_eq!(host.status_polls(), 4);
    }

    #[tokio::test]
    async fn test_zero_attempts_times_out_without_polling() {
        let host = Arc::new(FakeHost::new());
        let waiter = ReadinessWaiter::new(Arc::clone(&host));

        let result = waiter.wait_until_ready("/videos/1", FAST, 0).await;
        assert!(matches!(
            result,
            Err(TransferError::ReadinessTimeout { attempts: 0 })
        ));
        assert_eq!(host.status_polls(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_stops_polling() {
        let host = Arc::new(FakeHost::new());
        host.queue_statuses([ResourceStatus::Processing, ResourceStatus::Error]);

        let waiter = ReadinessWaiter::new(Arc::clone(&host));
        let result = waiter.wait_until_ready("/videos/9", FAST, 10).await;

        assert!(matches!(result, Err(TransferError::RemoteProcessing(uri)) if uri == "/videos/9"));
        assert_eq!(host.status_polls(), 2);
    }
}
