//! Readiness probing for a node's control plane.
//!
//! Daemons start asynchronously and are not immediately responsive; nothing
//! may be dispatched to a node until a probe has succeeded at least once.

use std::future::Future;

use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::config::ReadinessPolicy;
use crate::rpc::NodeRpc;
use crate::ProvisionError;
use crate::Result;

/// Blocks until the node's control plane answers a health check.
///
/// Polls on `poll_interval` and emits a diagnostic every
/// `log_every_failures` consecutive misses. With `max_wait_in_ms` of zero
/// the loop polls until the control plane answers or `cancel` fires;
/// otherwise it stops with [`ProvisionError::ReadinessTimeout`].
pub(crate) async fn wait_until_ready(
    client: &dyn NodeRpc,
    policy: &ReadinessPolicy,
    cancel: &CancellationToken,
    index: usize,
) -> Result<()> {
    let started = Instant::now();
    let deadline = policy.max_wait();
    let cadence = policy.log_every_failures.max(1);
    let mut failures: u64 = 0;

    loop {
        match client.ping().await {
            Ok(()) => {
                debug!("node {} control plane ready after {} failed probe(s)", index, failures);
                return Ok(());
            }
            Err(e) => {
                failures += 1;
                if failures % cadence == 0 {
                    warn!("node {} still not ready after {} probes: {}", index, failures, e);
                }
            }
        }

        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                return Err(ProvisionError::ReadinessTimeout {
                    index,
                    waited: started.elapsed(),
                }
                .into());
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(ProvisionError::Cancelled { index }.into());
            }
            _ = sleep(policy.poll_interval()) => {}
        }
    }
}

/// Probe-or-launch: if the control plane already answers, the daemon is
/// considered running and `launch` is never invoked; otherwise the daemon is
/// launched once and polled to readiness.
pub(crate) async fn ensure_ready_or_launch<F, Fut>(
    client: &dyn NodeRpc,
    policy: &ReadinessPolicy,
    cancel: &CancellationToken,
    index: usize,
    launch: F,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if client.ping().await.is_ok() {
        debug!("node {} control plane already serving, skipping launch", index);
        return Ok(());
    }

    launch().await?;
    wait_until_ready(client, policy, cancel, index).await
}
