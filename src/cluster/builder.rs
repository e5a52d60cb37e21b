//! Materializes a cluster of nodes with master-first peer topology.
//!
//! ## Key Design Points
//! - **Ordering**: the master (index 0) is created and made ready before any
//!   slave, because every slave's launch configuration embeds the master's
//!   peer port.
//! - **Fan-out/fan-in**: slaves are created on concurrent workers; results
//!   are collected only after every worker finished, so partial failure is
//!   an explicit outcome rather than a race.
//! - **No rollback**: a failed slave never tears down its siblings; the
//!   caller owns the partial node set.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use crate::config::Settings;
use crate::node::Backend;
use crate::node::BitcoindNode;
use crate::node::BtcdNode;
use crate::node::NodeHandle;
use crate::ClusterError;
use crate::Error;
use crate::ProvisionError;
use crate::Result;

/// Creates one started, ready node. The builder stays generic over this so
/// cluster logic is testable without daemon binaries.
#[cfg_attr(test, automock)]
#[async_trait]
pub(crate) trait NodeFactory: Send + Sync + 'static {
    async fn create_node(
        &self,
        index: usize,
        master_peer_port: Option<u16>,
    ) -> Result<Box<dyn NodeHandle>>;
}

/// Production factory: provisions a backend node, starts it, and reclaims
/// its directory if the launch fails (a failed handle is discarded, never
/// retried in place).
pub(crate) struct BackendFactory {
    backend: Backend,
    settings: Arc<Settings>,
    cancel: CancellationToken,
}

impl BackendFactory {
    pub(crate) fn new(
        backend: Backend,
        settings: Arc<Settings>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            settings,
            cancel,
        }
    }
}

#[async_trait]
impl NodeFactory for BackendFactory {
    async fn create_node(
        &self,
        index: usize,
        master_peer_port: Option<u16>,
    ) -> Result<Box<dyn NodeHandle>> {
        let mut node: Box<dyn NodeHandle> = match self.backend {
            Backend::Bitcoind => Box::new(
                BitcoindNode::create(index, master_peer_port, self.settings.clone(), self.cancel.clone())
                    .await?,
            ),
            Backend::Btcd => Box::new(
                BtcdNode::create(index, master_peer_port, self.settings.clone(), self.cancel.clone())
                    .await?,
            ),
        };

        if let Err(e) = node.start().await {
            let _ = node.stop().await;
            return Err(e);
        }
        Ok(node)
    }
}

/// Every successfully created node in index order, plus the last error
/// observed among the workers. `last_error` is `None` exactly when the
/// outcome holds all requested nodes.
pub(crate) struct BuildOutcome {
    pub(crate) nodes: Vec<Box<dyn NodeHandle>>,
    pub(crate) last_error: Option<Error>,
}

pub(crate) struct ClusterBuilder<F: NodeFactory> {
    factory: Arc<F>,
}

impl<F: NodeFactory> ClusterBuilder<F> {
    pub(crate) fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Brings up `count` nodes. A master failure aborts the build; slave
    /// failures are aggregated into the outcome, last error wins. Which of
    /// several concurrently failing slaves supplies that error is decided by
    /// collection order (index order), not by failure time.
    pub(crate) async fn build(
        &self,
        count: usize,
    ) -> Result<BuildOutcome> {
        if count < 1 {
            return Err(ClusterError::InvalidSize(count).into());
        }

        let master = self.factory.create_node(0, None).await?;
        let master_peer_port = master.info().peer_port;
        info!("master node ready on peer port {}", master_peer_port);

        let mut workers: Vec<JoinHandle<Result<Box<dyn NodeHandle>>>> = Vec::with_capacity(count - 1);
        for index in 1..count {
            let factory = self.factory.clone();
            workers.push(tokio::spawn(async move {
                factory.create_node(index, Some(master_peer_port)).await
            }));
        }

        let mut nodes: Vec<Box<dyn NodeHandle>> = Vec::with_capacity(count);
        nodes.push(master);

        let mut last_error = None;
        for (offset, worker) in workers.into_iter().enumerate() {
            match worker.await {
                Ok(Ok(node)) => nodes.push(node),
                Ok(Err(e)) => {
                    error!("creating node {} failed: {}", offset + 1, e);
                    last_error = Some(e);
                }
                Err(join_error) => {
                    error!("node {} creation worker died: {}", offset + 1, join_error);
                    last_error = Some(ProvisionError::WorkerPanic(join_error.to_string()).into());
                }
            }
        }

        // Collection order already equals index order; a gap from a failed
        // slave keeps the survivors sorted.
        Ok(BuildOutcome { nodes, last_error })
    }
}
