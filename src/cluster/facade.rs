//! Consumer-facing cluster surface.
//!
//! Thin composition over the builder, the readiness machinery inside each
//! node handle, and the mempool bootstrapper. Operations dispatch to the
//! addressed node's control connection after an index-bounds check; no
//! internal locking; a given node index is operated on by one logical
//! caller at a time.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::BackendFactory;
use super::ClusterBuilder;
use super::MempoolBootstrapper;
use crate::config::Settings;
use crate::node::Backend;
use crate::node::NodeHandle;
use crate::node::NodeInfo;
use crate::rpc::NodeRpc;
use crate::rpc::RawTransaction;
use crate::ClusterError;
use crate::Error;
use crate::Result;

/// Snapshot of cluster state: master ports, notification endpoint, and
/// whether startup completed. Empty/`None` before `start`.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Master's peer-to-peer listen port.
    pub node_port: Option<u16>,

    /// Master's control-plane port.
    pub rpc_port: Option<u16>,

    /// Master's block/transaction notification endpoint, when the backend
    /// publishes one.
    pub zmq_address: Option<String>,

    pub is_started: bool,

    pub nodes_number: usize,
}

/// An ephemeral cluster of full nodes sharing one peer-to-peer topology:
/// node 0 is the master, every other node connects outbound to it.
///
/// A cluster lives for the owning test process only; it is never restarted
/// after teardown.
///
/// ## Example
/// ```rust,no_run
/// # use regbox::{Backend, Cluster, Settings};
/// # async fn demo() -> regbox::Result<()> {
/// let mut cluster = Cluster::new(Backend::Bitcoind, Settings::default());
/// cluster.start(2).await?;
/// cluster.init_mempool().await?;
/// let address = cluster.address(1).await?;
/// let txid = cluster.send(0, &address, 0.18).await?;
/// cluster.generate(0, 3).await?;
/// cluster.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Cluster {
    backend: Backend,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    started: bool,
    nodes: Vec<Box<dyn NodeHandle>>,
}

impl Cluster {
    pub fn new(
        backend: Backend,
        settings: Settings,
    ) -> Self {
        Self {
            backend,
            settings: Arc::new(settings),
            cancel: CancellationToken::new(),
            started: false,
            nodes: Vec::new(),
        }
    }

    /// Brings up `count` nodes and returns once every one of them is ready.
    ///
    /// All-or-nothing from the caller's point of view: the cluster counts as
    /// started only when every requested node reached readiness. On partial
    /// failure the surviving nodes are retained (`stop` reclaims them), but
    /// the error of the failed sibling is returned and `state().is_started`
    /// stays false.
    pub async fn start(
        &mut self,
        count: usize,
    ) -> Result<()> {
        // A cluster is started at most once; teardown cancels the token, so
        // a stopped cluster cannot come back either.
        if self.started || !self.nodes.is_empty() || self.cancel.is_cancelled() {
            return Err(ClusterError::AlreadyStarted.into());
        }

        let factory =
            BackendFactory::new(self.backend, self.settings.clone(), self.cancel.clone());
        let outcome = ClusterBuilder::new(factory).build(count).await?;
        self.nodes = outcome.nodes;

        match outcome.last_error {
            Some(e) => Err(e),
            None => {
                self.started = true;
                Ok(())
            }
        }
    }

    /// Best-effort teardown of every node: each one's shutdown, process
    /// termination and directory removal are all attempted; the last failure
    /// is reported after cleanup ran to completion.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();

        let mut last_error: Option<Error> = None;
        for node in &mut self.nodes {
            if let Err(e) = node.stop().await {
                warn!("stopping node {} failed: {}", node.info().index, e);
                last_error = Some(e);
            }
        }
        self.nodes.clear();
        self.started = false;

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Never blocks or fails; safe on a cluster that was never started.
    pub fn state(&self) -> State {
        let master = self.nodes.first();
        State {
            node_port: master.map(|n| n.info().peer_port),
            rpc_port: master.map(|n| n.info().rpc_port),
            zmq_address: master.and_then(|n| n.info().zmq_address.clone()),
            is_started: self.started,
            nodes_number: self.nodes.len(),
        }
    }

    /// Per-node provisioning details, in index order.
    pub fn node_infos(&self) -> Vec<NodeInfo> {
        self.nodes.iter().map(|n| n.info().clone()).collect()
    }

    /// Mines `blocks` blocks on the addressed node.
    pub async fn generate(
        &self,
        node: usize,
        blocks: u32,
    ) -> Result<()> {
        self.node(node)?.client().generate(blocks).await.map(|_| ())
    }

    /// Sends funds from the addressed node's wallet; returns the
    /// transaction id.
    pub async fn send(
        &self,
        node: usize,
        address: &str,
        amount: f64,
    ) -> Result<String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ClusterError::InvalidAmount(amount).into());
        }

        let node = self.node(node)?;
        match node.accounts().funding_source {
            Some(account) => node.client().send_from(account, address, amount).await,
            None => node.client().send_to_address(address, amount).await,
        }
    }

    /// Spendable balance of the addressed node's wallet.
    pub async fn balance(
        &self,
        node: usize,
    ) -> Result<f64> {
        let node = self.node(node)?;
        node.client().balance(node.accounts().balance_scope).await
    }

    /// Fresh receiving address from the addressed node's wallet.
    pub async fn address(
        &self,
        node: usize,
    ) -> Result<String> {
        self.node(node)?.client().new_address("").await
    }

    /// Transaction lookup by id. Served by the master, which indexes full
    /// transaction history.
    pub async fn raw_transaction(
        &self,
        txid: &str,
    ) -> Result<RawTransaction> {
        self.node(0)?.client().raw_transaction(txid).await
    }

    /// Current block height, as seen by the master.
    pub async fn block_height(&self) -> Result<i64> {
        Ok(self.node(0)?.client().blockchain_info().await?.blocks)
    }

    /// Estimated fee rate to confirm within `target_blocks`, from the
    /// master.
    pub async fn estimate_fee(
        &self,
        target_blocks: i64,
    ) -> Result<f64> {
        self.node(0)?.client().estimate_fee(target_blocks).await
    }

    /// Runs the mempool bootstrap against the master, leaving the ledger
    /// with matured, spendable funds and a non-trivial history.
    pub async fn init_mempool(&self) -> Result<()> {
        let master = self.node(0)?;
        let client = master.client();
        MempoolBootstrapper::new(
            client.as_ref(),
            master.accounts(),
            &self.settings.bootstrap,
            &self.cancel,
        )
        .run()
        .await
    }

    fn node(
        &self,
        index: usize,
    ) -> Result<&dyn NodeHandle> {
        self.nodes.get(index).map(|n| n.as_ref()).ok_or_else(|| {
            ClusterError::NodeIndexOutOfRange {
                index,
                nodes: self.nodes.len(),
            }
            .into()
        })
    }

    /// Test constructor that injects pre-built handles.
    #[cfg(test)]
    pub(crate) fn with_nodes(
        nodes: Vec<Box<dyn NodeHandle>>,
        started: bool,
    ) -> Self {
        Self {
            backend: Backend::Bitcoind,
            settings: Arc::new(Settings::default()),
            cancel: CancellationToken::new(),
            started,
            nodes,
        }
    }
}
