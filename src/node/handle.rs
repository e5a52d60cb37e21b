//! Capability abstraction over a single running daemon instance.
//!
//! ## Key Responsibilities
//! - Owns one daemon process (and, for btcd, its wallet companion) plus the
//!   authoritative control connection
//! - Presents a uniform start/stop/info surface to the orchestration layers
//! - Encodes per-backend wallet conventions so the layers above stay
//!   backend-agnostic

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::rpc::NodeRpc;
use crate::Result;

/// Which node daemon implementation a cluster runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Single `bitcoind` process per node, regtest network.
    Bitcoind,
    /// `btcd` plus a `btcwallet` companion per node, simnet network.
    Btcd,
}

/// Wallet account conventions that differ between backends.
#[derive(Debug, Clone, Copy)]
pub struct WalletAccounts {
    /// Account selector for spendable-balance queries.
    pub balance_scope: &'static str,

    /// Named account bootstrap sends draw from, for backends that keep
    /// mining rewards under a distinguished account. `None` means the
    /// default wallet funds sends directly.
    pub funding_source: Option<&'static str>,
}

/// Static description of one provisioned node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// 0-based ordinal; 0 is the master. Unique within a cluster, assigned
    /// at creation, never reused.
    pub index: usize,

    /// Exclusively owned by this node for its lifetime.
    pub data_dir: PathBuf,

    /// Peer-to-peer listen port.
    pub peer_port: u16,

    /// Control-plane port.
    pub rpc_port: u16,

    /// The wallet companion's own RPC port (btcd backend only).
    pub wallet_rpc_port: Option<u16>,

    /// Block/transaction notification endpoint (bitcoind master only).
    pub zmq_address: Option<String>,

    /// The master's peer port this node connects out to; `None` on the
    /// master itself. Known before any non-master process launches.
    pub master_peer_port: Option<u16>,
}

impl NodeInfo {
    pub fn is_master(&self) -> bool {
        self.master_peer_port.is_none()
    }
}

/// One running daemon instance.
///
/// A handle that fails at creation or launch is discarded; it is never
/// retried in place.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Launches the daemon with its derived configuration and blocks until
    /// the control plane answers. Does not retry a failed launch.
    ///
    /// If the control plane already answers before launch (a leftover
    /// external process), no new process is spawned.
    async fn start(&mut self) -> Result<()>;

    /// Best-effort teardown: graceful shutdown via the control protocol,
    /// process termination, data-directory removal. Every step is attempted
    /// regardless of earlier failures; the last failure, if any, is
    /// returned.
    async fn stop(&mut self) -> Result<()>;

    /// Pure accessor; never blocks or fails.
    fn info(&self) -> &NodeInfo;

    /// The authoritative control connection for this node.
    fn client(&self) -> Arc<dyn NodeRpc>;

    fn accounts(&self) -> WalletAccounts;
}
