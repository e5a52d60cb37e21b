//! Error hierarchy for the cluster harness.
//!
//! Errors are grouped by operational concern: cluster configuration and
//! usage, node provisioning (directories, ports, processes, readiness), and
//! control-plane calls.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cluster configuration and usage violations
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Settings loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Node provisioning failures
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Control-plane call failures
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Unrecoverable failures requiring the harness to give up
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// A cluster must hold at least one node (the master)
    #[error("cluster size must be at least 1, got {0}")]
    InvalidSize(usize),

    /// Operation addressed a node index the cluster does not hold
    #[error("node index {index} out of range for cluster of {nodes} node(s)")]
    NodeIndexOutOfRange { index: usize, nodes: usize },

    /// Send amount must be a positive, finite number
    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    /// A cluster is started at most once; it is never restarted after teardown
    #[error("cluster is already started")]
    AlreadyStarted,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The OS refused to hand out a loopback port
    #[error("failed to allocate a loopback port")]
    PortAllocation(#[source] std::io::Error),

    /// The node's exclusive data directory could not be created
    #[error("failed to create data directory {path}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The daemon binary could not be spawned
    #[error("failed to launch {daemon}")]
    Spawn {
        daemon: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The daemonizing launcher exited unsuccessfully
    #[error("{daemon} exited during startup with {status}")]
    LaunchFailed {
        daemon: &'static str,
        status: std::process::ExitStatus,
    },

    /// Readiness deadline elapsed before the control plane answered
    #[error("node {index} control plane not ready after {waited:?}")]
    ReadinessTimeout { index: usize, waited: Duration },

    /// Spendable balance never cleared the bootstrap threshold
    #[error("spendable balance below bootstrap threshold after {waited:?}")]
    BootstrapTimeout { waited: Duration },

    /// Caller-requested cancellation during a wait loop
    #[error("provisioning of node {index} was cancelled")]
    Cancelled { index: usize },

    /// A concurrent node-creation worker died instead of reporting
    #[error("node creation worker panicked: {0}")]
    WorkerPanic(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Malformed control-plane address
    #[error("invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Connection or transfer failure against the control connection
    #[error("control connection failure")]
    Transport(#[from] reqwest::Error),

    /// The daemon rejected the call; carries its error verbatim
    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    /// The daemon answered with a body this crate cannot decode
    #[error("malformed RPC response")]
    MalformedResponse(#[from] serde_json::Error),
}
