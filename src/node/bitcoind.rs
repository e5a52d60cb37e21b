//! bitcoind backend: one regtest `bitcoind` process per node.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use nanoid::nanoid;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use super::readiness;
use super::NodeHandle;
use super::NodeInfo;
use super::WalletAccounts;
use crate::config::Settings;
use crate::rpc::NodeRpc;
use crate::rpc::RpcClient;
use crate::utils::file_io;
use crate::utils::net;
use crate::Error;
use crate::ProvisionError;
use crate::Result;

const DAEMON: &str = "bitcoind";

/// One regtest bitcoind node. The master additionally publishes ZMQ
/// notifications and indexes full transaction history; slaves connect
/// outbound to the master's peer port.
pub(crate) struct BitcoindNode {
    info: NodeInfo,
    client: Arc<RpcClient>,
    settings: Arc<Settings>,
    cancel: CancellationToken,
}

impl BitcoindNode {
    /// Provisions ports and the exclusive data directory; does not launch.
    pub(crate) async fn create(
        index: usize,
        master_peer_port: Option<u16>,
        settings: Arc<Settings>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let peer_port = net::alloc_port().await?;
        let rpc_port = net::alloc_port().await?;
        let zmq_address = match master_peer_port {
            None => Some(net::loopback(net::alloc_port().await?)),
            Some(_) => None,
        };

        let data_dir = settings.cluster.data_root.join(format!("regbox-{}", nanoid!(12)));
        file_io::create_data_dir(&data_dir).await?;

        let client = Arc::new(RpcClient::new(
            &net::loopback(rpc_port),
            &settings.cluster.rpc_user,
            &settings.cluster.rpc_password,
            &settings.rpc,
        )?);

        Ok(Self {
            info: NodeInfo {
                index,
                data_dir,
                peer_port,
                rpc_port,
                wallet_rpc_port: None,
                zmq_address,
                master_peer_port,
            },
            client,
            settings,
            cancel,
        })
    }

    pub(crate) fn daemon_args(&self) -> Vec<String> {
        let info = &self.info;
        let mut args = vec![
            "-regtest".to_string(),
            "-daemon".to_string(),
            "-deprecatedrpc=estimatefee,generate".to_string(),
            format!("-datadir={}", info.data_dir.display()),
            format!("-port={}", info.peer_port),
            format!("-rpcport={}", info.rpc_port),
            format!("-rpcuser={}", self.settings.cluster.rpc_user),
            format!("-rpcpassword={}", self.settings.cluster.rpc_password),
        ];

        match (info.master_peer_port, &info.zmq_address) {
            (Some(master_port), _) => {
                args.push(format!("-connect=127.0.0.1:{}", master_port));
            }
            (None, Some(zmq)) => {
                args.push("-txindex=1".to_string());
                for topic in ["hashtx", "hashblock", "rawblock", "rawtx"] {
                    args.push(format!("-zmqpub{}=tcp://{}", topic, zmq));
                }
            }
            // Masters always carry a ZMQ address, see create().
            (None, None) => {}
        }

        args
    }

    /// `-daemon` makes the launcher fork and exit once startup succeeds, so
    /// waiting on it here does not outlive daemonization. The forked daemon
    /// still needs a readiness probe before it answers RPC.
    async fn launch(&mut self) -> Result<()> {
        let status = Command::new(DAEMON)
            .args(self.daemon_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| ProvisionError::Spawn {
                daemon: DAEMON,
                source: e,
            })?;

        if !status.success() {
            return Err(ProvisionError::LaunchFailed {
                daemon: DAEMON,
                status,
            }
            .into());
        }

        info!("node {}: {} launched on peer port {}", self.info.index, DAEMON, self.info.peer_port);
        Ok(())
    }
}

#[async_trait]
impl NodeHandle for BitcoindNode {
    async fn start(&mut self) -> Result<()> {
        let client = self.client.clone();
        let policy = self.settings.readiness;
        let cancel = self.cancel.clone();
        let index = self.info.index;

        readiness::ensure_ready_or_launch(client.as_ref(), &policy, &cancel, index, || self.launch())
            .await
    }

    async fn stop(&mut self) -> Result<()> {
        let mut last_error: Option<Error> = None;

        // The daemonized process left no child handle behind; the control
        // protocol is the termination path.
        if let Err(e) = self.client.stop().await {
            warn!("node {}: graceful shutdown request failed: {}", self.info.index, e);
            last_error = Some(e);
        }

        if let Err(e) = file_io::remove_data_dir(&self.info.data_dir).await {
            warn!("node {}: removing data directory failed: {}", self.info.index, e);
            last_error = Some(
                ProvisionError::DataDir {
                    path: self.info.data_dir.clone(),
                    source: e,
                }
                .into(),
            );
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn client(&self) -> Arc<dyn NodeRpc> {
        self.client.clone()
    }

    fn accounts(&self) -> WalletAccounts {
        WalletAccounts {
            balance_scope: "*",
            funding_source: None,
        }
    }
}
