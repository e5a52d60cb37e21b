//! btcd backend: a simnet `btcd` process plus a `btcwallet` companion per
//! node.
//!
//! Launch is two-phase. btcd mines only to addresses named at startup, so
//! the pair is brought up once to mint a wallet address, then btcd is
//! restarted with that address as the mining-reward destination. The dance
//! is private to this backend; the orchestrator above only sees `start()`.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use nanoid::nanoid;
use tokio::process::Child;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;
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

const DAEMON: &str = "btcd";
const WALLET_DAEMON: &str = "btcwallet";

pub(crate) struct BtcdNode {
    info: NodeInfo,
    /// Authoritative control connection: the wallet's RPC endpoint, which
    /// proxies chain queries through to its paired btcd.
    client: Arc<RpcClient>,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    chain_process: Option<Child>,
    wallet_process: Option<Child>,
    mining_address: Option<String>,
}

impl BtcdNode {
    /// Provisions ports and the exclusive data directory; does not launch.
    pub(crate) async fn create(
        index: usize,
        master_peer_port: Option<u16>,
        settings: Arc<Settings>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let peer_port = net::alloc_port().await?;
        let rpc_port = net::alloc_port().await?;
        let wallet_rpc_port = net::alloc_port().await?;

        let data_dir = settings.cluster.data_root.join(format!("regbox-{}", nanoid!(12)));
        file_io::create_data_dir(&data_dir).await?;

        let client = Arc::new(RpcClient::new(
            &net::loopback(wallet_rpc_port),
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
                wallet_rpc_port: Some(wallet_rpc_port),
                zmq_address: None,
                master_peer_port,
            },
            client,
            settings,
            cancel,
            chain_process: None,
            wallet_process: None,
            mining_address: None,
        })
    }

    pub(crate) fn chain_args(
        &self,
        mining_address: Option<&str>,
    ) -> Vec<String> {
        let info = &self.info;
        let mut args = vec![
            "--simnet".to_string(),
            "--notls".to_string(),
            format!("--datadir={}", info.data_dir.join("chain").display()),
            format!("--logdir={}", info.data_dir.join("chain/logs").display()),
            format!("--listen=127.0.0.1:{}", info.peer_port),
            format!("--rpclisten=127.0.0.1:{}", info.rpc_port),
            format!("--rpcuser={}", self.settings.cluster.rpc_user),
            format!("--rpcpass={}", self.settings.cluster.rpc_password),
        ];

        match info.master_peer_port {
            Some(master_port) => args.push(format!("--connect=127.0.0.1:{}", master_port)),
            None => args.push("--txindex".to_string()),
        }

        if let Some(address) = mining_address {
            args.push(format!("--miningaddr={}", address));
        }

        args
    }

    pub(crate) fn wallet_args(&self) -> Vec<String> {
        let info = &self.info;
        vec![
            "--simnet".to_string(),
            "--createtemp".to_string(),
            "--noclienttls".to_string(),
            "--noservertls".to_string(),
            format!("--appdata={}", info.data_dir.join("wallet").display()),
            format!("--rpcconnect=127.0.0.1:{}", info.rpc_port),
            format!(
                "--rpclisten=127.0.0.1:{}",
                info.wallet_rpc_port.unwrap_or_default()
            ),
            format!("--username={}", self.settings.cluster.rpc_user),
            format!("--password={}", self.settings.cluster.rpc_password),
        ]
    }

    /// Fire-and-forget spawn; the child handle is kept for teardown and
    /// killed if the handle is dropped.
    fn spawn(
        daemon: &'static str,
        args: Vec<String>,
    ) -> Result<Child> {
        Command::new(daemon)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProvisionError::Spawn { daemon, source: e }.into())
    }

    async fn kill_process(
        process: &mut Option<Child>,
        daemon: &str,
        index: usize,
    ) {
        if let Some(mut child) = process.take() {
            if let Err(e) = child.kill().await {
                warn!("node {}: killing {} failed: {}", index, daemon, e);
            }
        }
    }
}

#[async_trait]
impl NodeHandle for BtcdNode {
    async fn start(&mut self) -> Result<()> {
        let client = self.client.clone();
        let policy = self.settings.readiness;
        let cancel = self.cancel.clone();
        let index = self.info.index;

        // A leftover external pair may already be serving on these ports.
        if client.ping().await.is_ok() {
            debug!("node {} wallet already serving, skipping launch", index);
            return Ok(());
        }

        // Phase one: bring the pair up without a mining destination.
        self.chain_process = Some(Self::spawn(DAEMON, self.chain_args(None))?);
        self.wallet_process = Some(Self::spawn(WALLET_DAEMON, self.wallet_args())?);
        readiness::wait_until_ready(client.as_ref(), &policy, &cancel, index).await?;

        // Phase two: mint a reward address from the fresh wallet, then
        // restart btcd so mined coinbase pays that address.
        let mining_address = client.new_address("").await?;
        Self::kill_process(&mut self.chain_process, DAEMON, index).await;
        self.chain_process = Some(Self::spawn(DAEMON, self.chain_args(Some(&mining_address)))?);
        self.mining_address = Some(mining_address);

        // The wallet stays up and reconnects; ready once it answers again
        // with its chain daemon behind it.
        readiness::wait_until_ready(client.as_ref(), &policy, &cancel, index).await?;

        info!("node {}: {} ready on peer port {}", index, DAEMON, self.info.peer_port);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let index = self.info.index;
        let mut last_error: Option<Error> = None;

        if let Err(e) = self.client.stop().await {
            warn!("node {}: graceful shutdown request failed: {}", index, e);
            last_error = Some(e);
        }

        Self::kill_process(&mut self.wallet_process, WALLET_DAEMON, index).await;
        Self::kill_process(&mut self.chain_process, DAEMON, index).await;

        if let Err(e) = file_io::remove_data_dir(&self.info.data_dir).await {
            warn!("node {}: removing data directory failed: {}", index, e);
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
            balance_scope: "",
            funding_source: Some("default"),
        }
    }
}
