//! Test doubles shared across unit tests.

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::node::NodeHandle;
use crate::node::NodeInfo;
use crate::node::WalletAccounts;
use crate::rpc::MockNodeRpc;
use crate::rpc::NodeRpc;
use crate::Error;
use crate::Result;

pub(crate) fn stub_info(
    index: usize,
    master_peer_port: Option<u16>,
) -> NodeInfo {
    NodeInfo {
        index,
        data_dir: PathBuf::from(format!("/tmp/regbox-stub-{}", index)),
        peer_port: 20_000 + index as u16,
        rpc_port: 21_000 + index as u16,
        wallet_rpc_port: None,
        zmq_address: master_peer_port
            .is_none()
            .then(|| "127.0.0.1:28332".to_string()),
        master_peer_port,
    }
}

/// A ready-made [`NodeHandle`] whose control connection is a [`MockNodeRpc`].
pub(crate) struct StubNode {
    pub(crate) info: NodeInfo,
    pub(crate) client: Arc<MockNodeRpc>,
    pub(crate) accounts: WalletAccounts,
    pub(crate) fail_stop: bool,
    pub(crate) stop_calls: Arc<AtomicUsize>,
}

impl StubNode {
    pub(crate) fn new(
        index: usize,
        master_peer_port: Option<u16>,
    ) -> Self {
        Self {
            info: stub_info(index, master_peer_port),
            client: Arc::new(MockNodeRpc::new()),
            accounts: WalletAccounts {
                balance_scope: "*",
                funding_source: None,
            },
            fail_stop: false,
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_client(
        mut self,
        client: MockNodeRpc,
    ) -> Self {
        self.client = Arc::new(client);
        self
    }

    pub(crate) fn with_accounts(
        mut self,
        accounts: WalletAccounts,
    ) -> Self {
        self.accounts = accounts;
        self
    }

    pub(crate) fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

#[async_trait]
impl NodeHandle for StubNode {
    async fn start(&mut self) -> Result<()> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            Err(Error::Fatal("stub stop failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn client(&self) -> Arc<dyn NodeRpc> {
        self.client.clone()
    }

    fn accounts(&self) -> WalletAccounts {
        self.accounts
    }
}
