use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::BlockchainInfo;
use super::RawTransaction;
use crate::Result;

/// Control-plane surface of one node, as consumed by the orchestration
/// layers.
///
/// [`RpcClient`](super::RpcClient) implements this against a live daemon;
/// tests substitute a mock so cluster logic runs without processes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Lightweight health check; succeeds once the daemon serves requests.
    async fn ping(&self) -> Result<()>;

    /// Mines `blocks` blocks, returning their hashes.
    async fn generate(&self, blocks: u32) -> Result<Vec<String>>;

    /// Spendable wallet balance for the given account selector.
    async fn balance(&self, account: &str) -> Result<f64>;

    /// Fresh receiving address from the node's wallet.
    async fn new_address(&self, account: &str) -> Result<String>;

    /// Sends `amount` to `address` from the default wallet; returns the
    /// transaction id.
    async fn send_to_address(&self, address: &str, amount: f64) -> Result<String>;

    /// Sends `amount` to `address` drawing from a named wallet account;
    /// returns the transaction id.
    async fn send_from(&self, account: &str, address: &str, amount: f64) -> Result<String>;

    /// Verbose transaction lookup; requires the node to index transactions.
    async fn raw_transaction(&self, txid: &str) -> Result<RawTransaction>;

    async fn blockchain_info(&self) -> Result<BlockchainInfo>;

    /// Estimated fee rate to confirm within `target_blocks` blocks.
    async fn estimate_fee(&self, target_blocks: i64) -> Result<f64>;

    /// Requests graceful daemon shutdown.
    async fn stop(&self) -> Result<()>;
}
