//! Mempool bootstrap: seeds a fresh cluster's ledger with matured coinage
//! and a non-trivial send history, so dependent tests never start against an
//! empty chain.

use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::BootstrapPolicy;
use crate::node::WalletAccounts;
use crate::rpc::NodeRpc;
use crate::ProvisionError;
use crate::Result;

/// Sequential bootstrap protocol, run against the master node only.
pub(crate) struct MempoolBootstrapper<'a> {
    client: &'a dyn NodeRpc,
    accounts: WalletAccounts,
    policy: &'a BootstrapPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> MempoolBootstrapper<'a> {
    pub(crate) fn new(
        client: &'a dyn NodeRpc,
        accounts: WalletAccounts,
        policy: &'a BootstrapPolicy,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            accounts,
            policy,
            cancel,
        }
    }

    /// Mines the maturity run, waits for spendable balance, then replays
    /// send+mine rounds. A failed round is logged and skipped: the goal is
    /// *a* transaction history, not an exact count, so partial iteration
    /// failure is tolerated by design of the protocol, while failures in the
    /// setup steps abort.
    pub(crate) async fn run(&self) -> Result<()> {
        self.client.generate(self.policy.maturity_blocks).await?;
        let address = self.client.new_address("").await?;
        self.wait_for_spendable_balance().await?;

        for round in 0..self.policy.iterations {
            if let Err(e) = self.send(&address).await {
                warn!("bootstrap round {}: send failed: {}", round, e);
            }
            if let Err(e) = self.client.generate(1).await {
                warn!("bootstrap round {}: generate failed: {}", round, e);
            }
        }

        info!("mempool bootstrap finished after {} rounds", self.policy.iterations);
        Ok(())
    }

    async fn send(
        &self,
        address: &str,
    ) -> Result<String> {
        match self.accounts.funding_source {
            Some(account) => {
                self.client
                    .send_from(account, address, self.policy.spend_amount)
                    .await
            }
            None => {
                self.client
                    .send_to_address(address, self.policy.spend_amount)
                    .await
            }
        }
    }

    /// Matured coins are not instantly reflected in a spendable-balance
    /// query on every backend; poll until the threshold clears.
    async fn wait_for_spendable_balance(&self) -> Result<()> {
        let started = Instant::now();
        let deadline = self.policy.max_balance_wait();

        loop {
            match self.client.balance(self.accounts.balance_scope).await {
                Ok(balance) if balance > self.policy.min_spendable => {
                    debug!("spendable balance {} clears bootstrap threshold", balance);
                    return Ok(());
                }
                Ok(balance) => {
                    debug!(
                        "spendable balance {} below threshold {}",
                        balance, self.policy.min_spendable
                    );
                }
                Err(e) => debug!("balance query failed while waiting: {}", e),
            }

            if let Some(limit) = deadline {
                if started.elapsed() >= limit {
                    return Err(ProvisionError::BootstrapTimeout {
                        waited: started.elapsed(),
                    }
                    .into());
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ProvisionError::Cancelled { index: 0 }.into());
                }
                _ = sleep(self.policy.balance_poll_interval()) => {}
            }
        }
    }
}
