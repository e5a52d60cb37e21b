use std::time::Duration;

use serde::Deserialize;

/// Mempool-bootstrap protocol parameters.
///
/// The defaults reproduce the canonical bootstrap: mine 200 blocks so
/// coinbase rewards mature on either backend, wait for more than 101 coins
/// of spendable balance, then 50 rounds of a 2-coin send plus one block.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BootstrapPolicy {
    /// Blocks mined up front to mature coinbase rewards.
    #[serde(default = "default_maturity_blocks")]
    pub maturity_blocks: u32,

    /// Spendable balance must exceed this before the send loop starts.
    #[serde(default = "default_min_spendable")]
    pub min_spendable: f64,

    /// Amount sent per iteration.
    #[serde(default = "default_spend_amount")]
    pub spend_amount: f64,

    /// Number of send-then-mine rounds.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_balance_poll_interval_in_ms")]
    pub balance_poll_interval_in_ms: u64,

    /// Maximum balance wait (unit: milliseconds, 0 means unlimited).
    #[serde(default = "default_max_balance_wait_in_ms")]
    pub max_balance_wait_in_ms: u64,
}

impl BootstrapPolicy {
    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_millis(self.balance_poll_interval_in_ms)
    }

    pub fn max_balance_wait(&self) -> Option<Duration> {
        if self.max_balance_wait_in_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.max_balance_wait_in_ms))
        }
    }
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            maturity_blocks: default_maturity_blocks(),
            min_spendable: default_min_spendable(),
            spend_amount: default_spend_amount(),
            iterations: default_iterations(),
            balance_poll_interval_in_ms: default_balance_poll_interval_in_ms(),
            max_balance_wait_in_ms: default_max_balance_wait_in_ms(),
        }
    }
}

fn default_maturity_blocks() -> u32 {
    200
}
fn default_min_spendable() -> f64 {
    101.0
}
fn default_spend_amount() -> f64 {
    2.0
}
fn default_iterations() -> u32 {
    50
}
fn default_balance_poll_interval_in_ms() -> u64 {
    200
}
fn default_max_balance_wait_in_ms() -> u64 {
    0
}
