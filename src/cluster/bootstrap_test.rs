use tokio_util::sync::CancellationToken;

use super::bootstrap::MempoolBootstrapper;
use crate::config::BootstrapPolicy;
use crate::node::WalletAccounts;
use crate::rpc::MockNodeRpc;
use crate::Error;
use crate::ProvisionError;

fn policy(iterations: u32) -> BootstrapPolicy {
    BootstrapPolicy {
        iterations,
        ..BootstrapPolicy::default()
    }
}

fn bitcoind_accounts() -> WalletAccounts {
    WalletAccounts {
        balance_scope: "*",
        funding_source: None,
    }
}

fn btcd_accounts() -> WalletAccounts {
    WalletAccounts {
        balance_scope: "",
        funding_source: Some("default"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_protocol_sequencing() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("mkHS9ne12qx9pS9VojpwU5xtRd4T7X7ZUt".to_string()));
    client
        .expect_balance()
        .withf(|account| account == "*")
        .times(1)
        .returning(|_| Ok(150.0));
    client
        .expect_send_to_address()
        .withf(|address, amount| address == "mkHS9ne12qx9pS9VojpwU5xtRd4T7X7ZUt" && *amount == 2.0)
        .times(3)
        .returning(|_, _| Ok("txid".to_string()));
    client
        .expect_generate()
        .withf(|blocks| *blocks == 1)
        .times(3)
        .returning(|_| Ok(vec![]));

    let cancel = CancellationToken::new();
    MempoolBootstrapper::new(&client, bitcoind_accounts(), &policy(3), &cancel)
        .run()
        .await
        .expect("bootstrap should succeed");
}

#[tokio::test(start_paused = true)]
async fn test_waits_until_balance_clears_threshold() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("addr".to_string()));
    // Matured coins show up in the spendable balance only after a few polls.
    client
        .expect_balance()
        .times(3)
        .returning(|_| Ok(50.0));
    client
        .expect_balance()
        .times(1)
        .returning(|_| Ok(150.0));
    client
        .expect_send_to_address()
        .times(1)
        .returning(|_, _| Ok("txid".to_string()));
    client
        .expect_generate()
        .withf(|blocks| *blocks == 1)
        .times(1)
        .returning(|_| Ok(vec![]));

    let cancel = CancellationToken::new();
    MempoolBootstrapper::new(&client, bitcoind_accounts(), &policy(1), &cancel)
        .run()
        .await
        .expect("bootstrap should succeed");
}

#[tokio::test(start_paused = true)]
async fn test_iteration_failures_are_tolerated() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("addr".to_string()));
    client.expect_balance().times(1).returning(|_| Ok(150.0));
    // Every send fails; the loop must still run all rounds and succeed.
    client
        .expect_send_to_address()
        .times(5)
        .returning(|_, _| Err(Error::Fatal("tx rejected".to_string())));
    client
        .expect_generate()
        .withf(|blocks| *blocks == 1)
        .times(5)
        .returning(|_| Ok(vec![]));

    let cancel = CancellationToken::new();
    MempoolBootstrapper::new(&client, bitcoind_accounts(), &policy(5), &cancel)
        .run()
        .await
        .expect("iteration failures must not abort the bootstrap");
}

#[tokio::test(start_paused = true)]
async fn test_funding_account_drives_sends_on_btcd() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("addr".to_string()));
    client
        .expect_balance()
        .withf(|account| account.is_empty())
        .times(1)
        .returning(|_| Ok(150.0));
    client
        .expect_send_from()
        .withf(|account, address, amount| {
            account == "default" && address == "addr" && *amount == 2.0
        })
        .times(2)
        .returning(|_, _, _| Ok("txid".to_string()));
    client
        .expect_generate()
        .withf(|blocks| *blocks == 1)
        .times(2)
        .returning(|_| Ok(vec![]));

    let cancel = CancellationToken::new();
    MempoolBootstrapper::new(&client, btcd_accounts(), &policy(2), &cancel)
        .run()
        .await
        .expect("bootstrap should succeed");
}

#[tokio::test(start_paused = true)]
async fn test_balance_wait_deadline() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("addr".to_string()));
    client.expect_balance().returning(|_| Ok(0.0));

    let bounded = BootstrapPolicy {
        max_balance_wait_in_ms: 1_000,
        ..BootstrapPolicy::default()
    };
    let cancel = CancellationToken::new();
    let result = MempoolBootstrapper::new(&client, bitcoind_accounts(), &bounded, &cancel)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(Error::Provision(ProvisionError::BootstrapTimeout { .. }))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_setup_failure_aborts() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Err(Error::Fatal("mining failed".to_string())));
    client.expect_new_address().times(0);

    let cancel = CancellationToken::new();
    let result = MempoolBootstrapper::new(&client, bitcoind_accounts(), &policy(3), &cancel)
        .run()
        .await;

    assert!(matches!(result, Err(Error::Fatal(msg)) if msg == "mining failed"));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_balance_wait() {
    let mut client = MockNodeRpc::new();
    client
        .expect_generate()
        .withf(|blocks| *blocks == 200)
        .times(1)
        .returning(|_| Ok(vec![]));
    client
        .expect_new_address()
        .times(1)
        .returning(|_| Ok("addr".to_string()));
    client.expect_balance().returning(|_| Ok(0.0));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = MempoolBootstrapper::new(&client, bitcoind_accounts(), &policy(1), &cancel)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(Error::Provision(ProvisionError::Cancelled { index: 0 }))
    ));
}
