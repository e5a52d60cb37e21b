//! JSON-RPC client for a node's control plane.
//!
//! Plaintext HTTP with basic auth and fixed test credentials, request/
//! response per call. The daemon reports call failures inside the JSON
//! envelope (often alongside a non-2xx status), so the body is decoded
//! before the HTTP status is considered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use tracing::trace;

use super::BlockchainInfo;
use super::NodeRpc;
use super::RawTransaction;
use crate::RpcError;
use crate::RpcSettings;
use crate::Result;

#[derive(Serialize)]
struct JsonRequestBody<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonResponseBody {
    #[serde(default)]
    result: Value,
    error: Option<JsonErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonErrorBody {
    code: i64,
    message: String,
}

/// Control connection to one daemon.
pub struct RpcClient {
    client: Client,
    url: Url,
    user: String,
    password: String,
}

impl RpcClient {
    /// `host` is `ip:port`; transport security is deliberately absent, the
    /// connection never leaves loopback.
    pub fn new(
        host: &str,
        user: &str,
        password: &str,
        settings: &RpcSettings,
    ) -> Result<Self> {
        let url =
            Url::parse(&format!("http://{}/", host)).map_err(|_| RpcError::InvalidUrl(host.to_string()))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_in_ms))
            .timeout(Duration::from_millis(settings.request_timeout_in_ms))
            .build()
            .map_err(RpcError::Transport)?;

        Ok(Self {
            client,
            url,
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    async fn call<D: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<D> {
        let body = JsonRequestBody {
            jsonrpc: "1.0",
            method,
            params,
            id: 1,
        };
        let response = self
            .client
            .post(self.url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(RpcError::Transport)?;

        let body: JsonResponseBody = response.json().await.map_err(RpcError::Transport)?;
        trace!("{} response decoded", method);

        match body.error {
            Some(e) => Err(RpcError::Server {
                code: e.code,
                message: e.message,
            }
            .into()),
            None => Ok(serde_json::from_value(body.result).map_err(RpcError::MalformedResponse)?),
        }
    }
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn ping(&self) -> Result<()> {
        let _: Value = self.call("ping", json!([])).await?;
        Ok(())
    }

    async fn generate(
        &self,
        blocks: u32,
    ) -> Result<Vec<String>> {
        self.call("generate", json!([blocks])).await
    }

    async fn balance(
        &self,
        account: &str,
    ) -> Result<f64> {
        self.call("getbalance", json!([account])).await
    }

    async fn new_address(
        &self,
        account: &str,
    ) -> Result<String> {
        self.call("getnewaddress", json!([account])).await
    }

    async fn send_to_address(
        &self,
        address: &str,
        amount: f64,
    ) -> Result<String> {
        self.call("sendtoaddress", json!([address, amount])).await
    }

    async fn send_from(
        &self,
        account: &str,
        address: &str,
        amount: f64,
    ) -> Result<String> {
        self.call("sendfrom", json!([account, address, amount])).await
    }

    async fn raw_transaction(
        &self,
        txid: &str,
    ) -> Result<RawTransaction> {
        self.call("getrawtransaction", json!([txid, true])).await
    }

    async fn blockchain_info(&self) -> Result<BlockchainInfo> {
        self.call("getblockchaininfo", json!([])).await
    }

    async fn estimate_fee(
        &self,
        target_blocks: i64,
    ) -> Result<f64> {
        self.call("estimatefee", json!([target_blocks])).await
    }

    async fn stop(&self) -> Result<()> {
        let _: Value = self.call("stop", json!([])).await?;
        Ok(())
    }
}
