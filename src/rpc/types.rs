use serde::Deserialize;

/// Subset of `getblockchaininfo` the harness consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,

    /// Current block height.
    pub blocks: i64,

    #[serde(default)]
    pub headers: i64,

    #[serde(default)]
    pub bestblockhash: String,
}

/// Verbose `getrawtransaction` record. Fields the harness does not consume
/// are ignored on decode.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub txid: String,

    #[serde(default)]
    pub hash: String,

    /// Serialized transaction, hex-encoded.
    pub hex: String,

    #[serde(default)]
    pub size: i64,

    #[serde(default)]
    pub confirmations: i64,
}
