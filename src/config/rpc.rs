use serde::Deserialize;

/// Control-connection transport parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RpcSettings {
    #[serde(default = "default_connect_timeout_in_ms")]
    pub connect_timeout_in_ms: u64,

    /// Per-request ceiling. Mining a few hundred blocks in one call is the
    /// slowest request the harness issues, so this is generous.
    #[serde(default = "default_request_timeout_in_ms")]
    pub request_timeout_in_ms: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            connect_timeout_in_ms: default_connect_timeout_in_ms(),
            request_timeout_in_ms: default_request_timeout_in_ms(),
        }
    }
}

fn default_connect_timeout_in_ms() -> u64 {
    1_000
}
fn default_request_timeout_in_ms() -> u64 {
    60_000
}
