use std::path::PathBuf;

use serde::Deserialize;

/// Provisioning parameters shared by every node of a cluster.
#[derive(Debug, Deserialize, Clone)]
pub struct ClusterSettings {
    /// Root under which each node's exclusive data directory is created.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Fixed control-plane credentials passed to every daemon.
    #[serde(default = "default_rpc_user")]
    pub rpc_user: String,

    #[serde(default = "default_rpc_password")]
    pub rpc_password: String,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            rpc_user: default_rpc_user(),
            rpc_password: default_rpc_password(),
        }
    }
}

fn default_data_root() -> PathBuf {
    std::env::temp_dir()
}
fn default_rpc_user() -> String {
    "test".to_string()
}
fn default_rpc_password() -> String {
    "test".to_string()
}
