//! Configuration for the cluster harness.
//!
//! Loading priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file
//! 3. Environment variables (highest priority, `REGBOX_` prefix)

mod bootstrap;
mod cluster;
mod readiness;
mod rpc;

pub use bootstrap::*;
pub use cluster::*;
pub use readiness::*;
pub use rpc::*;

#[cfg(test)]
mod config_test;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Cluster-wide provisioning parameters
    #[serde(default)]
    pub cluster: ClusterSettings,

    /// Control-connection transport parameters
    #[serde(default)]
    pub rpc: RpcSettings,

    /// Readiness-probe polling parameters
    #[serde(default)]
    pub readiness: ReadinessPolicy,

    /// Mempool-bootstrap protocol parameters
    #[serde(default)]
    pub bootstrap: BootstrapPolicy,
}

impl Settings {
    /// Load configuration, layering an optional file and `REGBOX_`-prefixed
    /// environment variables over the defaults.
    ///
    /// Nested keys use `__` in the environment, e.g.
    /// `REGBOX_READINESS__POLL_INTERVAL_IN_MS=50`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(p) = path {
            builder = builder.add_source(File::with_name(p).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("REGBOX")
                .prefix_separator("_")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
