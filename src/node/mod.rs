mod bitcoind;
mod btcd;
mod handle;
mod readiness;

pub use handle::*;

pub(crate) use bitcoind::BitcoindNode;
pub(crate) use btcd::BtcdNode;
