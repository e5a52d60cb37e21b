use tokio::net::TcpListener;

use crate::ProvisionError;
use crate::Result;

/// Allocates a free loopback port by binding port 0 and taking whatever the
/// OS assigns. Concurrent clusters in one test run each draw from this
/// source instead of sharing fixed port strings.
pub(crate) async fn alloc_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(ProvisionError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(ProvisionError::PortAllocation)?
        .port();
    drop(listener);
    Ok(port)
}

pub(crate) fn loopback(port: u16) -> String {
    format!("127.0.0.1:{}", port)
}
