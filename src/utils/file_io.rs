use std::path::Path;

use tracing::debug;

use crate::ProvisionError;
use crate::Result;

/// Creates a node's exclusive data directory, parents included.
pub(crate) async fn create_data_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| ProvisionError::DataDir {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("created data directory {:?}", path);
    Ok(())
}

/// Recursively removes a node's data directory. A directory that is already
/// gone counts as success.
pub(crate) async fn remove_data_dir(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
