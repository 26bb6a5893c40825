//! Importing WireGuard configuration files into NetworkManager.

use std::path::{Path, PathBuf};

use crate::error::NmError;
use crate::nmcli::ConnectionManager;

/// Starting directory for the file picker: the user's home.
pub fn default_import_dir() -> PathBuf {
    crate::utils::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Hands `path` to `nmcli connection import`, fire-and-forget.
///
/// The file is not inspected; whether the import succeeds is up to
/// NetworkManager. A new connection shows up on a later poll.
pub fn import_config<M: ConnectionManager + ?Sized>(
    manager: &M,
    path: &Path,
    connection_type: &str,
) -> Result<(), NmError> {
    if !path.is_file() {
        log::warn!("Importing {:?}, which does not look like a file", path);
    }
    let file = path.to_string_lossy();
    log::info!("Importing {} config from {}", connection_type, file);
    manager.spawn(&["connection", "import", "type", connection_type, "file", &file])
}

/// Same as [`import_config`] but waits for nmcli and returns its output.
pub async fn import_config_wait<M: ConnectionManager + ?Sized>(
    manager: &M,
    path: &Path,
    connection_type: &str,
) -> Result<String, NmError> {
    let file = path.to_string_lossy();
    manager
        .output(&["connection", "import", "type", connection_type, "file", &file])
        .await
}
