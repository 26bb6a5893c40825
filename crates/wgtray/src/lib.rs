//! # wgtray
//!
//! Lists, toggles and imports NetworkManager WireGuard connections by driving
//! `nmcli`. A [`Watcher`] polls the connection list once per interval, a
//! [`Reconciler`] diffs it against the displayed rows, and front ends consume
//! the resulting [`AppletEvent`]s.

pub mod config;
pub mod error;
pub mod import;
pub mod logger;
pub mod nmcli;
pub mod parse;
pub mod reconcile;
pub mod toggle;
pub mod utils;
pub mod watcher;

// Re-export commonly used items
pub use config::Settings;
pub use error::{ErrorCategory, NmError};
pub use import::{default_import_dir, import_config, import_config_wait};
pub use logger::init_logger;
pub use nmcli::{
    connection_status, list_connections, locate_nmcli, ConnectionManager, NmCli,
};
pub use parse::{ConnectionRecord, StateLine};
pub use reconcile::{AppletEvent, Caption, DisplayEntry, Reconciler};
pub use toggle::toggle_connection;
pub use utils::CancellationToken;
pub use watcher::{Watcher, WatcherCommand};
