//! User-initiated toggling of a connection row.

use crate::nmcli::{activate, deactivate, ConnectionManager};
use crate::reconcile::{AppletEvent, Reconciler};

/// Handles a switch flip on the row bound to `uuid`.
///
/// Issues `connection up`/`connection down` without waiting and updates the
/// entry and caption right away. The next poll confirms or overrules it.
pub fn toggle_connection<M: ConnectionManager + ?Sized>(
    manager: &M,
    reconciler: &mut Reconciler,
    uuid: &str,
    on: bool,
) -> Vec<AppletEvent> {
    let Some(events) = reconciler.toggle(uuid, on) else {
        log::warn!("Toggle for unknown connection {}", uuid);
        return Vec::new();
    };

    let result = if on {
        activate(manager, uuid)
    } else {
        deactivate(manager, uuid)
    };
    match result {
        Ok(()) => log::info!(
            "Requested connection {} for {}",
            if on { "up" } else { "down" },
            uuid
        ),
        Err(e) => log::error!("{}", e),
    }

    events
}
