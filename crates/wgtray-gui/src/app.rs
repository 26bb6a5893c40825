use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tray_icon::menu::{CheckMenuItem, MenuEvent};
use wgtray::{AppletEvent, WatcherCommand};

use crate::tray::{connection_row, update_tray_icon, TrayComponents, IMPORT_ID, QUIT_ID, ROW_ID_PREFIX};

/// What a click on a menu item asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Toggle(String),
    Import,
    Quit,
}

impl MenuAction {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            IMPORT_ID => Some(MenuAction::Import),
            QUIT_ID => Some(MenuAction::Quit),
            _ => id
                .strip_prefix(ROW_ID_PREFIX)
                .filter(|uuid| wgtray::parse::is_uuid(uuid))
                .map(|uuid| MenuAction::Toggle(uuid.to_string())),
        }
    }
}

/// Inserts a row at `position`, falling back to `fallback` (the end of the
/// connection rows) if that fails. Returns where the row landed.
pub fn place_row<E: std::fmt::Display>(
    position: usize,
    fallback: usize,
    mut insert: impl FnMut(usize) -> Result<(), E>,
) -> Option<usize> {
    match insert(position) {
        Ok(()) => return Some(position),
        Err(e) => log::warn!("Inserting menu row at {} failed: {}", position, e),
    }
    if fallback == position {
        return None;
    }
    match insert(fallback) {
        Ok(()) => Some(fallback),
        Err(e) => {
            log::warn!("Inserting menu row at {} failed: {}", fallback, e);
            None
        }
    }
}

/// Front-end state living on the GTK thread.
pub struct WgTray {
    pub components: TrayComponents,
    pub rows: HashMap<String, CheckMenuItem>,
    pub commands: mpsc::Sender<WatcherCommand>,
    pub import_dir: PathBuf,
    pub should_quit: bool,
}

impl WgTray {
    pub fn new(
        components: TrayComponents,
        commands: mpsc::Sender<WatcherCommand>,
        import_dir: PathBuf,
    ) -> Self {
        Self {
            components,
            rows: HashMap::new(),
            commands,
            import_dir,
            should_quit: false,
        }
    }

    /// Applies one change coming from the watcher.
    pub fn apply(&mut self, event: AppletEvent) {
        match event {
            AppletEvent::EntryAdded {
                uuid,
                name,
                position,
            } => {
                let row = connection_row(&uuid, &name);
                let menu = &self.components.menu;
                // Later positions may run past the shown rows; those land at the end.
                match place_row(position, self.rows.len(), |at| menu.insert(&row, at)) {
                    Some(_) => {
                        self.rows.insert(uuid, row);
                    }
                    None => log::error!("Menu row for {} is not shown", name),
                }
            }
            AppletEvent::EntryRemoved { uuid } => {
                if let Some(row) = self.rows.remove(&uuid) {
                    if let Err(e) = self.components.menu.remove(&row) {
                        log::error!("Failed to remove menu row for {}: {}", uuid, e);
                    }
                }
            }
            AppletEvent::EntryState { uuid, active } => {
                if let Some(row) = self.rows.get(&uuid) {
                    row.set_checked(active);
                }
            }
            AppletEvent::Caption(caption) => {
                update_tray_icon(&self.components.tray, &caption);
            }
        }
    }

    pub fn on_menu_event(&mut self, event: MenuEvent) {
        match MenuAction::from_id(event.id.as_ref()) {
            Some(MenuAction::Toggle(uuid)) => {
                // The check mark has already flipped by the time the event arrives.
                let Some(on) = self.rows.get(&uuid).map(|row| row.is_checked()) else {
                    return;
                };
                self.send(WatcherCommand::Toggle { uuid, on });
            }
            Some(MenuAction::Import) => self.import(),
            Some(MenuAction::Quit) => self.should_quit = true,
            None => log::debug!("Unhandled menu event {:?}", event.id),
        }
    }

    #[cfg(target_os = "linux")]
    fn import(&self) {
        if let Some(path) = crate::dialog::pick_config(&self.import_dir) {
            self.send(WatcherCommand::Import(path));
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn import(&self) {
        log::warn!("Importing is only available with GTK");
    }

    fn send(&self, command: WatcherCommand) {
        if let Err(e) = self.commands.try_send(command) {
            log::error!("Watcher is not accepting commands: {}", e);
        }
    }
}
