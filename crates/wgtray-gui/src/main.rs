//! # wgtray
//!
//! Panel applet listing NetworkManager WireGuard connections as toggle rows.
//! The watcher polls `nmcli` on a tokio runtime; the tray lives on the GTK
//! thread and drains the watcher's events every 20 ms.

mod app;
#[cfg(target_os = "linux")]
mod dialog;
mod tray;

#[cfg(target_os = "linux")]
pub fn main() -> anyhow::Result<()> {
    use crate::app::WgTray;
    use crate::tray::init_tray;
    use gtk::glib;
    use std::time::Duration;
    use tray_icon::menu::MenuEvent;
    use wgtray::{init_logger, CancellationToken, NmCli, NmError, Settings, Watcher};

    let settings = Settings::load();
    init_logger(settings.log_level());

    // tray-icon on Linux requires GTK to be initialized first
    gtk::init()?;

    let nm = NmCli::locate(&settings.nmcli_path).ok_or_else(|| NmError::NotFound {
        tool: settings.nmcli_path.clone(),
    })?;
    log::info!("Using {:?}", nm.path);

    let runtime = tokio::runtime::Runtime::new()?;
    let cancel = CancellationToken::new();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let (command_tx, command_rx) = tokio::sync::mpsc::channel(32);

    let watcher = Watcher::new(nm, &settings, event_tx);
    runtime.spawn(watcher.run(command_rx, cancel.clone()));

    let mut applet = WgTray::new(init_tray()?, command_tx, settings.import_dir());

    glib::timeout_add_local(Duration::from_millis(20), move || {
        while let Ok(event) = event_rx.try_recv() {
            applet.apply(event);
        }
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            applet.on_menu_event(event);
        }

        if applet.should_quit {
            log::info!("Exiting");
            gtk::main_quit();
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    gtk::main();

    cancel.cancel();
    runtime.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn main() {
    eprintln!("wgtray drives NetworkManager and only runs on Linux.");
}
