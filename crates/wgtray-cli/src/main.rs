//! # wgtray CLI
//!
//! Command-line access to the same operations the tray applet performs:
//! listing, status, up/down, import, and a foreground watch loop.

mod args;

use anyhow::Context;
use args::{Args, Commands};
use clap::Parser;
use console::Style;
use crossbeam_channel::RecvTimeoutError;
use log::error;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use wgtray::nmcli::set_active_wait;
use wgtray::utils::expand_home;
use wgtray::{
    connection_status, import_config_wait, init_logger, list_connections, AppletEvent,
    CancellationToken, ErrorCategory, NmCli, NmError, Settings, StateLine, Watcher,
};

/// The main entry point of the application.
fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.level.into());

    let mut settings = Settings::load();
    if let Some(path) = &args.nmcli {
        settings.nmcli_path = path.clone();
    }
    if let Some(ty) = &args.connection_type {
        settings.connection_type = ty.clone();
    }

    match run(args.command, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<NmError>().map(NmError::category) {
                Some(ErrorCategory::Input) => ExitCode::from(2),
                Some(ErrorCategory::Tool) => ExitCode::from(3),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(command: Commands, mut settings: Settings) -> anyhow::Result<()> {
    if let Commands::Config { save } = command {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        if save {
            settings.save().context("Failed to save settings")?;
            eprintln!("Settings saved.");
        }
        return Ok(());
    }

    let nm = NmCli::locate(&settings.nmcli_path).ok_or_else(|| NmError::NotFound {
        tool: settings.nmcli_path.clone(),
    })?;
    log::debug!("Using {:?}", nm.path);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let bold = Style::new().bold();
    let green = Style::new().green();
    let dim = Style::new().dim();

    match command {
        Commands::List => {
            let records = runtime.block_on(list_connections(&nm, &settings.connection_type))?;
            if records.is_empty() {
                eprintln!("No {} connections.", settings.connection_type);
            }
            for record in records {
                println!("{:<24} {}", bold.apply_to(&record.name), record.uuid);
            }
        }
        Commands::Status { uuid } => {
            check_uuid(&uuid)?;
            let state = runtime.block_on(connection_status(&nm, &uuid))?;
            match state {
                StateLine::Present { active: true } => {
                    println!("{} activated", green.apply_to("●"))
                }
                StateLine::Present { active: false } => println!("{} changing", dim.apply_to("◐")),
                StateLine::Missing => println!("{} not active", dim.apply_to("○")),
            }
        }
        Commands::Up { uuid } => {
            let out = runtime.block_on(set_active_wait(&nm, &uuid, true))?;
            print_tool_output(&out);
        }
        Commands::Down { uuid } => {
            let out = runtime.block_on(set_active_wait(&nm, &uuid, false))?;
            print_tool_output(&out);
        }
        Commands::Import { file } => {
            let file = import_path(&file);
            let out =
                runtime.block_on(import_config_wait(&nm, &file, &settings.connection_type))?;
            print_tool_output(&out);
        }
        Commands::Watch { interval_ms } => {
            if let Some(ms) = interval_ms {
                settings.poll_interval_ms = ms;
            }
            watch(&runtime, nm, &settings)?;
        }
        Commands::Config { .. } => unreachable!("handled before locating nmcli"),
    }

    Ok(())
}

fn check_uuid(uuid: &str) -> Result<(), NmError> {
    if wgtray::parse::is_uuid(uuid) {
        Ok(())
    } else {
        Err(NmError::InvalidIdentifier {
            value: uuid.to_string(),
        })
    }
}

/// Expands `~` and makes the path absolute; nmcli decides whether it is usable.
fn import_path(file: &Path) -> PathBuf {
    let file = expand_home(&file.to_string_lossy());
    if file.is_absolute() {
        return file;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(file),
        Err(_) => file,
    }
}

fn print_tool_output(out: &str) {
    let out = out.trim();
    if !out.is_empty() {
        println!("{}", out);
    }
}

/// Runs the watcher in the foreground, printing each change until Ctrl-C.
fn watch(runtime: &tokio::runtime::Runtime, nm: NmCli, settings: &Settings) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("Failed to set Ctrl-C handler")?;

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    // Held open so the watcher keeps running until cancelled.
    let (_commands, command_rx) = tokio::sync::mpsc::channel(8);
    let watcher = Watcher::new(nm, settings, event_tx);
    let handle = runtime.spawn(watcher.run(command_rx, cancel.clone()));

    let mut names = HashMap::new();
    while !cancel.is_cancelled() {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => print_event(&event, &mut names),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    runtime.block_on(handle).context("Watcher task failed")?;
    Ok(())
}

fn print_event(event: &AppletEvent, names: &mut HashMap<String, String>) {
    let green = Style::new().green();
    let red = Style::new().red();
    let cyan = Style::new().cyan().bold();

    match event {
        AppletEvent::EntryAdded { uuid, name, .. } => {
            names.insert(uuid.clone(), name.clone());
            println!("{} {} ({})", green.apply_to("+"), name, uuid);
        }
        AppletEvent::EntryRemoved { uuid } => {
            let name = names.remove(uuid).unwrap_or_default();
            println!("{} {} ({})", red.apply_to("-"), name, uuid);
        }
        AppletEvent::EntryState { uuid, active } => {
            let name = names.get(uuid).map(String::as_str).unwrap_or(uuid);
            let state = if *active { "up" } else { "down" };
            println!("  {} is {}", name, state);
        }
        AppletEvent::Caption(caption) => {
            println!("{} {}", cyan.apply_to(">>"), caption.tooltip());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_path_is_not_checked_for_existence() {
        let missing = import_path(Path::new("/nonexistent/wgtray/wg9.conf"));
        assert_eq!(missing, PathBuf::from("/nonexistent/wgtray/wg9.conf"));

        let relative = import_path(Path::new("wg9.conf"));
        assert!(relative.is_absolute());
        assert!(relative.ends_with("wg9.conf"));
    }

    #[test]
    fn import_path_expands_home() {
        if let Some(home) = wgtray::utils::home_dir() {
            assert_eq!(import_path(Path::new("~/wg0.conf")), home.join("wg0.conf"));
        }
    }
}
