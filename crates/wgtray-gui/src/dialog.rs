use gtk::prelude::*;
use std::path::{Path, PathBuf};

/// Asks for a single configuration file, starting in `start_dir`.
/// Returns `None` if the user cancels.
pub fn pick_config(start_dir: &Path) -> Option<PathBuf> {
    let dialog = gtk::FileChooserDialog::with_buttons(
        Some("Import config"),
        None::<&gtk::Window>,
        gtk::FileChooserAction::Open,
        &[
            ("_Cancel", gtk::ResponseType::Cancel),
            ("_Open", gtk::ResponseType::Accept),
        ],
    );
    dialog.set_select_multiple(false);
    if !dialog.set_current_folder(start_dir) {
        log::debug!("Could not open file picker in {:?}", start_dir);
    }

    let picked = match dialog.run() {
        gtk::ResponseType::Accept => dialog.filename(),
        _ => None,
    };
    dialog.close();
    picked
}
