use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Returns `$HOME`, if set.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expands a leading `~/` (or a bare `~`) to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path, home_dir()) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

/// Path from the home directory to the wgtray data directory.
const DATA_SUBPATH: &str = ".local/share/wgtray";

/// Returns the user data directory (`$XDG_DATA_HOME/wgtray` or
/// `~/.local/share/wgtray`), creating it if it does not already exist.
pub fn get_user_data_dir() -> Result<PathBuf, Box<dyn Error>> {
    let user_data_dir = match env::var_os("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        Some(base) => PathBuf::from(base).join("wgtray"),
        None => home_dir().ok_or("HOME is not set")?.join(DATA_SUBPATH),
    };

    if !user_data_dir.exists() {
        std::fs::create_dir_all(&user_data_dir)?;
        log::info!("User data directory created at: {:?}", user_data_dir);
    }

    Ok(user_data_dir)
}
