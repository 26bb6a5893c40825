use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub nmcli_path: String,
    /// Only connections of this nmcli type are listed.
    pub connection_type: String,
    pub poll_interval_ms: u64,
    /// Where the import file picker opens; the home directory when unset.
    pub import_dir: Option<PathBuf>,
    pub log_level: String,
    /// Treat a failed listing as "no connections" instead of skipping the tick.
    pub clear_on_error: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nmcli_path: "nmcli".to_string(),
            connection_type: "wireguard".to_string(),
            poll_interval_ms: 1000,
            import_dir: None,
            log_level: "info".to_string(),
            clear_on_error: false,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        crate::logger::parse_level(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }

    pub fn import_dir(&self) -> PathBuf {
        match &self.import_dir {
            Some(dir) => crate::utils::expand_home(&dir.to_string_lossy()),
            None => crate::import::default_import_dir(),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = crate::utils::get_user_data_dir().map_err(|e| anyhow::anyhow!("{}", e))?;
        self.save_to(&dir.join(SETTINGS_FILE))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load() -> Self {
        match crate::utils::get_user_data_dir() {
            Ok(dir) => Self::load_from(&dir.join(SETTINGS_FILE)),
            Err(e) => {
                log::debug!("No data directory ({}), using default settings", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from))
        {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring unreadable settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
