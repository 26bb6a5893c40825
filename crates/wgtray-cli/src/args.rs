use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lists, toggles and imports NetworkManager WireGuard connections
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// nmcli binary to run (path or name on PATH)
    #[arg(long, global = true)]
    pub nmcli: Option<String>,

    /// Connection type to list (nmcli TYPE column)
    #[arg(long = "type", value_name = "TYPE", global = true)]
    pub connection_type: Option<String>,

    /// Logging level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List connections of the configured type
    List,
    /// Show whether a connection is activated
    Status { uuid: String },
    /// Bring a connection up and wait for nmcli
    Up { uuid: String },
    /// Bring a connection down and wait for nmcli
    Down { uuid: String },
    /// Import a configuration file into NetworkManager
    Import { file: PathBuf },
    /// Poll continuously and print changes until Ctrl-C
    Watch {
        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Print the effective settings as JSON
    Config {
        /// Also write them to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}
