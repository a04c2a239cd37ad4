//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process;

use tilecache::config::ConfigFileError;
use tilecache::coord::CoordError;
use tilecache::provider::ProviderError;
use tilecache::scheduler::JobError;
use tilecache::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to create the tile provider
    Provider(ProviderError),
    /// Failed to open the tile store
    Store(StoreError),
    /// Coverage request rejected before downloading
    InvalidRequest(CoordError),
    /// Failed to start a download job
    Job(JobError),
    /// Failed to start the async runtime
    Runtime(io::Error),
    /// Tile server error
    Serve { bind: String, error: io::Error },
    /// Cache directory does not exist
    CacheMissing(PathBuf),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Serve { error, .. } if error.kind() == io::ErrorKind::AddrInUse => {
                eprintln!();
                eprintln!("Another process is listening on that address.");
                eprintln!("Use --bind to pick a different port, or change [server] bind in the config file.");
            }
            CliError::Provider(ProviderError::InvalidTemplate(_)) => {
                eprintln!();
                eprintln!("The URL template must contain {{z}}, {{x}} and {{y}}, e.g.:");
                eprintln!("  https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png");
            }
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!(
                    "Fix the value in {} or run 'tilecache init' on a fresh setup.",
                    tilecache::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Provider(e) => write!(f, "Failed to create provider: {}", e),
            CliError::Store(e) => write!(f, "Failed to open tile store: {}", e),
            CliError::InvalidRequest(e) => write!(f, "Invalid coverage request: {}", e),
            CliError::Job(e) => write!(f, "Failed to start download: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Serve { bind, error } => write!(f, "Tile server on {} failed: {}", bind, error),
            CliError::CacheMissing(path) => {
                write!(f, "Cache directory '{}' does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::InvalidRequest(e) => Some(e),
            CliError::Job(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Serve { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<JobError> for CliError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::InvalidRequest(e) => CliError::InvalidRequest(e),
            other => CliError::Job(other),
        }
    }
}
