//! Init command - create the configuration file.

use std::path::Path;

use tilecache::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created configuration file: {}", path.display());
    } else {
        println!("Configuration file already exists: {}", path.display());
    }
    println!();
    println!("Edit this file to change the provider, cache directory or server address.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
