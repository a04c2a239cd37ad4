//! Serialization of `ConfigFile` into the commented INI written to disk.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let public_url = config.server.public_url.as_deref().unwrap_or("");

    format!(
        r#"[server]
; Address the tile server listens on
bind = {}
; Base URL advertised in tilejson.json (default: http://<bind>)
public_url = {}

[cache]
; Root of the {{z}}/{{x}}/{{y}}.png tile hierarchy
directory = {}

[provider]
; Display name, also used as the TileJSON name
name = {}
; Tile URL with {{z}}, {{x}} and {{y}} placeholders
url_template = {}
; Attribution shown by map clients
attribution = {}
user_agent = {}

[download]
; Concurrent download workers per job (default: 20)
workers = {}
; Timeout in seconds for each tile request (default: 10)
timeout = {}
; Largest preload accepted, in tiles (default: 5000000)
max_tiles = {}

[logging]
directory = {}
file = {}
"#,
        config.server.bind,
        public_url,
        path_to_string(&config.cache.directory),
        config.provider.name,
        config.provider.url_template,
        config.provider.attribution,
        config.provider.user_agent,
        config.download.workers,
        config.download.timeout,
        config.download.max_tiles,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
