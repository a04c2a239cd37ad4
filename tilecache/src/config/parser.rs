//! INI parsing: the single place where INI keys are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_REQUEST_TILES;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("bind") {
            config.server.bind = v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "server".to_string(),
                key: "bind".to_string(),
                value: v.to_string(),
                reason: "expected an address like '127.0.0.1:5000'".to_string(),
            })?;
        }
        if let Some(v) = section.get("public_url") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(ConfigFileError::InvalidValue {
                        section: "server".to_string(),
                        key: "public_url".to_string(),
                        value: v.to_string(),
                        reason: "must start with http:// or https://".to_string(),
                    });
                }
                config.server.public_url = Some(v.to_string());
            }
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
    }

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("name") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.name = v.to_string();
            }
        }
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if !["{z}", "{x}", "{y}"].iter().all(|p| v.contains(p)) {
                return Err(ConfigFileError::InvalidValue {
                    section: "provider".to_string(),
                    key: "url_template".to_string(),
                    value: v.to_string(),
                    reason: "must contain {z}, {x} and {y}".to_string(),
                });
            }
            config.provider.url_template = v.to_string();
        }
        if let Some(v) = section.get("attribution") {
            config.provider.attribution = v.trim().to_string();
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.user_agent = v.to_string();
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("workers") {
            config.download.workers = parse_positive(v, "download", "workers", "")?;
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive(v, "download", "timeout", " (seconds)")?;
        }
        if let Some(v) = section.get("max_tiles") {
            let max_tiles: u64 = parse_positive(v, "download", "max_tiles", "")?;
            if max_tiles > MAX_REQUEST_TILES {
                return Err(ConfigFileError::InvalidValue {
                    section: "download".to_string(),
                    key: "max_tiles".to_string(),
                    value: v.to_string(),
                    reason: format!("must not exceed {}", MAX_REQUEST_TILES),
                });
            }
            config.download.max_tiles = max_tiles;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_positive<T>(value: &str, section: &str, key: &str, unit: &str) -> Result<T, ConfigFileError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be a positive integer{}", unit),
        }),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[download]
workers = 4
"#,
        )
        .unwrap();

        assert_eq!(config.download.workers, 4);
        assert_eq!(config.download.timeout, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        assert_eq!(config.download.max_tiles, DEFAULT_MAX_TILES);
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[server]
bind = 0.0.0.0:8080
public_url = https://tiles.example.org

[cache]
directory = /var/cache/tiles

[provider]
name = OpenStreetMap
url_template = https://tile.openstreetmap.org/{z}/{x}/{y}.png
attribution = © OpenStreetMap contributors
user_agent = my-agent/1.0

[download]
workers = 8
timeout = 30
max_tiles = 250000

[logging]
directory = /var/log/tilecache
file = server.log
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.server.public_url.as_deref(), Some("https://tiles.example.org"));
        assert_eq!(config.cache.directory, PathBuf::from("/var/cache/tiles"));
        assert_eq!(config.provider.name, "OpenStreetMap");
        assert_eq!(config.provider.attribution, "© OpenStreetMap contributors");
        assert_eq!(config.provider.user_agent, "my-agent/1.0");
        assert_eq!(config.download.workers, 8);
        assert_eq!(config.download.timeout, 30);
        assert_eq!(config.download.max_tiles, 250_000);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/tilecache"));
        assert_eq!(config.logging.file, "server.log");
    }

    #[test]
    fn test_invalid_bind() {
        let result = load("[server]\nbind = localhost\n");
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "bind"
        ));
    }

    #[test]
    fn test_invalid_public_url() {
        let result = load("[server]\npublic_url = tiles.example.org\n");
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "public_url"
        ));
    }

    #[test]
    fn test_invalid_url_template() {
        let result = load("[provider]\nurl_template = https://tiles/{z}/{x}.png\n");
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "url_template"
        ));
    }

    #[test]
    fn test_invalid_workers() {
        for bad in ["0", "-2", "many"] {
            let result = load(&format!("[download]\nworkers = {}\n", bad));
            assert!(
                matches!(result, Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "workers"),
                "workers = {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_max_tiles() {
        let too_many = (MAX_REQUEST_TILES + 1).to_string();
        for bad in ["0", "lots", too_many.as_str()] {
            let result = load(&format!("[download]\nmax_tiles = {}\n", bad));
            assert!(
                matches!(result, Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "max_tiles"),
                "max_tiles = {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_empty_public_url_means_derived() {
        let config = load("[server]\nbind = 127.0.0.1:9000\npublic_url =\n").unwrap();
        assert!(config.server.public_url.is_none());
        assert_eq!(config.server.public_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
