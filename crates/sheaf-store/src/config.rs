//! Workspace configuration in `.sheaf/config.json`.

use crate::atomic::write_atomic;
use crate::paths::SheafPaths;
use serde::{Deserialize, Serialize};
use sheaf_core::EngineOptions;
use std::path::Path;
use std::time::Duration;

/// Typed view of the known keys. Unknown keys are ignored here and kept in
/// the file by [`write_config_map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cap on derived patch names; 0 disables the cap.
    pub name_length: usize,
    /// How many times a transaction tries to take the workspace lock.
    pub lock_retries: u32,
    pub lock_retry_delay_ms: u64,
    /// Flush stack state and log writes to disk before returning.
    pub fsync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_length: sheaf_core::patchname::DEFAULT_NAME_LENGTH,
            lock_retries: 5,
            lock_retry_delay_ms: 50,
            fsync: true,
        }
    }
}

impl Config {
    /// Load from `config.json`, falling back to defaults when absent.
    pub fn load(paths: &SheafPaths) -> anyhow::Result<Self> {
        if !paths.config_json.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&paths.config_json)?;
        serde_json::from_str(&content).map_err(|e| {
            anyhow::anyhow!("invalid config {}: {e}", paths.config_json.display())
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            name_length: (self.name_length > 0).then_some(self.name_length),
        }
    }

    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock_retry_delay_ms)
    }
}

/// Read config as a raw key/value map. Returns empty map if file doesn't exist.
pub fn read_config_map(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Write a raw key/value map, rejecting values the typed view can't read.
pub fn write_config_map(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let value = serde_json::Value::Object(config.clone());
    serde_json::from_value::<Config>(value)
        .map_err(|e| anyhow::anyhow!("config would become unreadable: {e}"))?;
    let json = serde_json::to_string_pretty(&config)?;
    write_atomic(path, json.as_bytes(), true)?;
    Ok(())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SheafPaths::discover(tmp.path());
        let cfg = Config::load(&paths).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.engine_options().name_length, Some(30));
    }

    #[test]
    fn partial_file_fills_defaults_and_keeps_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SheafPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();

        let mut map = serde_json::Map::new();
        map.insert("name_length".into(), parse_value("0"));
        map.insert("editor".into(), parse_value("vi"));
        write_config_map(&paths.config_json, &map).unwrap();

        let cfg = Config::load(&paths).unwrap();
        assert_eq!(cfg.name_length, 0);
        assert_eq!(cfg.engine_options().name_length, None);
        assert_eq!(cfg.lock_retries, 5);
        let raw = read_config_map(&paths.config_json).unwrap();
        assert_eq!(raw["editor"], "vi");
    }

    #[test]
    fn ill_typed_values_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SheafPaths::discover(tmp.path());
        let mut map = serde_json::Map::new();
        map.insert("lock_retries".into(), parse_value("lots"));
        assert!(write_config_map(&paths.config_json, &map).is_err());
        assert!(!paths.config_json.exists());
    }

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), serde_json::Value::Bool(true));
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value("1.5"), serde_json::json!(1.5));
        assert_eq!(parse_value("abc"), serde_json::json!("abc"));
    }
}
