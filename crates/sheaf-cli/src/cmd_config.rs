use clap::Subcommand;
use sheaf_store::config::{parse_value, read_config_map, write_config_map};
use sheaf_store::{Config, SheafPaths};
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. name_length)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values, defaults included
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

fn workspace_paths(repo_root: &Path) -> anyhow::Result<SheafPaths> {
    match SheafPaths::find_root(repo_root) {
        Some(root) => Ok(SheafPaths::discover(root)),
        None => anyhow::bail!("No .sheaf/ workspace found. Run `sheaf init` first."),
    }
}

/// Stored values layered over the defaults.
fn effective(paths: &SheafPaths) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut merged = match serde_json::to_value(Config::default())? {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(read_config_map(&paths.config_json)?);
    Ok(merged)
}

/// `sheaf config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = workspace_paths(repo_root)?;
    let mut config = read_config_map(&paths.config_json)?;
    config.insert(key.to_string(), parse_value(value));
    write_config_map(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `sheaf config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = workspace_paths(repo_root)?;
    match effective(&paths)?.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `sheaf config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = workspace_paths(repo_root)?;
    for (k, v) in &effective(&paths)? {
        println!("{k} = {v}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheaf_store::Workspace;

    #[test]
    fn set_then_reload_changes_engine_options() {
        let tmp = tempfile::tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        set(tmp.path(), "name_length", "8").unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        assert_eq!(ws.config.name_length, 8);
        assert_eq!(ws.config.engine_options().name_length, Some(8));

        let paths = SheafPaths::discover(tmp.path());
        assert_eq!(effective(&paths).unwrap()["lock_retries"], 5);
    }

    #[test]
    fn set_rejects_mistyped_value() {
        let tmp = tempfile::tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        assert!(set(tmp.path(), "fsync", "sometimes").is_err());
        assert!(!SheafPaths::discover(tmp.path()).config_json.exists());
    }

    #[test]
    fn requires_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(get(tmp.path(), "fsync").is_err());
    }
}
