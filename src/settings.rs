use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BankError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Database chosen with `bankbook init --db`. There is no built-in default.
    #[serde(default)]
    pub db_path: Option<String>,
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bankbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    save_settings_to(settings, &settings_path())
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BankError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

/// The database to use: an explicit `--db` wins over the saved setting.
pub fn resolve_db_path(explicit: Option<&str>) -> Result<PathBuf> {
    resolve_with(explicit, &load_settings())
}

fn resolve_with(explicit: Option<&str>, settings: &Settings) -> Result<PathBuf> {
    explicit
        .or(settings.db_path.as_deref())
        .map(|p| PathBuf::from(shellexpand_path(p)))
        .ok_or_else(|| {
            BankError::Settings(
                "No database configured.\nPass --db <path> or run `bankbook init --db <path>` first.".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            db_path: Some("/tmp/bank_movements.db".to_string()),
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.db_path.as_deref(), Some("/tmp/bank_movements.db"));
    }

    #[test]
    fn test_load_returns_defaults_when_missing_or_broken() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings_from(&dir.path().join("nope.json")).db_path.is_none());
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(load_settings_from(&broken).db_path.is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let saved = Settings {
            db_path: Some("/data/saved.db".to_string()),
        };
        assert_eq!(resolve_with(Some("/tmp/x.db"), &saved).unwrap(), PathBuf::from("/tmp/x.db"));
        assert_eq!(resolve_with(None, &saved).unwrap(), PathBuf::from("/data/saved.db"));
    }

    #[test]
    fn test_resolve_without_any_path_fails() {
        let err = resolve_with(None, &Settings::default()).unwrap_err();
        assert!(matches!(err, BankError::Settings(_)));
    }
}
