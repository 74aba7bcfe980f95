use std::path::{Path, PathBuf};

use anyhow::Context;
use biliget_core::fs_paths::{AppPaths, DesktopPaths};
use biliget_core::models::settings::AppSettings;

const LOCAL_FILE: &str = "biliget.json";
const STORE_FILE: &str = "settings.json";

pub fn default_store_path() -> PathBuf {
    DesktopPaths.config_dir().join(STORE_FILE)
}

/// `explicit`, then `$BILIGET_CONFIG`, then `./biliget.json`, then the per-user store.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("BILIGET_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let local = PathBuf::from(LOCAL_FILE);
    if local.exists() {
        return Some(local);
    }
    let store = default_store_path();
    if store.exists() {
        return Some(store);
    }
    None
}

pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<AppSettings> {
    let Some(path) = resolve_config_path(explicit) else {
        tracing::warn!("No settings file found, using defaults (requests carry no session cookie)");
        return Ok(AppSettings::default());
    };
    read_settings(&path)
}

pub fn read_settings(path: &Path) -> anyhow::Result<AppSettings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings: AppSettings = serde_json::from_str(&raw)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let val = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, val).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/some/where.json");
        assert_eq!(resolve_config_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn save_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("settings.json");
        let mut settings = AppSettings::default();
        settings.auth.cookie = "SESSDATA=xyz".into();
        settings.encoder.program = "/opt/ffmpeg/bin/ffmpeg".into();

        save_settings(&path, &settings).unwrap();
        let loaded = read_settings(&path).unwrap();

        assert_eq!(loaded.auth.cookie, "SESSDATA=xyz");
        assert_eq!(loaded.encoder.program, "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn read_missing_file_fails_with_path() {
        let err = read_settings(Path::new("/nonexistent/biliget.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/biliget.json"));
    }

    #[test]
    fn read_invalid_json_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ cookie: nope").unwrap();
        assert!(read_settings(&path).is_err());
    }
}
