//! Scan configuration file.
//!
//! Values come from `ScanConfig::default()`, then an optional JSON file, then CLI flags.
//! An explicit `--config` path must exist; the default location is used only if present.

use crate::model::ScanConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-scan").join("config.json"))
}

pub fn load(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse config {}", path.display()))
}

pub fn save(cfg: &ScanConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, content).with_context(|| format!("write config {}", path.display()))
}

/// Load the file layer of the configuration.
pub fn load_layered(explicit: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = explicit {
        return load(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading default config");
            load(&path)
        }
        _ => Ok(ScanConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("face-scan-{}-{name}", std::process::id()))
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_path("partial-config.json");
        std::fs::write(&path, r#"{ "analysis_delay": "500ms", "camera": { "width": 320 } }"#)
            .unwrap();

        let cfg = load_layered(Some(&path)).unwrap();
        assert_eq!(cfg.analysis_delay, Duration::from_millis(500));
        assert_eq!(cfg.camera.width, 320);
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.jpeg_quality, 80);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = temp_path("nested/saved-config.json");
        let cfg = ScanConfig {
            seed: Some(11),
            jpeg_quality: 65,
            ..Default::default()
        };
        save(&cfg, &path).unwrap();
        assert_eq!(load(&path).unwrap(), cfg);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_layered(Some(Path::new("/nonexistent/face-scan.json"))).is_err());
    }
}
