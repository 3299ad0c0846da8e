//! Config file loading

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;

pub fn load_config(repo_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(repo_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    match parse_toml_config(&content, &config_file) {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            if config_path_provided {
                return Err(e);
            }
            // Auto-discovered: warn and fall back to defaults.
            tracing::warn!("Failed to parse auto-discovered config {}: {}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    toml::from_str(content)
        .with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

fn discover_config(repo_root: &Path) -> Option<PathBuf> {
    let candidates = ["repo-digest.toml", ".repo-digest.toml"];

    for candidate in candidates {
        let path = repo_root.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_config(tmp.path(), None).expect("config");
        assert!(cfg.base_path.is_none());
        assert!(cfg.include_globs.is_empty());
    }

    #[test]
    fn load_discovered_toml_config() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("repo-digest.toml"),
            "base_path = 'app'\nexclude_globs = ['docs', '**/*.md']\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.base_path.as_deref(), Some("app"));
        assert_eq!(cfg.exclude_globs, vec!["docs", "**/*.md"]);
    }

    #[test]
    fn explicit_config_with_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "include_globs = 123\n").expect("write");

        let result = load_config(tmp.path(), Some(&path));
        assert!(result.is_err(), "explicit config with invalid type should return Err");
    }

    #[test]
    fn auto_discovered_invalid_config_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("repo-digest.toml"), "include_globs = 123\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert!(cfg.include_globs.is_empty());
    }
}
