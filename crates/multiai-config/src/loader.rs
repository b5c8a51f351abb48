//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::{Config, Settings};

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load runtime configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load runtime configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        config.paths.vault = Self::expand_path(&config.paths.vault.to_string_lossy()).into();
        config.paths.settings = Self::expand_path(&config.paths.settings.to_string_lossy()).into();
        if let Some(dir) = config.browser.profile_dir.take() {
            config.browser.profile_dir = Some(Self::expand_path(&dir.to_string_lossy()).into());
        }
        Ok(config)
    }

    /// Load runtime configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load the host settings JSON. A missing file yields the defaults.
    pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        Self::load_settings_str(&content)
    }

    pub fn load_settings_str(content: &str) -> Result<Settings, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Write the host settings JSON, creating parent directories.
    pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name).map_err(|_| {
                ConfigError::EnvVarNotSet(var_name.to_string())
            })?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.multiai`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::schema::SearchMode;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.browser.debug_port, 9222);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [browser]
            debug_port = 9333
            headless = true

            [dispatch]
            settle_delay_ms = 250
            fullwidth_sanitize = true

            [collector]
            mode = "fixed"
            fixed_delay_ms = 10000

            [search]
            timeout_ms = 500
            max_snippets = 5

            [paths]
            vault = "/tmp/vault"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.browser.debug_port, 9333);
        assert!(config.browser.headless);
        assert_eq!(config.dispatch.settle_delay_ms, 250);
        assert!(config.dispatch.fullwidth_sanitize);
        assert_eq!(config.collector.mode, "fixed");
        assert_eq!(config.collector.fixed_delay_ms, 10_000);
        assert_eq!(config.search.max_snippets, 5);
        assert_eq!(config.paths.vault, std::path::PathBuf::from("/tmp/vault"));
    }

    #[test]
    fn test_load_expands_tilde_paths() {
        let content = r#"
            [paths]
            vault = "~/notes"

            [browser]
            profile_dir = "~/.multiai/profile"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(!config.paths.vault.to_string_lossy().starts_with('~'));
        assert!(config.paths.vault.ends_with("notes"));
        let profile = config.browser.profile_dir.unwrap();
        assert!(!profile.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[browser]").unwrap();
        writeln!(file, "debug_port = 9500").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.browser.debug_port, 9500);
    }

    #[test]
    fn test_shipped_default_config() {
        let config = ConfigLoader::load_str(include_str!("../../../config/default.toml")).unwrap();
        let defaults = crate::schema::Config::default();
        assert_eq!(config.browser.debug_port, defaults.browser.debug_port);
        assert_eq!(config.collector.mode, defaults.collector.mode);
        assert_eq!(config.dispatch.frame_timeout_ms, defaults.dispatch.frame_timeout_ms);
        assert!(config.paths.vault.ends_with(".multiai/vault"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.collector.mode, "poll");
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("MULTIAI_TEST_VAULT", "/data/vault");
        }
        let content = "[paths]\nvault = \"${MULTIAI_TEST_VAULT}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.paths.vault, std::path::PathBuf::from("/data/vault"));
        unsafe {
            std::env::remove_var("MULTIAI_TEST_VAULT");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_MULTIAI_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
    }

    #[test]
    fn test_settings_missing_file_defaults() {
        let settings = ConfigLoader::load_settings(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.frames.len(), 4);
    }

    #[test]
    fn test_settings_empty_string_defaults() {
        let settings = ConfigLoader::load_settings_str("  \n").unwrap();
        assert_eq!(settings.frame_count, 4);
    }

    #[test]
    fn test_settings_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = crate::schema::Settings::default();
        settings.search_mode = SearchMode::Combined;
        settings.frames.truncate(2);
        ConfigLoader::save_settings(&path, &settings).unwrap();

        let loaded = ConfigLoader::load_settings(&path).unwrap();
        assert_eq!(loaded.search_mode, SearchMode::Combined);
        assert_eq!(loaded.frames.len(), 2);
        assert_eq!(loaded.frames[1].display_name, "Kimi");
    }

    #[test]
    fn test_settings_invalid_json() {
        let result = ConfigLoader::load_settings_str("{\"frameCount\": }");
        assert!(matches!(result, Err(ConfigError::JsonParse(_))));
    }
}
