//! Configuration loading.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `PB_*` environment variables, then command-line overrides.

use crate::constants::{
    DEFAULT_BIND, DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_PATH, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_SERVE_PATH, DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::env::{env_flag_enabled, env_var_nonempty};
use crate::error::AppError;
use crate::text::normalize_serve_path;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub debug: bool,
    pub serve_path: String,
    pub database_path: String,
    /// Accepted for config-file compatibility; sessions are opaque store-backed tokens.
    pub session_secret: String,
    pub sweep_interval_secs: u64,
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            debug: false,
            serve_path: DEFAULT_SERVE_PATH.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            session_secret: String::new(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Command-line overrides; `None`/`false` leaves the lower layers untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub database_path: Option<String>,
    pub serve_path: Option<String>,
    pub debug: bool,
}

impl Config {
    /// Parse a TOML document on top of the defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the document is not valid TOML for [`Config`].
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        let mut config: Config =
            toml::from_str(raw).map_err(|err| AppError::Config(err.to_string()))?;
        config.serve_path = normalize_serve_path(&config.serve_path);
        Ok(config)
    }

    /// Load the config file layer.
    ///
    /// An explicitly requested file must exist. Without one, `config.toml` in
    /// the working directory is used when present and defaults otherwise.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for a missing explicit file, unreadable file,
    /// or invalid TOML.
    pub fn load_file(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            if explicit.is_some() {
                return Err(AppError::Config(format!(
                    "Config file {} specified but not found",
                    path.display()
                )));
            }
            tracing::info!("Config file {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        tracing::info!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `PB_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Some(bind) = env_var_nonempty("PB_BIND") {
            self.bind = bind;
        }
        if let Some(path) = env_var_nonempty("PB_DATABASE_PATH") {
            self.database_path = path;
        }
        if env_flag_enabled("PB_DEBUG") {
            self.debug = true;
        }
        if let Some(path) = env_var_nonempty("PB_SERVE_PATH") {
            self.serve_path = normalize_serve_path(&path);
        }
        match env_var_nonempty("PB_SWEEP_INTERVAL_SECS").map(|raw| raw.trim().parse::<u64>()) {
            Some(Ok(secs)) => self.sweep_interval_secs = secs,
            Some(Err(err)) => {
                tracing::warn!("Ignoring invalid PB_SWEEP_INTERVAL_SECS: {}", err);
            }
            None => {}
        }
        match env_var_nonempty("PB_MAX_BODY_SIZE").map(|raw| raw.trim().parse::<usize>()) {
            Some(Ok(size)) => self.max_body_size = size,
            Some(Err(err)) => tracing::warn!("Ignoring invalid PB_MAX_BODY_SIZE: {}", err),
            None => {}
        }
    }

    /// Apply command-line overrides (highest priority).
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(bind) = overrides.bind.as_deref().filter(|v| !v.trim().is_empty()) {
            self.bind = bind.to_string();
        }
        if let Some(path) = overrides
            .database_path
            .as_deref()
            .filter(|v| !v.trim().is_empty())
        {
            self.database_path = path.to_string();
        }
        if let Some(path) = overrides
            .serve_path
            .as_deref()
            .filter(|v| !v.trim().is_empty())
        {
            self.serve_path = normalize_serve_path(path);
        }
        if overrides.debug {
            self.debug = true;
        }
    }

    /// Load all layers: file, environment, then overrides.
    ///
    /// # Errors
    /// Propagates file-layer errors from [`Config::load_file`].
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, AppError> {
        let mut config = Self::load_file(explicit)?;
        config.apply_env();
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Interval between expiration sweeps; zero is clamped to one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides};
    use crate::env::{env_lock, EnvGuard};
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.bind, "0.0.0.0:3001");
        assert_eq!(config.serve_path, "/p/");
        assert_eq!(config.database_path, "./pastes.redb");
        assert!(!config.debug);
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn toml_layer_overrides_only_given_keys() {
        let config = Config::from_toml_str(
            "bind = \"127.0.0.1:8080\"\nserve_path = \"paste\"\ndebug = true\n",
        )
        .expect("parse toml");
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.serve_path, "/paste/");
        assert!(config.debug);
        assert_eq!(config.database_path, "./pastes.redb");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = Config::from_toml_str("bind = [").expect_err("invalid toml");
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn explicit_missing_file_is_rejected() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let missing = temp.path().join("nope.toml");
        let err = Config::load_file(Some(&missing)).expect_err("missing explicit file");
        assert!(err.to_string().contains("specified but not found"));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(file, "database_path = \"/tmp/pb.redb\"").expect("write config");
        drop(file);

        let config = Config::load_file(Some(&path)).expect("load config");
        assert_eq!(config.database_path, "/tmp/pb.redb");
    }

    #[test]
    fn env_layer_then_overrides_take_precedence() {
        let _lock = env_lock().lock().expect("env lock");
        let _bind = EnvGuard::set("PB_BIND", "127.0.0.1:9000");
        let _db = EnvGuard::set("PB_DATABASE_PATH", "/tmp/env.redb");
        let _debug = EnvGuard::set("PB_DEBUG", "true");
        let _serve = EnvGuard::set("PB_SERVE_PATH", "raw");
        let _sweep = EnvGuard::set("PB_SWEEP_INTERVAL_SECS", "not-a-number");

        let mut config = Config::default();
        config.apply_env();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.database_path, "/tmp/env.redb");
        assert!(config.debug);
        assert_eq!(config.serve_path, "/raw/");
        assert_eq!(config.sweep_interval_secs, 3600);

        config.apply_overrides(&ConfigOverrides {
            bind: Some("127.0.0.1:9100".to_string()),
            database_path: None,
            serve_path: Some("/view/".to_string()),
            debug: false,
        });
        assert_eq!(config.bind, "127.0.0.1:9100");
        assert_eq!(config.database_path, "/tmp/env.redb");
        assert_eq!(config.serve_path, "/view/");
        assert!(config.debug);
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let config = Config {
            sweep_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
