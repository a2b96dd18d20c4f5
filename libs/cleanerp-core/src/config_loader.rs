//! Configuration Loader
//!
//! Loads [`ErpConfig`] from defaults, then configuration files, then the
//! environment, and validates the result.

use crate::config::ErpConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loader that handles multiple sources with precedence
pub struct ConfigLoader {
    base_config: ErpConfig,
    /// Files tried in order; later files win
    config_paths: Vec<PathBuf>,
    load_from_env: bool,
    validate: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: ErpConfig::default(),
            config_paths: Self::get_default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    #[must_use]
    pub fn with_base_config(mut self, config: ErpConfig) -> Self {
        self.base_config = config;
        self
    }

    #[must_use]
    pub fn add_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the list of configuration files
    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources.
    ///
    /// Missing files are skipped; a file that exists but cannot be parsed is
    /// an error.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or the result is invalid
    pub fn load(&self) -> Result<ErpConfig> {
        let mut config = self.base_config.clone();

        for path in &self.config_paths {
            if path.exists() {
                debug!("Loading configuration from file: {}", path.display());
                config.merge_with(&ErpConfig::read_overlay(path)?)?;
                info!("Loaded configuration from: {}", path.display());
            } else {
                debug!("Configuration file not found: {}", path.display());
            }
        }

        if self.load_from_env {
            config.merge_with(&ErpConfig::env_overlay()?)?;
            debug!("Applied environment overrides");
        }

        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Files tried by default, lowest precedence first
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let system = Self::get_system_config_dir();
        let user = Self::get_user_config_dir();
        vec![
            system.join("config.yaml"),
            system.join("config.json"),
            user.join("config.yaml"),
            user.join("config.json"),
            PathBuf::from("cleanerp.yaml"),
            PathBuf::from("cleanerp.yml"),
            PathBuf::from("cleanerp.json"),
        ]
    }

    /// Get the user configuration directory
    #[must_use]
    pub fn get_user_config_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("cleanerp")
        } else if let Ok(userprofile) = std::env::var("USERPROFILE") {
            PathBuf::from(userprofile)
                .join("AppData")
                .join("Roaming")
                .join("cleanerp")
        } else {
            PathBuf::from("~/.config/cleanerp")
        }
    }

    /// Get the system configuration directory
    #[must_use]
    pub fn get_system_config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            PathBuf::from("C:\\ProgramData\\cleanerp")
        } else {
            PathBuf::from("/etc/cleanerp")
        }
    }

    /// Write the default configuration to `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be created
    pub fn create_sample_config<P: AsRef<Path>>(path: P, format: &str) -> Result<()> {
        ErpConfig::default().to_file(path, format)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the default locations and the environment
///
/// # Errors
/// Returns an error if configuration cannot be loaded
pub fn load_config() -> Result<ErpConfig> {
    ConfigLoader::new().load()
}

/// Load configuration from the given files and the environment
///
/// # Errors
/// Returns an error if configuration cannot be loaded
pub fn load_config_with_paths<P: AsRef<Path>>(config_paths: Vec<P>) -> Result<ErpConfig> {
    ConfigLoader::new().with_config_paths(config_paths).load()
}
