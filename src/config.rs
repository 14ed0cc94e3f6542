//! Configuration management for the StudyHub portal
//!
//! Values come from built-in defaults, an optional `config.toml` and
//! `STUDYHUB_*` environment variables, in increasing precedence.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_PATHS: [&str; 2] = [
    "studyhub/config", // Container layout: /app/studyhub/config.toml
    "config",          // Local development: ./config.toml
];

const SETTINGS_FILE: &str = "settings.json";
const UPLOADS_DIR: &str = "uploads";

/// Portal configuration, loaded once at startup
#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    /// IP address the command front end binds to
    pub bind_address: String,

    /// Port for the command front end
    pub port: u16,

    /// Directory holding `settings.json` and the `uploads/` tree
    pub data_dir: String,

    /// Maximum concurrent connections
    /// Environment: STUDYHUB_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum upload size in MB
    /// Environment: STUDYHUB_MAX_FILE_SIZE_MB
    pub max_file_size_mb: u64,

    pub admin_username: String,

    /// Admin login is disabled while this is unset.
    /// Environment: STUDYHUB_ADMIN_PASSWORD
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 2323,
            data_dir: "data".to_string(),
            max_clients: 10,
            max_file_size_mb: 100,
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}

impl PortalConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = PortalConfig::default();

        let mut builder = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("data_dir", defaults.data_dir)?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_file_size_mb", defaults.max_file_size_mb as i64)?
            .set_default("admin_username", defaults.admin_username)?;

        for path in CONFIG_PATHS {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("STUDYHUB").try_parsing(true))
            .build()?;

        let config: PortalConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.data_dir.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "data_dir cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_file_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        if self.admin_username.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "admin_username cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Location of the persisted catalog document
    pub fn settings_path(&self) -> PathBuf {
        self.data_path().join(SETTINGS_FILE)
    }

    /// Root under which every course folder lives
    pub fn uploads_root(&self) -> PathBuf {
        self.data_path().join(UPLOADS_DIR)
    }

    /// Get maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Longest command line accepted: one base64 upload plus its arguments.
    pub fn max_command_length(&self) -> usize {
        let encoded = self.max_file_size_bytes().div_ceil(3) * 4;
        encoded as usize + 4096
    }
}
