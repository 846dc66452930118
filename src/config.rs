//! Configuration management for cryptex

use crate::chunk::{ChunkOptions, MAX_BATCH_SIZE};
use crate::crypto::DEFAULT_KDF_ITERATIONS;
use crate::error::{Error, Result};
use crate::vault::VaultOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default extension for encrypted output
pub const DEFAULT_EXTENSION: &str = "ctx";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cryptographic parameters
    #[serde(default)]
    pub crypto: CryptoConfig,

    /// Output naming and placement
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cryptographic parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count; must match between encrypt and decrypt
    pub kdf_iterations: u32,

    /// Encrypt/decrypt chunks on all cores
    pub parallel: bool,

    /// Chunks per parallel batch (0 = one per worker thread, at most 4096)
    pub batch_size: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Extension appended to encrypted files
    pub extension: String,

    /// Carrier image used when none is given on the command line
    pub carrier_image: Option<PathBuf>,

    /// Directory for results (defaults to next to the input)
    pub output_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        CryptoConfig {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            parallel: true,
            batch_size: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            extension: DEFAULT_EXTENSION.to_string(),
            carrier_image: None,
            output_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cryptex")
            .join("config.json")
    }

    /// Load configuration from a JSON or YAML file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse YAML config: {}", e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse JSON config: {}", e))
            })?
        };

        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(iterations) = std::env::var("CRYPTEX_KDF_ITERATIONS") {
            if let Ok(n) = iterations.trim().parse::<u32>() {
                self.crypto.kdf_iterations = n;
            }
        }

        if let Ok(parallel) = std::env::var("CRYPTEX_PARALLEL") {
            match parallel.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.crypto.parallel = true,
                "0" | "false" | "no" | "off" => self.crypto.parallel = false,
                _ => {}
            }
        }

        if let Ok(level) = std::env::var("CRYPTEX_LOG_LEVEL") {
            let level = level.trim().to_string();
            if !level.is_empty() {
                self.logging.level = level;
            }
        }

        if let Ok(carrier) = std::env::var("CRYPTEX_CARRIER") {
            let carrier = carrier.trim();
            if !carrier.is_empty() {
                self.output.carrier_image = Some(PathBuf::from(carrier));
            }
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| {
                Error::Config(format!("Failed to serialize config to YAML: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                Error::Config(format!("Failed to serialize config: {}", e))
            })?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.crypto.kdf_iterations == 0 {
            return Err(Error::InvalidConfig(
                "KDF iteration count must be greater than 0".to_string(),
            ));
        }

        if self.crypto.batch_size > MAX_BATCH_SIZE {
            return Err(Error::InvalidConfig(format!(
                "Batch size must be at most {}, got {}",
                MAX_BATCH_SIZE, self.crypto.batch_size
            )));
        }

        let ext = &self.output.extension;
        if ext.is_empty() || ext.contains('.') || ext.contains(std::path::is_separator) {
            return Err(Error::InvalidConfig(format!(
                "Output extension must be a bare word, got {:?}",
                ext
            )));
        }

        Ok(())
    }

    /// Options for the encrypt/decrypt operations
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            kdf_iterations: self.crypto.kdf_iterations,
            chunks: ChunkOptions::new(self.crypto.parallel, self.crypto.batch_size),
        }
    }
}
