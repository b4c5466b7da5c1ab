//! Configuration system for the `TermTask` stub backend.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/termtask-stub/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

/// Errors that can occur when loading stub configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the stub.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StubConfigFile {
    server: ServerFileConfig,
}

/// `[server]` section of the stub config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    access_ttl_secs: Option<u64>,
    refresh_ttl_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the stub backend.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "TermTask stub backend")]
pub struct StubCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "TERMTASK_STUB_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/termtask-stub/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Access token lifetime in seconds.
    #[arg(long)]
    pub access_ttl_secs: Option<u64>,

    /// Refresh token lifetime in seconds.
    #[arg(long)]
    pub refresh_ttl_secs: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TERMTASK_STUB_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Fully resolved stub configuration.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Address to bind the server to (e.g., `127.0.0.1:4000`).
    pub bind_addr: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: u64,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            access_ttl_secs: 7 * SECS_PER_DAY,
            refresh_ttl_secs: 30 * SECS_PER_DAY,
            log_level: "info".to_string(),
        }
    }
}

impl StubConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &StubCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `StubConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &StubCliArgs, file: &StubConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            access_ttl_secs: cli
                .access_ttl_secs
                .or(file.server.access_ttl_secs)
                .unwrap_or(defaults.access_ttl_secs),
            refresh_ttl_secs: cli
                .refresh_ttl_secs
                .or(file.server.refresh_ttl_secs)
                .unwrap_or(defaults.refresh_ttl_secs),
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the stub.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<StubConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(StubConfigFile::default());
        };
        config_dir.join("termtask-stub").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StubConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
