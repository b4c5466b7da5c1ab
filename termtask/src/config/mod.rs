//! Configuration system for the `TermTask` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/termtask/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur when loading configuration.
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

    /// Could not determine the user's data directory for the token file.
    #[error("could not determine data directory (no HOME or XDG_DATA_HOME)")]
    NoDataDir,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    auth: AuthFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
    event_buffer: Option<usize>,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    token_file: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
    max_task_title_len: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Base URL of the REST backend (e.g., `http://127.0.0.1:4000`).
    pub api_base_url: String,
    /// Per-request timeout for HTTP calls.
    pub request_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
    /// Buffer size for the store event channels.
    pub event_buffer: usize,

    // -- Auth --
    /// Override for the token persistence file path.
    pub token_file: Option<PathBuf>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Date display format string (chrono) for task creation dates.
    pub date_format: String,
    /// Maximum task title length in characters.
    pub max_task_title_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:4000".to_string(),
            request_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            event_buffer: 64,
            token_file: None,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
            max_task_title_len: 256,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/termtask/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. This is separated from `load()` to
    /// enable unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.api_base_url),
            request_timeout: file
                .api
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            channel_capacity: file
                .api
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            event_buffer: file.api.event_buffer.unwrap_or(defaults.event_buffer),
            token_file: cli
                .token_file
                .clone()
                .or_else(|| file.auth.token_file.clone().map(PathBuf::from)),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: file
                .ui
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
            max_task_title_len: file
                .ui
                .max_task_title_len
                .unwrap_or(defaults.max_task_title_len),
        }
    }

    /// Resolve the token persistence file path.
    ///
    /// Uses the configured override if present, otherwise
    /// `<data_dir>/termtask/tokens.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] if no override is configured and
    /// the platform data directory cannot be determined.
    pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.token_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("termtask").join("tokens.json"))
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal-native task manager")]
pub struct CliArgs {
    /// Base URL of the REST backend.
    #[arg(long, env = "TERMTASK_API_URL")]
    pub api_url: Option<String>,

    /// Path to the token persistence file.
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Path to config file (default: `~/.config/termtask/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TERMTASK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/termtask.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available — use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("termtask").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
