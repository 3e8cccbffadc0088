//! Configuration system for the `Todosync` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/todosync/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;

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
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    account: AccountFileConfig,
    backend: BackendFileConfig,
}

/// `[account]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AccountFileConfig {
    email: Option<String>,
    password: Option<String>,
    display_name: Option<String>,
}

/// `[backend]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    max_documents: Option<usize>,
    max_image_bytes: Option<usize>,
    min_password_length: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Demo account credentials resolved from config.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    /// Sign-in email.
    pub email: String,
    /// Sign-in password.
    pub password: String,
    /// Optional display name to set after registration.
    pub display_name: Option<String>,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Account --
    /// Demo account email.
    pub email: Option<String>,
    /// Demo account password.
    pub password: Option<String>,
    /// Demo account display name.
    pub display_name: Option<String>,

    // -- Backend limits --
    /// Maximum number of documents in the task collection.
    pub max_documents: usize,
    /// Maximum image upload size in bytes.
    pub max_image_bytes: usize,
    /// Minimum password length enforced by the identity provider.
    pub min_password_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            display_name: None,
            max_documents: 10_000,
            max_image_bytes: 8 * 1024 * 1024,
            min_password_length: 6,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/todosync/config.toml`) is tried
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
            email: cli.email.clone().or_else(|| file.account.email.clone()),
            password: cli
                .password
                .clone()
                .or_else(|| file.account.password.clone()),
            display_name: cli
                .display_name
                .clone()
                .or_else(|| file.account.display_name.clone()),
            max_documents: file
                .backend
                .max_documents
                .unwrap_or(defaults.max_documents),
            max_image_bytes: file
                .backend
                .max_image_bytes
                .unwrap_or(defaults.max_image_bytes),
            min_password_length: file
                .backend
                .min_password_length
                .unwrap_or(defaults.min_password_length),
        }
    }

    /// Build a [`DemoAccount`] from this configuration, if both email and
    /// password are present.
    #[must_use]
    pub fn demo_account(&self) -> Option<DemoAccount> {
        let email = self.email.clone()?;
        let password = self.password.clone()?;
        if email.is_empty() {
            return None;
        }
        Some(DemoAccount {
            email,
            password,
            display_name: self.display_name.clone(),
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Real-time personal task list")]
pub struct CliArgs {
    /// Demo account email.
    #[arg(long, env = "TODOSYNC_EMAIL")]
    pub email: Option<String>,

    /// Demo account password.
    #[arg(long, env = "TODOSYNC_PASSWORD")]
    pub password: Option<String>,

    /// Demo account display name.
    #[arg(long)]
    pub display_name: Option<String>,

    /// Path to config file (default: `~/.config/todosync/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TODOSYNC_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/todosync.log`).
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
        config_dir.join("todosync").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
