//! Configuration management.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (explicit path, or `stockpile/config.toml` in the platform config dir)
//! 3. Environment variables (`.env` is loaded first if present)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable selecting the store provider.
pub const ENV_PROVIDER: &str = "STOCKPILE_PROVIDER";
/// Environment variable holding the `SQLite` database path.
pub const ENV_DB_PATH: &str = "DB_PATH";
/// Environment variable holding the schema script used by `init-db`.
pub const ENV_SCHEMA_PATH: &str = "SCHEMA_PATH";
/// Environment variable selecting the log format (`pretty` or `json`).
pub const ENV_LOG_FORMAT: &str = "STOCKPILE_LOG_FORMAT";
/// Environment variable naming a log file.
pub const ENV_LOG_FILE: &str = "STOCKPILE_LOG_FILE";

/// Main configuration for stockpile.
#[derive(Debug, Clone, Default)]
pub struct StockpileConfig {
    /// Which store backend to use.
    pub provider: StoreProvider,
    /// `SQLite` settings.
    pub sqlite: SqliteConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Export behaviour.
    pub export: ExportConfig,
}

/// Available store providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreProvider {
    /// File-backed `SQLite` database.
    #[default]
    Sqlite,
    /// Process-local, non-persistent store.
    Memory,
}

impl StoreProvider {
    /// Parses a provider string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown provider names.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "memory" | "mem" | "in-memory" => Ok(Self::Memory),
            other => Err(Error::Configuration(format!(
                "unknown store provider '{other}' (expected 'sqlite' or 'memory')"
            ))),
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `SQLite` settings.
#[derive(Debug, Clone, Default)]
pub struct SqliteConfig {
    /// Database file. Required when the provider is `sqlite`.
    pub db_path: Option<PathBuf>,
    /// Schema script for `init-db`; the embedded schema when unset.
    pub schema_path: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format string, falling back to pretty output.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default filter directive (e.g. `info`, `stockpile=debug`).
    pub level: Option<String>,
    /// Optional file receiving log output in addition to stderr.
    pub file: Option<PathBuf>,
}

/// Export behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportConfig {
    /// Abort the export when an item's image cannot be resolved.
    pub fail_on_missing_image: bool,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Store provider name.
    pub provider: Option<String>,
    /// `SQLite` section.
    pub sqlite: Option<ConfigFileSqlite>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Export section.
    pub export: Option<ConfigFileExport>,
}

/// `[sqlite]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSqlite {
    /// Database file.
    pub db_path: Option<String>,
    /// Schema script.
    pub schema_path: Option<String>,
}

/// `[logging]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive.
    pub level: Option<String>,
    /// Log file.
    pub file: Option<String>,
}

/// `[export]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileExport {
    /// Abort on unresolved images.
    pub fail_on_missing_image: Option<bool>,
}

impl StockpileConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/stockpile/`.
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("stockpile").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("stockpile")
                .join("config.toml"),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Loads configuration the way the CLI does: file (explicit or default),
    /// then `.env`, then process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded or an
    /// environment override is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown provider name.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_empty(ENV_PROVIDER) {
            self.provider = StoreProvider::parse(&provider)?;
        }
        if let Some(path) = non_empty(ENV_DB_PATH) {
            self.sqlite.db_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty(ENV_SCHEMA_PATH) {
            self.sqlite.schema_path = Some(PathBuf::from(path));
        }
        if let Some(format) = non_empty(ENV_LOG_FORMAT) {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(path) = non_empty(ENV_LOG_FILE) {
            self.logging.file = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Converts a `ConfigFile` to `StockpileConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(provider) = file.provider {
            config.provider = StoreProvider::parse(&provider)?;
        }
        if let Some(sqlite) = file.sqlite {
            config.sqlite.db_path = sqlite.db_path.map(PathBuf::from);
            config.sqlite.schema_path = sqlite.schema_path.map(PathBuf::from);
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.level = logging.level;
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(export) = file.export {
            if let Some(v) = export.fail_on_missing_image {
                config.export.fail_on_missing_image = v;
            }
        }

        Ok(config)
    }

    /// Sets the store provider.
    #[must_use]
    pub const fn with_provider(mut self, provider: StoreProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the `SQLite` database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite.db_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StockpileConfig::default();
        assert_eq!(config.provider, StoreProvider::Sqlite);
        assert!(config.sqlite.db_path.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.export.fail_on_missing_image);
    }

    #[test]
    fn test_from_toml() {
        let config = StockpileConfig::from_toml(
            r#"
            provider = "memory"

            [sqlite]
            db_path = "/var/lib/stockpile/app.db"

            [logging]
            format = "json"
            level = "stockpile=debug"

            [export]
            fail_on_missing_image = true
            "#,
        )
        .unwrap();

        assert_eq!(config.provider, StoreProvider::Memory);
        assert_eq!(
            config.sqlite.db_path,
            Some(PathBuf::from("/var/lib/stockpile/app.db"))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level.as_deref(), Some("stockpile=debug"));
        assert!(config.export.fail_on_missing_image);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = StockpileConfig::from_toml(r#"provider = "postgres""#);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PROVIDER, "memory"),
            (ENV_DB_PATH, "data/app.db"),
            (ENV_SCHEMA_PATH, ""),
            (ENV_LOG_FORMAT, "JSON"),
        ]
        .into_iter()
        .collect();

        let config = StockpileConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.provider, StoreProvider::Memory);
        assert_eq!(config.sqlite.db_path, Some(PathBuf::from("data/app.db")));
        assert!(config.sqlite.schema_path.is_none());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(StoreProvider::parse("SQLite").unwrap(), StoreProvider::Sqlite);
        assert_eq!(StoreProvider::parse(" memory ").unwrap(), StoreProvider::Memory);
        assert!(StoreProvider::parse("").is_err());
    }
}
