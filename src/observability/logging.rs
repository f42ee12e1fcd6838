//! Log filter and output selection.

use crate::config::{LogFormat, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive; takes precedence over `RUST_LOG`.
pub const ENV_LOG_FILTER: &str = "STOCKPILE_LOG";

/// Filter used when nothing else is configured.
const DEFAULT_FILTER: &str = "warn";

/// Filter used for `--verbose`.
const VERBOSE_FILTER: &str = "stockpile=debug,info";

/// Resolved logging settings for subscriber initialisation.
#[derive(Debug)]
pub struct LogSettings {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Resolves settings from configuration and the process environment.
    ///
    /// An invalid directive is reported on stderr and replaced by the default.
    #[must_use]
    #[allow(clippy::print_stderr)]
    pub fn from_config(config: &LoggingConfig, verbose: bool) -> Self {
        let directive = resolve_directive(
            std::env::var(ENV_LOG_FILTER).ok(),
            std::env::var("RUST_LOG").ok(),
            config.level.as_deref(),
            verbose,
        );
        let filter = match EnvFilter::try_new(&directive) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("ignoring invalid log filter '{directive}': {e}");
                EnvFilter::new(DEFAULT_FILTER)
            },
        };
        Self {
            format: config.format,
            filter,
            file: config.file.clone(),
        }
    }
}

/// Picks the filter directive: explicit env, `RUST_LOG`, verbose flag, config, default.
fn resolve_directive(
    stockpile_log: Option<String>,
    rust_log: Option<String>,
    configured: Option<&str>,
    verbose: bool,
) -> String {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    non_empty(stockpile_log)
        .or_else(|| non_empty(rust_log))
        .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
        .or_else(|| non_empty(configured.map(str::to_string)))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_precedence() {
        assert_eq!(
            resolve_directive(Some("trace".into()), Some("info".into()), Some("error"), true),
            "trace"
        );
        assert_eq!(
            resolve_directive(None, Some("info".into()), Some("error"), true),
            "info"
        );
        assert_eq!(resolve_directive(None, None, Some("error"), true), VERBOSE_FILTER);
        assert_eq!(resolve_directive(None, None, Some("error"), false), "error");
        assert_eq!(resolve_directive(Some(" ".into()), None, None, false), DEFAULT_FILTER);
    }
}
