// jurisguard/src/logger.rs
//! Logger setup for the CLI.
//!
//! Filter precedence, highest first: `--quiet`/`--debug`, `JURISGUARD_LOG`,
//! `RUST_LOG`, the configuration file's `log_level`, then `warn`. Logs go to
//! stderr so that stdout carries only command output.

use env_logger::{Builder, Target};
use jurisguard_core::config::ENV_LOG;
use log::LevelFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Resolves the filter directives to use when no CLI flag forces a level.
pub fn resolve_filter(
    jurisguard_log: Option<String>,
    rust_log: Option<String>,
    configured: Option<&str>,
) -> String {
    jurisguard_log
        .or(rust_log)
        .or_else(|| configured.map(str::to_string))
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initializes the global logger. Safe to call more than once; later calls
/// are ignored.
pub fn init_logger(level_override: Option<LevelFilter>, configured: Option<&str>) {
    let mut builder = Builder::new();
    match level_override {
        Some(level) => {
            builder.filter_level(level);
        }
        None => {
            let filter = resolve_filter(
                std::env::var(ENV_LOG).ok(),
                std::env::var(env_logger::DEFAULT_FILTER_ENV).ok(),
                configured,
            );
            builder.parse_filters(&filter);
            builder.parse_write_style(&std::env::var(env_logger::DEFAULT_WRITE_STYLE_ENV).unwrap_or_default());
        }
    }
    builder.target(Target::Stderr).format_timestamp(None);
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        assert_eq!(resolve_filter(Some("debug".into()), Some("info".into()), Some("error")), "debug");
        assert_eq!(resolve_filter(None, Some("info".into()), Some("error")), "info");
        assert_eq!(resolve_filter(None, None, Some("error")), "error");
        assert_eq!(resolve_filter(None, None, None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(Some("  ".into()), None, None), DEFAULT_FILTER);
    }
}
