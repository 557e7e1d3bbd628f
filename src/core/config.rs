//! Command-line configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

use crate::core::grammar::SqlDialect;

pub const DIALECT_VAR: &str = "QUERY_VISUALIZER_DIALECT";
pub const PRETTY_VAR: &str = "QUERY_VISUALIZER_PRETTY";

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQL dialect for the grammar
    /// Example: postgresql
    pub dialect: SqlDialect,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(DIALECT_VAR).ok().as_deref(),
            std::env::var(PRETTY_VAR).ok().as_deref(),
        )
    }

    /// Build configuration from raw variable values; unknown dialects fall back to generic
    pub fn from_values(dialect: Option<&str>, pretty: Option<&str>) -> Self {
        let dialect = match dialect {
            Some(name) => SqlDialect::from_name(name).unwrap_or_else(|| {
                tracing::warn!("Unknown {} '{}', using generic", DIALECT_VAR, name);
                SqlDialect::Generic
            }),
            None => SqlDialect::Generic,
        };
        let pretty = pretty.is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Self { dialect, pretty }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
