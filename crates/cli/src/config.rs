use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default directory holding data-source folders.
pub const DEFAULT_DATA_ROOT: &str = "./uploads/datasource";

/// Runtime configuration for the `hyperlabel` binary.
///
/// Values come from the environment (after `.env` is loaded) and may be
/// overridden by command-line flags.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Root directory of the data-source folders.
    pub data_root: PathBuf,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults. Explicit
    /// values (from flags) take precedence over the environment.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `DATABASE_URL`         | required                 |
    /// | `HYPERLABEL_DATA_ROOT` | `./uploads/datasource`   |
    /// | `DB_MAX_CONNECTIONS`   | `20`                     |
    pub fn load(
        database_url: Option<String>,
        data_root: Option<PathBuf>,
        max_connections: Option<u32>,
    ) -> Result<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
        };

        let data_root = data_root.unwrap_or_else(|| {
            std::env::var("HYPERLABEL_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_ROOT))
        });

        let max_connections = match max_connections {
            Some(n) => n,
            None => parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok())?,
        };

        Ok(Self {
            database_url,
            data_root,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<String>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(hyperlabel_db::DEFAULT_MAX_CONNECTIONS);
    };
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got '{raw}'"))?;
    anyhow::ensure!(value > 0, "DB_MAX_CONNECTIONS must be at least 1");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = CliConfig::load(
            Some("postgres://localhost/test".to_string()),
            Some(PathBuf::from("/srv/data")),
            Some(4),
        )
        .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.data_root, PathBuf::from("/srv/data"));
        assert_eq!(config.max_connections, 4);
    }

    #[test]
    fn max_connections_defaults() {
        assert_eq!(
            parse_max_connections(None).unwrap(),
            hyperlabel_db::DEFAULT_MAX_CONNECTIONS
        );
        assert_eq!(parse_max_connections(Some(" 8 ".to_string())).unwrap(), 8);
    }

    #[test]
    fn max_connections_rejects_garbage() {
        assert!(parse_max_connections(Some("many".to_string())).is_err());
        assert!(parse_max_connections(Some("0".to_string())).is_err());
    }
}
