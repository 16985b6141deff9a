//! Server configuration and CLI argument parsing
//!
//! All settings can be given as CLI arguments or as environment variables
//! with the `LASTMILE_` prefix. CLI arguments take precedence over
//! environment variables, which take precedence over defaults.
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! lastmile --http-port 9090 --database-url postgres://localhost/lastmile
//!
//! # Using environment variables
//! export LASTMILE_DATABASE_URL=postgres://localhost/lastmile
//! export LASTMILE_HTTP_PORT=8080
//! lastmile
//!
//! # Mixed (CLI overrides env)
//! export LASTMILE_HTTP_PORT=8080
//! lastmile --http-port 9090  # Uses port 9090
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;

/// Main configuration structure for the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener configuration
    pub http: HttpConfig,
    /// Database connection configuration
    pub database: DatabaseConfig,
    /// Per-operation rate limiter configuration
    pub limiter: LimiterConfig,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Connection pool size
    pub max_connections: u32,
}

/// Rate limiter configuration
///
/// Applied uniformly to every guarded operation; each operation still gets
/// its own independent bucket.
#[derive(Debug, Clone, Copy)]
pub struct LimiterConfig {
    /// Burst capacity of each bucket
    pub capacity: u32,
    /// Tokens granted per second
    pub refill_rate: u32,
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// LASTMILE_ prefix. CLI arguments take precedence over environment
/// variables.
#[derive(Parser, Debug)]
#[command(
    name = "lastmile",
    about = "Courier and delivery-order service",
    long_about = "An HTTP service managing couriers and delivery orders.\n\nEvery operation is guarded by its own token-bucket rate limiter.\n\nEnvironment variables with LASTMILE_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "LASTMILE_HTTP_HOST"
    )]
    pub http_host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "LASTMILE_HTTP_PORT"
    )]
    pub http_port: u16,

    #[arg(
        long,
        value_name = "URL",
        help = "PostgreSQL connection string",
        env = "LASTMILE_DATABASE_URL"
    )]
    pub database_url: String,
    #[arg(
        long,
        value_name = "N",
        help = "Database connection pool size",
        default_value_t = 10,
        env = "LASTMILE_DB_MAX_CONNECTIONS"
    )]
    pub db_max_connections: u32,

    #[arg(
        long,
        value_name = "N",
        help = "Burst capacity of each per-operation rate limiter",
        default_value_t = 10,
        env = "LASTMILE_LIMITER_CAPACITY"
    )]
    pub limiter_capacity: u32,
    #[arg(
        long,
        value_name = "N",
        help = "Tokens per second granted to each per-operation rate limiter",
        default_value_t = 10,
        env = "LASTMILE_LIMITER_REFILL_RATE"
    )]
    pub limiter_refill_rate: u32,

    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "LASTMILE_LOG_LEVEL"
    )]
    pub log_level: String,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments.
    ///
    /// Clap resolves the precedence: CLI arguments, then environment
    /// variables, then defaults.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            http: HttpConfig {
                host: args.http_host,
                port: args.http_port,
            },
            database: DatabaseConfig {
                url: args.database_url,
                max_connections: args.db_max_connections,
            },
            limiter: LimiterConfig {
                capacity: args.limiter_capacity,
                refill_rate: args.limiter_refill_rate,
            },
            log_level: args.log_level,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.limiter.capacity == 0 {
            return Err(anyhow!("limiter capacity must be at least 1"));
        }
        if self.limiter.refill_rate == 0 {
            return Err(anyhow!("limiter refill rate must be at least 1 token/s"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow!("database pool needs at least 1 connection"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database_url: "postgres://localhost/lastmile".to_string(),
            db_max_connections: 10,
            limiter_capacity: 10,
            limiter_refill_rate: 10,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_config_from_default_args() {
        let config = Config::from_args(args()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.limiter.capacity, 10);
        assert_eq!(config.limiter.refill_rate, 10);
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let mut invalid = args();
        invalid.limiter_capacity = 0;
        assert!(Config::from_args(invalid).is_err());
    }

    #[test]
    fn test_config_rejects_zero_refill_rate() {
        let mut invalid = args();
        invalid.limiter_refill_rate = 0;
        assert!(Config::from_args(invalid).is_err());
    }

    #[test]
    fn test_config_rejects_empty_pool() {
        let mut invalid = args();
        invalid.db_max_connections = 0;
        assert!(Config::from_args(invalid).is_err());
    }
}
