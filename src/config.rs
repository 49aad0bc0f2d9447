use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Fraction of the subtotal charged as tax, e.g. `0.12`.
    pub tax_rate: f64,
    /// Simulated processor latency for card payments.
    pub payment_delay: Duration,
    /// Idle time after which an unfinished booking flow is dropped.
    pub flow_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let tax_rate: f64 = try_load("TAX_RATE", "0.12")?;
        if !(0.0..=1.0).contains(&tax_rate) {
            return Err(ConfigError::Invalid {
                key: "TAX_RATE",
                value: tax_rate.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }

        let flow_ttl_secs: i64 = try_load("FLOW_TTL_SECS", "1800")?;
        if flow_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "FLOW_TTL_SECS",
                value: flow_ttl_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "8080")?,
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
            tax_rate,
            payment_delay: Duration::from_millis(try_load("PAYMENT_DELAY_MS", "1500")?),
            flow_ttl: chrono::Duration::seconds(flow_ttl_secs),
        })
    }

    /// In-memory database, no payment delay.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            db_max_connections: 1,
            tax_rate: 0.12,
            payment_delay: Duration::ZERO,
            flow_ttl: chrono::Duration::seconds(1800),
        }
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}
