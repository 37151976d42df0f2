use std::time::Duration;

/// Default pool size, matching the size the store was sized for.
const DEFAULT_POOL_SIZE: u32 = 5;

/// Default reaper tick: once an hour.
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

/// Default grace period before a stale token row is purged.
const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Longest accepted retention: ten years.
pub const MAX_RETENTION_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Provisioning configuration loaded from environment variables.
///
/// Everything except `DATABASE_URL` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Postgres connection URL.
    pub database_url: String,
    /// Maximum pool connections (default: `5`).
    pub pool_size: u32,
    /// Create the database before connecting if it is missing (default: `true`).
    pub create_database: bool,
    /// How often the token reaper runs (default: 1 hour).
    pub purge_interval: Duration,
    /// How long stale token rows are kept before purging, in hours
    /// (default: `24`, at most [`MAX_RETENTION_HOURS`]).
    pub retention_hours: i64,
}

impl ProvisionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default      |
    /// |-----------------------------------|--------------|
    /// | `DATABASE_URL`                    | (required)   |
    /// | `DB_POOL_SIZE`                    | `5`          |
    /// | `DB_CREATE_DATABASE`              | `true`       |
    /// | `RESET_TOKEN_PURGE_INTERVAL_SECS` | `3600`       |
    /// | `RESET_TOKEN_RETENTION_HOURS`     | `24`         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let pool_size: u32 = parse_or(&lookup, "DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_POOL_SIZE",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let create_database = match lookup("DB_CREATE_DATABASE") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "DB_CREATE_DATABASE",
                value: raw.clone(),
                reason: "expected true/false".into(),
            })?,
        };

        let purge_interval_secs: u64 = parse_or(
            &lookup,
            "RESET_TOKEN_PURGE_INTERVAL_SECS",
            DEFAULT_PURGE_INTERVAL_SECS,
        )?;
        if purge_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "RESET_TOKEN_PURGE_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let retention_hours: i64 =
            parse_or(&lookup, "RESET_TOKEN_RETENTION_HOURS", DEFAULT_RETENTION_HOURS)?;
        if !(0..=MAX_RETENTION_HOURS).contains(&retention_hours) {
            return Err(ConfigError::Invalid {
                var: "RESET_TOKEN_RETENTION_HOURS",
                value: retention_hours.to_string(),
                reason: format!("must be between 0 and {MAX_RETENTION_HOURS}"),
            });
        }

        Ok(Self {
            database_url,
            pool_size,
            create_database,
            purge_interval: Duration::from_secs(purge_interval_secs),
            retention_hours,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ProvisionConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProvisionConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/ken")]).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/ken");
        assert_eq!(config.pool_size, 5);
        assert!(config.create_database);
        assert_eq!(config.purge_interval, Duration::from_secs(3600));
        assert_eq!(config.retention_hours, 24);
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/ken"),
            ("DB_POOL_SIZE", "12"),
            ("DB_CREATE_DATABASE", "no"),
            ("RESET_TOKEN_PURGE_INTERVAL_SECS", "60"),
            ("RESET_TOKEN_RETENTION_HOURS", "0"),
        ])
        .unwrap();
        assert_eq!(config.pool_size, 12);
        assert!(!config.create_database);
        assert_eq!(config.purge_interval, Duration::from_secs(60));
        assert_eq!(config.retention_hours, 0);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert_matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
        assert_matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = load(&[("DATABASE_URL", "postgres://db/ken"), ("DB_POOL_SIZE", "lots")])
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "DB_POOL_SIZE", .. });
        assert!(err.to_string().starts_with("DB_POOL_SIZE has invalid value 'lots'"));
    }

    #[test]
    fn zero_pool_is_rejected() {
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db/ken"), ("DB_POOL_SIZE", "0")]),
            Err(ConfigError::Invalid { var: "DB_POOL_SIZE", .. })
        );
    }

    #[test]
    fn bad_bool_is_rejected() {
        assert_matches!(
            load(&[("DATABASE_URL", "postgres://db/ken"), ("DB_CREATE_DATABASE", "maybe")]),
            Err(ConfigError::Invalid { var: "DB_CREATE_DATABASE", .. })
        );
    }

    #[test]
    fn negative_retention_is_rejected() {
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://db/ken"),
                ("RESET_TOKEN_RETENTION_HOURS", "-1"),
            ]),
            Err(ConfigError::Invalid { var: "RESET_TOKEN_RETENTION_HOURS", .. })
        );
    }

    #[test]
    fn oversized_retention_is_rejected() {
        assert_matches!(
            load(&[
                ("DATABASE_URL", "postgres://db/ken"),
                ("RESET_TOKEN_RETENTION_HOURS", "10000000000"),
            ]),
            Err(ConfigError::Invalid { var: "RESET_TOKEN_RETENTION_HOURS", .. })
        );

        let config = load(&[
            ("DATABASE_URL", "postgres://db/ken"),
            ("RESET_TOKEN_RETENTION_HOURS", &MAX_RETENTION_HOURS.to_string()),
        ])
        .unwrap();
        assert_eq!(config.retention_hours, MAX_RETENTION_HOURS);
    }
}
