/// Worker configuration
///
/// Built with the `config` crate from two environment sources. Connection
/// URLs are read unprefixed, so the worker shares `BOARDS_DATABASE_URL`,
/// `TASKS_DATABASE_URL` and `REDIS_URL` with the API. Tuning knobs take the
/// `WORKER_` prefix and override the defaults:
///
/// | Variable | Default |
/// |---|---|
/// | `WORKER_POLL_INTERVAL_MS` | 1000 |
/// | `WORKER_BATCH_SIZE` | 50 |
/// | `WORKER_CONSUMER_NAME` | `$HOSTNAME`, else `worker-<pid>` |
/// | `WORKER_BLOCK_MS` | 5000 |
/// | `WORKER_LEASE_SECS` | 30 |
/// | `WORKER_MAX_BACKOFF_MS` | 60000 |
///
/// # Example
///
/// ```no_run
/// use taskboard_worker::config::WorkerConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = WorkerConfig::from_env()?;
/// println!("consumer {}", config.consumer_name);
/// # Ok(())
/// # }
/// ```

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub boards_database_url: String,
    pub tasks_database_url: String,
    pub redis_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Outbox entries per relay pass, and deliveries per consumer fetch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Name of this process within the cascade consumer group
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    #[serde(default = "default_block_ms")]
    pub block_ms: usize,

    /// How long a relay pass holds the entries it claimed
    #[serde(default = "default_lease_secs")]
    pub lease_secs: i64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    50
}

fn default_consumer_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| format!("worker-{}", std::process::id()))
}

fn default_block_ms() -> usize {
    5000
}

fn default_lease_secs() -> i64 {
    30
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl WorkerConfig {
    /// Loads configuration from the environment (after `.env`, if present)
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is missing, a number does not parse, or
    /// the batch size or poll interval is zero.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .add_source(config::Environment::with_prefix("WORKER").try_parsing(true))
            .build()?;
        Self::from_config(source)
    }

    fn from_config(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.batch_size == 0 {
            return Err(config::ConfigError::Message(
                "WORKER_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "WORKER_POLL_INTERVAL_MS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_from_pairs(pairs: &[(&str, &str)]) -> Result<WorkerConfig, config::ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        WorkerConfig::from_config(builder.build().unwrap())
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> WorkerConfig {
        try_from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_defaults_apply() {
        let config = from_pairs(&[
            ("boards_database_url", "postgresql://localhost/boards"),
            ("tasks_database_url", "postgresql://localhost/tasks"),
            ("redis_url", "redis://localhost:6379"),
        ]);

        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.block_ms, 5000);
        assert_eq!(config.lease_secs, 30);
        assert!(!config.consumer_name.is_empty());
    }

    #[test]
    fn test_overrides_parse() {
        let config = from_pairs(&[
            ("boards_database_url", "b"),
            ("tasks_database_url", "t"),
            ("redis_url", "r"),
            ("batch_size", "5"),
            ("consumer_name", "worker-a"),
        ]);

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.consumer_name, "worker-a");
    }

    #[test]
    fn test_missing_url_is_an_error() {
        assert!(try_from_pairs(&[("redis_url", "r")]).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let err = try_from_pairs(&[
            ("boards_database_url", "b"),
            ("tasks_database_url", "t"),
            ("redis_url", "r"),
            ("batch_size", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WORKER_BATCH_SIZE"));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = try_from_pairs(&[
            ("boards_database_url", "b"),
            ("tasks_database_url", "t"),
            ("redis_url", "r"),
            ("poll_interval_ms", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WORKER_POLL_INTERVAL_MS"));
    }
}
