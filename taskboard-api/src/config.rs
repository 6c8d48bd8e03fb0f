/// Configuration management for the API server
///
/// Loaded from environment variables (after `.env`, if present).
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `USERS_DATABASE_URL`, `BOARDS_DATABASE_URL`, `TASKS_DATABASE_URL`: one
///   PostgreSQL database per service (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size per database (default: 10)
/// - `JWT_SECRET`: token signing key, at least 32 characters (required)
/// - `REDIS_URL`: event transport (required)
/// - `BOARD_SERVICE_URL`: when set, task routes ask this board service for
///   membership over HTTP instead of reading the boards database
/// - `REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for permissive (default: *)
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub databases: DatabaseUrls,
    pub jwt: JwtConfig,
    pub redis_url: String,

    /// Remote board service for membership checks
    pub board_service_url: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// One database per service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseUrls {
    pub users: String,
    pub boards: String,
    pub tasks: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    ///
    /// Must be at least 32 characters. Generate with `openssl rand -hex 32`.
    #[serde(skip_serializing)]
    pub secret: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a number does not
    /// parse, or `JWT_SECRET` is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let secret = required("JWT_SECRET")?;
        validate_secret(&secret)?;

        let board_service_url = env::var("BOARD_SERVICE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                request_timeout_secs,
                cors_origins,
            },
            databases: DatabaseUrls {
                users: required("USERS_DATABASE_URL")?,
                boards: required("BOARDS_DATABASE_URL")?,
                tasks: required("TASKS_DATABASE_URL")?,
                max_connections,
            },
            jwt: JwtConfig { secret },
            redis_url: required("REDIS_URL")?,
            board_service_url,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Rejects signing keys shorter than 32 characters
pub fn validate_secret(secret: &str) -> anyhow::Result<()> {
    if secret.len() < 32 {
        anyhow::bail!("JWT_SECRET must be at least 32 characters long");
    }
    Ok(())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
