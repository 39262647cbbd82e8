use std::env;

/// Minimum signing-secret length accepted in production mode
const MIN_SECRET_LEN: usize = 32;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind address (0.0.0.0 for LAN, 127.0.0.1 for localhost)
    pub bind_addr: String,
    /// PostgreSQL database URL
    pub database_url: String,
    /// Secret used to sign session tokens
    pub token_secret: String,
    /// Production mode: secure cookies, diagnostics suppressed in responses
    pub production: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let production = env::var("ACCOUNTD_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        // Require an explicit secret and database URL - no defaults
        let token_secret = env::var("TOKEN_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("TOKEN_SECRET".to_string()))?;

        if token_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "TOKEN_SECRET must not be empty".to_string(),
            ));
        }
        if production && token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "TOKEN_SECRET must be at least {} characters in production",
                MIN_SECRET_LEN
            )));
        }

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        Ok(Self {
            port: env::var("ACCOUNTD_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            bind_addr: env::var("ACCOUNTD_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            database_url,
            token_secret,
            production,
        })
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
