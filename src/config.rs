use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::{AppError, AppResult};

/// Database settings read from the environment. Values are kept verbatim;
/// anything missing shows up later as a connection failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Self {
            db_host: var("DB_HOST"),
            db_port: var("DB_PORT"),
            db_user: var("DB_USERNAME"),
            db_password: var("DB_PASS"),
            db_name: var("DB_NAME"),
        }
    }

    /// Driver connect options, TLS disabled. An empty port keeps the driver
    /// default; a non-numeric one is rejected.
    pub fn connect_options(&self) -> AppResult<PgConnectOptions> {
        let mut options = PgConnectOptions::new()
            .host(&self.db_host)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
            .ssl_mode(PgSslMode::Disable);

        if !self.db_port.is_empty() {
            let port: u16 = self.db_port.parse().map_err(|_| {
                AppError::Config(format!("DB_PORT must be a valid port, got {:?}", self.db_port))
            })?;
            options = options.port(port);
        }

        Ok(options)
    }
}
