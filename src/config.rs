use std::env;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5002;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BLOG_PORT must be a port number, got {0:?}")]
    InvalidPort(String),
}

/// Where the server listens. Read from `BLOG_HOST` / `BLOG_PORT`,
/// after loading a `.env` file if one is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenvy::dotenv().ok();
        Config::from_vars(env::var("BLOG_HOST").ok(), env::var("BLOG_PORT").ok())
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> Result<Config, ConfigError> {
        let port = match port {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn address(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}
