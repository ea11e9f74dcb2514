use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {key} must be valid (got {value:?})")]
    Invalid { key: &'static str, value: String },
}

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            server: ServerConfig::load()?,
            store: StoreConfig::load()?,
        })
    }
}


// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request line, in bytes
    pub data_buffer: usize,
    /// Connections silent for this long are torn down
    pub idle_timeout_secs: u64,
    pub max_connections: usize,
    /// Acknowledgement sent for a fully successful push
    pub ok_reply: String,
    pub log_level: String,
}

impl ServerConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host:              get_env("BSM_HOST", "127.0.0.1")?,
            port:              get_env("BSM_PORT", "65432")?,
            data_buffer:       get_env("BSM_DATA_BUFFER", "4096")?,
            idle_timeout_secs: get_env("BSM_IDLE_TIMEOUT_SECS", "10")?,
            max_connections:   get_env("BSM_MAX_CONNECTIONS", "1024")?,
            ok_reply:          get_env("BSM_OK", "Ok.")?,
            log_level:         get_env("BSM_LOG", "info")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 65432,
            data_buffer: 4096,
            idle_timeout_secs: 10,
            max_connections: 1024,
            ok_reply: "Ok.".to_string(),
            log_level: "info".to_string(),
        }
    }
}

// STORE
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub object_lifetime_secs: u64,
}

impl StoreConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            object_lifetime_secs: get_env("BSM_OBJECT_LIFETIME_SECS", "20")?,
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { object_lifetime_secs: 20 }
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
