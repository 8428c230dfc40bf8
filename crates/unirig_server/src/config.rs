//! Server configuration from flags and environment.

use clap::{Parser, ValueEnum};
use http::Uri;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Error in server configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Bind address did not parse
    #[error("invalid bind address {value:?}: {reason}")]
    InvalidBind {
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Engine URL did not parse or is not plain http
    #[error("invalid engine url {value:?}: {reason}")]
    InvalidEngineUrl {
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A timeout was zero
    #[error("{name} must be greater than zero")]
    ZeroTimeout {
        /// Flag name
        name: &'static str,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "unirig-server")]
#[command(about = "UniRig workflow API server", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "UNIRIG_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Base URL of the execution engine
    #[arg(long, env = "UNIRIG_ENGINE_URL", default_value = "http://127.0.0.1:8188")]
    pub engine_url: String,

    /// Upper bound on one graph execution, in seconds
    #[arg(long, env = "UNIRIG_ENGINE_TIMEOUT_SECS", default_value_t = 300)]
    pub engine_timeout_secs: u64,

    /// Block startup until the engine answers its health check
    #[arg(long, env = "UNIRIG_WAIT_FOR_ENGINE")]
    pub wait_for_engine: bool,

    /// How long to wait for the engine at startup, in seconds
    #[arg(long, env = "UNIRIG_WAIT_TIMEOUT_SECS", default_value_t = 120)]
    pub wait_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "UNIRIG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            engine_url: "http://127.0.0.1:8188".to_string(),
            engine_timeout_secs: 300,
            wait_for_engine: false,
            wait_timeout_secs: 120,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Parsed bind address
    ///
    /// # Errors
    ///
    /// Returns error if the address does not parse
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidBind {
            value: self.bind.clone(),
            reason: e.to_string(),
        })
    }

    /// Parsed engine base URL, without a trailing slash
    ///
    /// # Errors
    ///
    /// Returns error if the URL does not parse or is not `http://host[:port]`
    pub fn engine_uri(&self) -> Result<Uri, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEngineUrl {
            value: self.engine_url.clone(),
            reason,
        };
        let trimmed = self.engine_url.trim_end_matches('/');
        let uri: Uri = trimmed.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// is supported".to_string()));
        }
        if uri.host().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(uri)
    }

    /// Engine execution timeout
    #[must_use]
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    /// Startup wait budget
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Check every value up front
    ///
    /// # Errors
    ///
    /// Returns the first invalid value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.engine_uri()?;
        if self.engine_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "engine-timeout-secs",
            });
        }
        if self.wait_for_engine && self.wait_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "wait-timeout-secs",
            });
        }
        Ok(())
    }
}
