//! Server configuration loaded from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use crate::crdt::SiteId;

/// Environment variable holding the listen address.
pub const ADDR_VAR: &str = "CRDT_SEQ_ADDR";
/// Environment variable holding the replica's site id.
pub const SITE_VAR: &str = "CRDT_SEQ_SITE";

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SITE: SiteId = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid listen address {value:?}: {reason}")]
    InvalidAddr { value: String, reason: String },

    #[error("Invalid site id {0:?}: expected an unsigned 32-bit integer")]
    InvalidSite(String),
}

/// Settings for the relay server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub site: SiteId,
}

impl ServerConfig {
    /// Reads [`ADDR_VAR`] and [`SITE_VAR`], falling back to defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_value = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddr {
                value: addr_value.clone(),
                reason: e.to_string(),
            })?;

        let site = match lookup(SITE_VAR) {
            Some(value) => value
                .trim()
                .parse::<SiteId>()
                .map_err(|_| ConfigError::InvalidSite(value.clone()))?,
            None => DEFAULT_SITE,
        };

        Ok(ServerConfig { addr, site })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            site: DEFAULT_SITE,
        }
    }
}
