use std::net::SocketAddr;
use std::path::PathBuf;

use arena_shared::WorldBounds;

use crate::policy::PolicyKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address {addr:?}: {source}")]
    ListenAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid world bounds: {0}")]
    World(String),
    #[error("{0} must be > 0")]
    ZeroBuffer(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub world: WorldBounds,
    /// Seed for item placement. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    pub policy: PolicyKind,
    /// Directory holding the browser client: `public/`, `assets/` and
    /// `views/index.html`.
    pub static_root: PathBuf,
    pub command_buffer: usize,
    pub broadcast_buffer: usize,
    /// Inbound text frames larger than this close the connection.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            world: WorldBounds::default(),
            rng_seed: None,
            policy: PolicyKind::Permissive,
            static_root: PathBuf::from("."),
            command_buffer: 256,
            broadcast_buffer: 64,
            max_message_bytes: 4096,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PORT`, `ARENA_SEED`, `ARENA_POLICY` and
    /// `ARENA_STATIC_ROOT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|_| ConfigError::Env {
                var: "PORT",
                value: port.clone(),
            })?;
            config.listen_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(seed) = lookup("ARENA_SEED") {
            let seed: u64 = seed.parse().map_err(|_| ConfigError::Env {
                var: "ARENA_SEED",
                value: seed.clone(),
            })?;
            config.rng_seed = Some(seed);
        }
        if let Some(policy) = lookup("ARENA_POLICY") {
            config.policy = policy.parse().map_err(|_| ConfigError::Env {
                var: "ARENA_POLICY",
                value: policy.clone(),
            })?;
        }
        if let Some(dir) = lookup("ARENA_STATIC_ROOT") {
            config.static_root = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::ListenAddr {
                addr: self.listen_addr.clone(),
                source,
            })?;
        self.world.validate().map_err(ConfigError::World)?;
        if self.command_buffer == 0 {
            return Err(ConfigError::ZeroBuffer("command_buffer"));
        }
        if self.broadcast_buffer == 0 {
            return Err(ConfigError::ZeroBuffer("broadcast_buffer"));
        }
        if self.max_message_bytes == 0 {
            return Err(ConfigError::ZeroBuffer("max_message_bytes"));
        }
        Ok(())
    }
}
