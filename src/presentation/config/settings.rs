use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub relay: RelaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    pub position_ttl_secs: u64,
}

impl RelaySettings {
    pub fn position_ttl(&self) -> Duration {
        Duration::from_secs(self.position_ttl_secs)
    }
}

impl Settings {
    /// Environment-variable configuration, suitable for containers.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            server: ServerSettings {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
            },
            database: DatabaseSettings {
                url: std::env::var("DATABASE_URL").map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL must be set")
                })?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            media: MediaSettings {
                root_dir: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "uploads".to_string()),
            },
            relay: RelaySettings {
                position_ttl_secs: std::env::var("RELAY_POSITION_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            },
        })
    }
}
