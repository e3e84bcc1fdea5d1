use serde::Deserialize;
use pixio_core::error::{PixioError, Result};

use crate::access::{AccessRole, LinkAccess};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    pub version: u32,

    #[serde(default)]
    pub hub: HubSection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub seed: SeedSection,
}

impl HubConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PixioError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.hub.validate()?;
        self.seed.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// How long a room may sit empty before it is evicted.
    #[serde(default = "default_room_idle_ms")]
    pub room_idle_ms: u64,

    /// Per-connection outbound queue capacity (frames).
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Empty list accepts every origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            room_idle_ms: default_room_idle_ms(),
            outbound_queue: default_outbound_queue(),
            allowed_origins: Vec::new(),
        }
    }
}

impl HubSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.handshake_timeout_ms) {
            return Err(PixioError::InvalidConfig(
                "hub.handshake_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(100..=60000).contains(&self.write_timeout_ms) {
            return Err(PixioError::InvalidConfig(
                "hub.write_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(1000..=120000).contains(&self.ping_interval_ms) {
            return Err(PixioError::InvalidConfig(
                "hub.ping_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if !(2000..=600000).contains(&self.idle_timeout_ms) {
            return Err(PixioError::InvalidConfig(
                "hub.idle_timeout_ms must be between 2000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(PixioError::InvalidConfig(
                "hub.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if self.room_idle_ms == 0 {
            return Err(PixioError::InvalidConfig(
                "hub.room_idle_ms must be greater than zero".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(PixioError::InvalidConfig(
                "hub.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_handshake_timeout_ms() -> u64 {
    10000
}
fn default_write_timeout_ms() -> u64 {
    10000
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_room_idle_ms() -> u64 {
    180000
}
fn default_outbound_queue() -> usize {
    256
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// HS256 secret for access tokens. Falls back to `ACCESS_TOKEN_SECRET`.
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

/// Development fixtures for the in-memory canvas store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSection {
    #[serde(default)]
    pub canvases: Vec<SeedCanvas>,
}

impl SeedSection {
    pub fn validate(&self) -> Result<()> {
        for c in &self.canvases {
            if c.id.is_empty() {
                return Err(PixioError::InvalidConfig("seed canvas id must not be empty".into()));
            }
            if c.width == 0 || c.height == 0 {
                return Err(PixioError::InvalidConfig(format!(
                    "seed canvas {} must have non-zero dimensions",
                    c.id
                )));
            }
            if c.link_role == AccessRole::Owner {
                return Err(PixioError::InvalidConfig(format!(
                    "seed canvas {} link_role cannot be owner",
                    c.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCanvas {
    pub id: String,
    pub owner_id: String,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub link_access: LinkAccess,
    #[serde(default)]
    pub link_role: AccessRole,
    #[serde(default)]
    pub access: Vec<SeedAccess>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedAccess {
    pub user_id: String,
    pub role: AccessRole,
}
