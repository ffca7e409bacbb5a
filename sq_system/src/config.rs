use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use crate::db::DbConfig;
use crate::llm::LlmConfig;

/// Everything the domain services need to be constructed.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SystemConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub dm: DmConfig,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret used to sign session tokens.
    ///
    /// A random one is generated when a new config file is created.
    pub jwt_secret: String,
    pub token_lifetime_hours: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime_hours", &self.token_lifetime_hours)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Alphanumeric.sample_string(&mut rand::rng(), 48),
            token_lifetime_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DmConfig {
    /// Amount of most recent story posts considered when prompting the Dungeon Master.
    pub history_window: u64,
    /// Upper bound on the characters of formatted story history included in a prompt.
    pub max_context_chars: usize,
}

impl Default for DmConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            // Roughly 4000 tokens
            max_context_chars: 16_000,
        }
    }
}
