use std::fmt::Debug;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::net::ToSocketAddrs;
use sq_system::config::{AuthConfig, DmConfig, SystemConfig};
use sq_system::db::DbConfig;
use sq_system::llm::LlmConfig;

pub type SharedConfig = Arc<Config>;

static CONFIG_FILE: &str = "config.toml";
/// Time left for storing a response after the language model answered.
const LLM_TIMEOUT_MARGIN_SECS: u64 = 5;

/// Initialise the config file.
///
/// Creates a new config file if it doesn't yet exist, otherwise loads the existing one.
/// Any value can be overridden with `STORYQUEST_<SECTION>__<KEY>`, f.e. `STORYQUEST_APP__PORT=5000`.
pub fn initialise_config() -> eyre::Result<Config> {
    let c_path = get_full_config_path();

    if !c_path.exists() {
        tracing::info!(path = ?c_path, "Creating new config file");
        save_config(&Config::default())?;
    }

    let c = config::Config::builder()
        .add_source(config::File::with_name(&c_path.to_string_lossy()).required(true))
        .add_source(
            config::Environment::with_prefix("STORYQUEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(c.try_deserialize()?)
}

/// Save the provided config to the known config directory.
pub fn save_config(app_settings: &Config) -> eyre::Result<()> {
    std::fs::create_dir_all(get_config_directory())?;

    let mut config_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(get_full_config_path())?;

    let basic_output = toml::to_string_pretty(app_settings)?;

    config_file.write_all(basic_output.as_bytes())?;

    Ok(())
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    /// Bindings and host address
    pub app: ServerConfig,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    /// Prompt budget of the Dungeon Master
    pub dm: DmConfig,
}

impl Config {
    /// The part of the config relevant to the domain services.
    ///
    /// The LLM timeout is capped below the request timeout, so a slow model still yields an LLM error.
    pub fn system(&self) -> SystemConfig {
        let mut llm = self.llm.clone();
        let max_llm_timeout = self.app.request_timeout_secs.saturating_sub(LLM_TIMEOUT_MARGIN_SECS).max(1);
        if llm.timeout_secs > max_llm_timeout {
            tracing::warn!(
                configured = llm.timeout_secs,
                request_timeout = self.app.request_timeout_secs,
                "LLM timeout exceeds the request timeout, capping it to {max_llm_timeout}s"
            );
            llm.timeout_secs = max_llm_timeout;
        }

        SystemConfig {
            db: self.db.clone(),
            auth: self.auth.clone(),
            llm,
            dm: self.dm,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests taking longer are aborted.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Turn the app config settings into a [ToSocketAddrs]
    pub fn bind_address(&self) -> impl ToSocketAddrs {
        (self.host.clone(), self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
            request_timeout_secs: 60,
        }
    }
}

/// Retrieve the *full* path to the config file.
///
/// This is just [get_config_directory] + [CONFIG_FILE]
pub fn get_full_config_path() -> PathBuf {
    get_config_directory().join(CONFIG_FILE)
}

/// Retrieve the directory which will be used to locate/save the config file.
pub fn get_config_directory() -> PathBuf {
    sq_system::get_app_dirs().config_dir
}
