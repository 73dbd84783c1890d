// config/mod.rs
use crate::devices::magic_home::DEFAULT_CONTROL_PORT;
use ::config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub discovery: DiscoverySettings,
    pub control: ControlSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverySettings {
    pub interval_secs: u64,
    pub timeout_ms: u64,
}

impl DiscoverySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct ControlSettings {
    pub port: u16,
    pub timeout_ms: u64,
}

impl ControlSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub port: u16,
}

impl Settings {
    /// Defaults, then `config/config.*` if present, then `APP__*` variables.
    /// A bare `PORT` variable overrides the listen port.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(
            File::with_name("config/config").required(false),
            std::env::var("PORT").ok(),
        )
    }

    fn load<S>(file: S, port: Option<String>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .set_default("server.address", "0.0.0.0:3000")?
            .set_default("discovery.interval_secs", 60_u64)?
            .set_default("discovery.timeout_ms", 1000_u64)?
            .set_default("control.port", u64::from(DEFAULT_CONTROL_PORT))?
            .set_default("control.timeout_ms", 5000_u64)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9000_u64)?
            .add_source(file)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("server.address", port.map(|p| format!("0.0.0.0:{p}")))?
            .build()?;

        settings.try_deserialize()
    }
}
