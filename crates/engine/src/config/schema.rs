use serde::Deserialize;
use std::path::PathBuf;

use sentinel_common::nats_config::SubjectConfig;

use crate::script::ScriptLimits;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
    /// Signals and commands go to Postgres when set, to the log otherwise.
    #[serde(default)]
    pub database_url: Option<String>,
    /// When off, every alert is also written to the alerts table.
    #[serde(default)]
    pub signals_used: bool,
    #[serde(default)]
    pub script: ScriptLimits,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    /// Rules, devices and readings for the in-memory stores.
    #[serde(default)]
    pub seed: Option<PathBuf>,
    /// How long pending alerts and commands may take to flush on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NatsConfig {
    #[serde(default = "default_nats_url")]
    pub url: String,
    #[serde(default)]
    pub subjects: SubjectConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct CorrelationConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig::default(),
            api_addr: default_api_addr(),
            database_url: None,
            signals_used: false,
            script: ScriptLimits::default(),
            correlation: CorrelationConfig::default(),
            seed: None,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
            subjects: SubjectConfig::default(),
        }
    }
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".into()
}

fn default_api_addr() -> String {
    "0.0.0.0:9091".into()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    30
}
