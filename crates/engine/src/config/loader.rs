use std::path::Path;

use super::schema::EngineConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_from_file(path: &Path) -> Result<EngineConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<EngineConfig, LoadError> {
    let cfg: EngineConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Applies `NATS_URL`, `ENGINE_API_ADDR`, `DATABASE_URL` and
/// `SCRIPT_TIMEOUT_MS` on top of `cfg`, then validates the result.
pub fn apply_env(cfg: EngineConfig) -> Result<EngineConfig, LoadError> {
    apply_overrides(cfg, |key| std::env::var(key).ok())
}

fn apply_overrides<F>(mut cfg: EngineConfig, var: F) -> Result<EngineConfig, LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = var("NATS_URL") {
        cfg.nats.url = url;
    }
    if let Some(addr) = var("ENGINE_API_ADDR") {
        cfg.api_addr = addr;
    }
    if let Some(url) = var("DATABASE_URL") {
        cfg.database_url = Some(url).filter(|u| !u.is_empty());
    }
    if let Some(ms) = var("SCRIPT_TIMEOUT_MS") {
        cfg.script.timeout_ms = ms
            .parse()
            .map_err(|_| LoadError::Validation(format!("SCRIPT_TIMEOUT_MS is not a number: {ms}")))?;
    }
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &EngineConfig) -> Result<(), LoadError> {
    if cfg.nats.url.is_empty() {
        return Err(LoadError::Validation("nats.url must not be empty".into()));
    }
    if cfg.api_addr.is_empty() {
        return Err(LoadError::Validation("api_addr must not be empty".into()));
    }
    if cfg.script.timeout_ms == 0 {
        return Err(LoadError::Validation("script.timeout_ms must be > 0".into()));
    }
    if cfg.script.max_memory_mb == 0 {
        return Err(LoadError::Validation("script.max_memory_mb must be > 0".into()));
    }
    if cfg.script.module_cache == 0 {
        return Err(LoadError::Validation("script.module_cache must be > 0".into()));
    }
    if cfg.correlation.ttl_secs == 0 || cfg.correlation.sweep_interval_secs == 0 {
        return Err(LoadError::Validation(
            "correlation.ttl_secs and correlation.sweep_interval_secs must be > 0".into(),
        ));
    }
    let s = &cfg.nats.subjects;
    if [&s.data, &s.command, &s.device, &s.alerts].iter().any(|x| x.is_empty()) {
        return Err(LoadError::Validation("nats subjects must not be empty".into()));
    }
    Ok(())
}
