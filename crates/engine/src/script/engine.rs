use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use wasmtime::{Config, Engine, StoreLimits, StoreLimitsBuilder};

use super::error::ScriptError;
use super::limits::ScriptLimits;

/// Granularity of the script wall-clock deadline.
pub const EPOCH_TICK: Duration = Duration::from_millis(10);

pub fn create_engine() -> Result<Engine, ScriptError> {
    let mut config = Config::new();
    config.epoch_interruption(true);
    Engine::new(&config).map_err(|e| ScriptError::Compile(e.to_string()))
}

pub fn create_store_limits(limits: &ScriptLimits) -> StoreLimits {
    StoreLimitsBuilder::new()
        .memory_size(limits.max_memory_mb as usize * 1024 * 1024)
        .instances(1)
        .build()
}

/// Epoch ticks a store may run for before it is interrupted.
pub fn deadline_ticks(timeout_ms: u64) -> u64 {
    timeout_ms.div_ceil(EPOCH_TICK.as_millis() as u64).max(1)
}

/// Advances the engine epoch every [`EPOCH_TICK`] until dropped. One ticker
/// serves every concurrent execution on the engine.
pub struct EpochTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EpochTicker {
    pub fn start(engine: Engine) -> Result<Self, ScriptError> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("script-epoch".into())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    std::thread::sleep(EPOCH_TICK);
                    engine.increment_epoch();
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for EpochTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
