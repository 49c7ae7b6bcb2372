use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ScriptLimits {
    #[serde(default = "default_memory_mb")]
    pub max_memory_mb: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Compiled modules kept for reuse.
    #[serde(default = "default_module_cache")]
    pub module_cache: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_memory_mb: default_memory_mb(),
            timeout_ms: default_timeout_ms(),
            module_cache: default_module_cache(),
        }
    }
}

fn default_memory_mb() -> u64 {
    16
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_module_cache() -> usize {
    64
}
