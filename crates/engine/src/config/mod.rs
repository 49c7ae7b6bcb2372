mod loader;
mod schema;

pub use loader::{apply_env, load_from_file, load_from_str, LoadError};
pub use schema::{CorrelationConfig, EngineConfig, NatsConfig};
