mod context;
mod engine;
mod error;
mod fingerprint;
mod host_fns;
mod host_state;
mod limits;
mod result;
mod runtime;

pub use context::ScriptContext;
pub use error::ScriptError;
pub use limits::ScriptLimits;
pub use result::{parse_result, ERROR_SENTINEL};
pub use runtime::{ExecutionResult, ScriptEvaluator, WasmScriptEvaluator, ENTRY_FN};
