use std::collections::HashMap;

use sentinel_common::Measurement;
use wasmtime::StoreLimits;

use super::context::ScriptContext;
use super::error::ScriptError;

/// Per-execution store data. Dropped with the store on every exit path.
pub struct HostState {
    pub eui: String,
    pub context_json: Vec<u8>,
    pub values: HashMap<String, Measurement>,
    pub result: Option<String>,
    pub logs: Vec<String>,
    pub limits: StoreLimits,
}

impl HostState {
    pub fn new(ctx: &ScriptContext<'_>, limits: StoreLimits) -> Result<Self, ScriptError> {
        Ok(Self {
            eui: ctx.eui.to_string(),
            context_json: serde_json::to_vec(ctx)?,
            values: ctx.snapshot.map(|s| s.values.clone()).unwrap_or_default(),
            result: None,
            logs: Vec::new(),
            limits,
        })
    }
}
