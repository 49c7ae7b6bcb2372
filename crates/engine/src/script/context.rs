use serde::Serialize;

use sentinel_common::{Device, EventType, MeasurementSnapshot, RuleConfig};

/// What a script sees: available as JSON through `context` and, for
/// measurements, through `get_value`/`get_delta`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScriptContext<'a> {
    pub event_type: EventType,
    pub eui: &'a str,
    pub config: &'a RuleConfig,
    pub device: Option<&'a Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<&'a MeasurementSnapshot>,
    /// Command JSON for COMMAND events, lifecycle descriptor for DEVICE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<&'a str>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(event_type: EventType, eui: &'a str, config: &'a RuleConfig) -> Self {
        Self {
            event_type,
            eui,
            config,
            device: None,
            snapshot: None,
            payload: None,
        }
    }

    pub fn with_device(mut self, device: Option<&'a Device>) -> Self {
        self.device = device;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Option<&'a MeasurementSnapshot>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn with_payload(mut self, payload: &'a str) -> Self {
        self.payload = Some(payload);
        self
    }
}
