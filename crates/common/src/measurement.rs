use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Measurement name -> storage column (`d1`..`d24`) for one device.
pub type ChannelMap = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    /// Signed change since the previous sample, when the source knows it.
    #[serde(default)]
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub eui: String,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub values: HashMap<String, Measurement>,
}

impl MeasurementSnapshot {
    pub fn new(eui: impl Into<String>) -> Self {
        Self {
            eui: eui.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: f64, delta: Option<f64>) -> Self {
        self.insert(name, value, delta);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64, delta: Option<f64>) {
        self.values.insert(name.into(), Measurement { value, delta });
    }

    pub fn get(&self, name: &str) -> Option<&Measurement> {
        self.values.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).map(|m| m.value)
    }

    pub fn delta(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|m| m.delta)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
