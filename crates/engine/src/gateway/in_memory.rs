use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sentinel_common::{
    ChannelMap, Device, DeviceGroup, EventType, Measurement, MeasurementSnapshot, RuleConfig,
    SentinelEvent, Tag, Target,
};

use super::{DeviceStore, GatewayError, RuleStore};
use crate::evaluator::DebounceStatus;

/// Recorded events kept per rule; older ones are dropped.
pub const EVENT_HISTORY: usize = 16;

#[derive(Clone, Default)]
pub struct InMemoryRuleStore {
    rules: Arc<DashMap<i64, RuleConfig>>,
    statuses: Arc<DashMap<i64, i32>>,
    events: Arc<DashMap<i64, VecDeque<SentinelEvent>>>,
    channels: Arc<DashMap<i64, HashMap<String, ChannelMap>>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, config: RuleConfig) {
        self.rules.insert(config.id, config);
    }

    pub fn get(&self, id: i64) -> Option<RuleConfig> {
        self.rules.get(&id).map(|r| r.clone())
    }

    pub fn list(&self) -> Vec<RuleConfig> {
        let mut all: Vec<RuleConfig> = self.rules.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub fn delete(&self, id: i64) -> bool {
        self.statuses.remove(&id);
        self.events.remove(&id);
        self.channels.remove(&id);
        self.rules.remove(&id).is_some()
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn set_status(&self, config_id: i64, status: i32) {
        self.statuses.insert(config_id, status);
    }

    pub fn assign(&self, config_id: i64, eui: impl Into<String>, channels: ChannelMap) {
        self.channels
            .entry(config_id)
            .or_default()
            .insert(eui.into(), channels);
    }

    /// The most recent events recorded for the rule, oldest first.
    pub fn events(&self, config_id: i64) -> Vec<SentinelEvent> {
        self.events
            .get(&config_id)
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last_event(&self, config_id: i64) -> Option<SentinelEvent> {
        self.events.get(&config_id).and_then(|e| e.back().cloned())
    }

    fn matching<F>(&self, event_type: EventType, pred: F) -> Vec<RuleConfig>
    where
        F: Fn(&RuleConfig) -> bool,
    {
        self.rules
            .iter()
            .filter(|r| r.event_type == event_type && pred(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }
}

impl RuleStore for InMemoryRuleStore {
    fn configs_for_device(
        &self,
        eui: &str,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError> {
        Ok(self.matching(event_type, |r| r.target() == Target::Device(eui)))
    }

    fn configs_for_tag(
        &self,
        tag: &Tag,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError> {
        Ok(self.matching(event_type, |r| {
            r.target()
                == Target::Tag {
                    name: &tag.name,
                    value: &tag.value,
                }
        }))
    }

    fn configs_for_group(
        &self,
        group_eui: &str,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError> {
        Ok(self.matching(event_type, |r| r.target() == Target::Group(group_eui)))
    }

    fn debounce_status(&self, config_id: i64) -> Result<DebounceStatus, GatewayError> {
        Ok(self
            .statuses
            .get(&config_id)
            .map(|s| DebounceStatus(*s))
            .unwrap_or(DebounceStatus::IDLE))
    }

    fn record_event(&self, event: SentinelEvent) -> Result<(), GatewayError> {
        if !self.rules.contains_key(&event.config_id) {
            return Err(GatewayError::UnknownRule(event.config_id));
        }
        self.statuses.insert(event.config_id, event.level);
        let mut history = self.events.entry(event.config_id).or_default();
        if history.len() == EVENT_HISTORY {
            history.pop_front();
        }
        history.push_back(event);
        Ok(())
    }

    fn device_channels(
        &self,
        config_id: i64,
        eui: Option<&str>,
    ) -> Result<HashMap<String, ChannelMap>, GatewayError> {
        let Some(assigned) = self.channels.get(&config_id) else {
            return Ok(HashMap::new());
        };
        Ok(match eui {
            Some(eui) => assigned
                .get(eui)
                .map(|m| HashMap::from([(eui.to_string(), m.clone())]))
                .unwrap_or_default(),
            None => assigned.value().clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeviceStore {
    devices: Arc<DashMap<String, Device>>,
    groups: Arc<DashMap<String, DeviceGroup>>,
    tags: Arc<DashMap<String, Vec<Tag>>>,
    readings: Arc<DashMap<String, HashMap<String, Measurement>>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_device(&self, device: Device) {
        self.devices.insert(device.eui.clone(), device);
    }

    pub fn insert_group(&self, group: DeviceGroup) {
        self.groups.insert(group.eui.clone(), group);
    }

    pub fn add_tag(&self, eui: impl Into<String>, tag: Tag) {
        self.tags.entry(eui.into()).or_default().push(tag);
    }

    pub fn record_reading(&self, eui: &str, measurement: &str, value: f64, delta: Option<f64>) {
        self.readings
            .entry(eui.to_string())
            .or_default()
            .insert(measurement.to_string(), Measurement { value, delta });
    }

    /// Every registered device, sorted by EUI.
    pub fn devices(&self) -> Vec<Device> {
        let mut all: Vec<Device> = self.devices.iter().map(|d| d.value().clone()).collect();
        all.sort_by(|a, b| a.eui.cmp(&b.eui));
        all
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn device(&self, eui: &str) -> Result<Option<Device>, GatewayError> {
        Ok(self.devices.get(eui).map(|d| d.clone()))
    }

    fn tags(&self, eui: &str) -> Result<Vec<Tag>, GatewayError> {
        Ok(self.tags.get(eui).map(|t| t.clone()).unwrap_or_default())
    }

    fn group(&self, eui: &str) -> Result<Option<DeviceGroup>, GatewayError> {
        Ok(self.groups.get(eui).map(|g| g.clone()))
    }

    fn last_values(
        &self,
        eui: &str,
        channels: &ChannelMap,
    ) -> Result<Option<MeasurementSnapshot>, GatewayError> {
        let Some(readings) = self.readings.get(eui) else {
            return Ok(None);
        };
        let mut snapshot = MeasurementSnapshot::new(eui);
        for name in channels.keys() {
            if let Some(m) = readings.get(name) {
                snapshot.insert(name.as_str(), m.value, m.delta);
            }
        }
        Ok(Some(snapshot))
    }
}
