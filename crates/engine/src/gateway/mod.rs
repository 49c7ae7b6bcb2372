mod in_memory;
pub mod seed;

use std::collections::HashMap;

use sentinel_common::{
    ChannelMap, Device, DeviceGroup, EventType, MeasurementSnapshot, RuleConfig, SentinelEvent,
    Tag,
};

use crate::evaluator::DebounceStatus;

pub use in_memory::{InMemoryDeviceStore, InMemoryRuleStore};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("rule {0} not found")]
    UnknownRule(i64),
}

/// Rule configurations and their persisted trigger bookkeeping.
///
/// Queries return every configuration for the key, active or not; callers
/// filter.
pub trait RuleStore: Send + Sync {
    fn configs_for_device(
        &self,
        eui: &str,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError>;

    fn configs_for_tag(
        &self,
        tag: &Tag,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError>;

    fn configs_for_group(
        &self,
        group_eui: &str,
        event_type: EventType,
    ) -> Result<Vec<RuleConfig>, GatewayError>;

    /// Rules that were never triggered report [`DebounceStatus::IDLE`].
    fn debounce_status(&self, config_id: i64) -> Result<DebounceStatus, GatewayError>;

    /// Persists the event; its `level` becomes the rule's debounce status.
    fn record_event(&self, event: SentinelEvent) -> Result<(), GatewayError>;

    /// Device EUI -> channel map for every device the rule is assigned to,
    /// or only `eui` when given.
    fn device_channels(
        &self,
        config_id: i64,
        eui: Option<&str>,
    ) -> Result<HashMap<String, ChannelMap>, GatewayError>;
}

pub trait DeviceStore: Send + Sync {
    fn device(&self, eui: &str) -> Result<Option<Device>, GatewayError>;

    fn tags(&self, eui: &str) -> Result<Vec<Tag>, GatewayError>;

    fn group(&self, eui: &str) -> Result<Option<DeviceGroup>, GatewayError>;

    /// Latest values for the measurements named in `channels`; `None` when
    /// the device never reported.
    fn last_values(
        &self,
        eui: &str,
        channels: &ChannelMap,
    ) -> Result<Option<MeasurementSnapshot>, GatewayError>;
}
