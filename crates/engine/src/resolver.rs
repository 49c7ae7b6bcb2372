use std::collections::BTreeMap;
use std::sync::Arc;

use sentinel_common::{EventType, RuleConfig};

use crate::gateway::{DeviceStore, GatewayError, RuleStore};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("device {0} not found")]
    UnknownDevice(String),
    #[error("device lookup failed for {eui}: {source}")]
    DeviceLookup {
        eui: String,
        #[source]
        source: GatewayError,
    },
    #[error("rule lookup failed for {eui}: {source}")]
    RuleLookup {
        eui: String,
        #[source]
        source: GatewayError,
    },
}

/// Maps one inbound event to the active rules that apply to it.
#[derive(Clone)]
pub struct ConfigResolver {
    rules: Arc<dyn RuleStore>,
    devices: Arc<dyn DeviceStore>,
}

impl ConfigResolver {
    pub fn new(rules: Arc<dyn RuleStore>, devices: Arc<dyn DeviceStore>) -> Self {
        Self { rules, devices }
    }

    /// Rules matched by device, by any of its tags and by any of its groups,
    /// deduplicated, active only, ascending by id.
    ///
    /// Device and by-device failures abort resolution. Tag and group
    /// failures only drop that subset.
    pub fn resolve(&self, event_type: EventType, eui: &str) -> Result<Vec<RuleConfig>, ResolveError> {
        let device = self
            .devices
            .device(eui)
            .map_err(|source| ResolveError::DeviceLookup {
                eui: eui.to_string(),
                source,
            })?
            .ok_or_else(|| ResolveError::UnknownDevice(eui.to_string()))?;
        let tags = self
            .devices
            .tags(eui)
            .map_err(|source| ResolveError::DeviceLookup {
                eui: eui.to_string(),
                source,
            })?;

        let mut matched: BTreeMap<i64, RuleConfig> = BTreeMap::new();
        let mut collect = |configs: Vec<RuleConfig>| {
            for config in configs {
                matched.entry(config.id).or_insert(config);
            }
        };

        collect(
            self.rules
                .configs_for_device(eui, event_type)
                .map_err(|source| ResolveError::RuleLookup {
                    eui: eui.to_string(),
                    source,
                })?,
        );

        for tag in &tags {
            match self.rules.configs_for_tag(tag, event_type) {
                Ok(configs) => collect(configs),
                Err(e) => tracing::warn!(
                    eui,
                    tag = %tag.name,
                    error = %e,
                    "rule lookup by tag failed, skipping"
                ),
            }
        }

        for group in device.group_list() {
            match self.rules.configs_for_group(group, event_type) {
                Ok(configs) => collect(configs),
                Err(e) => tracing::warn!(
                    eui,
                    group,
                    error = %e,
                    "rule lookup by group failed, skipping"
                ),
            }
        }

        Ok(matched.into_values().filter(|c| c.active).collect())
    }
}
