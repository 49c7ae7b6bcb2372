use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use sentinel_common::{ChannelMap, Device, DeviceGroup, Measurement, RuleConfig, Tag, Target};

use super::{InMemoryDeviceStore, InMemoryRuleStore};
use crate::config::LoadError;

/// Fixture data for the in-memory gateways.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub groups: Vec<DeviceGroup>,
    /// Device EUI -> tags.
    #[serde(default)]
    pub tags: HashMap<String, Vec<Tag>>,
    /// Device EUI -> measurement name -> latest reading.
    #[serde(default)]
    pub readings: HashMap<String, HashMap<String, Measurement>>,
    #[serde(default)]
    pub statuses: HashMap<i64, i32>,
}

pub fn load_from_file(path: &Path) -> Result<Seed, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<Seed, LoadError> {
    let seed: Seed = serde_yaml::from_str(yaml)?;
    for rule in &seed.rules {
        if rule.target() == Target::Unset {
            return Err(LoadError::Validation(format!(
                "rule {} has no device, group or tag target",
                rule.id
            )));
        }
    }
    Ok(seed)
}

/// Column mapping in channel order: the n-th declared measurement is `d<n>`.
pub fn channel_map(device: &Device) -> ChannelMap {
    device
        .channel_list()
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), format!("d{}", i + 1)))
        .collect()
}

impl Seed {
    pub fn apply(&self, rules: &InMemoryRuleStore, devices: &InMemoryDeviceStore) {
        for device in &self.devices {
            devices.insert_device(device.clone());
        }
        for group in &self.groups {
            devices.insert_group(group.clone());
        }
        for (eui, tags) in &self.tags {
            for tag in tags {
                devices.add_tag(eui.as_str(), tag.clone());
            }
        }
        for (eui, values) in &self.readings {
            for (name, m) in values {
                devices.record_reading(eui, name, m.value, m.delta);
            }
        }

        for rule in &self.rules {
            rules.insert(rule.clone());
            for device in self.targeted(rule) {
                rules.assign(rule.id, device.eui.as_str(), channel_map(device));
            }
        }
        for (id, status) in &self.statuses {
            rules.set_status(*id, *status);
        }

        tracing::info!(
            rules = self.rules.len(),
            devices = self.devices.len(),
            groups = self.groups.len(),
            "seed applied"
        );
    }

    fn targeted<'a>(&'a self, rule: &'a RuleConfig) -> impl Iterator<Item = &'a Device> + 'a {
        self.devices.iter().filter(move |d| match rule.target() {
            Target::Device(eui) => d.eui == eui,
            Target::Group(group) => d.group_list().contains(&group),
            Target::Tag { name, value } => self
                .tags
                .get(&d.eui)
                .is_some_and(|tags| tags.iter().any(|t| t.name == name && t.value == value)),
            Target::Unset => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{DeviceStore, RuleStore};
    use sentinel_common::EventType;

    const SEED: &str = r#"
rules:
  - id: 1
    device_eui: D1
    alert_level: 2
    conditions:
      - { measurement: temperature, condition1: ">", value1: 30.0 }
  - id: 2
    group_eui: G1
    event_type: COMMAND
  - id: 3
    tag_name: site
    tag_value: north
devices:
  - eui: D1
    channels: "temperature, humidity"
    groups: G1
  - eui: D2
    channels: temperature
groups:
  - eui: G1
    name: Greenhouse
tags:
  D2:
    - { name: site, value: north }
readings:
  D1:
    temperature: { value: 31.5 }
    humidity: { value: 40.0, delta: -2.0 }
statuses:
  1: 2
"#;

    #[test]
    fn seed_populates_stores() {
        let seed = load_from_str(SEED).unwrap();
        let rules = InMemoryRuleStore::new();
        let devices = InMemoryDeviceStore::new();
        seed.apply(&rules, &devices);

        assert_eq!(rules.count(), 3);
        assert_eq!(devices.device_count(), 2);
        assert_eq!(rules.debounce_status(1).unwrap().value(), 2);
        assert_eq!(
            rules.configs_for_group("G1", EventType::Command).unwrap()[0].id,
            2
        );
        assert_eq!(devices.group("G1").unwrap().unwrap().name, "Greenhouse");
    }

    #[test]
    fn channels_assigned_per_target() {
        let seed = load_from_str(SEED).unwrap();
        let rules = InMemoryRuleStore::new();
        let devices = InMemoryDeviceStore::new();
        seed.apply(&rules, &devices);

        let d1 = rules.device_channels(1, None).unwrap();
        assert_eq!(d1.len(), 1);
        assert_eq!(d1["D1"]["humidity"], "d2");

        assert!(rules.device_channels(2, Some("D1")).unwrap().contains_key("D1"));
        assert!(rules.device_channels(3, Some("D2")).unwrap().contains_key("D2"));

        let snap = devices.last_values("D1", &d1["D1"]).unwrap().unwrap();
        assert_eq!(snap.delta("humidity"), Some(-2.0));
    }

    #[test]
    fn untargeted_rule_rejected() {
        let err = load_from_str("rules:\n  - id: 5\n").unwrap_err();
        assert!(err.to_string().contains("rule 5"));
    }

    #[test]
    fn load_from_file_works() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.yml");
        std::fs::write(&path, SEED).unwrap();
        assert_eq!(load_from_file(&path).unwrap().rules.len(), 3);
    }
}
