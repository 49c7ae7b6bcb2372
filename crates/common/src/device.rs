use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub eui: String,
    #[serde(default)]
    pub name: String,
    /// Owner.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub administrators: String,
    /// Comma separated group EUIs.
    #[serde(default)]
    pub groups: String,
    /// Comma separated measurement names, in channel order.
    #[serde(default)]
    pub channels: String,
}

impl Device {
    pub fn new(eui: impl Into<String>) -> Self {
        Self {
            eui: eui.into(),
            ..Default::default()
        }
    }

    pub fn group_list(&self) -> Vec<&str> {
        split_list(&self.groups)
    }

    pub fn channel_list(&self) -> Vec<&str> {
        split_list(&self.channels)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub eui: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Splits a comma separated list, trimming entries and dropping empties.
pub fn split_list(s: &str) -> Vec<&str> {
    s.split(',').map(str::trim).filter(|v| !v.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_list_trims_and_skips_empty() {
        let mut d = Device::new("D1");
        d.groups = " g1, ,g2,".into();
        assert_eq!(d.group_list(), vec!["g1", "g2"]);
    }

    #[test]
    fn empty_lists() {
        let d = Device::new("D1");
        assert!(d.group_list().is_empty());
        assert!(d.channel_list().is_empty());
    }
}
