use serde::Deserialize;

use crate::event::EventType;

pub const DATA_SUBJECT: &str = "sentinel.data";
pub const COMMAND_SUBJECT: &str = "sentinel.command";
pub const DEVICE_SUBJECT: &str = "sentinel.device";
pub const ALERT_SUBJECT: &str = "sentinel.alerts";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    pub data: String,
    pub command: String,
    pub device: String,
    pub alerts: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            data: DATA_SUBJECT.into(),
            command: COMMAND_SUBJECT.into(),
            device: DEVICE_SUBJECT.into(),
            alerts: ALERT_SUBJECT.into(),
        }
    }
}

impl SubjectConfig {
    pub fn inbound(&self) -> [(EventType, &str); 3] {
        [
            (EventType::Data, self.data.as_str()),
            (EventType::Command, self.command.as_str()),
            (EventType::Device, self.device.as_str()),
        ]
    }

    pub fn event_type_for(&self, subject: &str) -> Option<EventType> {
        self.inbound()
            .into_iter()
            .find(|(_, s)| *s == subject)
            .map(|(t, _)| t)
    }
}
