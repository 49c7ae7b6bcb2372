use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    #[default]
    Data,
    Command,
    Device,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Command => "COMMAND",
            Self::Device => "DEVICE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DATA" | "0" => Ok(Self::Data),
            "COMMAND" | "1" => Ok(Self::Command),
            "DEVICE" | "2" => Ok(Self::Device),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// `<millis>-<uuid>`: unique per delivery, sortable by arrival.
pub fn generate_message_id() -> String {
    format!("{}-{}", now_ms(), uuid::Uuid::new_v4().simple())
}
