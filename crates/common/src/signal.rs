use serde::{Deserialize, Serialize};

pub const ACTUATOR_CMD: &str = "ACTUATOR_CMD";

pub fn alert_type(level: i32) -> &'static str {
    match level {
        0 => "GENERAL",
        1 => "INFO",
        2 => "WARNING",
        _ => "ALERT",
    }
}

/// A rule trigger or reset. Recording one persists the rule's debounce
/// status as `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelEvent {
    pub config_id: i64,
    pub device_eui: String,
    pub level: i32,
    pub message_en: String,
    pub message_pl: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub config_id: i64,
    pub organization_id: i64,
    pub user_id: String,
    pub device_eui: String,
    pub level: i32,
    pub subject: String,
    pub message: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub user_id: String,
    pub device_eui: String,
    pub alert_type: String,
    pub message: String,
    pub subject: String,
    pub created_at_ms: i64,
}

impl AlertMessage {
    /// Wire form: `userId \t deviceEui \t alertType \t alertMessage \t alertSubject`.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.user_id, self.device_eui, self.alert_type, self.message, self.subject
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub target_eui: String,
    pub kind: String,
    pub payload: String,
    pub created_at_ms: i64,
}

impl ActuatorCommand {
    pub fn new(target_eui: impl Into<String>, payload: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            target_eui: target_eui.into(),
            kind: ACTUATOR_CMD.into(),
            payload: payload.into(),
            created_at_ms,
        }
    }
}
