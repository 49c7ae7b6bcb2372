use sentinel_common::signal::alert_type;
use sentinel_common::{ActuatorCommand, AlertMessage, Device, DeviceGroup, RuleConfig, Signal};

use super::template::{recipients, TemplateVars};
use crate::verdict::ConditionResult;

/// Side effects produced by the tracker, delivered by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Notify(Notification),
    Command(ActuatorCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Fired,
    Reset,
}

/// One rendered alert or reset message and everyone who should get it.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub config_id: i64,
    pub organization_id: i64,
    pub device_eui: String,
    /// Signed: `+alert_level` when fired, `-alert_level` on reset.
    pub level: i32,
    pub alert_type: &'static str,
    pub subject: String,
    pub message: String,
    pub recipients: Vec<String>,
    pub created_at_ms: i64,
}

impl Notification {
    pub fn build(
        kind: NotificationKind,
        config: &RuleConfig,
        device: &Device,
        group: Option<&DeviceGroup>,
        result: &ConditionResult,
        created_at_ms: i64,
    ) -> Self {
        let (template, level) = match kind {
            NotificationKind::Fired => (&config.alert_message, config.alert_level),
            NotificationKind::Reset => (&config.condition_ok_message, -config.alert_level),
        };
        let vars = TemplateVars {
            config,
            device,
            group,
            result,
        };
        let (subject, message) = vars.render_message(template);
        Self {
            kind,
            config_id: config.id,
            organization_id: config.organization_id,
            device_eui: device.eui.clone(),
            level,
            alert_type: alert_type(config.alert_level),
            subject,
            message,
            recipients: recipients(config, device),
            created_at_ms,
        }
    }

    pub fn signal_for(&self, user_id: &str) -> Signal {
        Signal {
            config_id: self.config_id,
            organization_id: self.organization_id,
            user_id: user_id.to_string(),
            device_eui: self.device_eui.clone(),
            level: self.level,
            subject: self.subject.clone(),
            message: self.message.clone(),
            created_at_ms: self.created_at_ms,
        }
    }

    pub fn alert_for(&self, user_id: &str) -> AlertMessage {
        AlertMessage {
            user_id: user_id.to_string(),
            device_eui: self.device_eui.clone(),
            alert_type: self.alert_type.to_string(),
            message: self.message.clone(),
            subject: self.subject.clone(),
            created_at_ms: self.created_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::EventType;

    fn config() -> RuleConfig {
        let mut cfg = RuleConfig::new(9, EventType::Data);
        cfg.device_eui = Some("D1".into());
        cfg.alert_level = 2;
        cfg.alert_message = "Alarm{info}{measurement} = {value}".into();
        cfg.condition_ok_message = "OK{info}{measurement} back to {value}".into();
        cfg.team = "alice".into();
        cfg
    }

    fn verdict(value: f64) -> ConditionResult {
        let mut r = ConditionResult::not_violated(9, "D1");
        r.measurement = Some("temp".into());
        r.value = Some(value);
        r
    }

    #[test]
    fn fired_uses_alert_message() {
        let n = Notification::build(
            NotificationKind::Fired,
            &config(),
            &Device::new("D1"),
            None,
            &verdict(31.5),
            7,
        );
        assert_eq!(n.level, 2);
        assert_eq!(n.alert_type, "WARNING");
        assert_eq!(n.subject, "Alarm");
        assert_eq!(n.message, "temp = 31.5");
        assert_eq!(n.recipients, vec!["alice"]);
    }

    #[test]
    fn reset_is_negative_level() {
        let n = Notification::build(
            NotificationKind::Reset,
            &config(),
            &Device::new("D1"),
            None,
            &verdict(20.0),
            7,
        );
        assert_eq!(n.level, -2);
        assert_eq!(n.alert_type, "WARNING");
        assert_eq!(n.message, "temp back to 20.0");

        let s = n.signal_for("alice");
        assert_eq!(s.level, -2);
        assert_eq!(s.config_id, 9);
        let a = n.alert_for("alice");
        assert_eq!(a.to_line(), "alice\tD1\tWARNING\ttemp back to 20.0\tOK");
    }
}
