use serde::Serialize;

/// Outcome of evaluating one rule against one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConditionResult {
    pub config_id: i64,
    pub eui: String,
    pub measurement: Option<String>,
    pub value: Option<f64>,
    pub violated: bool,
    pub error: bool,
    pub error_message: String,
    pub command_target: Option<String>,
    pub command: Option<String>,
}

impl ConditionResult {
    pub fn not_violated(config_id: i64, eui: impl Into<String>) -> Self {
        Self {
            config_id,
            eui: eui.into(),
            ..Default::default()
        }
    }

    pub fn failed(config_id: i64, eui: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            config_id,
            eui: eui.into(),
            error: true,
            error_message: message.into(),
            ..Default::default()
        }
    }

    /// Both halves must be present for the verdict to count as a command.
    pub fn actuator_command(&self) -> Option<(&str, &str)> {
        match (self.command_target.as_deref(), self.command.as_deref()) {
            (Some(target), Some(command)) => Some((target, command)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_needs_target_and_payload() {
        let mut r = ConditionResult::not_violated(1, "D1");
        assert!(r.actuator_command().is_none());
        r.command = Some("{}".into());
        assert!(r.actuator_command().is_none());
        r.command_target = Some("V1".into());
        assert_eq!(r.actuator_command(), Some(("V1", "{}")));
    }

    #[test]
    fn failed_sets_error() {
        let r = ConditionResult::failed(3, "D1", "boom");
        assert!(r.error);
        assert!(!r.violated);
        assert_eq!(r.error_message, "boom");
    }
}
