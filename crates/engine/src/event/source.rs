use std::sync::Arc;

use sentinel_common::{EventType, MeasurementSnapshot, RuleConfig};

use super::payload::Event;
use crate::evaluator::{evaluate, evaluate_any, DebounceStatus};
use crate::gateway::{DeviceStore, RuleStore};
use crate::script::{ScriptContext, ScriptEvaluator};
use crate::verdict::ConditionResult;

/// Everything a source needs to turn a rule into a verdict.
#[derive(Clone)]
pub struct Gateways {
    pub rules: Arc<dyn RuleStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub scripts: Arc<dyn ScriptEvaluator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Verdict(ConditionResult),
    /// The rule could not be evaluated for this event.
    Skip(String),
}

/// Event-type specific evaluation of one rule. Runs on the blocking pool.
pub trait EventSource: Send + Sync {
    fn event_type(&self) -> EventType;
    fn eui(&self) -> &str;
    fn evaluate(&self, config: &RuleConfig, gw: &Gateways) -> Outcome;
}

impl Event {
    pub fn into_source(self) -> Arc<dyn EventSource> {
        match self {
            Event::Data { eui, snapshot } => Arc::new(DataSource { eui, snapshot }),
            Event::Command { eui, payload } => Arc::new(PayloadSource {
                event_type: EventType::Command,
                eui,
                payload,
            }),
            Event::Device { eui, payload } => Arc::new(PayloadSource {
                event_type: EventType::Device,
                eui,
                payload,
            }),
        }
    }
}

pub struct DataSource {
    eui: String,
    snapshot: Option<MeasurementSnapshot>,
}

impl DataSource {
    /// The triggering device's values: from the event when it carried them,
    /// otherwise from the store through the rule's channel map.
    fn own_snapshot(&self, config: &RuleConfig, gw: &Gateways) -> Result<Option<MeasurementSnapshot>, String> {
        if let Some(s) = &self.snapshot {
            return Ok(Some(s.clone()));
        }
        let assigned = gw
            .rules
            .device_channels(config.id, Some(&self.eui))
            .map_err(|e| format!("channel lookup: {e}"))?;
        let Some(channels) = assigned.get(&self.eui) else {
            return Err(format!("no channel mapping for {}", self.eui));
        };
        gw.devices
            .last_values(&self.eui, channels)
            .map_err(|e| format!("value lookup: {e}"))
    }

    fn any_device(&self, config: &RuleConfig, gw: &Gateways, status: DebounceStatus) -> Outcome {
        let assigned = match gw.rules.device_channels(config.id, None) {
            Ok(a) => a,
            Err(e) => return Outcome::Skip(format!("channel lookup: {e}")),
        };
        let mut euis: Vec<&String> = assigned.keys().collect();
        euis.sort();

        let mut snapshots = Vec::with_capacity(euis.len() + 1);
        if let Some(own) = &self.snapshot {
            snapshots.push(own.clone());
        }
        for eui in euis {
            if self.snapshot.is_some() && *eui == self.eui {
                continue;
            }
            match gw.devices.last_values(eui, &assigned[eui]) {
                Ok(Some(s)) => snapshots.push(s),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    config_id = config.id,
                    eui = %eui,
                    error = %e,
                    "value lookup failed, device skipped"
                ),
            }
        }
        if snapshots.is_empty() && assigned.is_empty() {
            return Outcome::Skip(format!("rule {} has no assigned devices", config.id));
        }
        Outcome::Verdict(evaluate_any(config, snapshots, &self.eui, status))
    }
}

impl EventSource for DataSource {
    fn event_type(&self) -> EventType {
        EventType::Data
    }

    fn eui(&self) -> &str {
        &self.eui
    }

    fn evaluate(&self, config: &RuleConfig, gw: &Gateways) -> Outcome {
        if let Some(script) = config.script_source() {
            let snapshot = match self.own_snapshot(config, gw) {
                Ok(s) => s,
                Err(reason) => return Outcome::Skip(reason),
            };
            let device = gw.devices.device(&self.eui).ok().flatten();
            let ctx = ScriptContext::new(EventType::Data, &self.eui, config)
                .with_device(device.as_ref())
                .with_snapshot(snapshot.as_ref());
            return Outcome::Verdict(gw.scripts.evaluate(script, &ctx));
        }
        if config.use_script {
            return Outcome::Skip(format!("rule {} is scripted but its script is empty", config.id));
        }

        let status = match gw.rules.debounce_status(config.id) {
            Ok(s) => s,
            Err(e) => return Outcome::Skip(format!("status lookup: {e}")),
        };
        if config.check_others {
            return self.any_device(config, gw, status);
        }
        match self.own_snapshot(config, gw) {
            Ok(snapshot) => {
                let snapshot = snapshot.unwrap_or_else(|| MeasurementSnapshot::new(&self.eui));
                Outcome::Verdict(evaluate(config, &snapshot, status))
            }
            Err(reason) => Outcome::Skip(reason),
        }
    }
}

/// COMMAND and DEVICE events: only scripted rules apply, and the script sees
/// the raw payload.
pub struct PayloadSource {
    event_type: EventType,
    eui: String,
    payload: String,
}

impl EventSource for PayloadSource {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn eui(&self) -> &str {
        &self.eui
    }

    fn evaluate(&self, config: &RuleConfig, gw: &Gateways) -> Outcome {
        let Some(script) = config.script_source() else {
            return Outcome::Skip(format!("{} rule {} has no script", self.event_type, config.id));
        };
        let device = match gw.devices.device(&self.eui) {
            Ok(d) => d,
            Err(e) => return Outcome::Skip(format!("device lookup: {e}")),
        };
        let ctx = ScriptContext::new(self.event_type, &self.eui, config)
            .with_device(device.as_ref())
            .with_payload(&self.payload);
        Outcome::Verdict(gw.scripts.evaluate(script, &ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryDeviceStore, InMemoryRuleStore};
    use sentinel_common::{ChannelMap, Comparator, Condition, Device};

    /// Echoes the context back so tests can see what the script received.
    struct Echo;

    impl ScriptEvaluator for Echo {
        fn evaluate(&self, _script: &str, ctx: &ScriptContext<'_>) -> ConditionResult {
            let mut r = ConditionResult::not_violated(ctx.config.id, ctx.eui);
            r.violated = true;
            r.measurement = ctx.payload.map(str::to_string);
            r.value = ctx.snapshot.and_then(|s| s.value("temp"));
            r
        }
    }

    fn setup() -> (InMemoryRuleStore, InMemoryDeviceStore, Gateways) {
        let rules = InMemoryRuleStore::new();
        let devices = InMemoryDeviceStore::new();
        devices.insert_device(Device::new("D1"));
        devices.insert_device(Device::new("D2"));
        let gw = Gateways {
            rules: Arc::new(rules.clone()),
            devices: Arc::new(devices.clone()),
            scripts: Arc::new(Echo),
        };
        (rules, devices, gw)
    }

    fn temp_rule(id: i64) -> RuleConfig {
        let mut cfg = RuleConfig::new(id, EventType::Data);
        cfg.conditions = vec![Condition::new("temp", Comparator::GreaterThan, 30.0)];
        cfg.alert_level = 1;
        cfg
    }

    fn temp_channels() -> ChannelMap {
        ChannelMap::from([("temp".to_string(), "d1".to_string())])
    }

    #[test]
    fn data_uses_carried_snapshot() {
        let (_, _, gw) = setup();
        let snap = MeasurementSnapshot::new("D1").with("temp", 40.0, None);
        let source = Event::Data { eui: "D1".into(), snapshot: Some(snap) }.into_source();
        match source.evaluate(&temp_rule(1), &gw) {
            Outcome::Verdict(r) => assert!(r.violated),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn data_reads_store_through_channels() {
        let (rules, devices, gw) = setup();
        rules.assign(1, "D1", temp_channels());
        devices.record_reading("D1", "temp", 35.0, None);
        let source = Event::Data { eui: "D1".into(), snapshot: None }.into_source();
        match source.evaluate(&temp_rule(1), &gw) {
            Outcome::Verdict(r) => assert_eq!(r.value, Some(35.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn data_without_channel_map_skipped() {
        let (_, _, gw) = setup();
        let source = Event::Data { eui: "D1".into(), snapshot: None }.into_source();
        assert!(matches!(source.evaluate(&temp_rule(1), &gw), Outcome::Skip(_)));
    }

    #[test]
    fn status_drives_hysteresis() {
        let (rules, _, gw) = setup();
        let mut cfg = temp_rule(1);
        cfg.hysteresis = 5.0;
        rules.insert(cfg.clone());
        rules.set_status(1, 1);
        let snap = MeasurementSnapshot::new("D1").with("temp", 27.0, None);
        let source = Event::Data { eui: "D1".into(), snapshot: Some(snap) }.into_source();
        match source.evaluate(&cfg, &gw) {
            Outcome::Verdict(r) => assert!(r.violated),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn check_others_finds_violating_peer() {
        let (rules, devices, gw) = setup();
        let mut cfg = temp_rule(1);
        cfg.check_others = true;
        rules.assign(1, "D1", temp_channels());
        rules.assign(1, "D2", temp_channels());
        devices.record_reading("D1", "temp", 20.0, None);
        devices.record_reading("D2", "temp", 45.0, None);

        let source = Event::Data { eui: "D1".into(), snapshot: None }.into_source();
        match source.evaluate(&cfg, &gw) {
            Outcome::Verdict(r) => {
                assert!(r.violated);
                assert_eq!(r.eui, "D2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scripted_data_rule_gets_snapshot() {
        let (_, _, gw) = setup();
        let mut cfg = temp_rule(1);
        cfg.use_script = true;
        cfg.script = Some("(module)".into());
        let snap = MeasurementSnapshot::new("D1").with("temp", 12.0, None);
        let source = Event::Data { eui: "D1".into(), snapshot: Some(snap) }.into_source();
        match source.evaluate(&cfg, &gw) {
            Outcome::Verdict(r) => assert_eq!(r.value, Some(12.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scripted_data_rule_with_empty_script_is_skipped() {
        let (_, _, gw) = setup();
        let mut cfg = temp_rule(1);
        cfg.use_script = true;
        cfg.script = Some(String::new());
        let snap = MeasurementSnapshot::new("D1").with("temp", 99.0, None);
        let source = Event::Data { eui: "D1".into(), snapshot: Some(snap) }.into_source();
        match source.evaluate(&cfg, &gw) {
            Outcome::Skip(reason) => assert!(reason.contains("script is empty")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn command_requires_script() {
        let (_, _, gw) = setup();
        let source = Event::Command { eui: "D1".into(), payload: "{}".into() }.into_source();
        let cfg = RuleConfig::new(2, EventType::Command);
        assert!(matches!(source.evaluate(&cfg, &gw), Outcome::Skip(_)));
    }

    #[test]
    fn command_script_sees_payload() {
        let (_, _, gw) = setup();
        let source =
            Event::Command { eui: "D1".into(), payload: "{\"on\":1}".into() }.into_source();
        assert_eq!(source.event_type(), EventType::Command);
        let mut cfg = RuleConfig::new(2, EventType::Command);
        cfg.use_script = true;
        cfg.script = Some("(module)".into());
        match source.evaluate(&cfg, &gw) {
            Outcome::Verdict(r) => assert_eq!(r.measurement.as_deref(), Some("{\"on\":1}")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
