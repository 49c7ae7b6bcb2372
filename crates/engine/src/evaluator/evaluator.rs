use sentinel_common::{Condition, MeasurementSnapshot, RuleConfig};

use super::debounce::DebounceStatus;
use super::threshold::breached;
use crate::verdict::ConditionResult;

struct SlotOutcome<'a> {
    measurement: &'a str,
    value: f64,
    violated: bool,
}

fn check_condition(condition: &Condition, value: f64, hysteresis: f64, status: DebounceStatus) -> bool {
    let first = breached(condition.condition1, value, condition.value1, hysteresis, status);
    match condition.second_clause() {
        Some((comparator, nominal)) => {
            let second = breached(comparator, value, nominal, hysteresis, status);
            condition.logic.combine(first, second)
        }
        None => first,
    }
}

fn evaluate_slot<'a>(
    condition: &'a Condition,
    snapshot: &MeasurementSnapshot,
    hysteresis: f64,
    status: DebounceStatus,
) -> Option<SlotOutcome<'a>> {
    let value = snapshot.value(&condition.measurement)?;
    Some(SlotOutcome {
        measurement: &condition.measurement,
        value,
        violated: check_condition(condition, value, hysteresis, status),
    })
}

/// Evaluates the rule's condition slots against one device snapshot.
///
/// Slots whose measurement is missing from the snapshot are skipped; when no
/// slot resolves the rule is not violated. The reported measurement/value is
/// the first violated slot, or the first resolved slot otherwise.
pub fn evaluate(
    config: &RuleConfig,
    snapshot: &MeasurementSnapshot,
    status: DebounceStatus,
) -> ConditionResult {
    let hysteresis = config.hysteresis();
    let mut combined: Option<bool> = None;
    let mut first_resolved: Option<(&str, f64)> = None;
    let mut first_violated: Option<(&str, f64)> = None;

    for condition in config.condition_slots() {
        let Some(slot) = evaluate_slot(condition, snapshot, hysteresis, status) else {
            tracing::debug!(
                config_id = config.id,
                eui = %snapshot.eui,
                measurement = %condition.measurement,
                "measurement not in snapshot, slot skipped"
            );
            continue;
        };

        first_resolved.get_or_insert((slot.measurement, slot.value));
        if slot.violated {
            first_violated.get_or_insert((slot.measurement, slot.value));
        }
        combined = Some(match combined {
            None => slot.violated,
            Some(prev) => config.condition_operator.combine(prev, slot.violated),
        });
    }

    let violated = combined.unwrap_or(false);
    let deciding = if violated { first_violated } else { first_resolved };

    ConditionResult {
        config_id: config.id,
        eui: snapshot.eui.clone(),
        measurement: deciding.map(|(m, _)| m.to_string()),
        value: deciding.map(|(_, v)| v),
        violated,
        ..Default::default()
    }
}

/// Evaluates every snapshot and returns the first violation. Without one the
/// verdict for `trigger_eui` is returned, falling back to a plain
/// not-violated verdict.
pub fn evaluate_any<I>(
    config: &RuleConfig,
    snapshots: I,
    trigger_eui: &str,
    status: DebounceStatus,
) -> ConditionResult
where
    I: IntoIterator<Item = MeasurementSnapshot>,
{
    let mut trigger_result = None;
    for snapshot in snapshots {
        let result = evaluate(config, &snapshot, status);
        if result.violated {
            return result;
        }
        if snapshot.eui == trigger_eui && trigger_result.is_none() {
            trigger_result = Some(result);
        }
    }
    trigger_result.unwrap_or_else(|| ConditionResult::not_violated(config.id, trigger_eui))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::{Comparator, EventType, Logic};

    fn rule(conditions: Vec<Condition>) -> RuleConfig {
        let mut cfg = RuleConfig::new(1, EventType::Data);
        cfg.conditions = conditions;
        cfg.alert_level = 2;
        cfg
    }

    fn snap(values: &[(&str, f64)]) -> MeasurementSnapshot {
        let mut s = MeasurementSnapshot::new("D1");
        for (name, v) in values {
            s.insert(*name, *v, None);
        }
        s
    }

    #[test]
    fn hysteresis_scenario() {
        let mut cfg = rule(vec![Condition::new("temp", Comparator::GreaterThan, 100.0)]);
        cfg.hysteresis = 5.0;

        assert!(evaluate(&cfg, &snap(&[("temp", 103.0)]), DebounceStatus::IDLE).violated);
        assert!(!evaluate(&cfg, &snap(&[("temp", 97.0)]), DebounceStatus::IDLE).violated);

        let triggered = DebounceStatus(2);
        assert!(evaluate(&cfg, &snap(&[("temp", 99.0)]), triggered).violated);
        assert!(!evaluate(&cfg, &snap(&[("temp", 94.0)]), triggered).violated);
    }

    #[test]
    fn missing_measurement_not_violated() {
        let cfg = rule(vec![Condition::new("temp", Comparator::GreaterThan, 0.0)]);
        let r = evaluate(&cfg, &snap(&[("humidity", 50.0)]), DebounceStatus::IDLE);
        assert!(!r.violated);
        assert!(!r.error);
        assert!(r.measurement.is_none());
    }

    #[test]
    fn unresolved_slot_does_not_abort() {
        let mut cfg = rule(vec![
            Condition::new("pressure", Comparator::GreaterThan, 0.0),
            Condition::new("temp", Comparator::GreaterThan, 30.0),
        ]);
        cfg.condition_operator = Logic::And;
        let r = evaluate(&cfg, &snap(&[("temp", 35.0)]), DebounceStatus::IDLE);
        assert!(r.violated);
        assert_eq!(r.measurement.as_deref(), Some("temp"));
        assert_eq!(r.value, Some(35.0));
    }

    #[test]
    fn clause_logic_and_or() {
        let band = Condition::new("temp", Comparator::GreaterThan, 10.0).with_second(
            Logic::And,
            Comparator::LessThan,
            20.0,
        );
        let cfg = rule(vec![band]);
        assert!(evaluate(&cfg, &snap(&[("temp", 15.0)]), DebounceStatus::IDLE).violated);
        assert!(!evaluate(&cfg, &snap(&[("temp", 25.0)]), DebounceStatus::IDLE).violated);

        let outside = Condition::new("temp", Comparator::LessThan, 10.0).with_second(
            Logic::Or,
            Comparator::GreaterThan,
            20.0,
        );
        let cfg = rule(vec![outside]);
        assert!(evaluate(&cfg, &snap(&[("temp", 25.0)]), DebounceStatus::IDLE).violated);
        assert!(!evaluate(&cfg, &snap(&[("temp", 15.0)]), DebounceStatus::IDLE).violated);
    }

    #[test]
    fn second_clause_ignored_without_logic() {
        let mut c = Condition::new("temp", Comparator::GreaterThan, 10.0);
        c.condition2 = Some(Comparator::LessThan);
        c.value2 = Some(0.0);
        let cfg = rule(vec![c]);
        assert!(evaluate(&cfg, &snap(&[("temp", 15.0)]), DebounceStatus::IDLE).violated);
    }

    #[test]
    fn slot_operator_and_or() {
        let slots = vec![
            Condition::new("temp", Comparator::GreaterThan, 30.0),
            Condition::new("humidity", Comparator::GreaterThan, 80.0),
        ];
        let mut cfg = rule(slots);
        let s = snap(&[("temp", 35.0), ("humidity", 50.0)]);

        cfg.condition_operator = Logic::And;
        assert!(!evaluate(&cfg, &s, DebounceStatus::IDLE).violated);

        cfg.condition_operator = Logic::Or;
        let r = evaluate(&cfg, &s, DebounceStatus::IDLE);
        assert!(r.violated);
        assert_eq!(r.measurement.as_deref(), Some("temp"));
    }

    #[test]
    fn deciding_slot_is_first_violated() {
        let mut cfg = rule(vec![
            Condition::new("temp", Comparator::GreaterThan, 30.0),
            Condition::new("humidity", Comparator::GreaterThan, 80.0),
        ]);
        cfg.condition_operator = Logic::Or;
        let r = evaluate(&cfg, &snap(&[("temp", 20.0), ("humidity", 90.0)]), DebounceStatus::IDLE);
        assert!(r.violated);
        assert_eq!(r.measurement.as_deref(), Some("humidity"));
        assert_eq!(r.value, Some(90.0));
    }

    #[test]
    fn not_equal_is_literal() {
        let cfg = rule(vec![Condition::new("state", Comparator::NotEqual, 1.0)]);
        assert!(!evaluate(&cfg, &snap(&[("state", 1.0)]), DebounceStatus::IDLE).violated);
        assert!(evaluate(&cfg, &snap(&[("state", 1.0000001)]), DebounceStatus::IDLE).violated);
    }

    #[test]
    fn evaluate_any_prefers_violation() {
        let cfg = rule(vec![Condition::new("temp", Comparator::GreaterThan, 30.0)]);
        let a = MeasurementSnapshot::new("D1").with("temp", 20.0, None);
        let b = MeasurementSnapshot::new("D2").with("temp", 40.0, None);
        let r = evaluate_any(&cfg, vec![a, b], "D1", DebounceStatus::IDLE);
        assert!(r.violated);
        assert_eq!(r.eui, "D2");
    }

    #[test]
    fn evaluate_any_falls_back_to_trigger() {
        let cfg = rule(vec![Condition::new("temp", Comparator::GreaterThan, 30.0)]);
        let a = MeasurementSnapshot::new("D2").with("temp", 10.0, None);
        let b = MeasurementSnapshot::new("D1").with("temp", 20.0, None);
        let r = evaluate_any(&cfg, vec![a, b], "D1", DebounceStatus::IDLE);
        assert!(!r.violated);
        assert_eq!(r.eui, "D1");
        assert_eq!(r.value, Some(20.0));

        let r = evaluate_any(&cfg, Vec::new(), "D9", DebounceStatus::IDLE);
        assert_eq!(r.eui, "D9");
        assert!(r.value.is_none());
    }
}
