use sentinel_common::Comparator;

use super::debounce::DebounceStatus;

/// Once a rule is triggered its threshold moves by `hysteresis` in the
/// trigger's favour, so the value has to recede past the band to reset.
/// Idle rules compare against the nominal value. `=` and `!=` never move.
pub fn effective_threshold(
    comparator: Comparator,
    nominal: f64,
    hysteresis: f64,
    status: DebounceStatus,
) -> f64 {
    if !status.is_triggered() {
        return nominal;
    }
    match comparator {
        Comparator::GreaterThan => nominal - hysteresis,
        Comparator::LessThan => nominal + hysteresis,
        Comparator::Equal | Comparator::NotEqual => nominal,
    }
}

pub fn breached(
    comparator: Comparator,
    value: f64,
    nominal: f64,
    hysteresis: f64,
    status: DebounceStatus,
) -> bool {
    comparator.evaluate(value, effective_threshold(comparator, nominal, hysteresis, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_uses_nominal() {
        let t = effective_threshold(Comparator::GreaterThan, 100.0, 5.0, DebounceStatus::IDLE);
        assert_eq!(t, 100.0);
        let t = effective_threshold(Comparator::LessThan, 10.0, 2.0, DebounceStatus(-1));
        assert_eq!(t, 10.0);
    }

    #[test]
    fn triggered_relaxes_in_trigger_favour() {
        let status = DebounceStatus(2);
        assert_eq!(effective_threshold(Comparator::GreaterThan, 100.0, 5.0, status), 95.0);
        assert_eq!(effective_threshold(Comparator::LessThan, 10.0, 2.0, status), 12.0);
    }

    #[test]
    fn equality_never_offset() {
        let status = DebounceStatus(1);
        assert_eq!(effective_threshold(Comparator::Equal, 1.0, 5.0, status), 1.0);
        assert_eq!(effective_threshold(Comparator::NotEqual, 1.0, 5.0, status), 1.0);
    }

    #[test]
    fn greater_than_band() {
        assert!(breached(Comparator::GreaterThan, 103.0, 100.0, 5.0, DebounceStatus::IDLE));
        assert!(!breached(Comparator::GreaterThan, 97.0, 100.0, 5.0, DebounceStatus::IDLE));
        assert!(breached(Comparator::GreaterThan, 99.0, 100.0, 5.0, DebounceStatus(1)));
        assert!(!breached(Comparator::GreaterThan, 94.0, 100.0, 5.0, DebounceStatus(1)));
    }

    #[test]
    fn less_than_band() {
        assert!(breached(Comparator::LessThan, 9.0, 10.0, 2.0, DebounceStatus::IDLE));
        assert!(!breached(Comparator::LessThan, 11.0, 10.0, 2.0, DebounceStatus::IDLE));
        assert!(breached(Comparator::LessThan, 11.0, 10.0, 2.0, DebounceStatus(1)));
        assert!(!breached(Comparator::LessThan, 12.5, 10.0, 2.0, DebounceStatus(1)));
    }
}
