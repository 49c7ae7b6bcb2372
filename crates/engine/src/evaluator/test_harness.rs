use sentinel_common::{MeasurementSnapshot, RuleConfig};

use super::debounce::{DebounceStatus, Transition};
use super::evaluator::evaluate;

pub struct Sample {
    pub eui: String,
    pub measurement: String,
    pub value: f64,
}

impl Sample {
    pub fn new(eui: &str, measurement: &str, value: f64) -> Self {
        Self {
            eui: eui.into(),
            measurement: measurement.into(),
            value,
        }
    }
}

pub struct HarnessResult {
    pub transitions: Vec<Transition>,
    pub fire_count: usize,
    pub reset_count: usize,
    pub final_status: DebounceStatus,
}

/// Replays samples one at a time through evaluation and debouncing, carrying
/// the persisted status forward the way the tracker does.
pub fn run_harness(config: &RuleConfig, samples: &[Sample]) -> HarnessResult {
    let mut status = DebounceStatus::IDLE;
    let mut transitions = Vec::with_capacity(samples.len());

    for sample in samples {
        let snapshot =
            MeasurementSnapshot::new(&sample.eui).with(&sample.measurement, sample.value, None);
        let result = evaluate(config, &snapshot, status);
        let t = status.transition(result.violated, config.every_time, config.alert_level);
        match t {
            Transition::Fire(next) | Transition::Reset(next) => status = next,
            Transition::Hold => {}
        }
        transitions.push(t);
    }

    let fire_count = transitions
        .iter()
        .filter(|t| matches!(t, Transition::Fire(_)))
        .count();
    let reset_count = transitions
        .iter()
        .filter(|t| matches!(t, Transition::Reset(_)))
        .count();

    HarnessResult {
        transitions,
        fire_count,
        reset_count,
        final_status: status,
    }
}
