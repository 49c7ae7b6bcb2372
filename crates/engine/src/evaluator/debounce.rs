use serde::{Deserialize, Serialize};

/// Persisted per rule: `0` idle, `+level` triggered, `-level` reset from `level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceStatus(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Fire(DebounceStatus),
    Reset(DebounceStatus),
    Hold,
}

impl DebounceStatus {
    pub const IDLE: Self = Self(0);

    pub fn triggered(alert_level: i32) -> Self {
        Self(alert_level)
    }

    pub fn reset(alert_level: i32) -> Self {
        Self(-alert_level)
    }

    pub fn is_triggered(self) -> bool {
        self.0 > 0
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn transition(self, violated: bool, every_time: bool, alert_level: i32) -> Transition {
        match (violated, self.is_triggered()) {
            (true, false) => Transition::Fire(Self::triggered(alert_level)),
            (true, true) if every_time => Transition::Fire(Self::triggered(alert_level)),
            (true, true) => Transition::Hold,
            (false, true) => Transition::Reset(Self::reset(alert_level)),
            (false, false) => Transition::Hold,
        }
    }
}

impl From<i32> for DebounceStatus {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
