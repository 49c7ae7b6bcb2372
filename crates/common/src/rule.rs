use serde::{Deserialize, Serialize};

use crate::event::EventType;

/// A rule never carries more than two condition slots.
pub const MAX_CONDITIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">", alias = "gt", alias = "GreaterThan")]
    GreaterThan,
    #[serde(rename = "<", alias = "lt", alias = "LessThan")]
    LessThan,
    #[serde(rename = "=", alias = "==", alias = "eq", alias = "Equal")]
    Equal,
    #[serde(rename = "!=", alias = "≠", alias = "<>", alias = "ne", alias = "NotEqual")]
    NotEqual,
}

impl Comparator {
    /// Equality is literal IEEE comparison, no epsilon.
    #[allow(clippy::float_cmp)]
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::Equal => value == threshold,
            Self::NotEqual => value != threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equal => "=",
            Self::NotEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    #[serde(rename = "none", alias = "NONE", alias = "")]
    None,
    #[serde(rename = "OR", alias = "or")]
    Or,
    #[serde(rename = "AND", alias = "and")]
    And,
}

impl Logic {
    /// `None` folds like `Or` so that a lone resolved operand passes through.
    pub fn combine(&self, a: bool, b: bool) -> bool {
        match self {
            Self::And => a && b,
            Self::Or | Self::None => a || b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub measurement: String,
    pub condition1: Comparator,
    pub value1: f64,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub condition2: Option<Comparator>,
    #[serde(default)]
    pub value2: Option<f64>,
}

impl Condition {
    pub fn new(measurement: impl Into<String>, comparator: Comparator, value: f64) -> Self {
        Self {
            measurement: measurement.into(),
            condition1: comparator,
            value1: value,
            logic: Logic::None,
            condition2: None,
            value2: None,
        }
    }

    pub fn with_second(mut self, logic: Logic, comparator: Comparator, value: f64) -> Self {
        self.logic = logic;
        self.condition2 = Some(comparator);
        self.value2 = Some(value);
        self
    }

    /// The second clause only takes part when a combining operator is set.
    pub fn second_clause(&self) -> Option<(Comparator, f64)> {
        if self.logic == Logic::None {
            return None;
        }
        Some((self.condition2?, self.value2?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    Device(&'a str),
    Group(&'a str),
    Tag { name: &'a str, value: &'a str },
    Unset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub organization_id: i64,
    #[serde(default)]
    pub device_eui: Option<String>,
    #[serde(default)]
    pub group_eui: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub tag_value: Option<String>,
    #[serde(default)]
    pub check_others: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default = "yes")]
    pub active: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub condition_operator: Logic,
    #[serde(default)]
    pub hysteresis: f64,
    #[serde(default)]
    pub every_time: bool,
    #[serde(default)]
    pub alert_level: i32,
    #[serde(default)]
    pub alert_message: String,
    #[serde(default)]
    pub condition_ok_message: String,
    #[serde(default)]
    pub condition_ok: bool,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub administrators: String,
    #[serde(default)]
    pub use_script: bool,
    #[serde(default)]
    pub script: Option<String>,
}

fn yes() -> bool {
    true
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|v| !v.is_empty())
}

impl RuleConfig {
    pub fn new(id: i64, event_type: EventType) -> Self {
        Self {
            id,
            name: String::new(),
            user_id: String::new(),
            organization_id: 0,
            device_eui: None,
            group_eui: None,
            tag_name: None,
            tag_value: None,
            check_others: false,
            event_type,
            active: true,
            conditions: Vec::new(),
            condition_operator: Logic::None,
            hysteresis: 0.0,
            every_time: false,
            alert_level: 0,
            alert_message: String::new(),
            condition_ok_message: String::new(),
            condition_ok: false,
            team: String::new(),
            administrators: String::new(),
            use_script: false,
            script: None,
        }
    }

    /// Condition slots beyond [`MAX_CONDITIONS`] are ignored.
    pub fn condition_slots(&self) -> &[Condition] {
        let n = self.conditions.len().min(MAX_CONDITIONS);
        &self.conditions[..n]
    }

    /// Negative hysteresis values are treated as their magnitude.
    pub fn hysteresis(&self) -> f64 {
        self.hysteresis.abs()
    }

    pub fn script_source(&self) -> Option<&str> {
        if !self.use_script {
            return None;
        }
        non_empty(&self.script)
    }

    pub fn target(&self) -> Target<'_> {
        if let Some(eui) = non_empty(&self.device_eui) {
            return Target::Device(eui);
        }
        if let Some(eui) = non_empty(&self.group_eui) {
            return Target::Group(eui);
        }
        match (non_empty(&self.tag_name), non_empty(&self.tag_value)) {
            (Some(name), Some(value)) => Target::Tag { name, value },
            _ => Target::Unset,
        }
    }
}
