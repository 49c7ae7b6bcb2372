pub mod device;
pub mod event;
pub mod measurement;
pub mod nats_config;
pub mod rule;
pub mod signal;

pub use device::{Device, DeviceGroup, Tag};
pub use event::EventType;
pub use measurement::{ChannelMap, Measurement, MeasurementSnapshot};
pub use rule::{Comparator, Condition, Logic, RuleConfig, Target};
pub use signal::{ActuatorCommand, AlertMessage, SentinelEvent, Signal};
