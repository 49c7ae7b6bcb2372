pub mod api;
pub mod cli;
pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod engine;
pub mod evaluator;
pub mod event;
pub mod gateway;
pub mod metrics;
pub mod resolver;
pub mod script;
pub mod shutdown;
pub mod tracker;
pub mod verdict;

pub use engine::{FanOut, SentinelEngine};
pub use verdict::ConditionResult;
