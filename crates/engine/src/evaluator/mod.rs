mod debounce;
mod evaluator;
mod threshold;
pub mod test_harness;

pub use debounce::{DebounceStatus, Transition};
pub use evaluator::{evaluate, evaluate_any};
pub use threshold::{breached, effective_threshold};
