mod payload;
mod source;

pub use payload::{Event, PayloadError};
pub use source::{DataSource, EventSource, Gateways, Outcome, PayloadSource};
