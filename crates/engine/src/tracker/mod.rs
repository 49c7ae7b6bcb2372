mod correlation;
mod tracker;

pub use correlation::Correlation;
pub use tracker::Tracker;
