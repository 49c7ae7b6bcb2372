mod handlers;
mod routes;

use std::sync::Arc;

use crate::metrics::EngineMetrics;
use crate::tracker::Tracker;

pub use handlers::{CorrelationsResponse, HealthResponse, ReadyResponse};
pub use routes::{router, serve};

/// Shared by every handler. Holds the tracker, so the API must be stopped
/// before the outbound channel can close.
#[derive(Clone)]
pub struct ApiState {
    pub metrics: Arc<EngineMetrics>,
    pub tracker: Arc<Tracker>,
}

impl ApiState {
    pub fn new(metrics: Arc<EngineMetrics>, tracker: Arc<Tracker>) -> Self {
        Self { metrics, tracker }
    }
}
