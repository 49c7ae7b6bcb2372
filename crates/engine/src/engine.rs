use std::sync::Arc;
use tokio::task::JoinHandle;

use sentinel_common::EventType;

use crate::event::{Event, Gateways, Outcome};
use crate::metrics::EngineMetrics;
use crate::resolver::ConfigResolver;
use crate::tracker::Tracker;

/// Entry point for inbound events: resolves the rules, opens the message's
/// correlation and fans evaluation out to the blocking pool.
#[derive(Clone)]
pub struct SentinelEngine {
    resolver: ConfigResolver,
    gateways: Gateways,
    tracker: Arc<Tracker>,
    metrics: Arc<EngineMetrics>,
}

/// Evaluations spawned for one message.
pub struct FanOut {
    pub message_id: String,
    handles: Vec<JoinHandle<()>>,
}

impl FanOut {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every evaluation of the message to be tracked.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(message_id = %self.message_id, error = %e, "evaluation task failed");
            }
        }
    }
}

impl SentinelEngine {
    pub fn new(gateways: Gateways, tracker: Arc<Tracker>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            resolver: ConfigResolver::new(gateways.rules.clone(), gateways.devices.clone()),
            gateways,
            tracker,
            metrics,
        }
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    /// Returns `None` when the event was dropped or matched no active rule.
    /// Must be called from within a tokio runtime.
    pub fn handle_event(
        &self,
        event_type: EventType,
        eui: &str,
        payload: Option<&str>,
        message_id: &str,
    ) -> Option<FanOut> {
        self.metrics.inc_events_received();
        let span = tracing::info_span!("handle_event", message_id, event_type = %event_type, eui);
        let _guard = span.enter();

        let event = match Event::parse(event_type, eui, payload) {
            Ok(e) => e,
            Err(e) => {
                self.metrics.inc_events_dropped();
                tracing::warn!(error = %e, "event dropped");
                return None;
            }
        };

        let configs = match self.resolver.resolve(event_type, event.eui()) {
            Ok(c) => c,
            Err(e) => {
                self.metrics.inc_events_dropped();
                tracing::error!(error = %e, "rule resolution failed, event dropped");
                return None;
            }
        };
        if !self.tracker.open(message_id, event.eui(), &configs) {
            tracing::debug!(rules = configs.len(), "nothing to evaluate");
            return None;
        }
        tracing::debug!(rules = configs.len(), "dispatching evaluations");

        let source = event.into_source();
        let handles = configs
            .into_iter()
            .map(|config| {
                let source = Arc::clone(&source);
                let gateways = self.gateways.clone();
                let tracker = Arc::clone(&self.tracker);
                let metrics = Arc::clone(&self.metrics);
                let message_id = message_id.to_string();
                tokio::task::spawn_blocking(move || {
                    match source.evaluate(&config, &gateways) {
                        Outcome::Verdict(result) => {
                            metrics.inc_configs_evaluated();
                            tracker.process(&message_id, result);
                        }
                        Outcome::Skip(reason) => tracker.skip(&message_id, config.id, &reason),
                    }
                })
            })
            .collect();

        Some(FanOut {
            message_id: message_id.to_string(),
            handles,
        })
    }
}
