use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use sentinel_common::event::now_ms;
use sentinel_common::{ActuatorCommand, RuleConfig, SentinelEvent, Target};

use super::correlation::Correlation;
use crate::dispatch::{Notification, NotificationKind, Outbound, OutboundSender};
use crate::evaluator::Transition;
use crate::gateway::{DeviceStore, RuleStore};
use crate::metrics::EngineMetrics;
use crate::verdict::ConditionResult;

/// Correlates the verdicts of concurrently evaluated rules back to their
/// inbound message, applies debouncing and emits side effects.
pub struct Tracker {
    correlations: DashMap<String, Correlation>,
    rules: Arc<dyn RuleStore>,
    devices: Arc<dyn DeviceStore>,
    outbound: OutboundSender,
    metrics: Arc<EngineMetrics>,
    ttl: Duration,
}

impl Tracker {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        devices: Arc<dyn DeviceStore>,
        outbound: OutboundSender,
        metrics: Arc<EngineMetrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            correlations: DashMap::new(),
            rules,
            devices,
            outbound,
            metrics,
            ttl,
        }
    }

    /// Registers the rules dispatched for `message_id`. Nothing is tracked
    /// for an empty set or an id that is already open.
    pub fn open(&self, message_id: &str, eui: &str, configs: &[RuleConfig]) -> bool {
        if configs.is_empty() {
            return false;
        }
        match self.correlations.entry(message_id.to_string()) {
            Entry::Occupied(_) => {
                tracing::error!(message_id, "message id already tracked");
                false
            }
            Entry::Vacant(v) => {
                v.insert(Correlation::new(eui, configs));
                self.metrics.inc_correlations_opened();
                true
            }
        }
    }

    pub fn is_open(&self, message_id: &str) -> bool {
        self.correlations.contains_key(message_id)
    }

    pub fn pending(&self, message_id: &str) -> Option<usize> {
        self.correlations.get(message_id).map(|c| c.pending())
    }

    pub fn open_count(&self) -> usize {
        self.correlations.len()
    }

    /// Applies one verdict. Every path ends with the rule marked processed.
    pub fn process(&self, message_id: &str, result: ConditionResult) {
        let config = self
            .correlations
            .get(message_id)
            .and_then(|c| c.config(result.config_id).cloned());
        let Some(config) = config else {
            tracing::error!(
                message_id,
                config_id = result.config_id,
                "verdict for unknown message or rule"
            );
            return;
        };

        self.apply(&config, &result);
        self.mark_processed(message_id, config.id);
    }

    /// Marks a rule processed without a verdict.
    pub fn skip(&self, message_id: &str, config_id: i64, reason: &str) {
        tracing::warn!(message_id, config_id, reason, "rule not evaluated");
        self.metrics.inc_configs_skipped();
        self.mark_processed(message_id, config_id);
    }

    /// A failed evaluation counts as not violated, so a triggered rule resets.
    fn apply(&self, config: &RuleConfig, result: &ConditionResult) {
        let violated = if result.error {
            self.metrics.inc_evaluation_errors();
            tracing::warn!(
                config_id = config.id,
                eui = %result.eui,
                error = %result.error_message,
                "evaluation failed, treated as not violated"
            );
            false
        } else {
            result.violated
        };

        if let Some((target, command)) = result.actuator_command().filter(|_| !result.error) {
            tracing::info!(config_id = config.id, target_eui = target, "actuator command requested");
            self.emit(Outbound::Command(ActuatorCommand::new(target, command, now_ms())));
            return;
        }

        let status = match self.rules.debounce_status(config.id) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(config_id = config.id, error = %e, "reading rule status failed");
                return;
            }
        };
        let device = match self.devices.device(&result.eui) {
            Ok(Some(d)) => d,
            Ok(None) => {
                tracing::error!(config_id = config.id, eui = %result.eui, "device not found");
                return;
            }
            Err(e) => {
                tracing::error!(config_id = config.id, eui = %result.eui, error = %e, "device lookup failed");
                return;
            }
        };

        let kind = match status.transition(violated, config.every_time, config.alert_level) {
            Transition::Fire(_) => NotificationKind::Fired,
            Transition::Reset(_) => NotificationKind::Reset,
            Transition::Hold => return,
        };

        let group = match config.target() {
            Target::Group(eui) => self.devices.group(eui).ok().flatten(),
            _ => None,
        };
        let notification =
            Notification::build(kind, config, &device, group.as_ref(), result, now_ms());

        let event = SentinelEvent {
            config_id: config.id,
            device_eui: device.eui.clone(),
            level: notification.level,
            message_en: notification.message.clone(),
            message_pl: notification.message.clone(),
            created_at_ms: notification.created_at_ms,
        };
        if let Err(e) = self.rules.record_event(event) {
            tracing::error!(config_id = config.id, error = %e, "recording sentinel event failed");
        }

        match kind {
            NotificationKind::Fired => {
                self.metrics.inc_alerts_fired();
                tracing::info!(
                    config_id = config.id,
                    eui = %device.eui,
                    level = notification.level,
                    recipients = notification.recipients.len(),
                    "rule fired"
                );
                self.emit(Outbound::Notify(notification));
            }
            NotificationKind::Reset => {
                self.metrics.inc_resets();
                tracing::info!(config_id = config.id, eui = %device.eui, "rule reset");
                if config.condition_ok {
                    self.emit(Outbound::Notify(notification));
                }
            }
        }
    }

    fn emit(&self, outbound: Outbound) {
        if self.outbound.send(outbound).is_err() {
            tracing::error!("dispatcher is gone, side effect dropped");
        }
    }

    fn mark_processed(&self, message_id: &str, config_id: i64) {
        let complete = match self.correlations.get_mut(message_id) {
            Some(mut c) => {
                if !c.mark_processed(config_id) {
                    tracing::error!(message_id, config_id, "rule not part of message");
                }
                c.is_complete()
            }
            None => {
                tracing::error!(message_id, config_id, "no correlation for message");
                return;
            }
        };

        if complete
            && self
                .correlations
                .remove_if(message_id, |_, c| c.is_complete())
                .is_some()
        {
            self.metrics.inc_correlations_closed();
            tracing::debug!(message_id, "all rules processed");
        }
    }

    /// Drops correlations older than the TTL; returns how many.
    pub fn sweep_expired(&self) -> usize {
        let before = self.correlations.len();
        self.correlations.retain(|message_id, c| {
            let keep = c.age() < self.ttl;
            if !keep {
                tracing::warn!(
                    message_id = %message_id,
                    eui = c.eui(),
                    pending = c.pending(),
                    "correlation expired"
                );
            }
            keep
        });
        let expired = before.saturating_sub(self.correlations.len());
        if expired > 0 {
            self.metrics.add_correlations_expired(expired as u64);
        }
        expired
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracker.sweep_expired();
            }
        })
    }
}
