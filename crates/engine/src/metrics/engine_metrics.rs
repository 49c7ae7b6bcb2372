use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    events_received: AtomicU64,
    events_dropped: AtomicU64,
    configs_evaluated: AtomicU64,
    configs_skipped: AtomicU64,
    evaluation_errors: AtomicU64,
    alerts_fired: AtomicU64,
    resets: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    signals_failed: AtomicU64,
    commands_issued: AtomicU64,
    commands_failed: AtomicU64,
    correlations_opened: AtomicU64,
    correlations_closed: AtomicU64,
    correlations_expired: AtomicU64,
    script_latency_sum_us: AtomicU64,
    script_latency_count: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_events_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_configs_evaluated(&self) {
        self.configs_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_configs_skipped(&self) {
        self.configs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evaluation_errors(&self) {
        self.evaluation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alerts_fired(&self) {
        self.alerts_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_resets(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_signals_failed(&self) {
        self.signals_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commands_issued(&self) {
        self.commands_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commands_failed(&self) {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_correlations_opened(&self) {
        self.correlations_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_correlations_closed(&self) {
        self.correlations_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_correlations_expired(&self, count: u64) {
        self.correlations_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_script_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.script_latency_sum_us.fetch_add(us, Ordering::Relaxed);
        self.script_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_received_val(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn events_dropped_val(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn configs_evaluated_val(&self) -> u64 {
        self.configs_evaluated.load(Ordering::Relaxed)
    }

    pub fn configs_skipped_val(&self) -> u64 {
        self.configs_skipped.load(Ordering::Relaxed)
    }

    pub fn evaluation_errors_val(&self) -> u64 {
        self.evaluation_errors.load(Ordering::Relaxed)
    }

    pub fn alerts_fired_val(&self) -> u64 {
        self.alerts_fired.load(Ordering::Relaxed)
    }

    pub fn resets_val(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_val(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_val(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }

    pub fn signals_failed_val(&self) -> u64 {
        self.signals_failed.load(Ordering::Relaxed)
    }

    pub fn commands_issued_val(&self) -> u64 {
        self.commands_issued.load(Ordering::Relaxed)
    }

    pub fn commands_failed_val(&self) -> u64 {
        self.commands_failed.load(Ordering::Relaxed)
    }

    pub fn correlations_opened_val(&self) -> u64 {
        self.correlations_opened.load(Ordering::Relaxed)
    }

    pub fn correlations_closed_val(&self) -> u64 {
        self.correlations_closed.load(Ordering::Relaxed)
    }

    pub fn correlations_expired_val(&self) -> u64 {
        self.correlations_expired.load(Ordering::Relaxed)
    }

    /// Opened minus closed and expired.
    pub fn correlations_open_val(&self) -> u64 {
        self.correlations_opened_val()
            .saturating_sub(self.correlations_closed_val())
            .saturating_sub(self.correlations_expired_val())
    }

    pub fn script_latency_vals(&self) -> (u64, u64) {
        (
            self.script_latency_sum_us.load(Ordering::Relaxed),
            self.script_latency_count.load(Ordering::Relaxed),
        )
    }
}
