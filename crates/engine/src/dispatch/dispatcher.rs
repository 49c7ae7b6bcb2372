use std::sync::Arc;
use tokio::sync::mpsc;

use super::outbound::{Notification, Outbound};
use super::sink::{AlertSink, AlertStore, CommandSink, SignalSink};
use crate::metrics::EngineMetrics;
use sentinel_common::ActuatorCommand;

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

pub fn channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

/// Delivers tracker side effects. A failing recipient or sink is logged and
/// never blocks the others.
#[derive(Clone)]
pub struct Dispatcher {
    signals: Arc<dyn SignalSink>,
    alerts: Arc<dyn AlertSink>,
    alert_store: Option<Arc<dyn AlertStore>>,
    commands: Arc<dyn CommandSink>,
    metrics: Arc<EngineMetrics>,
}

impl Dispatcher {
    pub fn new(
        signals: Arc<dyn SignalSink>,
        alerts: Arc<dyn AlertSink>,
        commands: Arc<dyn CommandSink>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            signals,
            alerts,
            alert_store: None,
            commands,
            metrics,
        }
    }

    /// Also persists every alert sent.
    pub fn with_alert_store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.alert_store = Some(store);
        self
    }

    /// Runs until every sender is dropped.
    pub async fn run(self, mut rx: OutboundReceiver) {
        while let Some(outbound) = rx.recv().await {
            self.dispatch(outbound).await;
        }
        tracing::info!("outbound channel closed, dispatcher stopping");
    }

    pub async fn dispatch(&self, outbound: Outbound) {
        match outbound {
            Outbound::Notify(n) => self.notify(&n).await,
            Outbound::Command(c) => self.command(&c).await,
        }
    }

    async fn notify(&self, n: &Notification) {
        if n.recipients.is_empty() {
            tracing::debug!(config_id = n.config_id, "no recipients");
        }
        for user in &n.recipients {
            if let Err(e) = self.signals.save_signal(&n.signal_for(user)).await {
                self.metrics.inc_signals_failed();
                tracing::error!(config_id = n.config_id, user_id = %user, error = %e, "saving signal failed");
            }
            let alert = n.alert_for(user);
            if let Some(store) = &self.alert_store {
                if let Err(e) = store.save_alert(&alert).await {
                    tracing::error!(config_id = n.config_id, user_id = %user, error = %e, "storing alert failed");
                }
            }
            match self.alerts.send_alert(&alert).await {
                Ok(()) => self.metrics.inc_notifications_sent(),
                Err(e) => {
                    self.metrics.inc_notifications_failed();
                    tracing::error!(config_id = n.config_id, user_id = %user, error = %e, "sending alert failed");
                }
            }
        }
    }

    async fn command(&self, c: &ActuatorCommand) {
        match self.commands.put_command(c).await {
            Ok(()) => {
                self.metrics.inc_commands_issued();
                tracing::info!(target_eui = %c.target_eui, "actuator command stored");
            }
            Err(e) => {
                self.metrics.inc_commands_failed();
                tracing::error!(target_eui = %c.target_eui, error = %e, "storing actuator command failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::outbound::NotificationKind;
    use crate::dispatch::sink::{DispatchError, InMemorySink};
    use async_trait::async_trait;
    use sentinel_common::AlertMessage;

    fn notification(recipients: &[&str]) -> Notification {
        Notification {
            kind: NotificationKind::Fired,
            config_id: 1,
            organization_id: 0,
            device_eui: "D1".into(),
            level: 3,
            alert_type: "ALERT",
            subject: "Hot".into(),
            message: "too hot".into(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            created_at_ms: 5,
        }
    }

    /// Rejects alerts for one user.
    struct PickyAlerts {
        reject: &'static str,
        inner: InMemorySink,
    }

    #[async_trait]
    impl AlertSink for PickyAlerts {
        async fn send_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
            if alert.user_id == self.reject {
                return Err(DispatchError::Publish("refused".into()));
            }
            self.inner.send_alert(alert).await
        }
    }

    #[tokio::test]
    async fn signal_and_alert_per_recipient() {
        let sink = InMemorySink::new();
        let m = EngineMetrics::new();
        let d = Dispatcher::new(Arc::new(sink.clone()), Arc::new(sink.clone()), Arc::new(sink.clone()), m.clone());
        d.dispatch(Outbound::Notify(notification(&["a", "b"]))).await;

        assert_eq!(sink.signals().await.len(), 2);
        let alerts = sink.alerts().await;
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].to_line(), "b\tD1\tALERT\ttoo hot\tHot");
        assert_eq!(m.notifications_sent_val(), 2);
    }

    #[tokio::test]
    async fn alert_store_keeps_history_when_attached() {
        let sink = InMemorySink::new();
        let m = EngineMetrics::new();
        let plain = Dispatcher::new(Arc::new(sink.clone()), Arc::new(sink.clone()), Arc::new(sink.clone()), m.clone());
        plain.dispatch(Outbound::Notify(notification(&["a"]))).await;
        assert!(sink.stored_alerts().await.is_empty());

        let storing = plain.with_alert_store(Arc::new(sink.clone()));
        storing.dispatch(Outbound::Notify(notification(&["a", "b"]))).await;
        let stored = sink.stored_alerts().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].user_id, "a");
        assert_eq!(stored[1].alert_type, "ALERT");
        assert_eq!(sink.alerts().await.len(), 3);
    }

    #[tokio::test]
    async fn failing_recipient_does_not_block_others() {
        let sink = InMemorySink::new();
        let m = EngineMetrics::new();
        let alerts = PickyAlerts { reject: "a", inner: sink.clone() };
        let d = Dispatcher::new(Arc::new(sink.clone()), Arc::new(alerts), Arc::new(sink.clone()), m.clone());
        d.dispatch(Outbound::Notify(notification(&["a", "b"]))).await;

        let delivered = sink.alerts().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].user_id, "b");
        assert_eq!(m.notifications_failed_val(), 1);
        assert_eq!(sink.signals().await.len(), 2);
    }

    #[tokio::test]
    async fn run_drains_channel() {
        let sink = InMemorySink::new();
        let m = EngineMetrics::new();
        let d = Dispatcher::new(Arc::new(sink.clone()), Arc::new(sink.clone()), Arc::new(sink.clone()), m.clone());
        let (tx, rx) = channel();
        tx.send(Outbound::Command(ActuatorCommand::new("V1", "{}", 1))).unwrap();
        drop(tx);
        d.run(rx).await;
        assert_eq!(sink.commands().await.len(), 1);
        assert_eq!(m.commands_issued_val(), 1);
    }
}
