use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use sentinel_common::{ActuatorCommand, AlertMessage, Signal};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("publish: {0}")]
    Publish(String),
}

#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn save_signal(&self, signal: &Signal) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError>;
}

/// Durable alert history, kept alongside the published alert.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn save_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn put_command(&self, command: &ActuatorCommand) -> Result<(), DispatchError>;
}

/// Keeps everything it receives. Used by tests and seeded local runs.
#[derive(Clone, Default)]
pub struct InMemorySink {
    signals: Arc<Mutex<Vec<Signal>>>,
    alerts: Arc<Mutex<Vec<AlertMessage>>>,
    stored_alerts: Arc<Mutex<Vec<AlertMessage>>>,
    commands: Arc<Mutex<Vec<ActuatorCommand>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signals(&self) -> Vec<Signal> {
        self.signals.lock().await.clone()
    }

    pub async fn alerts(&self) -> Vec<AlertMessage> {
        self.alerts.lock().await.clone()
    }

    pub async fn stored_alerts(&self) -> Vec<AlertMessage> {
        self.stored_alerts.lock().await.clone()
    }

    pub async fn commands(&self) -> Vec<ActuatorCommand> {
        self.commands.lock().await.clone()
    }
}

#[async_trait]
impl SignalSink for InMemorySink {
    async fn save_signal(&self, signal: &Signal) -> Result<(), DispatchError> {
        self.signals.lock().await.push(signal.clone());
        Ok(())
    }
}

#[async_trait]
impl AlertSink for InMemorySink {
    async fn send_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

#[async_trait]
impl AlertStore for InMemorySink {
    async fn save_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
        self.stored_alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

#[async_trait]
impl CommandSink for InMemorySink {
    async fn put_command(&self, command: &ActuatorCommand) -> Result<(), DispatchError> {
        self.commands.lock().await.push(command.clone());
        Ok(())
    }
}

/// Writes every side effect to the log. Stands in for the database when none
/// is configured.
#[derive(Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl SignalSink for LoggingSink {
    async fn save_signal(&self, signal: &Signal) -> Result<(), DispatchError> {
        tracing::info!(
            config_id = signal.config_id,
            user_id = %signal.user_id,
            eui = %signal.device_eui,
            level = signal.level,
            subject = %signal.subject,
            "signal"
        );
        Ok(())
    }
}

#[async_trait]
impl AlertSink for LoggingSink {
    async fn send_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
        tracing::info!(line = %alert.to_line(), "alert");
        Ok(())
    }
}

#[async_trait]
impl CommandSink for LoggingSink {
    async fn put_command(&self, command: &ActuatorCommand) -> Result<(), DispatchError> {
        tracing::info!(
            target_eui = %command.target_eui,
            kind = %command.kind,
            payload = %command.payload,
            "actuator command"
        );
        Ok(())
    }
}
