use async_trait::async_trait;

use sentinel_common::AlertMessage;

use super::sink::{AlertSink, DispatchError};

/// Publishes alerts as tab-separated lines on a core NATS subject.
pub struct NatsAlertSink {
    client: async_nats::Client,
    subject: String,
}

impl NatsAlertSink {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl AlertSink for NatsAlertSink {
    async fn send_alert(&self, alert: &AlertMessage) -> Result<(), DispatchError> {
        self.client
            .publish(self.subject.clone(), alert.to_line().into())
            .await
            .map_err(|e| DispatchError::Publish(e.to_string()))
    }
}
