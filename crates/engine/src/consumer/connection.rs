use async_nats::{Client, Subscriber};

use sentinel_common::nats_config::SubjectConfig;
use sentinel_common::EventType;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connect: {0}")]
    Connect(#[from] async_nats::ConnectError),
    #[error("subscribe: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),
}

pub async fn connect(url: &str) -> Result<Client, ConnectionError> {
    Ok(async_nats::connect(url).await?)
}

/// One core subscription per inbound event type.
pub async fn subscribe_inbound(
    client: &Client,
    subjects: &SubjectConfig,
) -> Result<Vec<(EventType, Subscriber)>, ConnectionError> {
    let mut subscriptions = Vec::with_capacity(3);
    for (event_type, subject) in subjects.inbound() {
        let sub = client.subscribe(subject.to_string()).await?;
        tracing::info!(%event_type, subject, "subscribed");
        subscriptions.push((event_type, sub));
    }
    Ok(subscriptions)
}
