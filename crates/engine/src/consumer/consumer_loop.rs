use async_nats::{Message, Subscriber};
use futures::stream::{self, StreamExt};

use sentinel_common::EventType;

use super::handler::decode;
use crate::engine::SentinelEngine;

pub struct ConsumerLoop {
    subscriptions: Vec<(EventType, Subscriber)>,
    engine: SentinelEngine,
}

impl ConsumerLoop {
    pub fn new(subscriptions: Vec<(EventType, Subscriber)>, engine: SentinelEngine) -> Self {
        Self {
            subscriptions,
            engine,
        }
    }

    /// Runs until every subscription is closed. Evaluations are not awaited.
    pub async fn run(self) {
        let Self {
            subscriptions,
            engine,
        } = self;
        let mut merged = stream::select_all(
            subscriptions
                .into_iter()
                .map(|(event_type, sub)| sub.map(move |msg| (event_type, msg))),
        );

        while let Some((event_type, msg)) = merged.next().await {
            on_message(&engine, event_type, &msg);
        }
        tracing::warn!("all subscriptions closed, consumer stopping");
    }
}

fn on_message(engine: &SentinelEngine, event_type: EventType, msg: &Message) {
    match decode(event_type, &msg.payload, msg.headers.as_ref()) {
        Ok(event) => {
            engine.handle_event(
                event.event_type,
                &event.eui,
                event.payload.as_deref(),
                &event.message_id,
            );
        }
        Err(e) => {
            tracing::error!(subject = %msg.subject, error = %e, "undecodable message, discarded");
        }
    }
}
