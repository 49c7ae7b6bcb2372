use async_nats::HeaderMap;

use sentinel_common::event::generate_message_id;
use sentinel_common::EventType;

pub const MESSAGE_ID_HEADER: &str = "X-Message-Id";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HandleError {
    #[error("payload is not UTF-8")]
    NotUtf8,
}

/// An inbound delivery in the shape the engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub event_type: EventType,
    pub eui: String,
    pub payload: Option<String>,
    pub message_id: String,
}

/// DATA and DEVICE carry their EUI in the first comma field; COMMAND bodies
/// name the target themselves.
pub fn decode(
    event_type: EventType,
    body: &[u8],
    headers: Option<&HeaderMap>,
) -> Result<InboundEvent, HandleError> {
    let body = std::str::from_utf8(body).map_err(|_| HandleError::NotUtf8)?.trim();
    let eui = match event_type {
        EventType::Command => "",
        EventType::Data | EventType::Device => body.split(',').next().unwrap_or_default().trim(),
    };
    let message_id = headers
        .and_then(|h| extract_header(h, MESSAGE_ID_HEADER))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate_message_id);

    Ok(InboundEvent {
        event_type,
        eui: eui.to_string(),
        payload: Some(body.to_string()).filter(|b| !b.is_empty()),
        message_id,
    })
}

pub fn extract_header(headers: &HeaderMap, key: &str) -> Option<String> {
    headers.get(key).map(|v| v.to_string())
}
