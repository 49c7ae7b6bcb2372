mod connection;
mod consumer_loop;
mod handler;

pub use connection::{connect, subscribe_inbound, ConnectionError};
pub use consumer_loop::ConsumerLoop;
pub use handler::{decode, extract_header, HandleError, InboundEvent, MESSAGE_ID_HEADER};
