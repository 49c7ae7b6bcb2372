mod dispatcher;
pub mod migrator;
mod nats;
mod outbound;
mod pg;
mod sink;
pub mod template;

pub use dispatcher::{channel, Dispatcher, OutboundReceiver, OutboundSender};
pub use nats::NatsAlertSink;
pub use outbound::{Notification, NotificationKind, Outbound};
pub use pg::{create_pool, PgAlertStore, PgCommandStore, PgSignalStore};
pub use sink::{AlertSink, AlertStore, CommandSink, DispatchError, InMemorySink, LoggingSink, SignalSink};
